//! HTML 模板渲染
//!
//! 模板在编译期通过 rust-embed 打包，启动时一次性载入 Tera。
//! `.html` 模板默认开启自动转义，只有显式 `| safe` 的字段才会原样输出。

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use rust_embed::Embed;
use tera::{Context, Tera};
use tracing::error;

use crate::errors::{LinkhubError, Result};

#[derive(Embed)]
#[folder = "templates/"]
struct TemplateAssets;

pub const INDEX_TEMPLATE: &str = "index.html";
pub const LOGIN_TEMPLATE: &str = "admin_login.html";
pub const DASHBOARD_TEMPLATE: &str = "admin_dashboard.html";
pub const NOT_FOUND_TEMPLATE: &str = "404.html";

pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    pub fn new() -> Result<Self> {
        let mut templates = Vec::new();
        for name in TemplateAssets::iter() {
            let Some(file) = TemplateAssets::get(&name) else {
                continue;
            };
            let source = String::from_utf8(file.data.into_owned()).map_err(|e| {
                LinkhubError::template(format!("Template {} is not valid UTF-8: {}", name, e))
            })?;
            templates.push((name.to_string(), source));
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)?;
        Ok(Self { tera })
    }

    pub fn render(&self, template: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template, context)?)
    }

    /// 渲染为 HTML 响应；渲染失败时记录日志并返回 500
    pub fn respond(&self, status: StatusCode, template: &str, context: &Context) -> HttpResponse {
        match self.render(template, context) {
            Ok(body) => HttpResponse::build(status)
                .content_type("text/html; charset=utf-8")
                .body(body),
            Err(e) => {
                error!("Failed to render {}: {}", template, e);
                HttpResponse::InternalServerError()
                    .content_type("text/plain; charset=utf-8")
                    .body("Internal Server Error")
            }
        }
    }

    /// 404 页面
    pub fn not_found(&self) -> HttpResponse {
        self.respond(StatusCode::NOT_FOUND, NOT_FOUND_TEMPLATE, &Context::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_templates_load() {
        let renderer = Renderer::new().unwrap();
        let names: Vec<_> = renderer.tera.get_template_names().collect();
        for template in [
            INDEX_TEMPLATE,
            LOGIN_TEMPLATE,
            DASHBOARD_TEMPLATE,
            NOT_FOUND_TEMPLATE,
        ] {
            assert!(names.contains(&template), "missing {}", template);
        }
    }

    #[test]
    fn test_not_found_page() {
        let renderer = Renderer::new().unwrap();
        let response = renderer.not_found();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_login_page_escapes_error() {
        let renderer = Renderer::new().unwrap();
        let mut context = Context::new();
        context.insert("error", "<script>x</script>");
        let html = renderer.render(LOGIN_TEMPLATE, &context).unwrap();
        assert!(!html.contains("<script>x</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
