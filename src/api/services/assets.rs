//! 静态资源
//!
//! 先查磁盘上的 `static_dir`（上传文件、运维放置的图片），
//! 找不到时回退到编译进二进制的内置资源。

use std::path::{Component, Path, PathBuf};

use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::{HttpRequest, HttpResponse, web};
use rust_embed::Embed;
use tracing::trace;

use crate::state::AppState;

#[derive(Embed)]
#[folder = "assets/"]
struct BuiltinAssets;

/// 只接受普通路径段，拒绝 `..`、绝对路径等
pub fn safe_relative_path(raw: &str) -> Option<PathBuf> {
    let path = Path::new(raw);
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!clean.as_os_str().is_empty()).then_some(clean)
}

pub fn content_type_for(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

fn asset_response(path: &str, body: Vec<u8>) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, content_type_for(path)))
        .insert_header((CACHE_CONTROL, "public, max-age=3600"))
        .body(body)
}

/// GET /static/{path:.*}
pub async fn serve_static(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let raw = req.match_info().query("path");
    let Some(relative) = safe_relative_path(raw) else {
        trace!("Rejected static path: {}", raw);
        return state.renderer.not_found();
    };

    let on_disk = Path::new(&state.config.server.static_dir).join(&relative);
    if let Ok(body) = tokio::fs::read(&on_disk).await {
        return asset_response(raw, body);
    }

    let key = relative.to_string_lossy().replace('\\', "/");
    match BuiltinAssets::get(&key) {
        Some(file) => asset_response(raw, file.data.into_owned()),
        None => {
            trace!("Static asset not found: {}", raw);
            state.renderer.not_found()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_relative_path() {
        assert_eq!(
            safe_relative_path("uploads/avatar.png"),
            Some(PathBuf::from("uploads/avatar.png"))
        );
        assert_eq!(safe_relative_path("./js/like.js"), Some(PathBuf::from("js/like.js")));
        assert_eq!(safe_relative_path("../secret"), None);
        assert_eq!(safe_relative_path("js/../../etc/passwd"), None);
        assert_eq!(safe_relative_path("/etc/passwd"), None);
        assert_eq!(safe_relative_path(""), None);
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("js/like.js"), "application/javascript; charset=utf-8");
        assert_eq!(content_type_for("uploads/a.SVG"), "image/svg+xml");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn test_builtin_assets_present() {
        for name in ["js/like.js", "js/share.js", "js/admin.js", "js/404.js", "css/site.css"] {
            assert!(BuiltinAssets::get(name).is_some(), "missing {}", name);
        }
    }
}
