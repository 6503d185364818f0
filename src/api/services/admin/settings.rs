//! 站点设置（multipart）
//!
//! 先读完整个表单并校验所有上传文件，全部通过后才落盘和写库；
//! 任何一个上传不合格都不会保存任何内容。

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use tracing::{debug, info};

use crate::api::middleware::AdminSession;
use crate::errors::{LinkhubError, Result};
use crate::services::{PendingUpload, UploadKind, UploadService};
use crate::state::AppState;

use super::content::{back_to_dashboard, reject};

/// 单个文本字段的上限
const MAX_TEXT_FIELD: usize = 64 * 1024;

#[derive(Debug, Default)]
struct SettingsSubmission {
    fields: Vec<(String, String)>,
    uploads: Vec<PendingUpload>,
}

async fn read_field(
    field: &mut actix_multipart::Field,
    limit: usize,
    too_large: impl Fn() -> LinkhubError,
) -> Result<Bytes> {
    let mut data = BytesMut::new();
    while let Some(chunk) = field.next().await {
        let chunk =
            chunk.map_err(|e| LinkhubError::validation(format!("Invalid form data: {}", e)))?;
        if data.len() + chunk.len() > limit {
            return Err(too_large());
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data.freeze())
}

async fn parse_submission(
    mut payload: Multipart,
    uploads: &UploadService,
) -> Result<SettingsSubmission> {
    let mut submission = SettingsSubmission::default();
    let max_mb = uploads.max_bytes() / (1024 * 1024);

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| LinkhubError::validation(format!("Invalid form data: {}", e)))?;
        let name = field.name().unwrap_or("").to_string();

        if let Some(kind) = UploadKind::from_field(&name) {
            let file_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string);
            let content_type = field.content_type().map(|m| m.essence_str().to_string());
            let data = read_field(&mut field, uploads.max_bytes(), || {
                LinkhubError::validation(format!("Image too large (max {} MB)", max_mb))
            })
            .await?;

            // 未选择文件时浏览器仍会提交一个空字段
            if data.is_empty() && file_name.as_deref().unwrap_or("").is_empty() {
                continue;
            }
            submission.uploads.push(PendingUpload {
                kind,
                content_type,
                file_name,
                data,
            });
            continue;
        }

        let data = read_field(&mut field, MAX_TEXT_FIELD, || {
            LinkhubError::validation(format!("Field '{}' is too long", name))
        })
        .await?;
        submission
            .fields
            .push((name, String::from_utf8_lossy(&data).into_owned()));
    }

    for upload in &submission.uploads {
        uploads.validate(upload)?;
    }
    Ok(submission)
}

async fn apply_submission(state: &AppState, submission: SettingsSubmission) -> Result<()> {
    let mut stored = Vec::with_capacity(submission.uploads.len());
    for upload in &submission.uploads {
        let public_path = state.uploads.store(upload).await?;
        stored.push((upload.kind.setting_key(), public_path));
    }

    let mut updated = 0;
    for (key, value) in &submission.fields {
        if state.settings.set(key, value).await? {
            updated += 1;
        } else {
            debug!("Ignored form field '{}'", key);
        }
    }

    // 上传的文件优先于同名文本字段
    for (key, public_path) in &stored {
        state.settings.set_key(*key, public_path).await?;
    }

    info!(
        "Settings saved: {} fields, {} uploads",
        updated,
        stored.len()
    );
    Ok(())
}

/// POST /admin/settings
pub async fn save_settings(
    state: web::Data<AppState>,
    session: web::ReqData<AdminSession>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let submission = match parse_submission(payload, &state.uploads).await {
        Ok(submission) => submission,
        Err(e) => return reject(&state, &session, e).await,
    };

    apply_submission(&state, submission).await?;
    Ok(back_to_dashboard())
}
