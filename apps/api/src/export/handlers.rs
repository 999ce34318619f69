use axum::{
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::export::{render_export, ExportFormat};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExportRequest {
    pub prompt: String,
    pub format: ExportFormat,
}

/// POST /api/v1/export
pub async fn handle_export(Json(req): Json<ExportRequest>) -> Response {
    let file = render_export(&req.prompt, req.format, Utc::now());
    let disposition = format!("attachment; filename=\"{}\"", file.filename);
    (
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.body,
    )
        .into_response()
}
