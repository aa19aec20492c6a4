//! Downloads journal media for analysis

use reqwest::Client;

use crate::error::{AppError, AppResult};

/// Largest media file sent to a model
pub const MAX_MEDIA_BYTES: usize = 25 * 1024 * 1024;

pub struct FetchedMedia {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Download a photo or recording by URL
pub async fn fetch_media(client: &Client, url: &str) -> AppResult<FetchedMedia> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::ExternalService(format!("Media download failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(AppError::ExternalService(format!(
            "Media download returned {}",
            response.status()
        )));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::ExternalService(format!("Media download failed: {}", e)))?;

    if bytes.len() > MAX_MEDIA_BYTES {
        return Err(AppError::ValidationError(format!(
            "Media file exceeds {} MB",
            MAX_MEDIA_BYTES / (1024 * 1024)
        )));
    }

    Ok(FetchedMedia {
        bytes: bytes.to_vec(),
        content_type,
    })
}
