//! Voice memo transcription
//!
//! Audio is sent to an OpenAI-compatible `/audio/transcriptions` endpoint;
//! the transcript can then be mined for tasks and names by Gemini.

use chrono::{DateTime, Utc};
use reqwest::{multipart, Client};
use serde::Deserialize;
use shared::{AudioTranscription, TranscriptAnalysis};

use super::gemini::{extract_json_object, GeminiClient};
use super::media::fetch_media;
use crate::error::{AppError, AppResult};

/// Whisper transcription client
#[derive(Clone)]
pub struct WhisperClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
    language: Option<String>,
}

impl WhisperClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            http_client: Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    /// Download the recording at `url` and transcribe it
    pub async fn transcribe_url(
        &self,
        url: &str,
        language: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<AudioTranscription> {
        let media = fetch_media(&self.http_client, url).await?;
        let mime = media.content_type.as_deref().unwrap_or("audio/m4a");
        let file_name = url
            .rsplit('/')
            .next()
            .filter(|name| name.contains('.'))
            .unwrap_or("audio.m4a")
            .to_string();

        let file = multipart::Part::bytes(media.bytes)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| AppError::ValidationError(format!("Unsupported audio type: {}", e)))?;

        let mut form = multipart::Form::new()
            .part("file", file)
            .text("model", self.model.clone());
        if let Some(lang) = language {
            form = form.text("language", lang.to_string());
        }

        let response = self
            .http_client
            .post(format!(
                "{}/audio/transcriptions",
                self.base_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::AiServiceError(format!("Transcription request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::AiServiceError(format!(
                "Transcription API returned {}: {}",
                status, body
            )));
        }

        let result: TranscriptionResponse = response.json().await.map_err(|e| {
            AppError::AiServiceError(format!("Failed to parse transcription: {}", e))
        })?;

        Ok(AudioTranscription {
            text: result.text,
            language: result
                .language
                .or_else(|| language.map(str::to_string))
                .or_else(|| Some("en".to_string())),
            confidence: None,
            transcribed_at: now,
            detected_tasks: Vec::new(),
            keywords: Vec::new(),
            mentions: Default::default(),
        })
    }
}

fn transcript_prompt(transcript: &str) -> String {
    format!(
        r#"This is the transcript of a voice memo from a barn journal.
Extract the tasks that were mentioned (done, to do, or just discussed), the
main keywords, and the names of horses, people and places.

Transcript: "{}"

Reply with a single JSON object:
{{
  "detected_tasks": [
    {{"task_title": "...", "action": "completed" | "added" | "mentioned", "confidence": 0.0}}
  ],
  "keywords": ["..."],
  "mentions": {{"horses": ["..."], "people": ["..."], "locations": ["..."]}}
}}

Phrases like "I fed", "I need to", "finished" or "done with" usually name a task."#,
        transcript.replace('"', "'")
    )
}

/// Extract tasks, keywords and mentions from a transcript.
///
/// Any failure yields an empty analysis; the transcript itself is kept.
pub async fn analyze_transcript(gemini: &GeminiClient, transcript: &str) -> TranscriptAnalysis {
    match gemini.generate_text(&transcript_prompt(transcript)).await {
        Ok(reply) => parse_transcript_analysis(&reply),
        Err(e) => {
            tracing::warn!("Transcript analysis failed: {}", e);
            TranscriptAnalysis::default()
        }
    }
}

pub fn parse_transcript_analysis(reply: &str) -> TranscriptAnalysis {
    extract_json_object(reply)
        .and_then(|json| match serde_json::from_str(json) {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                tracing::warn!("Malformed transcript analysis: {}", e);
                None
            }
        })
        .unwrap_or_default()
}
