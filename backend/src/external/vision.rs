//! Photo analysis for journal entries
//!
//! Runs one of three prompts (food, horse, general) against a photo, or all
//! three at once, and reads the replies into a [`PhotoAnalysis`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::{FoodItem, HorseCondition, PhotoAnalysis, PhotoAnalysisType};

use super::gemini::{extract_json_object, GeminiClient};
use super::media::fetch_media;
use crate::error::{AppError, AppResult};

const FOOD_PROMPT: &str = r#"You are a nutrition expert looking at a photo of food or feed.
List the items you can see with an estimated portion, estimated calories and
your confidence, plus the total calories for the meal.

Reply with a single JSON object:
{
  "food_detected": true or false,
  "food_items": [{"name": "...", "quantity": "...", "calories": 0, "confidence": 0.0}],
  "total_calories": 0,
  "description": "short description of the meal"
}

If there is no food, set food_detected to false and describe what you see."#;

const HORSE_PROMPT: &str = r#"You are an experienced equestrian looking at a photo from a barn.
Report whether a horse is visible, whether it is wearing a blanket or rug, the
blanket weight if so, the visible coat length and anything notable about the
horse's condition.

Reply with a single JSON object:
{
  "horse_detected": true or false,
  "blanket_status": "blanketed" | "not_blanketed" | "uncertain",
  "blanket_type": "none" | "light" | "medium" | "heavy" | "uncertain",
  "horse_condition": {
    "visible": true or false,
    "coat_condition": "clipped" | "short" | "medium" | "long",
    "notes": "..."
  },
  "description": "short description of the photo",
  "confidence": 0.0
}

If there is no horse, set horse_detected to false and describe what you see."#;

const GENERAL_PROMPT: &str = r#"You are looking at a photo for a barn management journal.
Describe the scene, list any animals you can see and any barn work that is
going on.

Reply with a single JSON object:
{
  "description": "detailed description of the scene",
  "animals_detected": ["..."],
  "barn_activity": "...",
  "confidence": 0.0
}"#;

/// Analyzes journal photos with a vision model
#[derive(Clone)]
pub struct PhotoAnalyzer {
    gemini: GeminiClient,
    http_client: reqwest::Client,
}

impl PhotoAnalyzer {
    pub fn new(gemini: GeminiClient) -> Self {
        Self {
            gemini,
            http_client: reqwest::Client::new(),
        }
    }

    /// Fetch the photo at `url` and run the requested analysis
    pub async fn analyze(
        &self,
        url: &str,
        analysis_type: PhotoAnalysisType,
        now: DateTime<Utc>,
    ) -> AppResult<PhotoAnalysis> {
        let media = fetch_media(&self.http_client, url).await?;
        let mime = media.content_type.as_deref().unwrap_or("image/jpeg");

        let base = PhotoAnalysis {
            analyzed_at: Some(now),
            ..Default::default()
        };

        let analysis = match analysis_type {
            PhotoAnalysisType::All => {
                let (food, horse, general) = tokio::join!(
                    self.run(PhotoAnalysisType::Food, mime, &media.bytes),
                    self.run(PhotoAnalysisType::Horse, mime, &media.bytes),
                    self.run(PhotoAnalysisType::General, mime, &media.bytes),
                );
                [food, horse, general]
                    .into_iter()
                    .filter_map(|result| match result {
                        Ok(analysis) => Some(analysis),
                        Err(e) => {
                            tracing::warn!("Photo sub-analysis failed: {}", e);
                            None
                        }
                    })
                    .fold(base, PhotoAnalysis::merge)
            }
            single => base.merge(self.run(single, mime, &media.bytes).await?),
        };

        Ok(PhotoAnalysis {
            analyzed_at: Some(now),
            ..analysis
        })
    }

    async fn run(
        &self,
        analysis_type: PhotoAnalysisType,
        mime: &str,
        image: &[u8],
    ) -> AppResult<PhotoAnalysis> {
        let prompt = match analysis_type {
            PhotoAnalysisType::Food => FOOD_PROMPT,
            PhotoAnalysisType::Horse => HORSE_PROMPT,
            PhotoAnalysisType::General | PhotoAnalysisType::All => GENERAL_PROMPT,
        };
        let reply = self.gemini.generate_with_image(prompt, mime, image).await?;
        parse_reply(analysis_type, &reply)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FoodReply {
    food_detected: Option<bool>,
    food_items: Vec<FoodItem>,
    total_calories: Option<f64>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HorseReply {
    horse_detected: Option<bool>,
    blanket_status: Option<String>,
    blanket_type: Option<String>,
    horse_condition: Option<HorseCondition>,
    description: Option<String>,
    confidence: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeneralReply {
    description: Option<String>,
    animals_detected: Vec<String>,
    barn_activity: Option<String>,
    confidence: Option<f64>,
}

/// Read a model reply for one prompt.
///
/// Only the fields the prompt asked about are kept. A reply with no JSON
/// becomes the description; JSON that does not parse is an error.
pub fn parse_reply(analysis_type: PhotoAnalysisType, reply: &str) -> AppResult<PhotoAnalysis> {
    let Some(json) = extract_json_object(reply) else {
        let description = Some(reply.trim().to_string());
        return Ok(match analysis_type {
            PhotoAnalysisType::Food => PhotoAnalysis {
                food_detected: Some(false),
                description,
                ..Default::default()
            },
            PhotoAnalysisType::Horse => PhotoAnalysis {
                horse_detected: Some(false),
                description,
                ..Default::default()
            },
            PhotoAnalysisType::General | PhotoAnalysisType::All => PhotoAnalysis {
                description,
                ..Default::default()
            },
        });
    };

    let malformed =
        |e: serde_json::Error| AppError::AiServiceError(format!("Malformed analysis JSON: {}", e));

    let analysis = match analysis_type {
        PhotoAnalysisType::Food => {
            let r: FoodReply = serde_json::from_str(json).map_err(malformed)?;
            PhotoAnalysis {
                food_detected: r.food_detected,
                food_items: r.food_items,
                total_calories: r.total_calories,
                description: r.description,
                ..Default::default()
            }
        }
        PhotoAnalysisType::Horse => {
            let r: HorseReply = serde_json::from_str(json).map_err(malformed)?;
            PhotoAnalysis {
                horse_detected: r.horse_detected,
                blanket_status: r.blanket_status,
                blanket_type: r.blanket_type,
                horse_condition: r.horse_condition,
                description: r.description,
                confidence: r.confidence,
                ..Default::default()
            }
        }
        PhotoAnalysisType::General | PhotoAnalysisType::All => {
            let r: GeneralReply = serde_json::from_str(json).map_err(malformed)?;
            PhotoAnalysis {
                description: r.description,
                animals_detected: r.animals_detected,
                barn_activity: r.barn_activity,
                confidence: r.confidence,
                ..Default::default()
            }
        }
    };

    Ok(analysis)
}
