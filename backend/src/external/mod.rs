//! External API integrations

pub mod gemini;
pub mod media;
pub mod transcription;
pub mod vision;
pub mod weather;

pub use gemini::GeminiClient;
pub use transcription::WhisperClient;
pub use vision::PhotoAnalyzer;
pub use weather::WeatherClient;
