//! LLM integration for workout image extraction
//!
//! This module sends a workout screenshot or photo to the Claude Messages API
//! and turns the structured reply into a workout guess the admin can confirm.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duration::{duration_between, is_valid_time_of_day, try_parse_duration_minutes};
use crate::models::workout::WORKOUT_TYPES;
use crate::models::DurationValue;
use crate::stats::parse_workout_date;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";
const CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";
const API_VERSION: &str = "2023-06-01";
const EXTRACTION_MAX_TOKENS: u32 = 1024;

/// Largest decoded image accepted for extraction
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub const SUPPORTED_MEDIA_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Serialize)]
pub enum LlmError {
  #[error("API key not configured")]
  MissingApiKey,

  #[error("Request failed: {0}")]
  Request(String),

  #[error("API error: {0}")]
  Api(String),

  #[error("Parse error: {0}")]
  Parse(String),

  #[error("Invalid image data: {0}")]
  InvalidImage(String),

  #[error("Unsupported image type: {0} (use JPEG, PNG, GIF or WebP)")]
  UnsupportedMediaType(String),

  #[error("Image is too large ({0} bytes, max 5 MB)")]
  ImageTooLarge(usize),
}

/// ---------------------------------------------------------------------------
/// Claude API Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ClaudeRequest {
  model: String,
  max_tokens: u32,
  system: String,
  messages: Vec<ClaudeMessage>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
  role: String,
  content: Vec<MessageContent>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MessageContent {
  Text { text: String },
  Image { source: ImageSource },
}

#[derive(Debug, Serialize)]
struct ImageSource {
  #[serde(rename = "type")]
  source_type: &'static str,
  media_type: String,
  data: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
  content: Vec<ContentBlock>,
  usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
  #[serde(rename = "type")]
  content_type: String,
  text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
  pub input_tokens: u32,
  pub output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorResponse {
  error: ClaudeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorDetail {
  message: String,
}

/// ---------------------------------------------------------------------------
/// Image Payload
/// ---------------------------------------------------------------------------

/// A base64 image checked for type and size before it is sent anywhere
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutImage {
  pub media_type: String,
  /// Base64 without whitespace or data-URL prefix
  pub data: String,
  pub byte_len: usize,
}

impl WorkoutImage {
  /// Accepts raw base64 or a `data:image/...;base64,` URL.
  ///
  /// The media type comes from the data URL, then `media_type`, then the
  /// file signature.
  pub fn parse(input: &str, media_type: Option<&str>) -> Result<Self, LlmError> {
    let input = input.trim();
    let (url_type, payload) = match input.strip_prefix("data:") {
      Some(rest) => {
        let (meta, payload) = rest
          .split_once(',')
          .ok_or_else(|| LlmError::InvalidImage("malformed data URL".into()))?;
        let mime = meta
          .strip_suffix(";base64")
          .ok_or_else(|| LlmError::InvalidImage("data URL is not base64 encoded".into()))?;
        (Some(mime.trim().to_ascii_lowercase()), payload)
      }
      None => (None, input),
    };

    let data: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if data.is_empty() {
      return Err(LlmError::InvalidImage("no image data".into()));
    }
    let bytes = BASE64
      .decode(&data)
      .map_err(|e| LlmError::InvalidImage(e.to_string()))?;

    if bytes.len() > MAX_IMAGE_BYTES {
      return Err(LlmError::ImageTooLarge(bytes.len()));
    }

    let media_type = url_type
      .or_else(|| media_type.map(|m| m.trim().to_ascii_lowercase()))
      .or_else(|| sniff_media_type(&bytes).map(str::to_string))
      .ok_or_else(|| LlmError::UnsupportedMediaType("unknown".into()))?;
    let media_type = if media_type == "image/jpg" { "image/jpeg".to_string() } else { media_type };

    if !SUPPORTED_MEDIA_TYPES.contains(&media_type.as_str()) {
      return Err(LlmError::UnsupportedMediaType(media_type));
    }

    Ok(Self {
      media_type,
      data,
      byte_len: bytes.len(),
    })
  }
}

fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
  if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
    Some("image/jpeg")
  } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
    Some("image/png")
  } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
    Some("image/gif")
  } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
    Some("image/webp")
  } else {
    None
  }
}

/// ---------------------------------------------------------------------------
/// Extraction Result
/// ---------------------------------------------------------------------------

/// Workout details read off an image. Advisory only: the admin reviews it
/// and submits it through the normal ingest path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedWorkout {
  pub workout_type: String,
  pub start_time: Option<String>,
  pub end_time: Option<String>,
  /// Minutes
  pub duration: Option<f64>,
  /// `YYYY-MM-DD`
  pub date: Option<String>,
  /// 0.0 to 1.0
  pub confidence: f64,
  pub extracted_text: String,
}

/// Reply shape requested from the model; every field may be missing or junk
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawExtraction {
  workout_type: Option<String>,
  start_time: Option<String>,
  end_time: Option<String>,
  duration: Option<DurationValue>,
  date: Option<String>,
  confidence: Option<f64>,
  extracted_text: Option<String>,
}

impl From<RawExtraction> for ExtractedWorkout {
  fn from(raw: RawExtraction) -> Self {
    let time = |t: Option<String>| t.map(|s| s.trim().to_string()).filter(|s| is_valid_time_of_day(s));
    let start_time = time(raw.start_time);
    let end_time = time(raw.end_time);

    let duration = raw
      .duration
      .as_ref()
      .and_then(try_parse_duration_minutes)
      .or_else(|| match (&start_time, &end_time) {
        (Some(start), Some(end)) => duration_between(start, end).filter(|m| *m >= 0).map(|m| m as f64),
        _ => None,
      });

    Self {
      workout_type: canonical_workout_type(raw.workout_type.as_deref().unwrap_or_default()),
      start_time,
      end_time,
      duration,
      date: raw
        .date
        .as_deref()
        .and_then(parse_workout_date)
        .map(|d| d.format("%Y-%m-%d").to_string()),
      confidence: raw
        .confidence
        .filter(|c| c.is_finite())
        .map_or(0.0, |c| c.clamp(0.0, 1.0)),
      extracted_text: raw.extracted_text.unwrap_or_default(),
    }
  }
}

/// Match a model-supplied type against the fixed categories, falling back to "Activity"
fn canonical_workout_type(value: &str) -> String {
  let value = value.trim();
  WORKOUT_TYPES
    .iter()
    .find(|t| t.eq_ignore_ascii_case(value))
    .unwrap_or(&"Activity")
    .to_string()
}

/// ---------------------------------------------------------------------------
/// Claude Client
/// ---------------------------------------------------------------------------

pub struct ClaudeClient {
  client: Client,
  api_key: String,
  api_url: String,
}

impl ClaudeClient {
  pub fn new(api_key: impl Into<String>) -> Self {
    Self {
      client: Client::new(),
      api_key: api_key.into(),
      api_url: CLAUDE_API_URL.to_string(),
    }
  }

  /// Create a new Claude client, loading API key from environment
  pub fn from_env() -> Result<Self, LlmError> {
    let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| LlmError::MissingApiKey)?;
    Ok(Self::new(api_key))
  }

  pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
    self.api_url = api_url.into();
    self
  }

  /// Send one user turn and return the first text block of the reply
  async fn complete(
    &self,
    system_prompt: &str,
    content: Vec<MessageContent>,
    max_tokens: u32,
  ) -> Result<(String, Usage), LlmError> {
    let request = ClaudeRequest {
      model: CLAUDE_MODEL.to_string(),
      max_tokens,
      system: system_prompt.to_string(),
      messages: vec![ClaudeMessage {
        role: "user".to_string(),
        content,
      }],
    };

    let response = self
      .client
      .post(&self.api_url)
      .header("x-api-key", &self.api_key)
      .header("anthropic-version", API_VERSION)
      .header("content-type", "application/json")
      .json(&request)
      .send()
      .await
      .map_err(|e| LlmError::Request(e.to_string()))?;

    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|e| LlmError::Request(e.to_string()))?;

    if !status.is_success() {
      if let Ok(error_resp) = serde_json::from_str::<ClaudeErrorResponse>(&body) {
        return Err(LlmError::Api(error_resp.error.message));
      }
      return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
    }

    let claude_response: ClaudeResponse =
      serde_json::from_str(&body).map_err(|e| LlmError::Parse(e.to_string()))?;

    let text = claude_response
      .content
      .iter()
      .find(|c| c.content_type == "text")
      .and_then(|c| c.text.clone())
      .ok_or_else(|| LlmError::Parse("No text content in response".to_string()))?;

    Ok((text, claude_response.usage))
  }

  /// Ask Claude to read workout details off an image
  pub async fn extract_workout(&self, image: &WorkoutImage) -> Result<ExtractedWorkout, LlmError> {
    let system_prompt = include_str!("prompts/extract_workout.txt");
    let today = chrono::Local::now().date_naive();

    let content = vec![
      MessageContent::Image {
        source: ImageSource {
          source_type: "base64",
          media_type: image.media_type.clone(),
          data: image.data.clone(),
        },
      },
      MessageContent::Text {
        text: format!(
          "Extract the workout from this image. Today is {}. Workout types: {}.",
          today.format("%Y-%m-%d"),
          WORKOUT_TYPES.join(", ")
        ),
      },
    ];

    let (response_text, usage) = self.complete(system_prompt, content, EXTRACTION_MAX_TOKENS).await?;
    tracing::debug!(
      input_tokens = usage.input_tokens,
      output_tokens = usage.output_tokens,
      "workout image extraction finished"
    );

    let json_str = extract_json(&response_text)?;
    let raw: RawExtraction =
      serde_json::from_str(&json_str).map_err(|e| LlmError::Parse(format!("{}: {}", e, json_str)))?;

    Ok(raw.into())
  }
}

/// Extract JSON from Claude's response (handles markdown code blocks)
fn extract_json(text: &str) -> Result<String, LlmError> {
  if text.trim().starts_with('{') {
    return Ok(text.trim().to_string());
  }

  if let Some(start) = text.find("```json") {
    let start = start + 7;
    if let Some(end) = text[start..].find("```") {
      return Ok(text[start..start + end].trim().to_string());
    }
  }

  if let Some(start) = text.find("```") {
    let start = start + 3;
    // Skip language identifier if present
    let content_start = text[start..]
      .find('\n')
      .map(|i| start + i + 1)
      .unwrap_or(start);
    if let Some(end) = text[content_start..].find("```") {
      return Ok(text[content_start..content_start + end].trim().to_string());
    }
  }

  // Last resort: find first { to the last } after it
  if let Some(start) = text.find('{') {
    if let Some(end) = text[start..].rfind('}') {
      return Ok(text[start..=start + end].to_string());
    }
  }

  Err(LlmError::Parse("Could not extract JSON from response".to_string()))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
