use crate::llm::{ClaudeClient, ExtractedWorkout, LlmError, WorkoutImage};

/// ---------------------------------------------------------------------------
/// Image Extraction
/// ---------------------------------------------------------------------------

/// Read a workout off a screenshot or photo.
///
/// `image` is base64 or a data URL. The result is a suggestion only; the
/// frontend shows it for confirmation and then calls `add_workout`.
#[tauri::command]
pub async fn process_workout_image(
  image: String,
  media_type: Option<String>,
) -> Result<ExtractedWorkout, LlmError> {
  let image = WorkoutImage::parse(&image, media_type.as_deref())?;
  let client = ClaudeClient::from_env()?;

  tracing::info!(media_type = %image.media_type, bytes = image.byte_len, "extracting workout from image");

  let extracted = client.extract_workout(&image).await.map_err(|e| {
    tracing::warn!(error = %e, "workout image extraction failed");
    e
  })?;

  tracing::info!(
    workout_type = %extracted.workout_type,
    confidence = extracted.confidence,
    "workout image extracted"
  );
  Ok(extracted)
}
