//! Time-of-day and duration parsing shared by ingestion and statistics

use crate::models::DurationValue;

/// Parse `H:MM`, `HH:MM` or `HH:MM:SS` into minutes since midnight.
/// Seconds contribute a fractional minute.
pub fn parse_time_of_day(value: &str) -> Option<f64> {
  let parts: Vec<&str> = value.trim().split(':').collect();
  if parts.len() != 2 && parts.len() != 3 {
    return None;
  }

  let hour = parse_digits(parts[0], 1, 2)?;
  let minute = parse_digits(parts[1], 2, 2)?;
  let second = match parts.get(2) {
    Some(s) => parse_digits(s, 2, 2)?,
    None => 0,
  };

  if hour > 23 || minute > 59 || second > 59 {
    return None;
  }

  Some(hour as f64 * 60.0 + minute as f64 + second as f64 / 60.0)
}

pub fn is_valid_time_of_day(value: &str) -> bool {
  parse_time_of_day(value).is_some()
}

/// Whole minutes from `start` to `end`, rounded to the nearest minute.
///
/// Overnight spans are not wrapped: an end before the start gives a negative result.
pub fn duration_between(start: &str, end: &str) -> Option<i64> {
  let start = parse_time_of_day(start)?;
  let end = parse_time_of_day(end)?;
  Some((end - start).round() as i64)
}

/// Duration in decimal minutes.
///
/// Numbers and numeric text are taken as minutes, `H:MM` / `H:MM:SS` text is
/// converted with `hours * 60 + minutes`. Anything else counts as 0.
pub fn parse_duration_minutes(value: &DurationValue) -> f64 {
  try_parse_duration_minutes(value).unwrap_or_else(|| {
    tracing::warn!(duration = %value, "could not parse duration, counting as 0 minutes");
    0.0
  })
}

/// Like [`parse_duration_minutes`] but `None` for blank, negative or malformed values
pub fn try_parse_duration_minutes(value: &DurationValue) -> Option<f64> {
  match value {
    DurationValue::Minutes(m) => (m.is_finite() && *m >= 0.0).then_some(*m),
    DurationValue::Text(text) => parse_duration_text(text),
  }
}

fn parse_duration_text(text: &str) -> Option<f64> {
  let text = text.trim();
  if text.is_empty() {
    return None;
  }

  if let Ok(minutes) = text.parse::<f64>() {
    return (minutes.is_finite() && minutes >= 0.0).then_some(minutes);
  }

  let parts: Vec<&str> = text.split(':').collect();
  if parts.len() != 2 && parts.len() != 3 {
    return None;
  }
  let hours = parse_digits(parts[0], 1, 3)?;
  let minutes = parse_digits(parts[1], 1, 2)?;
  let seconds = match parts.get(2) {
    Some(s) => parse_digits(s, 1, 2)?,
    None => 0,
  };
  if minutes > 59 || seconds > 59 {
    return None;
  }

  Some(hours as f64 * 60.0 + minutes as f64 + seconds as f64 / 60.0)
}

fn parse_digits(value: &str, min_len: usize, max_len: usize) -> Option<u32> {
  if value.len() < min_len || value.len() > max_len || !value.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  value.parse().ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_time_of_day_formats() {
    assert_eq!(parse_time_of_day("09:00"), Some(540.0));
    assert_eq!(parse_time_of_day("9:05"), Some(545.0));
    assert_eq!(parse_time_of_day("18:30:30"), Some(1110.5));
    assert_eq!(parse_time_of_day("0:00"), Some(0.0));
  }

  #[test]
  fn test_parse_time_of_day_rejects_out_of_range() {
    assert!(parse_time_of_day("24:00").is_none());
    assert!(parse_time_of_day("12:60").is_none());
    assert!(parse_time_of_day("12:30:60").is_none());
    assert!(parse_time_of_day("12:5").is_none());
    assert!(parse_time_of_day("123:00").is_none());
    assert!(parse_time_of_day("noon").is_none());
    assert!(parse_time_of_day("").is_none());
  }

  #[test]
  fn test_duration_between_rounds_to_minutes() {
    assert_eq!(duration_between("09:00", "09:45"), Some(45));
    assert_eq!(duration_between("07:00", "08:00"), Some(60));
    assert_eq!(duration_between("09:00:00", "09:44:40"), Some(45));
    assert_eq!(duration_between("09:00:00", "09:44:20"), Some(44));
  }

  #[test]
  fn test_duration_between_overnight_is_negative() {
    assert_eq!(duration_between("23:30", "00:15"), Some(-1395));
  }

  #[test]
  fn test_duration_between_invalid_time() {
    assert_eq!(duration_between("late", "09:45"), None);
  }

  #[test]
  fn test_parse_duration_minutes() {
    assert_eq!(parse_duration_minutes(&DurationValue::from("1:30")), 90.0);
    assert_eq!(parse_duration_minutes(&DurationValue::Minutes(45.0)), 45.0);
    assert_eq!(parse_duration_minutes(&DurationValue::from("45")), 45.0);
    assert_eq!(parse_duration_minutes(&DurationValue::from(" 30 ")), 30.0);
    assert_eq!(parse_duration_minutes(&DurationValue::from("0:45:30")), 45.5);
  }

  #[test]
  fn test_parse_duration_minutes_unparseable_is_zero() {
    assert_eq!(parse_duration_minutes(&DurationValue::from("about an hour")), 0.0);
    assert_eq!(parse_duration_minutes(&DurationValue::from("")), 0.0);
    assert_eq!(parse_duration_minutes(&DurationValue::from("1:75")), 0.0);
    assert_eq!(parse_duration_minutes(&DurationValue::Minutes(-5.0)), 0.0);
  }

  #[test]
  fn test_try_parse_duration_minutes() {
    assert_eq!(try_parse_duration_minutes(&DurationValue::from("2:00")), Some(120.0));
    assert_eq!(try_parse_duration_minutes(&DurationValue::from("-10")), None);
    assert_eq!(try_parse_duration_minutes(&DurationValue::from("  ")), None);
  }
}
