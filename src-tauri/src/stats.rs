//! Deterministic statistics over a snapshot of workouts
//!
//! Every function here is pure: the dashboard fetches the workout list once
//! and these compute totals, period histograms, the leaderboard and the chart
//! series from it. A record with a bad date or duration is skipped (with a
//! warning) rather than failing the whole aggregation.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::models::Workout;

/// Counts keyed by a sortable bucket label
pub type Buckets = BTreeMap<String, u32>;

/// ---------------------------------------------------------------------------
/// Date Handling
/// ---------------------------------------------------------------------------

/// Parse a workout date written as `YYYY-MM-DD` (optionally followed by a
/// time) or as `M/D/YYYY`.
pub fn parse_workout_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  if raw.is_empty() {
    return None;
  }

  if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
    return Some(date);
  }

  // ISO datetime, e.g. "2024-01-15T09:00:00Z"
  if raw.len() > 10 && raw.is_char_boundary(10) && matches!(raw.as_bytes()[10], b'T' | b' ') {
    if let Ok(date) = NaiveDate::parse_from_str(&raw[..10], "%Y-%m-%d") {
      return Some(date);
    }
  }

  let parts: Vec<&str> = raw.split('/').collect();
  if parts.len() == 3 {
    let month = parts[0].trim().parse().ok()?;
    let day = parts[1].trim().parse().ok()?;
    let year = parts[2].trim().parse().ok()?;
    return NaiveDate::from_ymd_opt(year, month, day);
  }

  None
}

/// Sunday that starts the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
  date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

fn week_key(date: NaiveDate) -> String {
  week_start(date).format("%Y-%m-%d").to_string()
}

fn month_key(date: NaiveDate) -> String {
  date.format("%Y-%m").to_string()
}

/// Quarter number zero-padded after the year, "2024-01" .. "2024-04"
fn quarter_key(date: NaiveDate) -> String {
  format!("{}-{:02}", date.year(), (date.month0() / 3) + 1)
}

fn year_key(date: NaiveDate) -> String {
  date.year().to_string()
}

fn day_label(date: NaiveDate) -> String {
  date.format("%b %d").to_string()
}

fn dated<'a>(workout: &'a Workout) -> Option<(NaiveDate, &'a Workout)> {
  match parse_workout_date(&workout.date) {
    Some(date) => Some((date, workout)),
    None => {
      tracing::warn!(
        person = %workout.person_name,
        date = %workout.date,
        "skipping workout with unparseable date"
      );
      None
    }
  }
}

/// ---------------------------------------------------------------------------
/// Aggregate Stats
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutStats {
  pub total_workouts: u32,
  /// Sum of durations in minutes
  pub total_duration: f64,
  pub average_duration: f64,
  pub workouts_by_week: Buckets,
  pub workouts_by_month: Buckets,
  pub workouts_by_quarter: Buckets,
  pub workouts_by_year: Buckets,
  pub workouts_by_type: Buckets,
}

impl WorkoutStats {
  pub fn compute(workouts: &[Workout]) -> Self {
    let mut stats = WorkoutStats {
      total_workouts: workouts.len() as u32,
      ..Default::default()
    };

    for workout in workouts {
      *stats
        .workouts_by_type
        .entry(workout.workout_type.clone())
        .or_insert(0) += 1;
      stats.total_duration += workout.duration_minutes();

      let Some((date, _)) = dated(workout) else {
        continue;
      };
      *stats.workouts_by_week.entry(week_key(date)).or_insert(0) += 1;
      *stats.workouts_by_month.entry(month_key(date)).or_insert(0) += 1;
      *stats.workouts_by_quarter.entry(quarter_key(date)).or_insert(0) += 1;
      *stats.workouts_by_year.entry(year_key(date)).or_insert(0) += 1;
    }

    stats.average_duration = if stats.total_workouts > 0 {
      stats.total_duration / stats.total_workouts as f64
    } else {
      0.0
    };

    stats
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonStats {
  pub person_name: String,
  #[serde(flatten)]
  pub stats: WorkoutStats,
}

impl PersonStats {
  /// Aggregate only the workouts whose `personName` matches exactly
  pub fn compute(workouts: &[Workout], person_name: &str) -> Self {
    let own: Vec<Workout> = workouts
      .iter()
      .filter(|w| w.person_name == person_name)
      .cloned()
      .collect();

    Self {
      person_name: person_name.to_string(),
      stats: WorkoutStats::compute(&own),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Leaderboard
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
  pub person_name: String,
  pub total_workouts: u32,
  pub rank: u32,
}

/// Rank people by workout count, most first.
///
/// Ties keep the order in which people first appear and still get distinct
/// sequential ranks.
pub fn leaderboard(workouts: &[Workout]) -> Vec<LeaderboardEntry> {
  let mut index: HashMap<&str, usize> = HashMap::new();
  let mut counts: Vec<(&str, u32)> = Vec::new();

  for workout in workouts {
    let name = workout.person_name.as_str();
    match index.get(name) {
      Some(&i) => counts[i].1 += 1,
      None => {
        index.insert(name, counts.len());
        counts.push((name, 1));
      }
    }
  }

  // sort_by is stable
  counts.sort_by(|a, b| b.1.cmp(&a.1));

  counts
    .into_iter()
    .enumerate()
    .map(|(i, (name, total))| LeaderboardEntry {
      person_name: name.to_string(),
      total_workouts: total,
      rank: i as u32 + 1,
    })
    .collect()
}

/// ---------------------------------------------------------------------------
/// Chart Series
/// ---------------------------------------------------------------------------

/// Running per-person totals as of one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativePoint {
  /// ISO date, the sort key
  pub date: String,
  /// Display label, e.g. "Jan 15"
  pub label: String,
  /// Running total per person
  pub totals: Buckets,
}

/// Cumulative workout count per person over time.
///
/// One point per day; each point carries every person's total so far, so
/// people who did not train that day keep their previous value.
pub fn cumulative_series(workouts: &[Workout]) -> Vec<CumulativePoint> {
  let mut sorted: Vec<(NaiveDate, &Workout)> = workouts.iter().filter_map(dated).collect();
  sorted.sort_by_key(|(date, _)| *date);

  let mut running: Buckets = BTreeMap::new();
  let mut points: Vec<CumulativePoint> = Vec::new();
  let mut last_date: Option<NaiveDate> = None;

  for (date, workout) in sorted {
    *running.entry(workout.person_name.clone()).or_insert(0) += 1;

    if last_date == Some(date) {
      if let Some(point) = points.last_mut() {
        point.totals = running.clone();
      }
    } else {
      points.push(CumulativePoint {
        date: date.format("%Y-%m-%d").to_string(),
        label: day_label(date),
        totals: running.clone(),
      });
      last_date = Some(date);
    }
  }

  points
}

/// Per-person counts for one week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPoint {
  /// ISO date of the week's Sunday
  pub week: String,
  pub label: String,
  pub counts: Buckets,
}

/// Workouts per person per week, oldest week first
pub fn weekly_breakdown(workouts: &[Workout]) -> Vec<WeeklyPoint> {
  let mut weeks: BTreeMap<NaiveDate, Buckets> = BTreeMap::new();

  for (date, workout) in workouts.iter().filter_map(dated) {
    *weeks
      .entry(week_start(date))
      .or_default()
      .entry(workout.person_name.clone())
      .or_insert(0) += 1;
  }

  weeks
    .into_iter()
    .map(|(start, counts)| WeeklyPoint {
      week: start.format("%Y-%m-%d").to_string(),
      label: day_label(start),
      counts,
    })
    .collect()
}

/// ---------------------------------------------------------------------------
/// Dashboard Bundle
/// ---------------------------------------------------------------------------

/// Where a list of workouts came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutSource {
  Store,
  Demo,
  /// The store failed and the demo dataset was substituted
  DemoFallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
  pub source: WorkoutSource,
  pub overall: WorkoutStats,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub person: Option<PersonStats>,
  pub leaderboard: Vec<LeaderboardEntry>,
  pub cumulative: Vec<CumulativePoint>,
  pub weekly: Vec<WeeklyPoint>,
}

impl Dashboard {
  pub fn build(workouts: &[Workout], source: WorkoutSource, person_name: Option<&str>) -> Self {
    Self {
      source,
      overall: WorkoutStats::compute(workouts),
      person: person_name.map(|name| PersonStats::compute(workouts, name)),
      leaderboard: leaderboard(workouts),
      cumulative: cumulative_series(workouts),
      weekly: weekly_breakdown(workouts),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
