//! Bundled demo dataset, served when no store is configured or a read fails

use crate::models::{DurationValue, Workout};

const DEMO_ROWS: [(&str, &str, f64, &str, &str); 16] = [
  ("Greg", "Gym", 60.0, "2024-01-15", "Chest and Triceps"),
  ("Cortese", "HIIT", 45.0, "2024-01-16", "Morning HIIT"),
  ("JP", "Cardio", 30.0, "2024-01-17", "Treadmill Run"),
  ("Kyle", "Activity", 90.0, "2024-01-18", "Basketball"),
  ("Nick", "Gym", 75.0, "2024-01-19", "Back and Biceps"),
  ("Amanda", "HIIT", 40.0, "2024-01-20", "Weekend HIIT"),
  ("Niki", "Cardio", 35.0, "2024-01-21", "Sunday Jog"),
  ("Stu", "Gym", 65.0, "2024-01-22", "Leg Day"),
  ("Greg", "Cardio", 25.0, "2024-01-23", "Quick Run"),
  ("Cortese", "Gym", 70.0, "2024-01-24", "Full Body"),
  ("JP", "Activity", 120.0, "2024-01-25", "Rock Climbing"),
  ("Kyle", "HIIT", 50.0, "2024-01-26", "Friday HIIT"),
  ("Nick", "Cardio", 40.0, "2024-01-27", "Weekend Bike Ride"),
  ("Amanda", "Activity", 60.0, "2024-01-28", "Hiking"),
  ("Niki", "Gym", 55.0, "2024-01-29", "Upper Body"),
  ("Stu", "HIIT", 35.0, "2024-01-30", "Quick HIIT"),
];

/// Demo records carry ids as if they sat in sheet rows 2..=17
pub fn demo_workouts() -> Vec<Workout> {
  DEMO_ROWS
    .iter()
    .enumerate()
    .map(|(i, (person, kind, minutes, date, name))| {
      Workout {
        id: Some(i as i64 + 2),
        day_of_week: String::new(),
        person_name: person.to_string(),
        workout_type: kind.to_string(),
        start_time: None,
        end_time: None,
        duration: DurationValue::Minutes(*minutes),
        date: date.to_string(),
        name: Some(name.to_string()),
      }
      .with_derived_fields()
    })
    .collect()
}
