pub mod workout;

pub use workout::{DurationValue, NewWorkout, Workout, WorkoutPatch, WorkoutRow};
