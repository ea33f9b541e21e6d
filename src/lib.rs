//! Academic record computation and weekly schedule placement for the course
//! registration portal.

pub mod config;
pub mod db;
pub mod error;
pub mod gpa;
pub mod grading;
pub mod ingest;
pub mod models;
pub mod report;
pub mod schedule;

pub use gpa::calculate_gpa;
pub use grading::{letter_grade_to_points, percentage_to_letter_grade};
pub use schedule::{generate_schedule, ScheduleOutcome};
