pub mod bank;
pub mod calendar;
pub mod core;
pub mod grading;
pub mod rubric;
