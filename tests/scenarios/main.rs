//! Scenario-based tests for devflow

#[path = "../helpers.rs"]
mod helpers;

mod concurrent_stage;
mod round_trip;
mod sequential_stage;
