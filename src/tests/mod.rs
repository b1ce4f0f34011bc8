//! Scenario tests driving the full pipeline against scripted RPC responses

mod lander_pipeline_tests;
mod submission_loop_tests;
