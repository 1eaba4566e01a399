//! Scenario-based tests for the lifecycle pipeline

mod helpers;

mod configuration;
mod failure_handling;
mod reset;
mod success_chain;
