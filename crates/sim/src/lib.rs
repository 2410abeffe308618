//! Tick driver for scripted combat scenarios.
//!
//! Loads content, spawns the scenario's units, plays its script on a fixed
//! step and streams every combat event as a JSON line.

pub mod driver;
pub mod report;

pub use driver::{RejectedAction, RunOptions, ScenarioRunner};
pub use report::{EventWriter, RunSummary, Tally, TimedEvent};
