#![warn(clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

//! Whole-Body Tracking Training Dispatcher
//!
//! Discovers pending motion-tracking training jobs, filters out completed
//! ones, splits the remainder across cooperating machines, and fans tasks
//! out over a fixed pool of per-GPU workers that invoke the external RL
//! trainer as a subprocess.

pub mod config;
pub mod discovery;
pub mod dispatcher;
pub mod registry;
pub mod runner;
pub mod worker;

pub use config::{DispatchConfig, DispatchSettings};
pub use dispatcher::Dispatcher;
pub use registry::{RunRegistry, TaskRecord, TaskStatus};
pub use runner::{RunOutcome, TrainRunner};
pub use worker::QueueItem;
