#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::cast_precision_loss)]
//! # Settling Experiment
//!
//! The control layer that drives the chain rig through its endless
//! pose-randomize-settle-record cycle. The physics engine stays behind
//! `mechanism::RigWorld`; this crate decides what to command it each tick
//! and records the resulting joint trajectories, one CSV file per session.
//!
//! The host simulation loop owns the cadence: it calls
//! [`Experiment::tick`] once per step and nothing in here blocks beyond
//! synchronous session-file writes.

pub mod config;
pub mod error;
pub mod machine;
pub mod randomize;
pub mod recorder;

pub use config::{ExperimentConfig, SwingConfig};
pub use error::ExperimentError;
pub use machine::{advance, Command, Experiment, ExperimentStatus, Phase, Transition};
pub use randomize::randomized_target;
pub use recorder::SessionRecorder;
