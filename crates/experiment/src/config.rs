//! Experiment configuration.
//!
//! Every tunable of the experiment lives here so none of the policy
//! constants are baked into the control logic. The defaults are the values
//! the rig was tuned with.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ExperimentError;

/// Randomization bounds per role class.
///
/// The first links of the chain get a swing centered on the home angle so
/// they cannot wind the rig into a full rotation near the base; every
/// further link draws from the full circle. The asymmetry is intentional.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SwingConfig {
    /// How many of the leading link pivots use the centered span.
    pub near_base_links: u32,
    /// Span, in whole degrees, for the near-base links. The draw is
    /// `span/2 - [0, span)`, i.e. `(-90°, 90°]` at the default.
    pub near_base_span_deg: i32,
    /// Span, in whole degrees, for every other link: `[0°, span)`.
    pub free_span_deg: i32,
}

impl Default for SwingConfig {
    fn default() -> Self {
        Self {
            near_base_links: 2,
            near_base_span_deg: 180,
            free_span_deg: 360,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// A joint counts as on-target below this angular distance (radians).
    pub angle_epsilon: f32,
    /// A body counts as still below this angular speed (radians/second).
    pub speed_epsilon: f32,
    /// Snapshot cadence while collecting, in ticks.
    pub sample_every: u64,
    /// Angular damping applied to every body while collecting.
    pub settle_damping: f32,
    /// Directory session files are written to.
    pub data_dir: PathBuf,
    /// Session file name prefix; the session index and `.csv` follow.
    pub file_prefix: String,
    pub swing: SwingConfig,
    /// Ticks a moving phase may run before `status()` reports it stalled.
    /// Diagnostic only; no transition is ever forced.
    pub stall_after: Option<u64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            angle_epsilon: 0.01,
            speed_epsilon: 1e-4,
            sample_every: 100,
            settle_damping: 0.8,
            data_dir: PathBuf::from("Revolute Chains Dir"),
            file_prefix: "Session_".to_string(),
            swing: SwingConfig::default(),
            stall_after: Some(100_000),
        }
    }
}

impl ExperimentConfig {
    /// Parses a JSON override file; unspecified fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ExperimentError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ExperimentError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the state machine cannot run with.
    pub fn validate(&self) -> Result<(), ExperimentError> {
        if self.angle_epsilon <= 0.0 {
            return Err(ExperimentError::Config(format!(
                "angle_epsilon must be positive, got {}",
                self.angle_epsilon
            )));
        }
        if self.speed_epsilon <= 0.0 {
            return Err(ExperimentError::Config(format!(
                "speed_epsilon must be positive, got {}",
                self.speed_epsilon
            )));
        }
        if self.sample_every == 0 {
            return Err(ExperimentError::Config(
                "sample_every must be at least 1".to_string(),
            ));
        }
        for (name, span) in [
            ("near_base_span_deg", self.swing.near_base_span_deg),
            ("free_span_deg", self.swing.free_span_deg),
        ] {
            if !(1..=360).contains(&span) {
                return Err(ExperimentError::Config(format!(
                    "{name} must be within 1..=360, got {span}"
                )));
            }
        }
        Ok(())
    }
}
