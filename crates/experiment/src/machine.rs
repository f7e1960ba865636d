//! Experiment state machine.
//!
//! The cycle is fixed and has no terminal state:
//! `Initial -> MovingToInitial -> Randomize -> MovingToRandom -> Collecting`
//! and back to `Initial`. Each tick the pure [`advance`] function maps the
//! current phase and observation to the next phase plus a list of
//! [`Command`]s; the [`Experiment`] orchestrator applies those commands to
//! the world and the session recorder. Keeping the side effects as data
//! makes every transition testable without a live engine.

use mechanism::{
    all_settled, reached_target_pose, Chain, JointRole, RigObservation, RigWorld,
};
use tracing::{info, warn};

use crate::config::ExperimentConfig;
use crate::error::ExperimentError;
use crate::randomize::randomized_target;
use crate::recorder::SessionRecorder;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Initial,
    MovingToInitial,
    Randomize,
    MovingToRandom,
    Collecting,
}

impl Phase {
    /// The fixed cycle order.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Phase::Initial => Phase::MovingToInitial,
            Phase::MovingToInitial => Phase::Randomize,
            Phase::Randomize => Phase::MovingToRandom,
            Phase::MovingToRandom => Phase::Collecting,
            Phase::Collecting => Phase::Initial,
        }
    }

    /// True for the phases that wait on the rig instead of acting on it.
    /// These are the phases that can stall if the rig never converges.
    #[must_use]
    pub const fn is_moving(self) -> bool {
        matches!(self, Phase::MovingToInitial | Phase::MovingToRandom)
    }
}

/// A side effect the state machine wants performed, as data.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Set angular damping on every body of the chain.
    SetDamping(f32),
    /// Pin one joint's limits to a single angle. `slot` indexes the chain's
    /// joint iteration order.
    PinJoint { slot: usize, angle: f32 },
    EnableLimits,
    DisableLimits,
    OpenSession,
    /// Append one row per joint to the open session.
    Snapshot,
    CloseSession,
}

/// Result of advancing the machine by one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub next: Phase,
    pub commands: Vec<Command>,
}

impl Transition {
    fn stay(phase: Phase) -> Self {
        Self {
            next: phase,
            commands: Vec::new(),
        }
    }
}

/// Home angle for a role. Every role currently homes to zero; the match is
/// exhaustive so a new role has to choose.
#[must_use]
pub const fn home_angle(role: JointRole) -> f32 {
    match role {
        JointRole::Ground | JointRole::Base | JointRole::Link(_) => 0.0,
    }
}

/// Advances the machine one tick.
///
/// Pure apart from the injected random generator: the same phase,
/// observation, rng state and `collect_ticks` always produce the same
/// transition.
pub fn advance(
    phase: Phase,
    obs: &RigObservation,
    rng: &mut fastrand::Rng,
    config: &ExperimentConfig,
    collect_ticks: u64,
) -> Transition {
    match phase {
        Phase::Initial => {
            // Free-swinging bodies, then drive every joint home.
            let mut commands = vec![Command::SetDamping(0.0)];
            commands.extend(obs.joints.iter().enumerate().map(|(slot, joint)| {
                Command::PinJoint {
                    slot,
                    angle: home_angle(joint.role),
                }
            }));
            commands.push(Command::EnableLimits);
            Transition {
                next: phase.next(),
                commands,
            }
        }
        Phase::MovingToInitial => {
            if reached_target_pose(&obs.joints, config.angle_epsilon) {
                Transition::stay(phase.next())
            } else {
                // No timeout: a rig that never converges holds the cycle
                // here, surfaced through the stall diagnostics only.
                Transition::stay(phase)
            }
        }
        Phase::Randomize => {
            // Randomization only happens with limits released; the caller
            // re-enables them in the same tick.
            let mut commands = vec![Command::DisableLimits];
            commands.extend(obs.joints.iter().enumerate().filter_map(|(slot, joint)| {
                randomized_target(joint.role, rng, &config.swing)
                    .map(|angle| Command::PinJoint { slot, angle })
            }));
            commands.push(Command::EnableLimits);
            Transition {
                next: phase.next(),
                commands,
            }
        }
        Phase::MovingToRandom => {
            if reached_target_pose(&obs.joints, config.angle_epsilon) {
                // Release the rig and let it fall while the recorder runs.
                Transition {
                    next: phase.next(),
                    commands: vec![
                        Command::SetDamping(config.settle_damping),
                        Command::DisableLimits,
                        Command::OpenSession,
                    ],
                }
            } else {
                Transition::stay(phase)
            }
        }
        Phase::Collecting => {
            let mut commands = Vec::new();
            if collect_ticks % config.sample_every == 0 {
                commands.push(Command::Snapshot);
            }
            if all_settled(&obs.links, config.speed_epsilon) {
                commands.push(Command::CloseSession);
                Transition {
                    next: phase.next(),
                    commands,
                }
            } else {
                Transition {
                    next: phase,
                    commands,
                }
            }
        }
    }
}

/// Health snapshot of the running experiment.
#[derive(Copy, Clone, Debug)]
pub struct ExperimentStatus {
    pub phase: Phase,
    /// Ticks spent in the current phase.
    pub ticks_in_phase: u64,
    /// Index of the next (or currently recording) session file.
    pub session_index: usize,
    /// True once a moving phase has exceeded the configured stall budget.
    pub stalled: bool,
}

/// The orchestrator: owns the phase, counters, random generator, session
/// recorder and configuration, and is driven by the host loop once per
/// simulation tick.
pub struct Experiment {
    phase: Phase,
    ticks_in_phase: u64,
    collect_ticks: u64,
    stall_logged: bool,
    rng: fastrand::Rng,
    recorder: SessionRecorder,
    config: ExperimentConfig,
}

impl Experiment {
    /// Validates the configuration and allocates the first session index.
    /// Fails on unusable settings or an unwritable data directory; nothing
    /// is retried.
    pub fn new(config: ExperimentConfig, seed: u64) -> Result<Self, ExperimentError> {
        config.validate()?;
        let recorder = SessionRecorder::new(config.data_dir.clone(), config.file_prefix.clone())?;
        Ok(Self {
            phase: Phase::Initial,
            ticks_in_phase: 0,
            collect_ticks: 0,
            stall_logged: false,
            rng: fastrand::Rng::with_seed(seed),
            recorder,
            config,
        })
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    #[must_use]
    pub fn status(&self) -> ExperimentStatus {
        let stalled = self.phase.is_moving()
            && self
                .config
                .stall_after
                .is_some_and(|limit| self.ticks_in_phase > limit);
        ExperimentStatus {
            phase: self.phase,
            ticks_in_phase: self.ticks_in_phase,
            session_index: self.recorder.session_index(),
            stalled,
        }
    }

    /// Advances the experiment by one simulation tick.
    pub fn tick(
        &mut self,
        world: &mut impl RigWorld,
        chain: &Chain,
    ) -> Result<(), ExperimentError> {
        let obs = RigObservation::capture(world, chain);
        let transition = advance(
            self.phase,
            &obs,
            &mut self.rng,
            &self.config,
            self.collect_ticks,
        );

        for command in &transition.commands {
            self.apply(command, world, chain, &obs)?;
        }

        if self.phase == Phase::Collecting {
            self.collect_ticks += 1;
        }

        if transition.next == self.phase {
            self.ticks_in_phase += 1;
            self.maybe_warn_stall();
        } else {
            info!(from = ?self.phase, to = ?transition.next, "phase switch");
            if transition.next == Phase::Collecting {
                self.collect_ticks = 0;
            }
            self.phase = transition.next;
            self.ticks_in_phase = 0;
            self.stall_logged = false;
        }
        Ok(())
    }

    fn apply(
        &mut self,
        command: &Command,
        world: &mut impl RigWorld,
        chain: &Chain,
        obs: &RigObservation,
    ) -> Result<(), ExperimentError> {
        match *command {
            Command::SetDamping(damping) => {
                for &body in &chain.links {
                    world.set_link_damping(body, damping);
                }
            }
            Command::PinJoint { slot, angle } => {
                world.pin_joint(chain.joints[slot], angle);
            }
            Command::EnableLimits => {
                for &joint in &chain.joints {
                    world.set_limit_enabled(joint, true);
                }
            }
            Command::DisableLimits => {
                for &joint in &chain.joints {
                    world.set_limit_enabled(joint, false);
                }
            }
            Command::OpenSession => {
                self.recorder.open()?;
            }
            Command::Snapshot => {
                for joint in &obs.joints {
                    self.recorder.record(joint.role.id(), joint.angle, joint.speed)?;
                }
            }
            Command::CloseSession => {
                self.recorder.close()?;
            }
        }
        Ok(())
    }

    fn maybe_warn_stall(&mut self) {
        if self.stall_logged || !self.phase.is_moving() {
            return;
        }
        let Some(limit) = self.config.stall_after else {
            return;
        };
        if self.ticks_in_phase > limit {
            warn!(
                phase = ?self.phase,
                ticks = self.ticks_in_phase,
                "phase has not converged; rig may be stalled"
            );
            self.stall_logged = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mechanism::{JointState, LinkState};

    fn observation(angles: &[f32], targets: &[f32], speeds: &[f32]) -> RigObservation {
        let joints = angles
            .iter()
            .zip(targets)
            .enumerate()
            .map(|(i, (&angle, &target))| JointState {
                role: match i {
                    0 => JointRole::Link(2),
                    1 => JointRole::Link(3),
                    2 => JointRole::Ground,
                    _ => JointRole::Base,
                },
                angle,
                speed: 0.0,
                target,
            })
            .collect();
        let links = speeds
            .iter()
            .map(|&angular_velocity| LinkState {
                awake: true,
                angular_velocity,
            })
            .collect();
        RigObservation { joints, links }
    }

    #[test]
    fn cycle_order_is_fixed() {
        let mut phase = Phase::Initial;
        let expected = [
            Phase::MovingToInitial,
            Phase::Randomize,
            Phase::MovingToRandom,
            Phase::Collecting,
            Phase::Initial,
        ];
        for want in expected {
            phase = phase.next();
            assert_eq!(phase, want);
        }
    }

    #[test]
    fn initial_pins_every_joint_home_and_enables_limits() {
        let obs = observation(&[0.5; 4], &[0.5; 4], &[0.0; 4]);
        let mut rng = fastrand::Rng::with_seed(0);
        let t = advance(Phase::Initial, &obs, &mut rng, &ExperimentConfig::default(), 0);

        assert_eq!(t.next, Phase::MovingToInitial);
        assert_eq!(t.commands[0], Command::SetDamping(0.0));
        assert_eq!(*t.commands.last().unwrap(), Command::EnableLimits);
        let pins: Vec<_> = t
            .commands
            .iter()
            .filter_map(|c| match c {
                Command::PinJoint { slot, angle } => Some((*slot, *angle)),
                _ => None,
            })
            .collect();
        assert_eq!(pins, vec![(0, 0.0), (1, 0.0), (2, 0.0), (3, 0.0)]);
    }

    #[test]
    fn moving_to_initial_waits_for_the_pose() {
        let mut rng = fastrand::Rng::with_seed(0);
        let config = ExperimentConfig::default();

        let off = observation(&[0.3, 0.0, 0.0, 0.0], &[0.0; 4], &[0.0; 4]);
        let t = advance(Phase::MovingToInitial, &off, &mut rng, &config, 0);
        assert_eq!(t.next, Phase::MovingToInitial);
        assert!(t.commands.is_empty());

        let on = observation(&[0.0; 4], &[0.0; 4], &[0.0; 4]);
        let t = advance(Phase::MovingToInitial, &on, &mut rng, &config, 0);
        assert_eq!(t.next, Phase::Randomize);
        assert!(t.commands.is_empty());
    }

    #[test]
    fn randomize_releases_pins_and_re_enables() {
        let obs = observation(&[0.0; 4], &[0.0; 4], &[0.0; 4]);
        let mut rng = fastrand::Rng::with_seed(11);
        let config = ExperimentConfig::default();
        let t = advance(Phase::Randomize, &obs, &mut rng, &config, 0);

        assert_eq!(t.next, Phase::MovingToRandom);
        assert_eq!(t.commands.first(), Some(&Command::DisableLimits));
        assert_eq!(t.commands.last(), Some(&Command::EnableLimits));

        // Only the two link joints are re-pinned; ground and base stay home.
        let pinned_slots: Vec<usize> = t
            .commands
            .iter()
            .filter_map(|c| match c {
                Command::PinJoint { slot, .. } => Some(*slot),
                _ => None,
            })
            .collect();
        assert_eq!(pinned_slots, vec![0, 1]);
    }

    #[test]
    fn reaching_the_random_pose_starts_a_session() {
        let obs = observation(&[1.0; 4], &[1.0; 4], &[1.0; 4]);
        let mut rng = fastrand::Rng::with_seed(0);
        let config = ExperimentConfig::default();
        let t = advance(Phase::MovingToRandom, &obs, &mut rng, &config, 0);

        assert_eq!(t.next, Phase::Collecting);
        assert_eq!(
            t.commands,
            vec![
                Command::SetDamping(config.settle_damping),
                Command::DisableLimits,
                Command::OpenSession,
            ]
        );
    }

    #[test]
    fn collecting_snapshots_on_cadence_and_closes_on_settle() {
        let mut rng = fastrand::Rng::with_seed(0);
        let config = ExperimentConfig::default();

        let busy = observation(&[0.0; 4], &[0.0; 4], &[0.5; 4]);
        let t = advance(Phase::Collecting, &busy, &mut rng, &config, 0);
        assert_eq!(t.next, Phase::Collecting);
        assert_eq!(t.commands, vec![Command::Snapshot]);

        let t = advance(Phase::Collecting, &busy, &mut rng, &config, 57);
        assert!(t.commands.is_empty());

        let t = advance(Phase::Collecting, &busy, &mut rng, &config, 200);
        assert_eq!(t.commands, vec![Command::Snapshot]);

        let still = observation(&[0.0; 4], &[0.0; 4], &[0.0; 4]);
        let t = advance(Phase::Collecting, &still, &mut rng, &config, 57);
        assert_eq!(t.next, Phase::Initial);
        assert_eq!(t.commands, vec![Command::CloseSession]);
    }

    #[test]
    fn settling_on_a_cadence_tick_snapshots_before_closing() {
        let mut rng = fastrand::Rng::with_seed(0);
        let config = ExperimentConfig::default();
        let still = observation(&[0.0; 4], &[0.0; 4], &[0.0; 4]);
        let t = advance(Phase::Collecting, &still, &mut rng, &config, 100);
        assert_eq!(t.commands, vec![Command::Snapshot, Command::CloseSession]);
    }
}
