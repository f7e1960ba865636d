//! Snapshot of the rig as the simulation currently reports it.

use crate::chain::Chain;
use crate::types::JointRole;
use crate::world::RigWorld;

/// One joint as observed this tick.
#[derive(Copy, Clone, Debug)]
pub struct JointState {
    pub role: JointRole,
    /// Current angle in radians.
    pub angle: f32,
    /// Current angular speed in radians per second.
    pub speed: f32,
    /// The pinned limit angle the joint is being driven toward.
    pub target: f32,
}

/// One body as observed this tick.
#[derive(Copy, Clone, Debug)]
pub struct LinkState {
    /// False once the engine has put the body to sleep.
    pub awake: bool,
    pub angular_velocity: f32,
}

/// Everything the experiment reads from the simulation in one tick.
#[derive(Clone, Debug, Default)]
pub struct RigObservation {
    /// Joints in chain iteration order.
    pub joints: Vec<JointState>,
    /// Bodies in chain iteration order.
    pub links: Vec<LinkState>,
}

impl RigObservation {
    /// Reads the current state of every joint and body of the chain.
    #[must_use]
    pub fn capture(world: &impl RigWorld, chain: &Chain) -> Self {
        let joints = chain
            .joints
            .iter()
            .map(|&j| JointState {
                role: world.joint_role(j),
                angle: world.joint_angle(j),
                speed: world.joint_speed(j),
                target: world.joint_target(j),
            })
            .collect();
        let links = chain
            .links
            .iter()
            .map(|&b| LinkState {
                awake: world.link_is_awake(b),
                angular_velocity: world.link_angular_velocity(b),
            })
            .collect();
        Self { joints, links }
    }
}
