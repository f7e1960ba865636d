//! Deterministic stand-in for the rigid-body engine.
//!
//! The real engine is an external collaborator; this one exists so the
//! binary and the integration tests can drive a complete experiment cycle
//! without it. Pinned joints relax toward their target at the motor rate
//! while limits are enabled; with limits released, joint speeds decay
//! with the commanded angular damping (the `1 / (1 + dt * d)` form
//! rigid-body engines use) and bodies fall asleep once they have been
//! slow for long enough.

use mechanism::{BodyRef, DiscDef, JointRole, LinkDef, PivotDef, RigWorld};

/// Angular speed below which a body is considered still.
const SLEEP_TOLERANCE: f32 = 0.035;
/// Seconds a body must stay still before it is put to sleep.
const TIME_TO_SLEEP: f32 = 0.5;
/// Angular speed bodies pick up when the rig is disturbed.
const DISTURBANCE_SPEED: f32 = 1.0;

struct RelaxJoint {
    role: JointRole,
    angle: f32,
    speed: f32,
    target: f32,
    limit_enabled: bool,
    motor_speed: f32,
    /// Dynamic bodies this joint moves, by body index.
    bodies: Vec<usize>,
}

struct RelaxBody {
    angular_velocity: f32,
    damping: f32,
    awake: bool,
    still_for: f32,
}

#[derive(Default)]
pub struct RelaxWorld {
    joints: Vec<RelaxJoint>,
    bodies: Vec<RelaxBody>,
}

impl RelaxWorld {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn add_body(&mut self, damping: f32) -> usize {
        self.bodies.push(RelaxBody {
            angular_velocity: 0.0,
            damping,
            awake: true,
            still_for: 0.0,
        });
        self.bodies.len() - 1
    }

    fn wake_all(&mut self) {
        for body in &mut self.bodies {
            body.awake = true;
            body.still_for = 0.0;
            if body.angular_velocity.abs() < DISTURBANCE_SPEED {
                body.angular_velocity = DISTURBANCE_SPEED;
            }
        }
    }

    /// Advances the stand-in dynamics by one step of `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }

        for joint in &mut self.joints {
            if joint.limit_enabled {
                let max_step = joint.motor_speed * dt;
                let delta = (joint.target - joint.angle).clamp(-max_step, max_step);
                joint.angle += delta;
                joint.speed = delta / dt;
            } else {
                let damping = joint
                    .bodies
                    .iter()
                    .map(|&b| self.bodies[b].damping)
                    .fold(0.0, f32::max);
                joint.angle += joint.speed * dt;
                joint.speed *= 1.0 / (1.0 + dt * damping);
            }
        }

        for (i, body) in self.bodies.iter_mut().enumerate() {
            let driven = self
                .joints
                .iter()
                .filter(|j| j.bodies.contains(&i))
                .map(|j| j.speed.abs())
                .fold(0.0, f32::max);
            body.angular_velocity = driven / (1.0 + dt * body.damping);

            if body.angular_velocity.abs() < SLEEP_TOLERANCE {
                body.still_for += dt;
                if body.still_for >= TIME_TO_SLEEP {
                    body.awake = false;
                }
            } else {
                body.still_for = 0.0;
                body.awake = true;
            }
        }
    }
}

impl RigWorld for RelaxWorld {
    fn add_box_link(&mut self, def: &LinkDef) -> usize {
        self.add_body(def.angular_damping)
    }

    fn add_disc(&mut self, def: &DiscDef) -> usize {
        self.add_body(def.angular_damping)
    }

    fn add_pivot(&mut self, def: &PivotDef) -> usize {
        let bodies = [def.body_a, def.body_b]
            .into_iter()
            .filter_map(|body| match body {
                BodyRef::Body(index) => Some(index),
                BodyRef::Ground => None,
            })
            .collect();
        self.joints.push(RelaxJoint {
            role: def.role,
            angle: 0.0,
            speed: 0.0,
            target: 0.0,
            limit_enabled: false,
            motor_speed: def.motor_speed,
            bodies,
        });
        self.joints.len() - 1
    }

    fn joint_count(&self) -> usize {
        self.joints.len()
    }

    fn joint_role(&self, joint: usize) -> JointRole {
        self.joints[joint].role
    }

    fn joint_angle(&self, joint: usize) -> f32 {
        self.joints[joint].angle
    }

    fn joint_speed(&self, joint: usize) -> f32 {
        self.joints[joint].speed
    }

    fn joint_target(&self, joint: usize) -> f32 {
        self.joints[joint].target
    }

    fn pin_joint(&mut self, joint: usize, angle: f32) {
        self.joints[joint].target = angle;
        self.wake_all();
    }

    fn set_limit_enabled(&mut self, joint: usize, enabled: bool) {
        let joint = &mut self.joints[joint];
        // Releasing a pinned joint lets the rig swing; the impulse stands
        // in for gravity taking over.
        if joint.limit_enabled && !enabled {
            joint.speed = DISTURBANCE_SPEED;
        }
        joint.limit_enabled = enabled;
    }

    fn link_count(&self) -> usize {
        self.bodies.len()
    }

    fn link_angular_velocity(&self, link: usize) -> f32 {
        self.bodies[link].angular_velocity
    }

    fn link_is_awake(&self, link: usize) -> bool {
        self.bodies[link].awake
    }

    fn set_link_damping(&mut self, link: usize, damping: f32) {
        self.bodies[link].damping = damping;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mechanism::{Chain, ChainConfig};

    #[test]
    fn pinned_joints_motor_toward_their_target() {
        let mut world = RelaxWorld::new();
        let chain = Chain::build(&mut world, &ChainConfig::default());
        for &j in &chain.joints {
            world.pin_joint(j, 1.0);
            world.set_limit_enabled(j, true);
        }
        for _ in 0..600 {
            world.step(1.0 / 60.0);
        }
        for &j in &chain.joints {
            assert!((world.joint_angle(j) - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn released_damped_bodies_fall_asleep() {
        let mut world = RelaxWorld::new();
        let chain = Chain::build(&mut world, &ChainConfig::default());
        for &j in &chain.joints {
            world.pin_joint(j, 0.5);
            world.set_limit_enabled(j, true);
        }
        for _ in 0..200 {
            world.step(1.0 / 60.0);
        }

        // Release the pinned rig with settle damping on.
        for &b in &chain.links {
            world.set_link_damping(b, 0.8);
        }
        for &j in &chain.joints {
            world.set_limit_enabled(j, false);
        }
        for &b in &chain.links {
            assert!(world.link_angular_velocity(b) >= 0.0);
        }

        for _ in 0..5000 {
            world.step(1.0 / 60.0);
        }
        for &b in &chain.links {
            assert!(!world.link_is_awake(b));
            assert!(world.link_angular_velocity(b).abs() < SLEEP_TOLERANCE);
        }
    }
}
