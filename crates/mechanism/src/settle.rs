//! Settle detection.
//!
//! Two independent predicates over the observed rig state. Both
//! short-circuit on the first violation in iteration order and are
//! vacuously true for an empty rig.

use crate::observe::{JointState, LinkState};

/// True once every joint sits within `angle_epsilon` of its pinned target.
#[must_use]
pub fn reached_target_pose(joints: &[JointState], angle_epsilon: f32) -> bool {
    joints
        .iter()
        .all(|j| (j.angle - j.target).abs() < angle_epsilon)
}

/// True once every body has stopped moving: either the engine reports it
/// asleep, or it is awake with angular speed below `speed_epsilon`.
#[must_use]
pub fn all_settled(links: &[LinkState], speed_epsilon: f32) -> bool {
    links
        .iter()
        .all(|l| !l.awake || l.angular_velocity.abs() < speed_epsilon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JointRole;

    fn joint(angle: f32, target: f32) -> JointState {
        JointState {
            role: JointRole::Link(2),
            angle,
            speed: 0.0,
            target,
        }
    }

    fn link(awake: bool, angular_velocity: f32) -> LinkState {
        LinkState {
            awake,
            angular_velocity,
        }
    }

    #[test]
    fn empty_rig_is_vacuously_settled() {
        assert!(reached_target_pose(&[], 0.01));
        assert!(all_settled(&[], 1e-4));
    }

    #[test]
    fn pose_reached_within_epsilon() {
        let joints = [joint(0.009, 0.0), joint(1.0, 1.0)];
        assert!(reached_target_pose(&joints, 0.01));
    }

    #[test]
    fn one_joint_off_target_fails_the_pose() {
        let joints = [joint(0.0, 0.0), joint(0.5, 0.0), joint(0.0, 0.0)];
        assert!(!reached_target_pose(&joints, 0.01));
    }

    #[test]
    fn exact_epsilon_is_not_reached() {
        // The comparison is strict.
        let joints = [joint(0.01, 0.0)];
        assert!(!reached_target_pose(&joints, 0.01));
    }

    #[test]
    fn asleep_body_counts_as_settled_regardless_of_velocity() {
        // A sleeping body can still report a stale velocity.
        let links = [link(false, 3.0)];
        assert!(all_settled(&links, 1e-4));
    }

    #[test]
    fn awake_body_below_epsilon_is_settled() {
        let links = [link(true, 5e-5), link(true, -5e-5)];
        assert!(all_settled(&links, 1e-4));
    }

    #[test]
    fn single_fast_body_fails_regardless_of_position() {
        for fast_at in 0..3 {
            let mut links = vec![link(true, 0.0); 3];
            links[fast_at] = link(true, 0.2);
            assert!(!all_settled(&links, 1e-4), "fast body at {fast_at}");
        }
    }
}
