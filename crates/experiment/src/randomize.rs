//! Pose randomization.
//!
//! Draws a fresh pinned target for every link pivot. The draw is in whole
//! degrees, matching the granularity the rig was tuned with; the result is
//! handed back in radians.

use mechanism::JointRole;

use crate::config::SwingConfig;

/// Target angle for `role` under the given swing policy, or `None` for the
/// anchor roles, which stay pinned at their home angle.
#[must_use]
pub fn randomized_target(
    role: JointRole,
    rng: &mut fastrand::Rng,
    swing: &SwingConfig,
) -> Option<f32> {
    let degrees = match role {
        JointRole::Ground | JointRole::Base => return None,
        JointRole::Link(n) if n - 2 < swing.near_base_links => {
            swing.near_base_span_deg / 2 - rng.i32(0..swing.near_base_span_deg)
        }
        JointRole::Link(_) => rng.i32(0..swing.free_span_deg),
    };
    Some((degrees as f32).to_radians())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, TAU};

    #[test]
    fn anchor_roles_are_never_randomized() {
        let mut rng = fastrand::Rng::with_seed(7);
        let swing = SwingConfig::default();
        assert!(randomized_target(JointRole::Ground, &mut rng, &swing).is_none());
        assert!(randomized_target(JointRole::Base, &mut rng, &swing).is_none());
    }

    #[test]
    fn near_base_links_stay_within_half_swing() {
        let mut rng = fastrand::Rng::with_seed(42);
        let swing = SwingConfig::default();
        for role in [JointRole::Link(2), JointRole::Link(3)] {
            for _ in 0..1000 {
                let angle = randomized_target(role, &mut rng, &swing).unwrap();
                assert!(
                    angle > -FRAC_PI_2 && angle <= FRAC_PI_2,
                    "near-base target {angle} out of (-pi/2, pi/2]"
                );
            }
        }
    }

    #[test]
    fn far_links_draw_from_the_full_circle() {
        let mut rng = fastrand::Rng::with_seed(42);
        let swing = SwingConfig::default();
        for _ in 0..1000 {
            let angle = randomized_target(JointRole::Link(4), &mut rng, &swing).unwrap();
            assert!(
                (0.0..TAU).contains(&angle),
                "free target {angle} out of [0, 2pi)"
            );
        }
    }

    #[test]
    fn draws_are_deterministic_for_a_seed() {
        let swing = SwingConfig::default();
        let mut a = fastrand::Rng::with_seed(99);
        let mut b = fastrand::Rng::with_seed(99);
        for _ in 0..100 {
            assert_eq!(
                randomized_target(JointRole::Link(2), &mut a, &swing),
                randomized_target(JointRole::Link(2), &mut b, &swing),
            );
        }
    }

    #[test]
    fn custom_near_base_count_widens_the_free_class() {
        let swing = SwingConfig {
            near_base_links: 1,
            ..SwingConfig::default()
        };
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..1000 {
            let angle = randomized_target(JointRole::Link(3), &mut rng, &swing).unwrap();
            assert!((0.0..TAU).contains(&angle));
        }
    }
}
