//! Chain entity.
//!
//! Builds the jointed rig this experiment poses: a series of box links
//! connected by revolute pivots, terminated by a heavier disc that hangs
//! from a fixed ground point. Registration order fixes the role ids and the
//! joint iteration order, so construction is fully deterministic.

use tracing::debug;

use crate::types::{BodyRef, DiscDef, JointRole, LinkDef, PivotDef, Vec2};
use crate::world::RigWorld;

/// Configuration for the chain rig.
#[derive(Clone, Debug)]
pub struct ChainConfig {
    /// Number of chain segments beyond the anchor link.
    pub link_count: usize,
    /// Link half-extents (width, height).
    pub link_half_extents: Vec2,
    /// Link mass density.
    pub link_density: f32,
    /// Radius of the heavy terminal disc.
    pub disc_radius: f32,
    /// Disc mass density. Much denser than the links so the chain hangs
    /// from it rather than dragging it around.
    pub disc_density: f32,
    /// Spawn position shared by all bodies; the joints pull them apart.
    pub spawn_position: Vec2,
    /// Distance from a link's center to its pivot anchors.
    pub anchor_inset: f32,
    /// World-coordinate point the disc is pinned to.
    pub ground_anchor: Vec2,
    /// Motor torque available at every pivot.
    pub max_motor_torque: f32,
    /// Motor speed at every pivot (radians per second).
    pub motor_speed: f32,
    /// Angular damping the bodies start out with.
    pub initial_damping: f32,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            link_count: 2,
            link_half_extents: Vec2::new(5.0, 2.0),
            link_density: 20.0,
            disc_radius: 3.0,
            disc_density: 200.0,
            spawn_position: Vec2::new(0.0, 8.0),
            anchor_inset: 4.75,
            ground_anchor: Vec2::new(0.0, 30.0),
            max_motor_torque: 100.0,
            motor_speed: 20.0_f32.to_radians(),
            initial_damping: 0.8,
        }
    }
}

/// A built chain: body and joint indices in their fixed iteration order.
///
/// Membership is immutable once constructed; only dynamic properties
/// (damping, limits) change afterwards.
pub struct Chain {
    /// Moving bodies in build order: anchor link, chain links, disc.
    pub links: Vec<usize>,
    /// Joints in build order: `Link(2)..Link(N+1)`, then `Ground`, then
    /// `Base`. Settle checks and snapshots iterate in this order.
    pub joints: Vec<usize>,
}

impl Chain {
    /// Registers the whole rig with the simulation.
    pub fn build(world: &mut impl RigWorld, config: &ChainConfig) -> Self {
        let link_def = LinkDef {
            position: config.spawn_position,
            half_extents: config.link_half_extents,
            density: config.link_density,
            angular_damping: config.initial_damping,
        };

        let mut links = Vec::new();
        let mut joints = Vec::new();

        let mut prev = world.add_box_link(&link_def);
        links.push(prev);

        // Consecutive links share anchors at opposite insets.
        for i in 0..config.link_count {
            let link = world.add_box_link(&link_def);
            links.push(link);
            let joint = world.add_pivot(&PivotDef {
                body_a: BodyRef::Body(prev),
                body_b: BodyRef::Body(link),
                local_anchor_a: Vec2::new(config.anchor_inset, 0.0),
                local_anchor_b: Vec2::new(-config.anchor_inset, 0.0),
                max_motor_torque: config.max_motor_torque,
                motor_speed: config.motor_speed,
                role: JointRole::Link(i as u32 + 2),
            });
            joints.push(joint);
            prev = link;
        }

        let disc = world.add_disc(&DiscDef {
            position: config.spawn_position,
            radius: config.disc_radius,
            density: config.disc_density,
            angular_damping: config.initial_damping,
        });
        links.push(disc);

        // Pin the disc to the fixed ground point. The ground body sits at
        // the origin, so the local anchor is a world coordinate.
        let ground_joint = world.add_pivot(&PivotDef {
            body_a: BodyRef::Ground,
            body_b: BodyRef::Body(disc),
            local_anchor_a: config.ground_anchor,
            local_anchor_b: Vec2::ZERO,
            max_motor_torque: config.max_motor_torque,
            motor_speed: config.motor_speed,
            role: JointRole::Ground,
        });
        joints.push(ground_joint);

        // And hang the last chain link off the disc's center.
        let base_joint = world.add_pivot(&PivotDef {
            body_a: BodyRef::Body(prev),
            body_b: BodyRef::Body(disc),
            local_anchor_a: Vec2::new(config.anchor_inset, 0.0),
            local_anchor_b: Vec2::ZERO,
            max_motor_torque: config.max_motor_torque,
            motor_speed: config.motor_speed,
            role: JointRole::Base,
        });
        joints.push(base_joint);

        debug!(
            links = links.len(),
            joints = joints.len(),
            "chain registered"
        );

        Self { links, joints }
    }

    #[must_use]
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }
}
