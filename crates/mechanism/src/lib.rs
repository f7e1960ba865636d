#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::cast_possible_truncation)]
//! # Chain Mechanism
//!
//! Static description of the jointed rig the settling experiment poses: a
//! chain of box links joined by revolute pivots, hung from a fixed ground
//! point through a heavier disc. The rigid-body engine itself lives behind
//! the [`RigWorld`] trait; this crate only describes the rig, captures its
//! observed state, and decides whether it has stopped moving.
//!
//! ## Key Components
//!
//! -   **Chain model:** [`Chain::build`] registers the bodies and pivots in
//!     a fixed order that assigns each joint its [`JointRole`].
//! -   **Observation:** [`RigObservation::capture`] reads angles, speeds,
//!     targets and sleep flags in that same order.
//! -   **Settle detection:** [`reached_target_pose`] and [`all_settled`]
//!     are the two pure predicates the experiment's transitions hang on.

pub mod chain;
pub mod observe;
pub mod settle;
pub mod types;
pub mod world;

pub use chain::{Chain, ChainConfig};
pub use observe::{JointState, LinkState, RigObservation};
pub use settle::{all_settled, reached_target_pose};
pub use types::{BodyRef, DiscDef, JointRole, LinkDef, PivotDef, Vec2};
pub use world::RigWorld;
