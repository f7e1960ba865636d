#![deny(clippy::all, clippy::pedantic)]
//! Host-loop pieces shared by the binary and its integration tests.

pub mod world;
