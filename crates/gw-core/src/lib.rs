//! gw-core: Solver, rendering and CLI plumbing for gridworld.
//!
//! This crate turns a world layout and MDP parameters into utilities and a
//! policy, and prints them as tables or JSON. Exposed as a library for
//! integration testing.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod mdp;
pub mod render;
pub mod report;
pub mod solver;
pub mod style;

pub use error::{Error, Result};
