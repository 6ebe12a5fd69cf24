//! gw-model: Shared world types for gridworld.
//!
//! This crate defines the cells, actions and world layout that the solver,
//! renderer and report all speak in. It carries no solver logic.

pub mod cell;
pub mod world;

pub use cell::{Action, Cell, ParseActionError};
pub use world::{Terminal, World, WorldError};
