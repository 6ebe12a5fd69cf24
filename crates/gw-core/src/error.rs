//! Top-level error for a gridworld run.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::mdp::MdpError;
use crate::report::ReportError;
use crate::solver::SolverError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Mdp(#[from] MdpError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
