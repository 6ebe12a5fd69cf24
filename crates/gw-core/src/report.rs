//! Machine-readable JSON report of a solved world.

use std::fs;
use std::path::{Path, PathBuf};

use gw_model::{Action, Cell, World};
use serde::Serialize;
use thiserror::Error;

use crate::mdp::{GridMdp, MdpParams};
use crate::solver::{q_values, Algorithm, Solution};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write report to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct CellUtility {
    pub cell: Cell,
    pub utility: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CellAction {
    pub cell: Cell,
    pub action: Action,
}

#[derive(Debug, Clone, Serialize)]
pub struct CellQValues {
    pub cell: Cell,
    pub up: f64,
    pub down: f64,
    pub left: f64,
    pub right: f64,
}

/// Utilities after one sweep, in `states` order.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryFrame {
    pub iteration: usize,
    pub utilities: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub algorithm: Algorithm,
    pub params: MdpParams,
    pub world: World,
    pub iterations: usize,
    pub converged: bool,
    pub residual: f64,
    pub states: Vec<Cell>,
    pub utilities: Vec<CellUtility>,
    pub policy: Vec<CellAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryFrame>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q_values: Option<Vec<CellQValues>>,
}

impl Report {
    pub fn new(mdp: &GridMdp, solution: &Solution, include_q_values: bool) -> Self {
        let states = mdp.states().to_vec();

        let utilities = states
            .iter()
            .zip(solution.utilities.values())
            .map(|(&cell, &utility)| CellUtility { cell, utility })
            .collect();

        let policy = states
            .iter()
            .zip(solution.policy.actions())
            .filter_map(|(&cell, &action)| action.map(|action| CellAction { cell, action }))
            .collect();

        let history = (!solution.history.is_empty()).then(|| {
            solution
                .history
                .iter()
                .enumerate()
                .map(|(iteration, u)| HistoryFrame {
                    iteration,
                    utilities: u.values().to_vec(),
                })
                .collect()
        });

        let q_values = include_q_values.then(|| {
            q_values(mdp, &solution.utilities)
                .into_iter()
                .map(|(cell, [up, down, left, right])| CellQValues {
                    cell,
                    up,
                    down,
                    left,
                    right,
                })
                .collect()
        });

        Self {
            algorithm: solution.algorithm,
            params: *mdp.params(),
            world: mdp.world().clone(),
            iterations: solution.iterations,
            converged: solution.converged,
            residual: solution.residual,
            states,
            utilities,
            policy,
            history,
            q_values,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the pretty JSON to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<(), ReportError> {
        let json = self.to_json_pretty()?;
        let io_err = |source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, json + "\n").map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{value_iteration, SolverOptions};

    fn report(history: bool, q: bool) -> Report {
        let mdp = GridMdp::new(World::classic(), MdpParams::default()).unwrap();
        let opts = SolverOptions {
            record_history: history,
            ..SolverOptions::default()
        };
        let sol = value_iteration(&mdp, &opts).unwrap();
        Report::new(&mdp, &sol, q)
    }

    #[test]
    fn report_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&report(false, false).to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["algorithm"], "value");
        assert_eq!(json["converged"], true);
        assert_eq!(json["params"]["gamma"], 0.9);
        assert_eq!(json["world"]["cols"], 4);
        assert_eq!(json["states"].as_array().unwrap().len(), 11);
        assert_eq!(json["utilities"].as_array().unwrap().len(), 11);
        // terminals carry no action
        assert_eq!(json["policy"].as_array().unwrap().len(), 9);
        assert!(json.get("history").is_none());
        assert!(json.get("q_values").is_none());
    }

    #[test]
    fn policy_entries_use_cell_pairs_and_names() {
        let json: serde_json::Value =
            serde_json::from_str(&report(false, false).to_json_pretty().unwrap()).unwrap();
        let first = &json["policy"][0];
        assert_eq!(first["cell"], serde_json::json!([1, 3]));
        assert_eq!(first["action"], "right");
    }

    #[test]
    fn optional_sections() {
        let r = report(true, true);
        let history = r.history.as_ref().unwrap();
        assert_eq!(history[0].iteration, 0);
        assert_eq!(history.len(), r.iterations + 1);
        assert_eq!(r.q_values.as_ref().unwrap().len(), 9);
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");
        report(false, false).write_to(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["iterations"], report(false, false).iterations);
    }

    #[test]
    fn write_error_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let path = blocker.join("out.json");
        let err = report(false, false).write_to(&path).unwrap_err();
        assert!(err.to_string().contains("out.json"), "{err}");
    }
}
