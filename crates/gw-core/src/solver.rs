//! Dynamic-programming solvers: value iteration and policy iteration.

use std::fmt;

use gw_model::{Action, Cell};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::mdp::GridMdp;
pub use crate::mdp::Utilities;

/// Improvement must beat the incumbent action by more than this to switch.
const IMPROVEMENT_MARGIN: f64 = 1e-12;

/// Policy evaluation runs to a tighter tolerance than the outer loop.
const EVALUATION_FACTOR: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("epsilon must be positive and finite (got {0})")]
    Epsilon(f64),

    #[error("max_iterations must be at least 1")]
    MaxIterations,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Value,
    Policy,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Value => f.write_str("value iteration"),
            Algorithm::Policy => f.write_str("policy iteration"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    pub epsilon: f64,
    pub max_iterations: usize,
    /// Keep a snapshot of the utilities after every sweep.
    pub record_history: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            epsilon: 1e-4,
            max_iterations: 1000,
            record_history: false,
        }
    }
}

impl SolverOptions {
    pub fn validate(&self) -> Result<(), SolverError> {
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(SolverError::Epsilon(self.epsilon));
        }
        if self.max_iterations == 0 {
            return Err(SolverError::MaxIterations);
        }
        Ok(())
    }
}

/// One action per state; `None` for terminals.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy(Vec<Option<Action>>);

impl Policy {
    pub fn get(&self, index: usize) -> Option<Action> {
        self.0[index]
    }

    pub fn action(&self, mdp: &GridMdp, cell: Cell) -> Option<Action> {
        mdp.index_of(cell).and_then(|i| self.0[i])
    }

    pub fn actions(&self) -> &[Option<Action>] {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct Solution {
    pub algorithm: Algorithm,
    pub utilities: Utilities,
    pub policy: Policy,
    /// Sweeps for value iteration, improvement rounds for policy iteration.
    pub iterations: usize,
    pub converged: bool,
    /// `max |T(U) - U|` for the returned utilities.
    pub residual: f64,
    /// Utilities before the first sweep and after each one, if recorded.
    pub history: Vec<Utilities>,
}

pub fn solve(
    mdp: &GridMdp,
    algorithm: Algorithm,
    options: &SolverOptions,
) -> Result<Solution, SolverError> {
    match algorithm {
        Algorithm::Value => value_iteration(mdp, options),
        Algorithm::Policy => policy_iteration(mdp, options),
    }
}

/// Stop threshold on the sweep delta that bounds the utility error by epsilon.
fn convergence_threshold(epsilon: f64, gamma: f64) -> f64 {
    if gamma > 0.0 && gamma < 1.0 {
        epsilon * (1.0 - gamma) / gamma
    } else {
        epsilon
    }
}

/// One synchronous Bellman optimality update.
pub fn bellman_update(mdp: &GridMdp, u: &Utilities) -> Utilities {
    let mut next = u.clone();
    for i in 0..mdp.states().len() {
        if mdp.is_terminal_index(i) {
            continue;
        }
        let best = Action::ALL
            .iter()
            .map(|&a| mdp.q_value_at(i, a, u))
            .fold(f64::NEG_INFINITY, f64::max);
        next.set(i, best);
    }
    next
}

pub fn bellman_residual(mdp: &GridMdp, u: &Utilities) -> f64 {
    bellman_update(mdp, u).max_delta(u)
}

pub fn value_iteration(mdp: &GridMdp, options: &SolverOptions) -> Result<Solution, SolverError> {
    options.validate()?;
    let threshold = convergence_threshold(options.epsilon, mdp.gamma());

    let mut u = mdp.initial_utilities();
    let mut history = Vec::new();
    if options.record_history {
        history.push(u.clone());
    }

    let mut iterations = 0;
    let mut converged = false;
    let mut diverged = false;
    while iterations < options.max_iterations {
        iterations += 1;
        let next = bellman_update(mdp, &u);
        let delta = next.max_delta(&u);
        u = next;
        if options.record_history {
            history.push(u.clone());
        }
        debug!(iteration = iterations, delta, "value iteration sweep");
        if !delta.is_finite() || !u.is_finite() {
            diverged = true;
            break;
        }
        if delta < threshold {
            converged = true;
            break;
        }
    }

    if converged {
        info!(iterations, "value iteration converged");
    } else if diverged {
        warn!(iterations, "value iteration diverged: utilities are no longer finite");
    } else {
        warn!(
            iterations,
            "value iteration stopped at the iteration cap without converging"
        );
    }

    let policy = extract_policy(mdp, &u);
    let residual = bellman_residual(mdp, &u);
    Ok(Solution {
        algorithm: Algorithm::Value,
        utilities: u,
        policy,
        iterations,
        converged,
        residual,
        history,
    })
}

/// Greedy policy with respect to `u`. Ties go to the earliest action in
/// [`Action::ALL`].
pub fn extract_policy(mdp: &GridMdp, u: &Utilities) -> Policy {
    let actions = (0..mdp.states().len())
        .map(|i| {
            if mdp.is_terminal_index(i) {
                return None;
            }
            let mut best = Action::ALL[0];
            let mut best_value = mdp.expected_utility_at(i, best, u);
            for &action in &Action::ALL[1..] {
                let value = mdp.expected_utility_at(i, action, u);
                if value > best_value {
                    best = action;
                    best_value = value;
                }
            }
            Some(best)
        })
        .collect();
    Policy(actions)
}

/// How a policy evaluation pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Evaluation {
    Settled(usize),
    Capped,
    /// Utilities overflowed to a non-finite value.
    Diverged(usize),
}

/// Iteratively evaluate `policy`, starting from `u`.
fn evaluate_policy(
    mdp: &GridMdp,
    policy: &Policy,
    u: &mut Utilities,
    threshold: f64,
    max_sweeps: usize,
) -> Evaluation {
    for sweep in 1..=max_sweeps {
        let mut next = u.clone();
        for i in 0..mdp.states().len() {
            if let Some(action) = policy.get(i) {
                next.set(i, mdp.q_value_at(i, action, u));
            }
        }
        let delta = next.max_delta(u);
        *u = next;
        if !delta.is_finite() || !u.is_finite() {
            return Evaluation::Diverged(sweep);
        }
        if delta < threshold {
            return Evaluation::Settled(sweep);
        }
    }
    Evaluation::Capped
}

pub fn policy_iteration(mdp: &GridMdp, options: &SolverOptions) -> Result<Solution, SolverError> {
    options.validate()?;
    let threshold = options.epsilon * EVALUATION_FACTOR;

    let mut policy = Policy(
        (0..mdp.states().len())
            .map(|i| (!mdp.is_terminal_index(i)).then_some(Action::Up))
            .collect(),
    );
    let mut u = mdp.initial_utilities();
    let mut history = Vec::new();
    if options.record_history {
        history.push(u.clone());
    }

    let mut iterations = 0;
    let mut converged = false;
    let mut diverged = false;
    while iterations < options.max_iterations {
        iterations += 1;
        let evaluation =
            evaluate_policy(mdp, &policy, &mut u, threshold, options.max_iterations);
        if options.record_history {
            history.push(u.clone());
        }
        let sweeps = match evaluation {
            Evaluation::Settled(n) | Evaluation::Diverged(n) => n,
            Evaluation::Capped => options.max_iterations,
        };
        if let Evaluation::Diverged(_) = evaluation {
            debug!(round = iterations, sweeps, "policy evaluation diverged");
            diverged = true;
            break;
        }

        let mut changed = 0;
        for i in 0..mdp.states().len() {
            let Some(current) = policy.get(i) else {
                continue;
            };
            let mut best = current;
            let mut best_value = mdp.expected_utility_at(i, current, &u);
            for action in Action::ALL {
                let value = mdp.expected_utility_at(i, action, &u);
                if value > best_value + IMPROVEMENT_MARGIN {
                    best = action;
                    best_value = value;
                }
            }
            if best != current {
                policy.0[i] = Some(best);
                changed += 1;
            }
        }

        debug!(round = iterations, sweeps, changed, "policy iteration round");
        if changed == 0 {
            converged = true;
            break;
        }
    }

    if converged {
        info!(iterations, "policy iteration converged");
    } else if diverged {
        warn!(iterations, "policy iteration diverged: utilities are no longer finite");
    } else {
        warn!(
            iterations,
            "policy iteration stopped at the iteration cap without a stable policy"
        );
    }

    let residual = bellman_residual(mdp, &u);
    Ok(Solution {
        algorithm: Algorithm::Policy,
        utilities: u,
        policy,
        iterations,
        converged,
        residual,
        history,
    })
}

/// Q-values for every non-terminal state, in [`Action::ALL`] order.
pub fn q_values(mdp: &GridMdp, u: &Utilities) -> Vec<(Cell, [f64; 4])> {
    mdp.states()
        .iter()
        .enumerate()
        .filter(|&(i, _)| !mdp.is_terminal_index(i))
        .map(|(i, &cell)| (cell, Action::ALL.map(|a| mdp.q_value_at(i, a, u))))
        .collect()
}
