//! Stochastic transition model over a grid world.
//!
//! An attempted move succeeds with probability `1 - noise`; the remaining
//! mass is split evenly between the two perpendicular directions. Moves that
//! would leave the grid or enter an obstacle leave the agent where it is.
//! Terminal cells are absorbing and have no outgoing transitions.

use std::collections::HashMap;

use gw_model::{Action, Cell, World, WorldError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MdpError {
    #[error("invalid world: {0}")]
    World(#[from] WorldError),

    #[error("gamma must be within [0, 1] (got {0})")]
    Gamma(f64),

    #[error("noise must be within [0, 1] (got {0})")]
    Noise(f64),

    #[error("step reward must be finite (got {0})")]
    StepReward(f64),
}

/// Discounting, per-step reward and slip probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MdpParams {
    pub gamma: f64,
    /// Reward received in every non-terminal state.
    pub step_reward: f64,
    /// Probability of slipping sideways instead of moving as intended.
    pub noise: f64,
}

impl Default for MdpParams {
    fn default() -> Self {
        Self {
            gamma: 0.9,
            step_reward: -0.04,
            noise: 0.2,
        }
    }
}

impl MdpParams {
    pub fn validate(&self) -> Result<(), MdpError> {
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(MdpError::Gamma(self.gamma));
        }
        if !(0.0..=1.0).contains(&self.noise) {
            return Err(MdpError::Noise(self.noise));
        }
        if !self.step_reward.is_finite() {
            return Err(MdpError::StepReward(self.step_reward));
        }
        Ok(())
    }
}

/// Utility estimates, one per state in [`GridMdp::states`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct Utilities(Vec<f64>);

impl Utilities {
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, index: usize) -> f64 {
        self.0[index]
    }

    pub(crate) fn set(&mut self, index: usize, value: f64) {
        self.0[index] = value;
    }

    /// Largest absolute per-state difference. NaN if any difference is NaN.
    pub fn max_delta(&self, other: &Utilities) -> f64 {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, |acc: f64, d| {
                if acc.is_nan() || d.is_nan() {
                    f64::NAN
                } else {
                    acc.max(d)
                }
            })
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

type Outcomes = Vec<(usize, f64)>;

/// A validated world plus parameters, with the transition table precomputed.
#[derive(Debug, Clone)]
pub struct GridMdp {
    world: World,
    params: MdpParams,
    states: Vec<Cell>,
    index: HashMap<Cell, usize>,
    rewards: Vec<f64>,
    terminal: Vec<bool>,
    /// `table[state][action]`, empty for terminals.
    table: Vec<[Outcomes; 4]>,
}

impl GridMdp {
    pub fn new(world: World, params: MdpParams) -> Result<Self, MdpError> {
        world.validate()?;
        params.validate()?;

        let states = world.states();
        let index: HashMap<Cell, usize> =
            states.iter().enumerate().map(|(i, &c)| (c, i)).collect();

        let terminal: Vec<bool> = states.iter().map(|&c| world.is_terminal(c)).collect();
        let rewards = states
            .iter()
            .map(|&c| world.terminal_reward(c).unwrap_or(params.step_reward))
            .collect();

        let table = states
            .iter()
            .zip(&terminal)
            .map(|(&cell, &is_terminal)| {
                Action::ALL.map(|action| {
                    if is_terminal {
                        Vec::new()
                    } else {
                        outcomes(&world, &index, params.noise, cell, action)
                    }
                })
            })
            .collect();

        Ok(Self {
            world,
            params,
            states,
            index,
            rewards,
            terminal,
            table,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn params(&self) -> &MdpParams {
        &self.params
    }

    pub fn gamma(&self) -> f64 {
        self.params.gamma
    }

    pub fn states(&self) -> &[Cell] {
        &self.states
    }

    pub fn index_of(&self, cell: Cell) -> Option<usize> {
        self.index.get(&cell).copied()
    }

    pub fn is_terminal_index(&self, index: usize) -> bool {
        self.terminal[index]
    }

    pub fn reward_at(&self, index: usize) -> f64 {
        self.rewards[index]
    }

    /// Reward for occupying `cell`; `None` for blocked or out-of-bounds cells.
    pub fn reward(&self, cell: Cell) -> Option<f64> {
        self.index_of(cell).map(|i| self.rewards[i])
    }

    /// Zero for non-terminals, the payoff for terminals.
    pub fn initial_utilities(&self) -> Utilities {
        Utilities(
            self.terminal
                .iter()
                .zip(&self.rewards)
                .map(|(&t, &r)| if t { r } else { 0.0 })
                .collect(),
        )
    }

    /// Successor distribution for taking `action` in `cell`.
    pub fn transitions(&self, cell: Cell, action: Action) -> Vec<(Cell, f64)> {
        match self.index_of(cell) {
            Some(i) => self.table[i][action.index()]
                .iter()
                .map(|&(j, p)| (self.states[j], p))
                .collect(),
            None => Vec::new(),
        }
    }

    /// `Σ P(s'|s,a)·U(s')` by state index.
    pub fn expected_utility_at(&self, index: usize, action: Action, u: &Utilities) -> f64 {
        self.table[index][action.index()]
            .iter()
            .map(|&(j, p)| p * u.get(j))
            .sum()
    }

    pub fn expected_utility(&self, cell: Cell, action: Action, u: &Utilities) -> Option<f64> {
        self.index_of(cell)
            .map(|i| self.expected_utility_at(i, action, u))
    }

    /// `R(s) + γ·Σ P(s'|s,a)·U(s')`; terminals yield just their payoff.
    pub fn q_value_at(&self, index: usize, action: Action, u: &Utilities) -> f64 {
        if self.terminal[index] {
            return self.reward_at(index);
        }
        self.reward_at(index) + self.params.gamma * self.expected_utility_at(index, action, u)
    }

    pub fn q_value(&self, cell: Cell, action: Action, u: &Utilities) -> Option<f64> {
        self.index_of(cell).map(|i| self.q_value_at(i, action, u))
    }

    /// Utility of `cell` under `u`, if it is a state.
    pub fn utility(&self, cell: Cell, u: &Utilities) -> Option<f64> {
        self.index_of(cell).map(|i| u.get(i))
    }
}

fn outcomes(
    world: &World,
    index: &HashMap<Cell, usize>,
    noise: f64,
    cell: Cell,
    action: Action,
) -> Outcomes {
    let [left, right] = action.perpendicular();
    let moves = [
        (action, 1.0 - noise),
        (left, noise / 2.0),
        (right, noise / 2.0),
    ];

    let mut result: Outcomes = Vec::with_capacity(3);
    for (direction, p) in moves {
        if p <= 0.0 {
            continue;
        }
        let target = cell
            .step(direction)
            .filter(|&c| world.is_open(c))
            .unwrap_or(cell);
        let j = index[&target];
        match result.iter_mut().find(|(k, _)| *k == j) {
            Some((_, acc)) => *acc += p,
            None => result.push((j, p)),
        }
    }
    result
}
