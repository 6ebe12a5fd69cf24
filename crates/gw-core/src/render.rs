//! Plain-text tables for a solved grid world.
//!
//! `TableRenderer<W: Write>` writes everything the text output shows: the
//! utility grid, the policy grid, the per-sweep history frame and the
//! Q-value table. Wide or long history frames are elided with `...` the way
//! dataframe printers do.

use std::io::{self, Write};

use gw_model::{Action, Cell, World};

use crate::mdp::{GridMdp, Utilities};
use crate::solver::{Policy, Solution};
use crate::style::{format_signed, pad_left, Style, Tone};

/// Printed width of every value column.
const CELL_WIDTH: usize = 8;

/// Width reserved for an elided column.
const ELLIPSIS_WIDTH: usize = 5;

const ELLIPSIS: &str = "...";

/// Longer history frames show only their head and tail.
const HISTORY_MAX_ROWS: usize = 30;
const HISTORY_EDGE_ROWS: usize = 5;

pub struct TableRenderer<W: Write> {
    writer: W,
    style: Style,
    term_width: u16,
}

impl<W: Write> TableRenderer<W> {
    pub fn new(writer: W, style: Style) -> Self {
        let term_width = crossterm::terminal::size().map(|(w, _)| w).unwrap_or(80);
        Self {
            writer,
            style,
            term_width,
        }
    }

    pub fn new_with_width(writer: W, style: Style, width: u16) -> Self {
        Self {
            writer,
            style,
            term_width: width,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Everything the default text output shows, in order.
    pub fn emit_solution(
        &mut self,
        mdp: &GridMdp,
        solution: &Solution,
        show_history: bool,
        show_q_values: bool,
    ) -> io::Result<()> {
        self.emit_summary(mdp, solution)?;

        self.emit_title("Utilities")?;
        self.emit_utilities(mdp, &solution.utilities)?;

        self.emit_title("Policy")?;
        self.emit_policy(mdp, &solution.policy)?;

        if show_history {
            self.emit_title("History")?;
            self.emit_history(mdp, &solution.history)?;
        }

        if show_q_values {
            self.emit_title("Q-values")?;
            let q = crate::solver::q_values(mdp, &solution.utilities);
            self.emit_q_values(&q)?;
        }
        Ok(())
    }

    pub fn emit_summary(&mut self, mdp: &GridMdp, solution: &Solution) -> io::Result<()> {
        let p = mdp.params();
        let outcome = if solution.converged {
            format!("converged after {} iterations", solution.iterations)
        } else {
            format!(
                "stopped after {} iterations without converging",
                solution.iterations
            )
        };
        writeln!(self.writer, "{}: {outcome}", solution.algorithm)?;
        writeln!(
            self.writer,
            "gamma={} step_reward={} noise={} residual={:.2e}",
            p.gamma, p.step_reward, p.noise, solution.residual
        )
    }

    pub fn emit_title(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", self.style.paint(Tone::Header, title))
    }

    pub fn emit_utilities(&mut self, mdp: &GridMdp, utilities: &Utilities) -> io::Result<()> {
        let style = self.style;
        let world = mdp.world();
        let lines = grid_lines(style, world, |cell| {
            if world.is_obstacle(cell) {
                return style.paint(Tone::Muted, "####");
            }
            match world.terminal_reward(cell) {
                Some(reward) => {
                    let value = mdp.utility(cell, utilities).unwrap_or(reward);
                    style.paint(payoff_tone(reward), &format!("{value:.3}"))
                }
                None => format!("{:.3}", mdp.utility(cell, utilities).unwrap_or(0.0)),
            }
        });
        self.write_lines(&lines)
    }

    pub fn emit_policy(&mut self, mdp: &GridMdp, policy: &Policy) -> io::Result<()> {
        let style = self.style;
        let world = mdp.world();
        let lines = grid_lines(style, world, |cell| {
            if world.is_obstacle(cell) {
                return style.paint(Tone::Muted, "####");
            }
            match world.terminal_reward(cell) {
                Some(reward) => style.paint(payoff_tone(reward), &format_signed(reward, 2)),
                None => policy
                    .action(mdp, cell)
                    .map(|a| a.arrow().to_string())
                    .unwrap_or_default(),
            }
        });
        self.write_lines(&lines)
    }

    /// Iterations down, states across.
    pub fn emit_history(&mut self, mdp: &GridMdp, history: &[Utilities]) -> io::Result<()> {
        if history.is_empty() {
            return writeln!(self.writer, "(no history recorded)");
        }

        let states = mdp.states();
        let index_width = "iter".len().max((history.len() - 1).to_string().len());
        let columns = visible_columns(states.len(), index_width, self.term_width as usize);
        let rows = visible_rows(history.len());

        let mut header = format!("{:<index_width$}", "iter");
        for column in &columns {
            header.push_str(&match column {
                Some(j) => pad_left(
                    &self.style.paint(Tone::Header, &states[*j].to_string()),
                    CELL_WIDTH,
                ),
                None => pad_left(ELLIPSIS, ELLIPSIS_WIDTH),
            });
        }
        writeln!(self.writer, "{header}")?;

        for row in &rows {
            let mut line = match row {
                Some(i) => format!("{i:<index_width$}"),
                None => format!("{ELLIPSIS:<index_width$}"),
            };
            for column in &columns {
                let (text, width) = match (row, column) {
                    (Some(i), Some(j)) => (format!("{:.3}", history[*i].get(*j)), CELL_WIDTH),
                    (None, Some(_)) => (ELLIPSIS.to_string(), CELL_WIDTH),
                    (_, None) => (ELLIPSIS.to_string(), ELLIPSIS_WIDTH),
                };
                line.push_str(&pad_left(&text, width));
            }
            writeln!(self.writer, "{}", line.trim_end())?;
        }

        if columns.len() < states.len() || rows.len() < history.len() {
            writeln!(self.writer)?;
            writeln!(
                self.writer,
                "[{} rows x {} columns]",
                history.len(),
                states.len()
            )?;
        }
        Ok(())
    }

    /// One row per state; the best action is starred.
    pub fn emit_q_values(&mut self, q_values: &[(Cell, [f64; 4])]) -> io::Result<()> {
        let label_width = q_values
            .iter()
            .map(|(cell, _)| cell.to_string().len())
            .max()
            .unwrap_or(0)
            .max("state".len());

        let mut header = format!("{:<label_width$}", "state");
        for action in Action::ALL {
            header.push_str(&pad_left(action.name(), CELL_WIDTH));
        }
        writeln!(self.writer, "{}", self.style.paint(Tone::Header, &header))?;

        for (cell, q) in q_values {
            let best = best_index(q);
            let mut line = format!("{:<label_width$}", cell.to_string());
            for (i, value) in q.iter().enumerate() {
                let text = if i == best {
                    self.style.paint(Tone::Highlight, &format!("{value:.3}*"))
                } else {
                    format!("{value:.3} ")
                };
                line.push_str(&pad_left(&text, CELL_WIDTH));
            }
            writeln!(self.writer, "{}", line.trim_end())?;
        }
        Ok(())
    }

    fn write_lines(&mut self, lines: &[String]) -> io::Result<()> {
        for line in lines {
            writeln!(self.writer, "{line}")?;
        }
        Ok(())
    }
}

fn payoff_tone(reward: f64) -> Tone {
    if reward >= 0.0 {
        Tone::Gain
    } else {
        Tone::Loss
    }
}

/// First index of the maximum, so ties resolve like the greedy policy.
fn best_index(values: &[f64; 4]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Lay the world out top row first, with `x=` headers and `y=` labels.
fn grid_lines(style: Style, world: &World, cell_text: impl Fn(Cell) -> String) -> Vec<String> {
    let label_width = format!("y={}", world.rows).len();

    let mut header = " ".repeat(label_width);
    for x in 1..=world.cols {
        header.push_str(&pad_left(
            &style.paint(Tone::Header, &format!("x={x}")),
            CELL_WIDTH,
        ));
    }

    let mut lines = vec![header];
    for y in (1..=world.rows).rev() {
        let label = format!("{:<label_width$}", format!("y={y}"));
        let mut line = style.paint(Tone::Header, &label);
        for x in 1..=world.cols {
            line.push_str(&pad_left(&cell_text(Cell::new(x, y)), CELL_WIDTH));
        }
        lines.push(line);
    }
    lines
}

/// Column indices to print; `None` marks the elided middle.
fn visible_columns(count: usize, index_width: usize, term_width: usize) -> Vec<Option<usize>> {
    if index_width + count * CELL_WIDTH <= term_width || count <= 2 {
        return (0..count).map(Some).collect();
    }
    let available = term_width.saturating_sub(index_width + ELLIPSIS_WIDTH);
    let per_side = (available / (2 * CELL_WIDTH)).max(1).min((count - 1) / 2);
    elide(count, per_side)
}

fn visible_rows(count: usize) -> Vec<Option<usize>> {
    if count <= HISTORY_MAX_ROWS {
        return (0..count).map(Some).collect();
    }
    elide(count, HISTORY_EDGE_ROWS)
}

fn elide(count: usize, per_side: usize) -> Vec<Option<usize>> {
    (0..per_side)
        .map(Some)
        .chain(std::iter::once(None))
        .chain((count - per_side..count).map(Some))
        .collect()
}
