//! Command-line arguments. Flags override the config file, which overrides
//! the built-in defaults.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::{Config, ConfigError, OutputFormat};
use crate::solver::Algorithm;

#[derive(Debug, Parser)]
#[command(
    name = "gridworld",
    version,
    about = "Solve a stochastic grid world with value or policy iteration"
)]
pub struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/gridworld/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Solver to run
    #[arg(long, value_enum)]
    pub algorithm: Option<Algorithm>,

    /// Discount factor in [0, 1]
    #[arg(long)]
    pub gamma: Option<f64>,

    /// Reward for every non-terminal step
    #[arg(long, allow_negative_numbers = true)]
    pub step_reward: Option<f64>,

    /// Probability of slipping sideways
    #[arg(long)]
    pub noise: Option<f64>,

    /// Maximum error in the returned utilities
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Iteration cap
    #[arg(long, value_name = "N")]
    pub max_iterations: Option<usize>,

    /// Print utilities after every sweep
    #[arg(long)]
    pub history: bool,

    /// Print the Q-value table
    #[arg(long)]
    pub q_values: bool,

    /// Output format on stdout
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Also write the JSON report to this file
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,

    /// Exit with status 3 if the solver hits the iteration cap
    #[arg(long)]
    pub strict: bool,

    /// More diagnostics on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// The explicit `--config` file, or the per-user one if present.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        match &self.config {
            Some(path) => Config::load(path),
            None => Ok(Config::load_or_default()),
        }
    }

    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(algorithm) = self.algorithm {
            config.solver.algorithm = algorithm;
        }
        if let Some(gamma) = self.gamma {
            config.mdp.gamma = gamma;
        }
        if let Some(step_reward) = self.step_reward {
            config.mdp.step_reward = step_reward;
        }
        if let Some(noise) = self.noise {
            config.mdp.noise = noise;
        }
        if let Some(epsilon) = self.epsilon {
            config.solver.epsilon = epsilon;
        }
        if let Some(max_iterations) = self.max_iterations {
            config.solver.max_iterations = max_iterations;
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        // Switches only ever turn things on (or colour off).
        config.output.history |= self.history;
        config.output.q_values |= self.q_values;
        if self.no_color {
            config.output.color = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("gridworld").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn no_args_keeps_config() {
        let cli = parse(&[]);
        let mut cfg = Config::default();
        cli.apply_overrides(&mut cfg);
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn flags_override_config() {
        let cli = parse(&[
            "--algorithm",
            "policy",
            "--gamma",
            "0.5",
            "--step-reward",
            "-0.1",
            "--noise",
            "0",
            "--epsilon",
            "0.01",
            "--max-iterations",
            "7",
            "--format",
            "json",
            "--history",
            "--q-values",
            "--no-color",
        ]);
        let mut cfg = Config::default();
        cli.apply_overrides(&mut cfg);
        assert_eq!(cfg.solver.algorithm, Algorithm::Policy);
        assert_eq!(cfg.mdp.gamma, 0.5);
        assert_eq!(cfg.mdp.step_reward, -0.1);
        assert_eq!(cfg.mdp.noise, 0.0);
        assert_eq!(cfg.solver.epsilon, 0.01);
        assert_eq!(cfg.solver.max_iterations, 7);
        assert_eq!(cfg.output.format, OutputFormat::Json);
        assert!(cfg.output.history);
        assert!(cfg.output.q_values);
        assert!(!cfg.output.color);
    }

    #[test]
    fn switches_do_not_clear_config() {
        let cli = parse(&[]);
        let mut cfg = Config::default();
        cfg.output.history = true;
        cli.apply_overrides(&mut cfg);
        assert!(cfg.output.history);
    }

    #[test]
    fn verbose_counts() {
        assert_eq!(parse(&["-vv"]).verbose, 2);
        assert_eq!(parse(&[]).verbose, 0);
    }

    #[test]
    fn rejects_unknown_algorithm() {
        let result = Cli::try_parse_from(["gridworld", "--algorithm", "sarsa"]);
        assert!(result.is_err());
    }

    #[test]
    fn explicit_missing_config_is_error() {
        let cli = parse(&["--config", "/nonexistent/gridworld.toml"]);
        assert!(cli.load_config().is_err());
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
