//! Build the MDP from a resolved config, solve it and print the result.

use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::config::{Config, OutputFormat};
use crate::error::Result;
use crate::mdp::GridMdp;
use crate::render::TableRenderer;
use crate::report::Report;
use crate::solver::{solve, Solution};
use crate::style::Style;

pub fn run<W: Write>(
    config: &Config,
    report_path: Option<&Path>,
    mut writer: W,
) -> Result<Solution> {
    let mdp = GridMdp::new(config.world.clone(), config.mdp)?;
    let options = config.solver_options();
    info!(
        algorithm = %config.solver.algorithm,
        states = mdp.states().len(),
        gamma = config.mdp.gamma,
        noise = config.mdp.noise,
        "solving"
    );

    let solution = solve(&mdp, config.solver.algorithm, &options)?;

    match config.output.format {
        OutputFormat::Text => {
            let style = Style::with_color(config.output.color);
            let mut renderer = TableRenderer::new(&mut writer, style);
            renderer.emit_solution(
                &mdp,
                &solution,
                config.output.history,
                config.output.q_values,
            )?;
        }
        OutputFormat::Json => {
            let report = Report::new(&mdp, &solution, config.output.q_values);
            writeln!(writer, "{}", report.to_json_pretty()?)?;
        }
    }
    writer.flush()?;

    if let Some(path) = report_path {
        Report::new(&mdp, &solution, config.output.q_values).write_to(path)?;
        info!(path = %path.display(), "wrote report");
    }

    Ok(solution)
}
