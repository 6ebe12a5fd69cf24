use std::io;

use clap::Parser;
use gw_core::app;
use gw_core::cli::Cli;
use gw_core::logging;

const EXIT_FAILURE: i32 = 1;
const EXIT_NOT_CONVERGED: i32 = 3;

fn execute(cli: &Cli) -> gw_core::Result<i32> {
    let mut config = cli.load_config()?;
    cli.apply_overrides(&mut config);

    let solution = app::run(&config, cli.output.as_deref(), io::stdout().lock())?;

    if cli.strict && !solution.converged {
        eprintln!(
            "error: {} did not converge within {} iterations",
            solution.algorithm, solution.iterations
        );
        return Ok(EXIT_NOT_CONVERGED);
    }
    Ok(0)
}

fn main() {
    // Usage errors exit with status 2 from inside clap
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let code = match execute(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}
