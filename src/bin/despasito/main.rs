mod cli;
mod error;
mod logging;

use crate::cli::Cli;
use crate::error::Result;
use clap::Parser;
use despasito::input::{write_output, InputFile};
use std::time::Instant;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run() {
        error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;
    info!("despasito v{}", env!("CARGO_PKG_VERSION"));
    debug!("{cli:?}");

    let input = InputFile::from_json(&cli.input)?;
    let start = Instant::now();
    let output = evaluate(&input, cli.threads)?;
    info!("{} finished in {:.2?}", input.calculation.name(), start.elapsed());

    let path = cli.output.unwrap_or_else(|| input.output_path());
    write_output(&output, &path)?;
    info!("results written to {}", path.display());
    Ok(())
}

#[cfg(feature = "rayon")]
fn evaluate(input: &InputFile, threads: Option<usize>) -> Result<despasito::thermo::ThermoOutput> {
    use despasito_core::EosError;
    use despasito::thermo::par_thermo;
    use std::sync::Arc;

    let Some(threads) = threads else {
        return Ok(input.run()?);
    };
    info!("evaluating points on {threads} thread(s)");
    let thread_pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(EosError::from)?;
    let eos = Arc::new(input.equation_of_state()?);
    Ok(par_thermo(
        &eos,
        &input.calculation,
        &input.options,
        &thread_pool,
    )?)
}

#[cfg(not(feature = "rayon"))]
fn evaluate(input: &InputFile, threads: Option<usize>) -> Result<despasito::thermo::ThermoOutput> {
    if threads.is_some() {
        tracing::warn!("built without the `rayon` feature, points are evaluated serially");
    }
    Ok(input.run()?)
}
