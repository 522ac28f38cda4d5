use std::process::ExitCode;

use clap::Parser;

use stockroute_cli::Cli;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    stockroute_observability::init_with(cli.log_format);

    let output = stockroute_cli::run(&cli)?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    if output.report.is_aborted() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
