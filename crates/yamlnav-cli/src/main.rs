use clap::Parser;
use color_eyre::eyre;
use yamlnav_cli::Cli;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    yamlnav::logging::setup_logging(cli.global.log_level, cli.global.log_format, cli.global.color)?;
    yamlnav_cli::run(cli)?;
    Ok(())
}
