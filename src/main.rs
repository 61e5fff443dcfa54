use clap::Parser;
use colored::*;

use gxcheck::cli::Cli;
use gxcheck::commands;
use gxcheck::config::Config;

fn main() {
    let cli = Cli::parse();

    // 설정 파일이 깨져 있어도 기본값으로 계속 진행
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    if let Err(e) = gxcheck::logging::init(cli.log_level(&config.log_level)) {
        eprintln!("{} {}", "warning:".yellow(), e);
    }

    if let Some(e) = config_error {
        tracing::warn!(error = %e, "using default configuration");
    }
    tracing::debug!(?cli, "parsed arguments");

    let status = commands::dispatch(&cli.command, &config);
    std::process::exit(status.code());
}
