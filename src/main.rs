mod buffer;
mod camera;
mod capture;
mod cli;
mod config;
mod core;
mod domain;
mod error;
mod present;
mod render;
#[cfg(test)]
mod testing;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = cli::Cli::parse();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let code = runtime.block_on(core::app::run(cli));
    // Stdin reads run on a blocking thread that never returns on its own
    runtime.shutdown_background();
    code
}
