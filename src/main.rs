mod commands;
mod domain;
mod services;
#[cfg(test)]
mod test_support;

use crate::commands::base_commands::{CliArgs, Commands};
use crate::commands::fetch_timeline_cmd::fetch_timeline_command;
use crate::commands::plot_timeline_cmd::plot_timeline_command;
use clap::{CommandFactory, Parser};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    let result = match args.command {
        cmd @ Commands::FetchTimeline { .. } => {
            fetch_timeline_command(cmd).map_err(|e| format!("Failed to fetch timeline: {e}"))
        }
        cmd @ Commands::PlotTimeline { .. } => {
            plot_timeline_command(cmd).map_err(|e| format!("Failed to plot timeline: {e}"))
        }
        Commands::Completions { shell } => {
            let mut command = CliArgs::command();
            let name = command.get_name().to_string();
            clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(message) = result {
        log::error!("{message}");
        std::process::exit(1);
    }
}
