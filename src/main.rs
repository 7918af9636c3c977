//! Main application entry point.
//!
//! Parses the command line, sets up logging, and hands off to either the
//! daemon ([`Lamplighter`]) or a one-shot command.

use anyhow::Result;

use lamplighter::Lamplighter;
use lamplighter::args::{self, CliAction, ParsedArgs};
use lamplighter::commands;
use lamplighter::common::constants::EXIT_FAILURE;
use lamplighter::config;
use lamplighter::logger::Log;
use lamplighter::{log_end, log_error, log_error_exit, log_version};

fn main() {
    if let Err(e) = run() {
        log_error_exit!("{e:#}");
        std::process::exit(EXIT_FAILURE);
    }
}

fn run() -> Result<()> {
    let parsed_args = ParsedArgs::from_env();

    match parsed_args.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::ShowCommandUsageDueToError {
            command,
            error_message,
        } => {
            log_version!();
            log_error!("{error_message}");
            commands::help::show_command_usage(&command);
            log_end!();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::HelpCommand { command } => {
            commands::help::run_help_command(command.as_deref())
        }
        CliAction::Run {
            debug_enabled,
            config_path,
            log_file,
        } => {
            config::set_config_path(config_path)?;
            // Keep the guard alive so the writer thread flushes on exit
            let _log_guard = match log_file {
                Some(path) => Some(Log::start_file_logging(path.display().to_string())?),
                None => None,
            };
            Lamplighter::new(debug_enabled).run()
        }
        CliAction::PreviewCommand {
            debug_enabled,
            config_path,
            count,
        } => {
            config::set_config_path(config_path)?;
            commands::preview::handle_preview_command(count, debug_enabled)
        }
        CliAction::TestCommand {
            debug_enabled,
            config_path,
            device,
            params,
        } => {
            config::set_config_path(config_path)?;
            commands::test::handle_test_command(&device, params, debug_enabled)
        }
    }
}
