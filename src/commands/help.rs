//! Help command: general help or help for one command.

use anyhow::Result;

/// Show brief usage for a command (used for error messages)
pub fn show_command_usage(command: &str) {
    match command {
        "preview" | "p" => log_block_start!("Usage: lamplighter preview [COUNT]"),
        "test" | "t" => log_block_start!("Usage: lamplighter test <device> key=value [...]"),
        _ => log_block_start!("Usage: lamplighter [OPTIONS] [COMMAND]"),
    }
}

pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => crate::args::display_help(),
        Some("preview") | Some("p") => super::preview::display_help(),
        Some("test") | Some("t") => super::test::display_help(),
        Some("help") | Some("h") => display_help_help(),
        Some(unknown) => {
            log_warning!("Unknown command: {unknown}");
            crate::args::display_help();
        }
    }
    Ok(())
}

fn display_help_help() {
    log_version!();
    log_block_start!("help - Display help information");
    log_block_start!("Usage: lamplighter help [COMMAND]");
    log_block_start!("Arguments:");
    log_indented!("COMMAND  Optional command to get help for");
    log_indented!("         If omitted, shows general help");
    log_end!();
}
