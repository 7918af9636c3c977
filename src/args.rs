//! Command-line argument parsing.
//!
//! Global flags may appear anywhere on the line. The first positional argument
//! selects a subcommand; without one the daemon runs.

use std::path::PathBuf;

use crate::common::constants::DEFAULT_PREVIEW_COUNT;

/// What the process was asked to do.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the daemon
    Run {
        debug_enabled: bool,
        config_path: Option<PathBuf>,
        log_file: Option<PathBuf>,
    },
    /// Print upcoming trigger times without touching devices
    PreviewCommand {
        debug_enabled: bool,
        config_path: Option<PathBuf>,
        count: usize,
    },
    /// Run one transition now
    TestCommand {
        debug_enabled: bool,
        config_path: Option<PathBuf>,
        device: String,
        params: Vec<(String, String)>,
    },
    /// `help [COMMAND]`
    HelpCommand { command: Option<String> },

    ShowHelp,
    ShowVersion,
    ShowHelpDueToError,
    /// A subcommand was recognised but its arguments were not
    ShowCommandUsageDueToError {
        command: String,
        error_message: String,
    },
}

pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse arguments, the first of which is the program name.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut unknown_arg_found = false;
        let mut config_path: Option<PathBuf> = None;
        let mut log_file: Option<PathBuf> = None;
        let mut positionals: Vec<String> = Vec::new();

        let mut iter = args.into_iter().skip(1).map(|s| s.as_ref().to_string());
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-d" | "--debug" => debug_enabled = true,
                "-h" | "--help" => display_help = true,
                "-V" | "-v" | "--version" => display_version = true,
                "-c" | "--config" => match iter.next() {
                    Some(path) => config_path = Some(PathBuf::from(path)),
                    None => {
                        log_warning!("--config requires a file path");
                        unknown_arg_found = true;
                    }
                },
                "-l" | "--log" => match iter.next() {
                    Some(path) => log_file = Some(PathBuf::from(path)),
                    None => {
                        log_warning!("--log requires a file path");
                        unknown_arg_found = true;
                    }
                },
                flag if flag.starts_with('-') && flag.len() > 1 => {
                    log_warning!("Unknown argument: {flag}");
                    unknown_arg_found = true;
                }
                _ => positionals.push(arg),
            }
        }

        let action = if display_version {
            CliAction::ShowVersion
        } else if display_help {
            CliAction::ShowHelp
        } else if unknown_arg_found {
            CliAction::ShowHelpDueToError
        } else {
            Self::subcommand(debug_enabled, config_path, log_file, positionals)
        };

        ParsedArgs { action }
    }

    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }

    fn subcommand(
        debug_enabled: bool,
        config_path: Option<PathBuf>,
        log_file: Option<PathBuf>,
        positionals: Vec<String>,
    ) -> CliAction {
        let mut rest = positionals.into_iter();
        let Some(command) = rest.next() else {
            return CliAction::Run {
                debug_enabled,
                config_path,
                log_file,
            };
        };
        let rest: Vec<String> = rest.collect();

        match command.as_str() {
            "preview" | "p" => {
                if rest.len() > 1 {
                    return usage_error("preview", "too many arguments");
                }
                let count = match rest.first() {
                    None => DEFAULT_PREVIEW_COUNT,
                    Some(raw) => match raw.parse::<usize>() {
                        Ok(n) if n > 0 => n,
                        _ => {
                            return usage_error(
                                "preview",
                                &format!("COUNT must be a positive integer (got '{raw}')"),
                            );
                        }
                    },
                };
                CliAction::PreviewCommand {
                    debug_enabled,
                    config_path,
                    count,
                }
            }
            "test" | "t" => {
                let mut rest = rest.into_iter();
                let Some(device) = rest.next() else {
                    return usage_error("test", "missing DEVICE");
                };
                let mut params = Vec::new();
                for pair in rest {
                    match pair.split_once('=') {
                        Some((key, value)) if !key.is_empty() => {
                            params.push((key.to_string(), value.to_string()));
                        }
                        _ => {
                            return usage_error(
                                "test",
                                &format!("expected key=value, got '{pair}'"),
                            );
                        }
                    }
                }
                CliAction::TestCommand {
                    debug_enabled,
                    config_path,
                    device,
                    params,
                }
            }
            "help" | "h" => CliAction::HelpCommand {
                command: rest.into_iter().next(),
            },
            other => {
                log_warning!("Unknown command: {other}");
                CliAction::ShowHelpDueToError
            }
        }
    }
}

fn usage_error(command: &str, message: &str) -> CliAction {
    CliAction::ShowCommandUsageDueToError {
        command: command.to_string(),
        error_message: message.to_string(),
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays the top-level help.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("lamplighter [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <file>    Use a specific configuration file");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-l, --log <file>       Write output to a file instead of stdout");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("help, h [COMMAND]      Show detailed help for a command");
    log_indented!("preview, p [COUNT]     List upcoming trigger times for every job");
    log_indented!("test, t <device> k=v   Run one transition now");
    log_block_start!("Without a command the scheduler and HTTP control surface run");
    log_indented!("until SIGINT, SIGTERM or SIGHUP.");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_no_args() {
        let parsed = ParsedArgs::parse(vec!["lamplighter"]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                debug_enabled: false,
                config_path: None,
                log_file: None,
            }
        );
    }

    #[test]
    fn test_parse_daemon_flags() {
        let parsed = ParsedArgs::parse(vec![
            "lamplighter",
            "--config",
            "/etc/lamplighter.toml",
            "-d",
            "--log",
            "/tmp/lamp.log",
        ]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                debug_enabled: true,
                config_path: Some(PathBuf::from("/etc/lamplighter.toml")),
                log_file: Some(PathBuf::from("/tmp/lamp.log")),
            }
        );
    }

    #[test]
    fn test_missing_flag_value() {
        let parsed = ParsedArgs::parse(vec!["lamplighter", "--config"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(
            ParsedArgs::parse(vec!["lamplighter", "--help"]).action,
            CliAction::ShowHelp
        );
        assert_eq!(
            ParsedArgs::parse(vec!["lamplighter", "-V"]).action,
            CliAction::ShowVersion
        );
        // Version takes precedence
        assert_eq!(
            ParsedArgs::parse(vec!["lamplighter", "--help", "--version"]).action,
            CliAction::ShowVersion
        );
    }

    #[test]
    fn test_unknown_flag() {
        let parsed = ParsedArgs::parse(vec!["lamplighter", "--debug", "--frobnicate"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_unknown_command() {
        let parsed = ParsedArgs::parse(vec!["lamplighter", "dance"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_preview_default_and_count() {
        assert_eq!(
            ParsedArgs::parse(vec!["lamplighter", "preview"]).action,
            CliAction::PreviewCommand {
                debug_enabled: false,
                config_path: None,
                count: DEFAULT_PREVIEW_COUNT,
            }
        );
        assert_eq!(
            ParsedArgs::parse(vec!["lamplighter", "p", "10", "-d"]).action,
            CliAction::PreviewCommand {
                debug_enabled: true,
                config_path: None,
                count: 10,
            }
        );
    }

    #[test]
    fn test_preview_rejects_bad_count() {
        let parsed = ParsedArgs::parse(vec!["lamplighter", "preview", "zero"]);
        assert!(matches!(
            parsed.action,
            CliAction::ShowCommandUsageDueToError { ref command, .. } if command == "preview"
        ));
        let parsed = ParsedArgs::parse(vec!["lamplighter", "preview", "0"]);
        assert!(matches!(
            parsed.action,
            CliAction::ShowCommandUsageDueToError { .. }
        ));
    }

    #[test]
    fn test_test_subcommand() {
        let parsed = ParsedArgs::parse(vec![
            "lamplighter",
            "test",
            "desk",
            "brightness=80",
            "transition=5s",
        ]);
        assert_eq!(
            parsed.action,
            CliAction::TestCommand {
                debug_enabled: false,
                config_path: None,
                device: "desk".to_string(),
                params: vec![
                    ("brightness".to_string(), "80".to_string()),
                    ("transition".to_string(), "5s".to_string()),
                ],
            }
        );
    }

    #[test]
    fn test_test_subcommand_errors() {
        let parsed = ParsedArgs::parse(vec!["lamplighter", "test"]);
        assert!(matches!(
            parsed.action,
            CliAction::ShowCommandUsageDueToError { ref error_message, .. }
                if error_message == "missing DEVICE"
        ));

        let parsed = ParsedArgs::parse(vec!["lamplighter", "test", "desk", "bright"]);
        assert!(matches!(
            parsed.action,
            CliAction::ShowCommandUsageDueToError { .. }
        ));
    }

    #[test]
    fn test_help_subcommand() {
        assert_eq!(
            ParsedArgs::parse(vec!["lamplighter", "help", "test"]).action,
            CliAction::HelpCommand {
                command: Some("test".to_string())
            }
        );
    }
}
