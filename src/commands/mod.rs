//! One-shot command handlers.
//!
//! Each command lives in its own submodule and exposes a `handle_*` entry point
//! plus a `display_help` used by `lamplighter help <command>`.

pub mod help;
pub mod preview;
pub mod test;
