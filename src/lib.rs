//! # Lamplighter Library
//!
//! Internal library for the lamplighter binary.
//!
//! This library exists to enable testing of the scheduling and transition
//! internals and to keep CLI dispatch (main.rs) apart from application logic.
//!
//! ## Architecture
//!
//! - **Entry Point**: [`Lamplighter`] loads configuration, probes devices and runs
//!   the daemon
//! - **Schedules**: `schedule` turns `@sunset -1h` or cron expressions into
//!   "next trigger" calculators; `geo` supplies sunrise and sunset
//! - **Devices**: `device` defines the capability boundary, the LIFX, Tasmota and
//!   Shelly drivers, and the flicker-free transition sequence
//! - **Dispatch**: `core` polls schedules and fires jobs on worker threads
//! - **HTTP**: `api` exposes per-device power and status routes
//! - **Configuration**: `config` for the TOML file and its validation
//! - **Infrastructure**: signal handling, logging, time sources and utilities

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod api;
pub mod args;
pub mod commands;
pub mod common;
pub mod config;
pub mod core;
pub mod device;
pub mod geo;
pub mod lamplighter;
pub mod schedule;
pub mod signals;
pub mod time_source;

pub use lamplighter::Lamplighter;
