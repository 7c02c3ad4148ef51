//! # CLI Module
//!
//! Command-line entry point shared by actionwire application binaries.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Load the configuration, initialize logging and the coroutine runtime,
//! build the dispatcher and serve it over HTTP until `SIGINT`/`SIGTERM`:
//!
//! ```bash
//! widgets-demo serve --config demos/widgets/config.yaml --addr 127.0.0.1:8080
//! ```
//!
//! Options:
//! - `--config <FILE>` - YAML configuration (`ACTIONWIRE_CONFIG`)
//! - `--addr <ADDR>` - listen address, overrides `server.addr` (`ACTIONWIRE_ADDR`)
//! - `--templates <DIR>` - template directory, overrides `templates.dir`
//!
//! ### `check`
//!
//! Build the dispatcher without serving. Fails on unknown components,
//! unregistered layouts and unreadable templates; otherwise prints the
//! mount table:
//!
//! ```bash
//! widgets-demo check --config demos/widgets/config.yaml
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use actionwire::cli::{run_cli, Cli};
//! use clap::Parser;
//!
//! run_cli(Cli::parse(), |builder| Ok(builder.mount("/widgets", widgets()?)))?;
//! ```

mod commands;


pub use commands::{run_cli, Cli, Commands};
