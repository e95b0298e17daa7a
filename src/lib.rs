//! Convention-over-configuration build tasks for web projects laid out in
//! the standard source directory layout (`src/main/{html,less,scss,css,js,
//! es6,fonts,static,data}` building into `dist/`).
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: merge user options over defaults into [`config::EffectiveSettings`]
//! - **[`pipeline`]** and **[`filters`]**: file records flowing from source
//!   globs through ordered transforms into a destination directory
//! - **[`bundle`]**: style bundles concatenated from LESS, SASS and CSS inputs
//! - **[`tasks`]**: named, dependency-ordered units of work wired to pipelines
//! - **[`watch`]** and **[`server`]**: rebuild on change, serve the dist tree
//! - **[`commands`]**: top-level subcommand orchestration (`run`, `list`, `config`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod bundle;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod filters;
pub mod logging;
pub mod path;
pub mod pipeline;
pub mod server;
pub mod tasks;
pub mod watch;
