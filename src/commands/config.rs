//! Command: print the effective settings.
use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::logging::Logger;

/// Print the merged and normalized settings as pretty JSON.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded or serialized.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let json = serde_json::to_string_pretty(&setup.settings).context("cannot serialize settings")?;
    println!("{json}");
    Ok(())
}
