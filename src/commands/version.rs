//! Command: print version information.

/// Version string: `GSDL_VERSION` at build time (a `git describe`), else the
/// package version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("GSDL_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the gsdl version to stdout.
pub fn run() {
    println!("gsdl {}", version());
}
