use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

/// Default settings file name, looked up in the project root.
pub const CONFIG_FILE: &str = "gsdl.toml";

/// Top-level CLI entry point for gsdl.
#[derive(Parser, Debug)]
#[command(
    name = "gsdl",
    about = "Build tasks for projects using the standard source directory layout",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Preview what would be written without touching the dist tree
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Project root (defaults to the current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Settings file (defaults to <root>/gsdl.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable parallel execution of tasks and files (parallel is enabled by default)
    #[arg(long = "no-parallel", global = true, action = clap::ArgAction::SetFalse)]
    pub parallel: bool,
}

impl GlobalOpts {
    /// Project root: `--root`, else the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn resolve_root(&self) -> std::io::Result<PathBuf> {
        let root = match &self.root {
            Some(root) => root.clone(),
            None => std::env::current_dir()?,
        };
        Ok(dunce::canonicalize(&root).unwrap_or(root))
    }

    /// Settings file: `--config` (relative to `root`), else `root/gsdl.toml`.
    #[must_use]
    pub fn config_path(&self, root: &Path) -> PathBuf {
        self.config
            .as_ref()
            .map_or_else(|| root.join(CONFIG_FILE), |c| root.join(c))
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run tasks and their dependencies
    Run(RunOpts),
    /// List every task with its dependencies
    List,
    /// Print the effective settings as JSON
    Config,
    /// Print version information
    Version,
}

/// Options for the `run` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RunOpts {
    /// Tasks to run
    #[arg(default_value = "default")]
    pub tasks: Vec<String>,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_defaults_to_default_task() {
        let cli = Cli::parse_from(["gsdl", "run"]);
        assert!(matches!(&cli.command, Command::Run(_)), "expected run");
        if let Command::Run(opts) = cli.command {
            assert_eq!(opts.tasks, vec!["default"]);
        }
    }

    #[test]
    fn run_takes_several_tasks() {
        let cli = Cli::parse_from(["gsdl", "run", "clean", "dist"]);
        assert!(matches!(&cli.command, Command::Run(_)), "expected run");
        if let Command::Run(opts) = cli.command {
            assert_eq!(opts.tasks, vec!["clean", "dist"]);
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["gsdl", "run", "-d", "-v", "--no-parallel"]);
        assert!(cli.global.dry_run);
        assert!(cli.verbose);
        assert!(!cli.global.parallel);
    }

    #[test]
    fn parallel_is_enabled_by_default() {
        let cli = Cli::parse_from(["gsdl", "list"]);
        assert!(cli.global.parallel);
        assert!(matches!(cli.command, Command::List));
    }

    #[test]
    fn config_path_defaults_to_root_file() {
        let cli = Cli::parse_from(["gsdl", "config"]);
        assert_eq!(
            cli.global.config_path(Path::new("/site")),
            PathBuf::from("/site/gsdl.toml")
        );
    }

    #[test]
    fn config_path_is_relative_to_root() {
        let cli = Cli::parse_from(["gsdl", "--config", "conf/build.toml", "config"]);
        assert_eq!(
            cli.global.config_path(Path::new("/site")),
            PathBuf::from("/site/conf/build.toml")
        );
        let abs = Cli::parse_from(["gsdl", "--config", "/etc/gsdl.toml", "config"]);
        assert_eq!(
            abs.global.config_path(Path::new("/site")),
            PathBuf::from("/etc/gsdl.toml")
        );
    }

    #[test]
    fn root_override() {
        let cli = Cli::parse_from(["gsdl", "--root", "/tmp/site", "version"]);
        assert_eq!(cli.global.root, Some(PathBuf::from("/tmp/site")));
        assert!(matches!(cli.command, Command::Version));
    }
}
