//! Organizer Engine
//!
//! Command-line front end for the sandboxed filesystem action engine.
//! Actions come in as JSON Lines; results go out the same way on stdout,
//! one line per action, in submission order.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use organizer::config::{default_config_path, Config};
use organizer::engine::Engine;
use organizer::intent::JsonLinesSource;
use schema::{Action, SessionMode};

/// Organizer Engine - sandboxed executor for structured file actions.
#[derive(Parser, Debug)]
#[command(name = "organizer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for the engine.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a session: execute actions from a JSON Lines stream
    Run {
        /// Sandbox root directory the session is confined to
        #[arg(long, short, value_name = "DIR")]
        root: PathBuf,

        /// Conflict handling mode
        #[arg(long, short, value_enum, default_value = "default")]
        mode: ModeArg,

        /// Action stream file, or "-" for stdin
        #[arg(long, short, default_value = "-", value_name = "FILE")]
        actions: String,
    },

    /// Preview a session: report what the actions would do, mutate nothing
    Preview {
        /// Sandbox root directory the session is confined to
        #[arg(long, short, value_name = "DIR")]
        root: PathBuf,

        /// Action stream file, or "-" for stdin
        #[arg(long, short, default_value = "-", value_name = "FILE")]
        actions: String,
    },

    /// Write a default configuration file
    InitConfig {
        /// Destination path (defaults to the per-user config location)
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

/// Conflict handling mode for a session.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// Auto-rename on destination conflicts
    Default,
    /// Refuse destination conflicts outright
    Strict,
    /// Describe actions without executing them
    Preview,
}

impl From<ModeArg> for SessionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Default => SessionMode::Default,
            ModeArg::Strict => SessionMode::Strict,
            ModeArg::Preview => SessionMode::PreviewOnly,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default()?
    };
    config.apply_env_overrides();
    config.validate()?;

    // Initialize tracing: stdout carries the result stream, so diagnostics
    // go to a rolling file under the log directory.
    std::fs::create_dir_all(&config.logging.log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&config.logging.log_dir, "organizer.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.log_level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    match cli.command {
        Commands::Run {
            root,
            mode,
            actions,
        } => run_session(&root, mode.into(), &actions, &config),
        Commands::Preview { root, actions } => {
            run_session(&root, SessionMode::PreviewOnly, &actions, &config)
        }
        Commands::InitConfig { output, force } => init_config(&config, output, force),
    }
}

/// Execute (or preview) an action stream and print one result per line.
fn run_session(
    root: &std::path::Path,
    mode: SessionMode,
    actions: &str,
    config: &Config,
) -> anyhow::Result<()> {
    let actions = read_actions(actions)?;
    let mut engine = Engine::new(root, mode, config)?;

    let mut failed = 0usize;
    for action in &actions {
        let result = engine.submit(action);
        if !result.success {
            failed += 1;
        }
        println!("{}", serde_json::to_string(&result)?);
    }

    let summary = engine.finish()?;
    eprintln!(
        "{} action(s): {} succeeded, {} failed",
        summary.actions, summary.succeeded, summary.failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Read the action stream from a file or stdin.
fn read_actions(source: &str) -> anyhow::Result<Vec<Action>> {
    let actions = if source == "-" {
        JsonLinesSource::new(io::stdin().lock()).collect_actions()?
    } else {
        let file = File::open(source)
            .map_err(|e| anyhow::anyhow!("Cannot open action file {source}: {e}"))?;
        JsonLinesSource::new(BufReader::new(file)).collect_actions()?
    };
    Ok(actions)
}

/// Write the default configuration to disk.
fn init_config(config: &Config, output: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = output.unwrap_or_else(default_config_path);
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }
    config.save(&path)?;
    println!("Config written to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_debug_assert() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_command_defaults() {
        let cli = Cli::try_parse_from(["organizer", "run", "--root", "/tmp/sandbox"]).unwrap();
        match cli.command {
            Commands::Run {
                root,
                mode,
                actions,
            } => {
                assert_eq!(root, PathBuf::from("/tmp/sandbox"));
                assert_eq!(mode, ModeArg::Default);
                assert_eq!(actions, "-");
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_run_strict_mode() {
        let cli = Cli::try_parse_from([
            "organizer",
            "run",
            "--root",
            "/tmp/sandbox",
            "--mode",
            "strict",
        ])
        .unwrap();
        match cli.command {
            Commands::Run { mode, .. } => assert_eq!(mode, ModeArg::Strict),
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_run_with_action_file() {
        let cli = Cli::try_parse_from([
            "organizer",
            "run",
            "-r",
            "/tmp/sandbox",
            "-a",
            "plan.jsonl",
        ])
        .unwrap();
        match cli.command {
            Commands::Run { actions, .. } => assert_eq!(actions, "plan.jsonl"),
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_run_requires_root() {
        let result = Cli::try_parse_from(["organizer", "run"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_preview_command() {
        let cli = Cli::try_parse_from(["organizer", "preview", "--root", "/tmp/sandbox"]).unwrap();
        match cli.command {
            Commands::Preview { root, actions } => {
                assert_eq!(root, PathBuf::from("/tmp/sandbox"));
                assert_eq!(actions, "-");
            }
            _ => panic!("Expected Preview command"),
        }
    }

    #[test]
    fn test_init_config_command() {
        let cli = Cli::try_parse_from(["organizer", "init-config"]).unwrap();
        match cli.command {
            Commands::InitConfig { output, force } => {
                assert!(output.is_none());
                assert!(!force);
            }
            _ => panic!("Expected InitConfig command"),
        }
    }

    #[test]
    fn test_init_config_with_output_and_force() {
        let cli = Cli::try_parse_from([
            "organizer",
            "init-config",
            "--output",
            "/tmp/config.toml",
            "--force",
        ])
        .unwrap();
        match cli.command {
            Commands::InitConfig { output, force } => {
                assert_eq!(output, Some(PathBuf::from("/tmp/config.toml")));
                assert!(force);
            }
            _ => panic!("Expected InitConfig command"),
        }
    }

    #[test]
    fn test_invalid_mode_fails() {
        let result = Cli::try_parse_from([
            "organizer",
            "run",
            "--root",
            "/tmp",
            "--mode",
            "overwrite",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "organizer",
            "--verbose",
            "--config",
            "/etc/organizer.toml",
            "run",
            "--root",
            "/tmp",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/organizer.toml")));
    }

    #[test]
    fn test_mode_conversion() {
        assert_eq!(SessionMode::from(ModeArg::Default), SessionMode::Default);
        assert_eq!(SessionMode::from(ModeArg::Strict), SessionMode::Strict);
        assert_eq!(
            SessionMode::from(ModeArg::Preview),
            SessionMode::PreviewOnly
        );
    }
}
