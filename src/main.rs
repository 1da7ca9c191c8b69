//! dirsnap - snapshot a directory subtree into a sorted metadata tree.
//!
//! Usage:
//!   dirsnap [PATH]              Print a recursive snapshot
//!   dirsnap scan [PATH]         Snapshot with filtering and failure options
//!   dirsnap export [PATH]       Export a snapshot to JSON
//!   dirsnap --help              Show help

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use dirsnap_core::{EntryState, ScanConfig, Snapshot, TreeNode};
use dirsnap_scan::ScanEngine;

#[derive(Parser)]
#[command(
    name = "dirsnap",
    version,
    about = "Snapshot a directory subtree into a sorted metadata tree",
    long_about = "dirsnap lists a directory tree into an in-memory snapshot whose \
                  siblings are ordered byte-wise by path.\n\n\
                  Run `dirsnap [PATH]` for a quick recursive listing, or use \
                  subcommands for filtering and export."
)]
struct Cli {
    /// Path to snapshot (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Snapshot a directory and print the tree
    Scan {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        options: ScanArgs,

        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<u32>,
    },

    /// Export a snapshot to JSON
    Export {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        options: ScanArgs,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Flags shared by every scanning subcommand.
#[derive(Args)]
struct ScanArgs {
    /// Load base configuration from a JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only list the root directory
    #[arg(long)]
    flat: bool,

    /// Maximum depth to list (at least 1)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_depth: Option<u32>,

    /// Skip entries whose name starts with `.`
    #[arg(long)]
    no_hidden: bool,

    /// Glob pattern of entry names to skip (repeatable)
    #[arg(short, long = "ignore")]
    ignore: Vec<String>,

    /// Keep scanning when a subdirectory cannot be read
    #[arg(short, long)]
    keep_going: bool,

    /// Refuse to scan a root that is a symbolic link
    #[arg(long)]
    no_follow_root: bool,
}

impl ScanArgs {
    /// Build the scan config: file first, then command-line overrides.
    fn to_config(&self, path: &Path) -> Result<ScanConfig> {
        let mut config = match &self.config {
            Some(file) => {
                let raw = std::fs::read_to_string(file)
                    .with_context(|| format!("Cannot read config {}", file.display()))?;
                serde_json::from_str::<ScanConfig>(&raw)
                    .with_context(|| format!("Invalid config {}", file.display()))?
            }
            None => ScanConfig::new(path),
        };

        config.root = path.to_path_buf();
        if self.flat {
            config.recursive = false;
        }
        if self.max_depth.is_some() {
            config.max_depth = self.max_depth;
        }
        if self.no_hidden {
            config.include_hidden = false;
        }
        if self.keep_going {
            config.abort_on_child_error = false;
        }
        if self.no_follow_root {
            config.follow_root_symlink = false;
        }
        config.ignore_patterns.extend(self.ignore.iter().cloned());

        debug!(?config, "resolved scan configuration");
        Ok(config)
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Command::Scan {
            path,
            options,
            depth,
        }) => {
            let config = options.to_config(&path)?;
            run_scan(&config, depth)?;
        }
        Some(Command::Export {
            path,
            options,
            output,
        }) => {
            let config = options.to_config(&path)?;
            run_export(&config, output)?;
        }
        None => {
            run_scan(&ScanConfig::new(&cli.path), None)?;
        }
    }

    Ok(())
}

/// Install the log subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .compact()
        .init();
}

fn take_snapshot(config: &ScanConfig) -> Result<Snapshot> {
    eprintln!("Scanning {}...", config.root.display());
    ScanEngine::new().snapshot(config).context("Scan failed")
}

/// Snapshot a directory and print the tree.
fn run_scan(config: &ScanConfig, max_depth: Option<u32>) -> Result<()> {
    let snapshot = take_snapshot(config)?;
    let stats = &snapshot.stats;

    println!();
    println!("{}", "─".repeat(60));
    println!(
        " {} - {}",
        snapshot.root_path().display(),
        format_size(stats.total_size)
    );
    println!(
        " {} files, {} directories, {} symlinks",
        stats.total_files, stats.total_dirs, stats.total_symlinks
    );
    if stats.total_missing > 0 {
        println!(" {} entries vanished during the scan", stats.total_missing);
    }
    println!(" Scanned in {:.2}s", snapshot.scan_duration.as_secs_f64());
    println!("{}", "─".repeat(60));
    println!();

    print_node(&snapshot.root, 0, max_depth.unwrap_or(u32::MAX));

    if snapshot.has_warnings() {
        println!();
        println!("{} warning(s) during scan", snapshot.warnings.len());
        for warning in &snapshot.warnings {
            println!("  {}", warning.message);
        }
    }

    Ok(())
}

/// Export a snapshot to JSON.
fn run_export(config: &ScanConfig, output: Option<PathBuf>) -> Result<()> {
    let snapshot = take_snapshot(config)?;
    let json = serde_json::to_string_pretty(&snapshot)?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)
                .with_context(|| format!("Cannot write {}", output_path.display()))?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

/// Print a node and its children.
fn print_node(node: &TreeNode, depth: u32, max_depth: u32) {
    let indent = "  ".repeat(depth as usize);
    let info = node.info();

    let name = if depth == 0 {
        info.path().display().to_string()
    } else {
        info.name().to_string()
    };

    let detail = match info.state() {
        EntryState::Missing => "(vanished)".to_string(),
        EntryState::Existing {
            is_dir: true,
            is_symlink: true,
            ..
        } => "(symlink, not followed)".to_string(),
        EntryState::Existing { is_dir: true, .. } => String::new(),
        EntryState::Existing { size, modified, .. } => format!(
            "{:>10}  {}",
            format_size(size.unwrap_or(0)),
            modified.map(format_time).unwrap_or_default()
        ),
    };

    let marker = if info.is_dir() { "/" } else { "" };
    let link = if info.is_symlink() && !info.is_dir() { "@" } else { "" };

    println!(
        "{}{}{:<40} {}",
        indent,
        if info.is_dir() { "▼ " } else { "  " },
        truncate(&format!("{name}{marker}{link}"), 40),
        detail
    );

    if depth < max_depth {
        for child in node.children() {
            print_node(child, depth + 1, max_depth);
        }
    } else if !node.is_leaf() {
        let indent = "  ".repeat((depth + 1) as usize);
        println!("{}  ... {} more", indent, node.descendant_count());
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Format a modification time in local time.
fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Truncate a string to max length.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 1).collect();
        format!("{head}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn test_scan_args_override_config() {
        let args = ScanArgs {
            config: None,
            flat: true,
            max_depth: Some(2),
            no_hidden: true,
            ignore: vec!["*.tmp".to_string()],
            keep_going: true,
            no_follow_root: false,
        };
        let config = args.to_config(Path::new("/srv")).unwrap();

        assert_eq!(config.root, PathBuf::from("/srv"));
        assert!(!config.recursive);
        assert_eq!(config.max_depth, Some(2));
        assert!(!config.include_hidden);
        assert!(!config.abort_on_child_error);
        assert!(config.follow_root_symlink);
        assert_eq!(config.ignore_patterns, vec!["*.tmp".to_string()]);
    }

    #[test]
    fn test_zero_max_depth_flag_is_rejected() {
        let result = Cli::try_parse_from(["dirsnap", "scan", "/srv", "--max-depth", "0"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from(["dirsnap", "scan", "/srv", "--max-depth", "1"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Scan { ref options, .. }) if options.max_depth == Some(1)
        ));
    }
}
