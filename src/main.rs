use chat_export_md::logging::{self, Verbosity};
use chat_export_md::{ExportConfig, LoadError, Prefer, sequential};
use clap::Parser;
use eyre::{Context, Result, eyre};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Exit status when the export bundle cannot be found or decoded.
const EXIT_LOAD_FAILURE: u8 = 2;

/// Convert a ChatGPT data export into Markdown conversations.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing conversations.json and/or chat.html.
    /// Defaults to ./source-data if not set in config.
    #[arg(long, value_name = "DIR")]
    input: Option<PathBuf>,

    /// Destination root for conversation folders.
    /// Defaults to ./conversations if not set in config.
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Format to read first when both exist.
    #[arg(long, value_enum)]
    prefer: Option<Prefer>,

    /// Include tool-authored messages.
    #[arg(long)]
    include_tools: bool,

    /// Copy resolvable attachments (default).
    #[arg(long, overrides_with = "no_copy_attachments")]
    copy_attachments: bool,

    /// Do not copy attachments.
    #[arg(long, overrides_with = "copy_attachments")]
    no_copy_attachments: bool,

    /// Print planned writes without touching the filesystem.
    #[arg(long)]
    dry_run: bool,

    /// Path to a specific configuration file.
    /// Defaults to $XDG_CONFIG_HOME/chat-export-md/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log each conversation as it is written.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress the progress bar and run summary.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Deserialize, Default)]
struct FileConfig {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    prefer: Option<Prefer>,
    include_tools: Option<bool>,
    copy_attachments: Option<bool>,
}

fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = if let Some(p) = explicit_path {
        if !p.exists() {
            return Err(eyre!("Config file not found: {}", p.display()));
        }
        Some(p.to_path_buf())
    } else {
        dirs::config_dir()
            .map(|d| d.join("chat-export-md/config.toml"))
            .filter(|p| p.exists())
    };

    match path {
        None => Ok(FileConfig::default()),
        Some(p) => {
            let content = fs::read_to_string(&p)
                .wrap_err_with(|| format!("Failed to read config: {}", p.display()))?;
            toml::from_str(&content)
                .wrap_err_with(|| format!("Failed to parse config: {}", p.display()))
        }
    }
}

/// CLI > config file > built-in default.
fn resolve_config(cli: Cli, file_cfg: FileConfig) -> ExportConfig {
    let defaults = ExportConfig::default();

    let copy_attachments = if cli.no_copy_attachments {
        false
    } else if cli.copy_attachments {
        true
    } else {
        file_cfg
            .copy_attachments
            .unwrap_or(defaults.copy_attachments)
    };

    ExportConfig {
        input_dir: cli
            .input
            .or(file_cfg.input_dir)
            .unwrap_or(defaults.input_dir),
        output_dir: cli
            .output
            .or(file_cfg.output_dir)
            .unwrap_or(defaults.output_dir),
        prefer: cli.prefer.or(file_cfg.prefer).unwrap_or(defaults.prefer),
        include_tools: cli.include_tools || file_cfg.include_tools.unwrap_or(false),
        copy_attachments,
        dry_run: cli.dry_run,
        verbose: cli.verbose,
        quiet: cli.quiet,
    }
}

fn run(cli: Cli) -> Result<()> {
    let file_cfg = load_file_config(cli.config.as_deref())?;
    let config = resolve_config(cli, file_cfg);
    sequential::execute(&config)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(Verbosity::from_flags(cli.quiet, cli.verbose)) {
        eprintln!("Warning: logging unavailable: {:#}", e);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => match report.downcast_ref::<LoadError>() {
            Some(load_err) => {
                eprintln!("Error loading export: {}", load_err);
                ExitCode::from(EXIT_LOAD_FAILURE)
            }
            None => {
                eprintln!("Error: {:?}", report);
                ExitCode::FAILURE
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("chat-export-md").chain(args.iter().copied()))
    }

    #[test]
    fn defaults() {
        let config = resolve_config(parse(&[]), FileConfig::default());
        assert_eq!(config.input_dir, PathBuf::from("source-data"));
        assert_eq!(config.output_dir, PathBuf::from("conversations"));
        assert_eq!(config.prefer, Prefer::Json);
        assert!(!config.include_tools);
        assert!(config.copy_attachments);
        assert!(!config.dry_run);
    }

    #[test]
    fn cli_overrides_file_config() {
        let file_cfg: FileConfig = toml::from_str(
            r#"
            input_dir = "from-config"
            output_dir = "out-config"
            prefer = "html"
            copy_attachments = false
            "#,
        )
        .unwrap();
        let config = resolve_config(
            parse(&["--input", "from-cli", "--prefer", "json", "--copy-attachments"]),
            file_cfg,
        );
        assert_eq!(config.input_dir, PathBuf::from("from-cli"));
        assert_eq!(config.output_dir, PathBuf::from("out-config"));
        assert_eq!(config.prefer, Prefer::Json);
        assert!(config.copy_attachments);
    }

    #[test]
    fn copy_attachments_flags() {
        let off = resolve_config(parse(&["--no-copy-attachments"]), FileConfig::default());
        assert!(!off.copy_attachments);

        let last_wins = resolve_config(
            parse(&["--no-copy-attachments", "--copy-attachments"]),
            FileConfig::default(),
        );
        assert!(last_wins.copy_attachments);
    }

    #[test]
    fn include_tools_and_dry_run() {
        let config = resolve_config(
            parse(&["--include-tools", "--dry-run", "--prefer", "html"]),
            FileConfig::default(),
        );
        assert!(config.include_tools);
        assert!(config.dry_run);
        assert_eq!(config.prefer, Prefer::Html);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let err = load_file_config(Some(Path::new("/nonexistent/chat-export-md.toml")))
            .err()
            .unwrap();
        assert!(err.to_string().contains("Config file not found"));
    }
}
