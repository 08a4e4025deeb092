//! datobridge CLI
//!
//! Loads CMS content for static site builds and keeps it fresh while serving.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for datobridge.
#[derive(Parser)]
#[command(
    name = "datobridge",
    version,
    about = "Bridge a headless CMS into static site builds"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "datobridge.toml")]
    config: std::path::PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Load all content once and write the snapshot
    Fetch {
        /// Snapshot path (defaults to output.snapshot)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
        /// Fetch draft content
        #[arg(long)]
        preview: bool,
    },
    /// Keep the snapshot in sync with the CMS until Ctrl+C
    Watch {
        /// Snapshot path (defaults to output.snapshot)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
    /// Validate configuration and credentials without network access
    Check {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
    /// Print SEO tags for a record
    Tags {
        /// Record id
        item_id: String,
        /// Also print favicon tags
        #[arg(long)]
        favicon: bool,
        /// Theme color for favicon tags (overrides output.theme_color)
        #[arg(long)]
        theme_color: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    datobridge::init_tracing(cli.verbose);

    match cli.command {
        Commands::Fetch { output, preview } => {
            datobridge::cmd::fetch::run(&cli.config, output.as_deref(), preview).await?;
        }
        Commands::Watch { output } => {
            datobridge::cmd::watch::run(&cli.config, output.as_deref()).await?;
        }
        Commands::Check { strict } => {
            datobridge::cmd::check::run(&cli.config, strict)?;
        }
        Commands::Tags {
            item_id,
            favicon,
            theme_color,
        } => {
            datobridge::cmd::tags::run(&cli.config, &item_id, favicon, theme_color.as_deref())
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_fetch_command_parsing() {
        let args = ["datobridge", "fetch", "--output", "out.json", "--preview"];
        let cli = Cli::parse_from(args);

        assert_eq!(cli.config, std::path::PathBuf::from("datobridge.toml"));
        assert_eq!(cli.verbose, 0);

        match cli.command {
            Commands::Fetch { output, preview } => {
                assert_eq!(output, Some(std::path::PathBuf::from("out.json")));
                assert!(preview);
            }
            _ => panic!("Expected Fetch command"),
        }
    }

    #[test]
    fn test_cli_watch_defaults() {
        let cli = Cli::parse_from(["datobridge", "watch"]);

        match cli.command {
            Commands::Watch { output } => assert!(output.is_none()),
            _ => panic!("Expected Watch command"),
        }
    }

    #[test]
    fn test_cli_check_strict() {
        let cli = Cli::parse_from(["datobridge", "-c", "site.toml", "check", "--strict"]);

        assert_eq!(cli.config, std::path::PathBuf::from("site.toml"));
        match cli.command {
            Commands::Check { strict } => assert!(strict),
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_tags() {
        let cli = Cli::parse_from([
            "datobridge",
            "-vv",
            "tags",
            "123",
            "--favicon",
            "--theme-color",
            "#112233",
        ]);

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Tags {
                item_id,
                favicon,
                theme_color,
            } => {
                assert_eq!(item_id, "123");
                assert!(favicon);
                assert_eq!(theme_color.as_deref(), Some("#112233"));
            }
            _ => panic!("Expected Tags command"),
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["datobridge"]).is_err());
    }
}
