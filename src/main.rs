//! ReasonKit Media CLI
//!
//! Finds video files, streaming manifests and embedded players on web pages.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reasonkit_media::config::{ExtractorConfig, FetchConfig};
use reasonkit_media::extraction::{MediaExtractor, ResultSet};
use reasonkit_media::fetch::PageFetcher;
use reasonkit_media::mcp::{McpServer, ToolRegistry};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

/// ReasonKit Media
#[derive(Parser, Debug)]
#[command(name = "rk-media")]
#[command(author = "ReasonKit Team <team@reasonkit.sh>")]
#[command(version)]
#[command(about = "Find the media a web page references")]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a page and list its media as JSON
    Extract {
        /// Page URL
        url: String,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Extract from a saved page (stdin when no file is given)
    Scan {
        /// URL the page was loaded from
        #[arg(long)]
        url: String,

        /// Path to the saved page
        #[arg(long)]
        file: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Run the MCP stdio server
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = if args.verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let extractor = Arc::new(
        MediaExtractor::new(ExtractorConfig::from_env()?).context("failed to build extractor")?,
    );

    match args.command {
        Command::Extract { url, pretty } => {
            let fetcher = PageFetcher::new(FetchConfig::from_env()?)?;
            let mut result = match extractor.direct_link(&url) {
                Some(result) => result,
                None => {
                    let page = fetcher
                        .fetch(&url)
                        .await
                        .with_context(|| format!("failed to fetch {}", url))?;
                    extractor.extract(&page.body, &page.final_url)?
                }
            };
            result.suggest_user_agent(fetcher.user_agent());
            print_result(&result, pretty)?;
        }
        Command::Scan { url, file, pretty } => {
            let html = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("failed to read stdin")?;
                    buf
                }
            };
            let result = extractor.extract(&html, &url)?;
            print_result(&result, pretty)?;
        }
        Command::Serve => {
            tracing::info!("ReasonKit Media MCP server starting on stdio");
            let fetcher = PageFetcher::new(FetchConfig::from_env()?)?;
            let server = McpServer::new(ToolRegistry::new(extractor, fetcher));
            server.run().await?;
        }
    }

    Ok(())
}

fn print_result(result: &ResultSet, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{}", json);
    Ok(())
}
