use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use folio_core::config::JobConfig;
use folio_core::{BrochureRequest, FolioConfig};
use folio_pipeline::{init_logging, GenerationPipeline};
use folio_web::{brochure_filename, AppState};
use tracing::{info, Level};

#[derive(Debug, Clone, PartialEq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;

        for c in s.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if let Ok(num) = current_number.parse::<u64>() {
                match c {
                    's' => total_seconds += num,
                    'm' => total_seconds += num * 60,
                    'h' => total_seconds += num * 3600,
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                }
                current_number.clear();
                has_unit = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // A bare number means seconds
        if !current_number.is_empty() {
            match current_number.parse::<u64>() {
                Ok(num) => {
                    total_seconds += num;
                    has_unit = true;
                }
                Err(_) => return Err("Invalid number in duration".to_string()),
            }
        }

        if !has_unit {
            return Err("Duration must include a number".to_string());
        }
        if total_seconds == 0 {
            return Err("Duration must be positive".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Turn a company website into a PDF brochure", long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Generate one brochure and write it to disk
    Generate {
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
        /// Output path (defaults to <name>_brochure.pdf)
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        max_pages: Option<usize>,
        /// Backend: gemini (default), deepseek, openai or dummy
        #[arg(long)]
        model: Option<String>,
        /// Overall job budget, e.g. 90s, 5m, 1h15m
        #[arg(long)]
        job_timeout: Option<HumanDuration>,
    },
    /// Serve POST /generate-brochure
    Serve {
        #[arg(long, env = "FOLIO_ADDR", default_value = "0.0.0.0:8000")]
        addr: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(if cli.verbose { Level::DEBUG } else { Level::INFO });

    let mut config = FolioConfig::from_env().context("invalid FOLIO_* environment")?;

    match cli.command {
        Commands::Generate {
            name,
            url,
            out,
            max_pages,
            model,
            job_timeout,
        } => {
            if let Some(max_pages) = max_pages {
                config.fetch.max_pages = max_pages;
            }
            if let Some(model) = model {
                config.enrich.model = model;
            }
            if let Some(HumanDuration(total)) = job_timeout {
                config.job = JobConfig::with_total_budget(total);
            }

            let pipeline = GenerationPipeline::from_config(config)?;
            let document = match pipeline.generate(BrochureRequest::new(&name, &url)).await {
                Ok(document) => document,
                Err(failure) => bail!("{}", failure),
            };

            let out = out.unwrap_or_else(|| PathBuf::from(brochure_filename(&name)));
            tokio::fs::write(&out, &document.bytes)
                .await
                .with_context(|| format!("writing {}", out.display()))?;
            info!("💾 Saved {}", out.display());
            println!("{} ({} pages)", out.display(), document.page_count);
        }
        Commands::Serve { addr } => {
            let pipeline = GenerationPipeline::from_config(config)?;
            info!("🧠 Brochure backend: {}", pipeline.config().enrich.model);
            folio_web::serve(AppState::new(pipeline), &addr).await?;
        }
    }

    Ok(())
}
