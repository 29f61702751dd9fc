use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use citeharvest_core::config_file::{self, ConfigFile};
use citeharvest_core::{Config, ReferenceExtractionResult};
use citeharvest_ingest::{
    ContentExtraction, DocumentAcquirer, ReferenceExtractionOrchestrator, clean_source,
};
use citeharvest_parsing::{ParsingConfigBuilder, PatternReferenceParser};
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod output;

use output::ColorMode;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const DEFAULT_LOG_LEVEL: &str = "warn";

/// Citation harvester - Extract bibliography references from papers and web pages
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log level: trace, debug, info, warn or error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write logs to daily files in this directory instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract references from a PDF (path or URL) or from text
    Extract {
        /// PDF path, PDF URL, or the document text itself
        source: String,

        /// Read already-extracted document text from this file
        #[arg(long)]
        content_file: Option<PathBuf>,

        /// Acquire the source's text first and parse that
        #[arg(long, conflicts_with = "content_file")]
        fetch: bool,

        /// Use the structured extraction service for PDFs
        #[arg(long, conflicts_with = "no_structured")]
        structured: bool,

        /// Never use the structured extraction service
        #[arg(long)]
        no_structured: bool,

        /// Base URL of the structured extraction service
        #[arg(long)]
        service_url: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Path to output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Print the text of a PDF, web page or local file
    Fetch {
        source: String,

        /// Maximum number of characters to print
        #[arg(long)]
        max_chars: Option<usize>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Show the bibliography section located in a text file
    Section {
        file: PathBuf,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Inspect or save the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the merged configuration as TOML
    Show,
    /// Save the merged configuration to the platform config file
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let file_config = config_file::load_config();
    let logging = file_config.logging.clone().unwrap_or_default();
    let level = cli
        .log_level
        .or_else(|| std::env::var("LOG_LEVEL").ok())
        .or(logging.level);
    let log_dir = cli.log_file.or(logging.log_dir.map(PathBuf::from));
    let _guard = init_logging(level.as_deref(), log_dir);

    let mut config = Config::from_file(&file_config);
    apply_env(&mut config, |key| std::env::var(key).ok());

    match cli.command {
        Command::Extract {
            source,
            content_file,
            fetch,
            structured,
            no_structured,
            service_url,
            json,
            output,
            no_color,
        } => {
            if structured {
                config.use_structured_extraction = true;
            } else if no_structured {
                config.use_structured_extraction = false;
            }
            if let Some(url) = service_url {
                config.service_base_url = url;
            }
            extract(&config, &source, content_file, fetch, json, output, no_color).await
        }
        Command::Fetch {
            source,
            max_chars,
            json,
            no_color,
        } => fetch(&config, &source, max_chars, json, no_color).await,
        Command::Section { file, no_color } => section(&config, &file, no_color),
        Command::Config { action } => config_command(action, &file_config),
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over `level`.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_logging(level: Option<&str>, log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    let requested = level.map(|l| l.trim().to_ascii_lowercase());
    let unknown = requested
        .clone()
        .filter(|l| !LOG_LEVELS.contains(&l.as_str()));
    let level = requested
        .filter(|l| LOG_LEVELS.contains(&l.as_str()))
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let guard = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "citeharvest.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(false)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    };

    if let Some(unknown) = unknown {
        tracing::warn!(level = %unknown, "unknown log level, using {}", DEFAULT_LOG_LEVEL);
    }
    guard
}

/// Apply `USE_GROBID` and `GROBID_URL` from the environment.
fn apply_env(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(enabled) = var("USE_GROBID").as_deref().and_then(parse_bool) {
        config.use_structured_extraction = enabled;
    }
    if let Some(url) = var("GROBID_URL").filter(|u| !u.trim().is_empty()) {
        config.service_base_url = url.trim().to_string();
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn http_client(config: &Config) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .build()
        .context("failed to build HTTP client")
}

fn open_writer(output: Option<&PathBuf>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    })
}

async fn extract(
    config: &Config,
    source: &str,
    content_file: Option<PathBuf>,
    fetch: bool,
    json: bool,
    output: Option<PathBuf>,
    no_color: bool,
) -> anyhow::Result<()> {
    let color = ColorMode(!no_color && output.is_none());
    let mut writer = open_writer(output.as_ref())?;

    let client = http_client(config)?;
    let orchestrator = ReferenceExtractionOrchestrator::from_config(config, client.clone())
        .context("invalid parsing configuration")?;

    let content = match content_file {
        Some(path) => Some(
            std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read {}", path.display()))?,
        ),
        None if fetch => {
            let acquirer =
                DocumentAcquirer::new(client, config.download_dir.clone()).with_page_markers(false);
            match acquirer.acquire_source(source).await {
                Ok(acquired) => Some(acquired.content),
                Err(e) => {
                    tracing::error!(source, error = %e, "failed to acquire document text");
                    let result = ReferenceExtractionResult::failure(clean_source(source), e);
                    return write_result(&mut writer, &result, json, color);
                }
            }
        }
        None => None,
    };

    let result = orchestrator
        .extract_references(source, content.as_deref())
        .await;
    write_result(&mut writer, &result, json, color)
}

fn write_result(
    writer: &mut Box<dyn Write>,
    result: &ReferenceExtractionResult,
    json: bool,
    color: ColorMode,
) -> anyhow::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *writer, result)?;
        writeln!(writer)?;
    } else {
        output::print_extraction(&mut **writer, result, color)?;
    }
    writer.flush()?;
    Ok(())
}

async fn fetch(
    config: &Config,
    source: &str,
    max_chars: Option<usize>,
    json: bool,
    no_color: bool,
) -> anyhow::Result<()> {
    let client = http_client(config)?;
    let acquirer = DocumentAcquirer::new(client, config.download_dir.clone());
    let acquired = acquirer
        .acquire_source(source)
        .await
        .with_context(|| format!("failed to fetch {}", clean_source(source)))?;
    let extraction =
        ContentExtraction::new(acquired, max_chars.unwrap_or(config.max_content_chars));

    let mut stdout = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &extraction)?;
        writeln!(stdout)?;
    } else {
        output::print_content(&mut stdout, &extraction, ColorMode(!no_color))?;
    }
    Ok(())
}

fn section(config: &Config, file: &std::path::Path, no_color: bool) -> anyhow::Result<()> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }
    let bytes = std::fs::read(file)?;
    let text = String::from_utf8_lossy(&bytes);

    let parsing = ParsingConfigBuilder::from_config(config)
        .build()
        .context("invalid parsing configuration")?;
    let parser = PatternReferenceParser::with_config(parsing);
    let located = parser.locate_section(&text);

    let mut stdout = std::io::stdout().lock();
    output::print_section(
        &mut stdout,
        &located,
        parser.config().fallback_lines(),
        ColorMode(!no_color),
    )?;
    Ok(())
}

fn config_command(action: ConfigAction, file_config: &ConfigFile) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", toml::to_string_pretty(file_config)?);
        }
        ConfigAction::Init => {
            let path = config_file::save_config(file_config).map_err(anyhow::Error::msg)?;
            println!("Saved configuration to {}", path.display());
        }
    }
    Ok(())
}
