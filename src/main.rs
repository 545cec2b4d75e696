//! dualsub - bilingual subtitle merger
//!
//! Command-line entry point: fetches subtitles in two languages, aligns them
//! and writes merged SRT files.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dualsub::cli::{Args, Commands};
use dualsub::config::Config;
use dualsub::language::language_options;
use dualsub::source::{ContentKind, ContentQuery};
use dualsub::workflow::{FetchRequest, Workflow};

const DEFAULT_CONFIG_FILE: &str = "dualsub.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };

    if let Some(threshold_ms) = args.threshold_ms {
        config.merge.threshold_ms = threshold_ms;
    }

    match args.command {
        Commands::Merge { primary, secondary, output, primary_lang, secondary_lang } => {
            let primary_lang = primary_lang.unwrap_or_else(|| config.merge.primary_language.clone());
            let secondary_lang = secondary_lang.unwrap_or_else(|| config.merge.secondary_language.clone());

            let workflow = Workflow::new(config)?;
            let result = workflow
                .merge_files(&primary, &secondary, &primary_lang, &secondary_lang, &output)
                .await?;

            println!("Merged {} cues into {}", result.cues.len(), output.display());
        }
        Commands::Fetch {
            id,
            kind,
            season,
            episode,
            primary,
            secondary,
            output_dir,
            max_versions,
            primary_id,
            secondary_id,
            filename,
            video_size,
            video_hash,
        } => {
            let kind: ContentKind = kind.parse()?;
            let mut query = ContentQuery::parse_id(&id, kind, season, episode)?;
            query.filename = filename;
            query.video_size = video_size;
            query.video_hash = video_hash;

            let primary = primary.unwrap_or_else(|| config.merge.primary_language.clone());
            let secondary = secondary.unwrap_or_else(|| config.merge.secondary_language.clone());
            let mut request = FetchRequest::new(query, &primary, &secondary);
            request.max_outputs = max_versions;

            let workflow = Workflow::new(config)?;

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
            );
            spinner.set_message(format!("Fetching subtitles for {}", id));
            spinner.enable_steady_tick(Duration::from_millis(120));

            let fetched = match (&primary_id, &secondary_id) {
                (Some(primary_id), Some(secondary_id)) => workflow
                    .regenerate(&request, primary_id, secondary_id)
                    .await
                    .map(|result| result.into_iter().collect::<Vec<_>>()),
                _ => workflow.fetch_merged(&request).await,
            };
            spinner.finish_and_clear();
            let results = fetched?;

            if results.is_empty() {
                println!(
                    "No merged subtitles for {} ({} + {})",
                    id, request.primary_language, request.secondary_language
                );
            } else {
                let paths = workflow.write_results(&results, &request, &output_dir).await?;
                for (result, path) in results.iter().zip(&paths) {
                    println!("{:<30} {}", result.id, path.display());
                }
            }
        }
        Commands::Decode { input, output, lang } => {
            let workflow = Workflow::new(config)?;
            workflow.decode_file(&input, lang.as_deref(), &output).await?;
            println!("Decoded {} to {}", input.display(), output.display());
        }
        Commands::Languages => {
            for option in language_options() {
                println!("{}", option);
            }
        }
    }

    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".dualsub").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotation; the guard must outlive every log call
    let file_appender = rolling::daily(&log_dir, "dualsub.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("dualsub.log").display()
    );

    Ok(())
}
