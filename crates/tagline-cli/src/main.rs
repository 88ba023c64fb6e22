use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tagline_cli::{
    archive, enrich,
    logging::init_logging,
    report,
    settings::Settings,
    stats,
};
use tagline_types::{finalize, ConversationRecord};

#[derive(Debug, Parser)]
#[command(name = "tagline", version, about = "Index and tag an exported chat history")]
struct Cli {
    /// Settings file (defaults to ./settings.{json,toml,yaml})
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse, tag and write the JSON and text reports
    Run {
        /// Reuse the cached structured history instead of reparsing the HTML
        #[arg(long)]
        from_structured: bool,
        /// Report the parsed conversations without calling the provider
        #[arg(long)]
        skip_analysis: bool,
    },
    /// Parse the archive and cache the structured history
    Parse,
    /// Print statistics over the JSON report
    Stats {
        /// Number of tags to list
        #[arg(long, default_value_t = 20)]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let settings = Settings::load(cli.settings.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load settings: {}", e))?;

    init_logging(&settings.logging);

    match &settings.source {
        Some(path) => tracing::info!("Settings loaded from {}", path.display()),
        None => tracing::warn!("No settings file found, using defaults"),
    }

    match cli.command {
        Command::Run {
            from_structured,
            skip_analysis,
        } => run(&settings, from_structured, skip_analysis).await,
        Command::Parse => parse(&settings).await.map(|_| ()),
        Command::Stats { top } => print_stats(&settings, top).await,
    }
}

async fn parse(settings: &Settings) -> anyhow::Result<Vec<ConversationRecord>> {
    let options = settings
        .archive_options()
        .context("Invalid archive timestamp pattern")?;
    let records = archive::parse_file(&settings.paths.input_html, &options).await?;
    archive::save_structured(&settings.paths.structured_json, &records).await?;
    Ok(records)
}

async fn run(settings: &Settings, from_structured: bool, skip_analysis: bool) -> anyhow::Result<()> {
    let conversations = if from_structured {
        archive::load_structured(&settings.paths.structured_json).await?
    } else {
        parse(settings).await?
    };

    if conversations.is_empty() {
        tracing::warn!("No conversations to process");
        return Ok(());
    }

    let records = if skip_analysis || !settings.pipeline.enable_analysis {
        tracing::info!("Analysis disabled, reporting conversations untagged");
        finalize(conversations)
    } else {
        enrich::enrich(conversations, settings).await?
    };

    report::write_json_report(&settings.paths.output_json, &records).await?;
    report::write_text_report(&settings.paths.output_txt, &records).await?;
    tracing::info!("Done: {} records", records.len());
    Ok(())
}

async fn print_stats(settings: &Settings, top: usize) -> anyhow::Result<()> {
    let records = report::read_json_report(&settings.paths.output_json)
        .await
        .with_context(|| {
            format!(
                "Failed to read report {}",
                settings.paths.output_json.display()
            )
        })?;
    let text = stats::render(&records, top)?;
    println!("{}", text);
    Ok(())
}
