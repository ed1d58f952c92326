//! `newsroom` command line: configure sources and reports, crawl, research.

mod config;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use config::Config;
use newsroom::crawl::{compile_pattern, discover_urls, suggest_pattern};
use newsroom::defaults::{default_reports, default_sources};
use newsroom::{
    due_sources, ContentExtractor, Crawler, HttpExtractor, NotifierKind, OpenAiModel, ReportConfig,
    ReportRunner, SerpApiSearcher, SourceConfig, SqliteStore, Store, TimeRange, WebhookNotifier,
};

/// URLs printed by `sources preview`.
const PREVIEW_LIMIT: usize = 50;

#[derive(Parser)]
#[command(name = "newsroom")]
#[command(about = "News harvesting and AI-guided research")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    Init,

    /// Insert the default sources and reports that are not present yet
    Seed,

    /// Manage crawl sources
    Sources {
        #[command(subcommand)]
        command: SourceCommands,
    },

    /// Crawl one source, or every due source
    Crawl {
        id: Option<Uuid>,
        #[arg(long, conflicts_with = "id")]
        due: bool,
    },

    /// Manage report configurations
    Reports {
        #[command(subcommand)]
        command: ReportCommands,
    },

    /// Generate one report now
    Report { id: Uuid },

    /// Show generated reports for a report configuration
    History {
        report_id: Uuid,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Poll and crawl due sources until interrupted
    Watch,
}

#[derive(Subcommand)]
enum SourceCommands {
    /// List configured sources
    List {
        #[arg(long)]
        active: bool,
    },

    /// Add a source
    Add {
        name: String,
        listing_url: String,
        /// Regex matching article URLs; group 1 is used when present
        pattern: String,
        #[arg(long, default_value_t = 3600)]
        frequency: i64,
    },

    /// Show which article URLs a pattern finds on a listing page
    Preview { listing_url: String, pattern: String },

    /// Ask the model for a discovery pattern for a listing page
    SuggestPattern { listing_url: String },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// List report configurations
    List {
        #[arg(long)]
        active: bool,
    },

    /// Add a report configuration
    Add {
        name: String,
        #[arg(long)]
        purpose: String,
        /// Source ids, comma separated
        #[arg(long, value_delimiter = ',')]
        sources: Vec<Uuid>,
        /// Filter keywords, comma separated
        #[arg(long, default_value = "")]
        keywords: String,
        /// 24h, 3d, 7d, 14d or 30d
        #[arg(long, default_value = "24h")]
        range: String,
        #[arg(long, default_value = "")]
        focus: String,
        #[arg(long)]
        deep: bool,
        /// wechat or jinshan
        #[arg(long, requires = "webhook")]
        notify: Option<NotifierKind>,
        #[arg(long)]
        webhook: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,newsroom=debug".into()),
        )
        .with(fmt::layer().with_target(true).with_line_number(true))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let store = open_store(&config).await?;

    match cli.command {
        Commands::Init => {
            println!("{} schema ready at {}", "✓".green(), config.database_url);
            Ok(())
        }
        Commands::Seed => cmd_seed(store.as_ref()).await,
        Commands::Sources { command } => cmd_sources(&config, store.as_ref(), command).await,
        Commands::Crawl { id: Some(id), .. } => cmd_crawl_one(store, id).await,
        Commands::Crawl { id: None, due: true } => cmd_crawl_due(store).await,
        Commands::Crawl { .. } => bail!("pass a source id or --due"),
        Commands::Reports { command } => cmd_reports(store.as_ref(), command).await,
        Commands::Report { id } => cmd_report(&config, store, id).await,
        Commands::History { report_id, limit } => cmd_history(store.as_ref(), report_id, limit).await,
        Commands::Watch => cmd_watch(&config, store).await,
    }
}

async fn open_store(config: &Config) -> Result<Arc<dyn Store>> {
    let store = SqliteStore::new(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;
    Ok(Arc::new(store))
}

fn crawler(store: Arc<dyn Store>) -> Result<Crawler> {
    let extractor = HttpExtractor::new().context("Failed to build HTTP extractor")?;
    Ok(Crawler::new(store, Arc::new(extractor)))
}

// ============================================================================
// Commands
// ============================================================================

async fn cmd_seed(store: &dyn Store) -> Result<()> {
    let mut sources = Vec::new();
    for source in default_sources() {
        match store.find_source_by_name(&source.name).await? {
            Some(existing) => sources.push(existing),
            None => {
                store.insert_source(&source).await?;
                println!("{} source {}", "+".green(), source.name);
                sources.push(source);
            }
        }
    }

    let existing: Vec<String> = store
        .list_reports(false)
        .await?
        .into_iter()
        .map(|r| r.name)
        .collect();
    for report in default_reports(&sources) {
        if existing.contains(&report.name) {
            continue;
        }
        store.insert_report(&report).await?;
        println!("{} report {}", "+".green(), report.name);
    }

    Ok(())
}

async fn cmd_sources(config: &Config, store: &dyn Store, command: SourceCommands) -> Result<()> {
    match command {
        SourceCommands::List { active } => {
            for source in store.list_sources(active).await? {
                let last_run = source
                    .last_run_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string());
                let state = if source.active { "active".green() } else { "inactive".dimmed() };
                println!(
                    "{}  {}  [{}]  every {}s  last run {}\n    {}",
                    source.id,
                    source.name.bold(),
                    state,
                    source.frequency_seconds,
                    last_run,
                    source.listing_url
                );
            }
        }
        SourceCommands::Add {
            name,
            listing_url,
            pattern,
            frequency,
        } => {
            compile_pattern(&pattern).context("Pattern is not a valid regex")?;
            let source = SourceConfig::new(name, listing_url, pattern).with_frequency(frequency);
            store.insert_source(&source).await?;
            println!("{} {}", "Added source".green(), source.id);
        }
        SourceCommands::Preview { listing_url, pattern } => {
            let listing = render_listing(&listing_url).await?;
            preview_matches(&listing_url, &listing, &pattern)?;
        }
        SourceCommands::SuggestPattern { listing_url } => {
            let listing = render_listing(&listing_url).await?;
            let suggestion =
                suggest_pattern(&OpenAiModel::new(), &config.ai_context(), &listing_url, &listing).await;
            if suggestion.from_model {
                println!("{} {}", "Suggested".green(), suggestion.pattern);
            } else {
                println!("{} {}", "Fallback".yellow(), suggestion.pattern);
            }
            preview_matches(&listing_url, &listing, &suggestion.pattern)?;
        }
    }
    Ok(())
}

async fn render_listing(listing_url: &str) -> Result<String> {
    let extractor = HttpExtractor::new().context("Failed to build HTTP extractor")?;
    extractor
        .render(listing_url)
        .await
        .with_context(|| format!("Failed to render {listing_url}"))
}

/// Print what a crawl with `pattern` would discover on the rendered listing.
fn preview_matches(listing_url: &str, listing: &str, pattern: &str) -> Result<()> {
    let regex = compile_pattern(pattern).context("Pattern is not a valid regex")?;
    let urls = discover_urls(&regex, listing, listing_url);
    println!("{} article URLs found", urls.len().to_string().bold());
    for url in urls.iter().take(PREVIEW_LIMIT) {
        println!("  {url}");
    }
    if urls.len() > PREVIEW_LIMIT {
        println!("  {}", format!("... {} more", urls.len() - PREVIEW_LIMIT).dimmed());
    }
    Ok(())
}

async fn cmd_crawl_one(store: Arc<dyn Store>, id: Uuid) -> Result<()> {
    let summary = crawler(store)?.run_source_by_id(id).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    if let Some(err) = &summary.error {
        bail!("crawl aborted: {err}");
    }
    Ok(())
}

async fn cmd_crawl_due(store: Arc<dyn Store>) -> Result<()> {
    let crawler = crawler(store.clone())?;
    let count = crawl_due(&crawler, store.as_ref()).await?;
    println!("{} crawled {} due sources", "✓".green(), count);
    Ok(())
}

/// Run every due source in its own task and wait for all of them.
async fn crawl_due(crawler: &Crawler, store: &dyn Store) -> Result<usize> {
    let due = due_sources(&store.list_sources(true).await?, Utc::now());

    let mut tasks = JoinSet::new();
    for source in due {
        let crawler = crawler.clone();
        tasks.spawn(async move { crawler.run_source(&source).await });
    }

    let mut finished = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(summary) => {
                finished += 1;
                info!(
                    source = %summary.source_name,
                    new = summary.succeeded,
                    failed = summary.failed,
                    "Due source crawled"
                );
            }
            Err(e) => error!(error = %e, "Crawl task panicked"),
        }
    }
    Ok(finished)
}

async fn cmd_reports(store: &dyn Store, command: ReportCommands) -> Result<()> {
    match command {
        ReportCommands::List { active } => {
            for report in store.list_reports(active).await? {
                let mode = if report.deep_research { "deep" } else { "simple" };
                let state = if report.active { "active".green() } else { "inactive".dimmed() };
                println!(
                    "{}  {}  [{}]  {} {}  keywords: {}",
                    report.id,
                    report.name.bold(),
                    state,
                    mode,
                    report.time_range,
                    report.keywords_text()
                );
            }
        }
        ReportCommands::Add {
            name,
            purpose,
            sources,
            keywords,
            range,
            focus,
            deep,
            notify,
            webhook,
        } => {
            for id in &sources {
                if store.get_source(*id).await?.is_none() {
                    bail!("source {id} does not exist");
                }
            }

            let mut report = ReportConfig::new(name, purpose)
                .with_sources(sources)
                .with_keywords(&keywords)
                .with_time_range(TimeRange::parse_or_default(&range))
                .with_focus(focus)
                .with_deep_research(deep);
            if let (Some(kind), Some(webhook)) = (notify, webhook) {
                report = report.with_notify(kind, webhook);
            }

            store.insert_report(&report).await?;
            println!("{} {}", "Added report".green(), report.id);
        }
    }
    Ok(())
}

async fn cmd_report(config: &Config, store: Arc<dyn Store>, id: Uuid) -> Result<()> {
    let runner = ReportRunner::new(
        store,
        Arc::new(HttpExtractor::new().context("Failed to build HTTP extractor")?),
        Arc::new(OpenAiModel::new()),
        Arc::new(SerpApiSearcher::new(config.serpapi_api_key.clone())),
        Arc::new(WebhookNotifier::new().context("Failed to build webhook client")?),
    );

    let outcome = runner.run_by_id(&config.ai_context(), id).await?;
    let record = &outcome.record;

    if outcome.is_success() {
        println!("{}\n", record.content);
        println!(
            "{} {} ({} articles, {} research iterations, notified: {})",
            "✓".green(),
            record.title,
            outcome.articles,
            outcome.iterations,
            record.notification_sent
        );
        if let Some(err) = &record.error {
            println!("{} {}", "!".yellow(), err);
        }
        Ok(())
    } else {
        bail!(
            "report failed: {}",
            record.error.as_deref().unwrap_or("unknown error")
        )
    }
}

async fn cmd_history(store: &dyn Store, report_id: Uuid, limit: usize) -> Result<()> {
    let history = store.report_history(report_id, limit).await?;
    if history.is_empty() {
        println!("no reports generated yet");
    }
    for record in history {
        let status = match record.status.as_str() {
            "success" => record.status.as_str().green(),
            other => other.red(),
        };
        println!(
            "{}  {}  [{}]\n    {}",
            record.generated_at.to_rfc3339(),
            record.title.bold(),
            status,
            record.summary.replace('\n', " ")
        );
    }
    Ok(())
}

async fn cmd_watch(config: &Config, store: Arc<dyn Store>) -> Result<()> {
    let crawler = crawler(store.clone())?;
    let mut ticker = tokio::time::interval(config.poll_interval);
    info!(interval_secs = config.poll_interval.as_secs(), "Watching sources");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match crawl_due(&crawler, store.as_ref()).await {
                    Ok(0) => {}
                    Ok(count) => info!(count, "Poll finished"),
                    Err(e) => error!(error = %e, "Poll failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
        }
    }
}
