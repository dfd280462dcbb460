//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use researchpress_blocks::convert;
use researchpress_core::display::{display_title, domain_of, format_time_ago};
use researchpress_core::export::{
    ExportConfig, ExportResult, SavedResults, export_article, load_results, save_results,
};
use researchpress_core::pipeline::{
    ProgressReporter, ResearchQuery, WrittenArticle, research, write_article,
};
use researchpress_core::prompt::parse_selection;
use researchpress_generation::{ArticleGenerator, GeneratorConfig, OpenRouterClient};
use researchpress_search::{ExaClient, SearchAggregator};
use researchpress_shared::{
    AppConfig, ArticleTemplate, CategorySelection, Locale, MAX_RESULTS_PER_CATEGORY,
    ResearchError, SearchReport, init_config, load_config, openrouter_api_key, parse_lookback,
    search_api_key,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ResearchPress: research a topic and publish a cited article.
#[derive(Parser)]
#[command(
    name = "researchpress",
    version,
    about = "Search recent sources across content categories and turn them into a cited article.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Search flags shared by `search` and `run`.
#[derive(Args, Debug)]
pub(crate) struct SearchArgs {
    /// Research query.
    pub query: String,

    /// Categories to search (comma-separated, or `all`). Defaults to the config.
    #[arg(short, long)]
    pub categories: Option<String>,

    /// Results per category (1-25).
    #[arg(short = 'n', long)]
    pub results: Option<u32>,

    /// Look-back window, e.g. 2h, 3d, 1w, 6m.
    #[arg(short, long)]
    pub lookback: Option<String>,
}

/// Article flags shared by `generate` and `run`.
#[derive(Args, Debug)]
pub(crate) struct ArticleArgs {
    /// Sources to use, e.g. `1,3,5-7`, or `all`.
    #[arg(short, long, default_value = "all")]
    pub select: String,

    /// Article locale: en or nl. Defaults to the config.
    #[arg(long)]
    pub locale: Option<Locale>,

    /// Model ID override.
    #[arg(short, long)]
    pub model: Option<String>,

    /// Output directory. Defaults to the config.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Skip the block-format document.
    #[arg(long)]
    pub no_blocks: bool,

    /// Also write the selected sources to sources.json.
    #[arg(long)]
    pub save_sources: bool,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Search categories and list the ranked sources.
    Search {
        #[command(flatten)]
        search: SearchArgs,

        /// Save the ranked results to a JSON file for `generate`.
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Generate an article from saved search results.
    Generate {
        /// Results file written by `search --save`.
        #[arg(long)]
        results: PathBuf,

        /// Article topic. Defaults to the saved query.
        #[arg(short, long)]
        topic: Option<String>,

        #[command(flatten)]
        article: ArticleArgs,
    },

    /// Search, generate, and export in one go.
    Run {
        #[command(flatten)]
        search: SearchArgs,

        /// Article topic. Defaults to the query.
        #[arg(short, long)]
        topic: Option<String>,

        #[command(flatten)]
        article: ArticleArgs,
    },

    /// Convert a Markdown article to block markup on stdout.
    Convert {
        /// Markdown article file.
        file: PathBuf,

        /// Citation locale: en or nl. Defaults to the config.
        #[arg(long)]
        locale: Option<Locale>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "researchpress=info",
        1 => "researchpress=debug",
        _ => "researchpress=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Search { search, save } => cmd_search(&search, save.as_deref()).await,
        Command::Generate {
            results,
            topic,
            article,
        } => cmd_generate(&results, topic.as_deref(), &article).await,
        Command::Run {
            search,
            topic,
            article,
        } => cmd_run(&search, topic.as_deref(), &article).await,
        Command::Convert { file, locale } => cmd_convert(&file, locale).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_search(args: &SearchArgs, save: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let query = research_query(args, &config)?;
    let aggregator = build_aggregator(&config)?;

    let report = run_research(&aggregator, &query).await?;
    print_report(&report);

    if let Some(path) = save {
        let saved = SavedResults {
            query: query.query.clone(),
            saved_at: Utc::now(),
            results: report.results,
        };
        save_results(path, &saved)?;
        println!("  Saved {} results to {}", saved.results.len(), path.display());
        println!();
    }

    Ok(())
}

async fn cmd_generate(results: &Path, topic: Option<&str>, args: &ArticleArgs) -> Result<()> {
    let config = load_config()?;
    let generator = build_generator(&config, args)?;

    let saved = load_results(results)?;
    let selection = parse_selection(&args.select, &saved.results)?;
    let topic = topic.unwrap_or(&saved.query);

    info!(
        results = %results.display(),
        available = saved.results.len(),
        selected = selection.len(),
        "generating article from saved results"
    );

    let reporter = CliProgress::new();
    let article = write_article(
        &generator,
        &saved.results,
        &selection,
        topic,
        !args.no_blocks,
        &reporter,
    )
    .await?;

    let exported = export(&config, args, &generator, &article)?;
    print_article_summary(&article, &exported);
    Ok(())
}

async fn cmd_run(search: &SearchArgs, topic: Option<&str>, args: &ArticleArgs) -> Result<()> {
    let config = load_config()?;
    let query = research_query(search, &config)?;

    // Resolve both credentials before any network traffic.
    let aggregator = build_aggregator(&config)?;
    let generator = build_generator(&config, args)?;

    let report = run_research(&aggregator, &query).await?;
    print_report(&report);

    let selection = parse_selection(&args.select, &report.results)?;
    let topic = topic.unwrap_or(&query.query);

    let reporter = CliProgress::new();
    let article = write_article(
        &generator,
        &report.results,
        &selection,
        topic,
        !args.no_blocks,
        &reporter,
    )
    .await?;

    let exported = export(&config, args, &generator, &article)?;
    print_article_summary(&article, &exported);
    Ok(())
}

async fn cmd_convert(file: &Path, locale: Option<Locale>) -> Result<()> {
    let config = load_config()?;
    let template = ArticleTemplate::for_locale(locale.unwrap_or(config.defaults.locale));

    let body = std::fs::read_to_string(file).map_err(|e| ResearchError::io(file, e))?;
    let doc = convert(&body, &template);

    print!("{}", doc.to_block_markup());
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Merge search flags over config defaults.
fn research_query(args: &SearchArgs, config: &AppConfig) -> Result<ResearchQuery> {
    let results_per_category = args.results.unwrap_or(config.defaults.results_per_category);
    if !(1..=MAX_RESULTS_PER_CATEGORY).contains(&results_per_category) {
        return Err(eyre!(
            "results per category must be between 1 and {MAX_RESULTS_PER_CATEGORY}, got {results_per_category}"
        ));
    }

    let lookback = args.lookback.as_deref().unwrap_or(&config.defaults.lookback);
    let lookback_hours = parse_lookback(lookback)?;

    let categories = match &args.categories {
        Some(list) => CategorySelection::parse(list).map_err(|e| eyre!(e))?,
        None if config.defaults.categories.is_empty() => CategorySelection::All,
        None => CategorySelection::parse(&config.defaults.categories.join(","))
            .map_err(|e| eyre!("defaults.categories: {e}"))?,
    };
    if matches!(&categories, CategorySelection::Only(list) if list.is_empty()) {
        return Err(eyre!("no categories given (use e.g. --categories news,pdf or all)"));
    }

    Ok(ResearchQuery {
        query: args.query.clone(),
        results_per_category,
        lookback_hours,
        categories,
    })
}

fn build_aggregator(config: &AppConfig) -> Result<SearchAggregator> {
    let key = search_api_key(config)?;
    let client = ExaClient::new(key, &config.search)?;
    Ok(SearchAggregator::new(Arc::new(client)))
}

fn build_generator(config: &AppConfig, args: &ArticleArgs) -> Result<ArticleGenerator> {
    let key = openrouter_api_key(config)?;
    let client = OpenRouterClient::new(key, &config.openrouter)?;

    let mut settings = GeneratorConfig::from(&config.openrouter);
    if let Some(model) = &args.model {
        settings.model = model.clone();
    }

    let locale = args.locale.unwrap_or(config.defaults.locale);
    Ok(ArticleGenerator::new(
        Arc::new(client),
        settings,
        ArticleTemplate::for_locale(locale),
    ))
}

/// Run the search stage, printing remediation hints when nothing was found.
async fn run_research(aggregator: &SearchAggregator, query: &ResearchQuery) -> Result<SearchReport> {
    let reporter = CliProgress::new();
    match research(aggregator, query, &reporter).await {
        Ok(report) => Ok(report),
        Err(err) => {
            reporter.spinner.finish_and_clear();
            if let ResearchError::SearchExhausted { suggestions, .. } = &err {
                eprintln!();
                eprintln!("  No results found. Suggestions:");
                for suggestion in suggestions {
                    eprintln!("  • {suggestion}");
                }
                eprintln!();
            }
            Err(err.into())
        }
    }
}

fn export(
    config: &AppConfig,
    args: &ArticleArgs,
    generator: &ArticleGenerator,
    article: &WrittenArticle,
) -> Result<ExportResult> {
    let export_config = ExportConfig {
        output_root: args
            .out
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.defaults.output_dir)),
        model: args
            .model
            .clone()
            .unwrap_or_else(|| config.openrouter.default_model.clone()),
        locale: generator.template().locale,
        include_sources: args.save_sources,
    };
    Ok(export_article(&export_config, article, Utc::now())?)
}

fn print_report(report: &SearchReport) {
    let now = Utc::now();

    println!();
    for (position, result) in report.results.listable() {
        println!("  {position:>2}. {}", display_title(result));
        println!(
            "      {} · {}",
            domain_of(&result.url),
            format_time_ago(result.published_date.as_deref(), now)
        );
        println!("      {}", result.url);
    }
    println!();

    let succeeded: Vec<&str> = report.succeeded().iter().map(|c| c.label()).collect();
    println!("  Found results in: {}", succeeded.join(", "));

    let failed = report.failed();
    if !failed.is_empty() {
        let failed: Vec<&str> = failed.iter().map(|c| c.label()).collect();
        println!("  No results in:    {}", failed.join(", "));
    }
    println!();
}

fn print_article_summary(article: &WrittenArticle, exported: &ExportResult) {
    if article.draft.title.is_empty() || article.draft.meta_description.is_empty() {
        warn!("article metadata is incomplete");
    }

    let or_missing = |s: &str| if s.is_empty() { "(missing)".to_string() } else { s.to_string() };

    println!();
    println!("  Article generated!");
    println!("  Title:       {}", or_missing(&article.draft.title));
    println!("  Description: {}", or_missing(&article.draft.meta_description));
    println!("  Sources:     {}", article.sources.len());
    println!("  Article:     {}", exported.article_path.display());
    println!("  Run dir:     {}", exported.run_dir.display());
    println!("  Time:        {:.1}s", article.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn search_done(&self, _report: &SearchReport) {
        self.spinner.finish_and_clear();
    }

    fn article_done(&self, _article: &WrittenArticle) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
