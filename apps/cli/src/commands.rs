//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use bookrelease_core::chapters::split_chapters;
use bookrelease_core::collect::DEFAULT_OUTPUT;
use bookrelease_core::pipeline::{
    ProgressReporter, ReleaseOptions, ReleaseResult, build_notes, derive_all_trade, run_release,
};
use bookrelease_core::preflight::check_requirements;
use bookrelease_core::{IndexPaths, ReleasePlan, collect_chapters, regenerate_index, run_preflight};
use bookrelease_shared::{
    AppConfig, BookReleaseError, DeleteOutcome, config_file_path, init_config, load_config,
};
use bookrelease_tools::{DryRunPublisher, GhPublisher, SystemToolchain};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// bookrelease: build and publish the book's release artifacts.
#[derive(Parser)]
#[command(
    name = "bookrelease",
    version,
    about = "Derive trade and preview PDFs, split chapters, and publish the book release.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ./bookrelease.toml, then ~/.bookrelease/bookrelease.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
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

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build every artifact and replace the release.
    Release {
        /// Keep the main copy, previews and chapter directory afterwards.
        #[arg(long)]
        keep_artifacts: bool,

        /// Log the release actions instead of running them.
        #[arg(long)]
        dry_run: bool,
    },

    /// Check inputs and tools without building anything.
    Preflight,

    /// Derive both trade-size PDFs (reused when up to date).
    Trade,

    /// Split a trade PDF into chapter files.
    Split {
        /// PDF to split.
        input: PathBuf,

        /// Output directory (defaults to the configured chapter directory).
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Print release notes for the files currently on disk.
    Notes,

    /// Concatenate chapter LaTeX sources into one text file.
    Collect {
        /// Book root containing `NN_subject` directories.
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Output file.
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,
    },

    /// Subject index maintenance.
    Index {
        /// Index subcommand.
        #[command(subcommand)]
        action: IndexAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Index subcommands.
#[derive(Subcommand)]
pub(crate) enum IndexAction {
    /// Rebuild the JSON and LaTeX index from the classification results.
    Regenerate {
        /// Directory holding `pass2_raw_results.json` and `candidates.json`.
        #[arg(long, default_value = "index")]
        dir: PathBuf,

        /// Book source naming each chapter's label.
        #[arg(long, default_value = "main.tex")]
        main_tex: PathBuf,
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
        0 => "bookrelease=info",
        1 => "bookrelease=debug",
        _ => "bookrelease=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Release {
            keep_artifacts,
            dry_run,
        } => cmd_release(config_path, keep_artifacts, dry_run).await,
        Command::Preflight => cmd_preflight(config_path).await,
        Command::Trade => cmd_trade(config_path).await,
        Command::Split { input, output_dir } => {
            cmd_split(config_path, &input, output_dir.as_deref()).await
        }
        Command::Notes => cmd_notes(config_path).await,
        Command::Collect { root, output } => cmd_collect(&root, &output).await,
        Command::Index { action } => match action {
            IndexAction::Regenerate { dir, main_tex } => cmd_index_regenerate(dir, main_tex).await,
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path).await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

/// Config plus the plan rooted at the working directory.
fn load_plan(config_path: Option<&Path>) -> Result<(AppConfig, ReleasePlan)> {
    let config = load_config(config_path)?;
    let cwd = std::env::current_dir()
        .map_err(|e| eyre!("cannot determine working directory: {e}"))?;
    let plan = ReleasePlan::from_config(&config, &cwd);
    Ok((config, plan))
}

fn describe_delete(outcome: &DeleteOutcome) -> String {
    match outcome {
        DeleteOutcome::Deleted => "deleted".to_string(),
        DeleteOutcome::NotFound => "none found".to_string(),
        DeleteOutcome::Failed(reason) => format!("failed ({reason})"),
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_release(config_path: Option<&Path>, keep_artifacts: bool, dry_run: bool) -> Result<()> {
    let (config, plan) = load_plan(config_path)?;
    let tools = SystemToolchain::new(&config.tools, config.chapters);
    let options = ReleaseOptions { keep_artifacts };

    info!(
        repository = %plan.repository,
        tag = %plan.tag,
        dry_run,
        "releasing"
    );

    let reporter = CliProgress::new();
    let outcome = if dry_run {
        run_release(&plan, &tools, &DryRunPublisher, options, &reporter).await
    } else {
        let publisher = GhPublisher::new(&config.tools.gh, &plan.repository);
        run_release(&plan, &tools, &publisher, options, &reporter).await
    };
    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            reporter.abandon();
            return Err(e.into());
        }
    };

    // Print summary
    println!();
    if dry_run {
        println!("  Dry run complete, nothing was published.");
    } else {
        println!("  Release published!");
    }
    println!("  Tag:      {}", plan.tag);
    println!("  Assets:   {}", result.asset_count);
    println!("  Trade:    BPS {}, US {}", result.bps_trade, result.us_trade);
    println!(
        "  Previous: release {}, tag {}",
        describe_delete(&result.publish.release),
        describe_delete(&result.publish.tag),
    );
    match &result.cleanup {
        Some(report) => println!("  Cleaned:  {} paths", report.removed.len()),
        None => println!("  Cleaned:  skipped (--keep-artifacts)"),
    }
    println!("  Time:     {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_preflight(config_path: Option<&Path>) -> Result<()> {
    let (config, plan) = load_plan(config_path)?;
    let tools = SystemToolchain::new(&config.tools, config.chapters);
    let publisher = GhPublisher::new(&config.tools.gh, &plan.repository);

    run_preflight(&plan, &tools, &publisher)?;
    println!("All inputs and tools present.");
    Ok(())
}

async fn cmd_trade(config_path: Option<&Path>) -> Result<()> {
    let (config, plan) = load_plan(config_path)?;
    let missing: Vec<_> = plan
        .missing_inputs()
        .into_iter()
        .filter(|m| m.path == plan.bps_executive || m.path == plan.us_executive)
        .collect();
    if !missing.is_empty() {
        return Err(BookReleaseError::MissingInputs(missing).into());
    }

    let tools = SystemToolchain::new(&config.tools, config.chapters);
    check_requirements(&tools.rescale_requirements(), &plan.root)?;

    let (bps, us) = derive_all_trade(&plan, &tools).await?;
    println!("  {}: {bps}", plan.bps_trade.display());
    println!("  {}: {us}", plan.us_trade.display());
    Ok(())
}

async fn cmd_split(
    config_path: Option<&Path>,
    input: &Path,
    output_dir: Option<&Path>,
) -> Result<()> {
    let (config, plan) = load_plan(config_path)?;
    if !input.is_file() {
        return Err(eyre!("input PDF not found: {}", input.display()));
    }
    let out_dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| plan.chapters_dir.clone());

    let tools = SystemToolchain::new(&config.tools, config.chapters);
    check_requirements(&tools.split_requirements(), &plan.root)?;

    let files = split_chapters(&tools, input, &out_dir, &config.chapters).await?;
    println!("Wrote {} chapter files to {}", files.len(), out_dir.display());
    Ok(())
}

async fn cmd_notes(config_path: Option<&Path>) -> Result<()> {
    let (_config, plan) = load_plan(config_path)?;
    let (_manifest, notes) = build_notes(&plan)?;
    print!("{notes}");
    Ok(())
}

async fn cmd_collect(root: &Path, output: &Path) -> Result<()> {
    let report = collect_chapters(root, output)?;
    println!(
        "Written {} chapters ({} files) to {}",
        report.chapters,
        report.files,
        output.display()
    );
    if report.unreadable > 0 {
        println!("  {} files could not be read", report.unreadable);
    }
    Ok(())
}

async fn cmd_index_regenerate(dir: PathBuf, main_tex: PathBuf) -> Result<()> {
    let report = regenerate_index(&IndexPaths { dir, main_tex })?;
    println!("Indexed {} subjects", report.subjects);
    println!("  JSON:  {}", report.final_index.display());
    println!("  LaTeX: {}", report.latex.display());
    if report.labelled_chapters == 0 {
        println!("  No chapter labels found, citing chapter numbers");
    }
    if report.failed_chapters > 0 {
        println!("  {} chapters had no classification", report.failed_chapters);
    }
    Ok(())
}

async fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };
    let path = init_config(&path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config: AppConfig = load_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
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
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn abandon(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _result: &ReleaseResult) {
        self.spinner.finish_and_clear();
    }
}
