use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use refmine_cooccur::{
    ArtifactCache, CoOccurrence, FsCache, HeatmapOutput, NoCache, SqliteSource, Sweep, SweepPlan,
    SweepReport,
};
use refmine_core::{format_threshold, OutputFormat, RefmineConfig};
use refmine_heatmap::{Colormap, PngRenderer};

const CONFIG_FILE: &str = ".refmine.toml";

#[derive(Parser)]
#[command(
    name = "refmine",
    version,
    about = "Refactoring co-occurrence statistics and heatmaps",
    long_about = "Computes which refactoring types tend to happen together, in the same commit\n\
                   or in the same time window, from a database of mined refactorings.\n\
                   Intermediate and final matrices are cached as CSV in the results directory;\n\
                   delete a file to recompute it.\n\n\
                   Examples:\n  \
                     refmine init                                   Create a .refmine.toml\n  \
                     refmine sweep                                  Run every configured analysis\n  \
                     refmine commit --threshold 0.3                 Same-commit co-occurrence\n  \
                     refmine window --hours 6 --statistic frequency Windowed co-occurrence"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .refmine.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database with the refactoring tables
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Directory for CSV artifacts and heatmaps
    #[arg(long, global = true)]
    results_dir: Option<PathBuf>,

    /// Recompute everything and write no CSV artifacts
    #[arg(long, global = true)]
    no_cache: bool,

    /// Skip heatmap rendering
    #[arg(long, global = true)]
    no_heatmaps: bool,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for the sweep report.\n\n\
                       Formats:\n  \
                         text      Human-readable table (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run every analysis listed in the configuration
    #[command(long_about = "Run every analysis listed in the configuration.\n\n\
        Per-commit co-occurrence first, then each window size with each statistic,\n\
        all at every configured threshold.")]
    Sweep,
    /// Co-occurrence of refactorings within the same commit
    Commit {
        /// Probability threshold; repeat for several (default: from config)
        #[arg(long = "threshold")]
        thresholds: Vec<f64>,
    },
    /// Co-occurrence of refactorings within the same time window
    #[command(long_about = "Co-occurrence of refactorings within the same time window.\n\n\
        Reads the window table for the given size. The likelihood statistic counts\n\
        windows in which both types occur; frequency sums occurrences and divides by\n\
        the number of commits in those windows.\n\n\
        Examples:\n  refmine window --hours 24 --statistic likelihood\n  \
        refmine window --hours 6 --statistic frequency --threshold 0.1 --threshold 0.2")]
    Window {
        /// Window size in hours
        #[arg(long)]
        hours: u32,
        /// "likelihood" or "frequency"
        #[arg(long)]
        statistic: String,
        /// Probability threshold; repeat for several (default: from config)
        #[arg(long = "threshold")]
        thresholds: Vec<f64>,
    },
    /// Create a default .refmine.toml configuration file
    #[command(long_about = "Create a default .refmine.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .refmine.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

const DEFAULT_CONFIG: &str = r#"# refmine configuration

# Replaces the built-in list of refactoring types.
# refactorings = ["Extract Method", "Rename Method", "Move Class"]

[database]
# path = "refactorings.db"
# commit_table = "refactoringspercommit"
# commit_id_column = "commitMetaData_id"
# window_table_prefix = "RefactoringsWindow_"

[output]
# results_dir = "results"
# cache = true

[sweep]
# commit = true
# thresholds = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5]
# window_hours = [6, 12, 24]
# statistics = ["likelihood", "frequency"]

[heatmap]
# enabled = true
# colormap = "YlGn"
# cell_size = 48

[logging]
# level = "warn"
"#;

fn load_config(cli: &Cli) -> Result<RefmineConfig> {
    let mut config = match &cli.config {
        Some(path) => RefmineConfig::from_file(path)?,
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                RefmineConfig::from_file(default_path)?
            } else {
                RefmineConfig::default()
            }
        }
    };

    if let Some(path) = &cli.database {
        config.database.path = path.clone();
    }
    if let Some(dir) = &cli.results_dir {
        config.output.results_dir = dir.clone();
    }
    if cli.no_cache {
        config.output.cache = false;
    }
    if cli.no_heatmaps {
        config.heatmap.enabled = false;
    }
    match &cli.command {
        Command::Commit { thresholds } | Command::Window { thresholds, .. }
            if !thresholds.is_empty() =>
        {
            config.sweep.thresholds = thresholds.clone();
        }
        _ => {}
    }

    config.validate()?;
    Ok(config)
}

fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "refmine={level},refmine_core={level},refmine_cooccur={level},refmine_heatmap={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_sweep(config: &RefmineConfig, plan: &SweepPlan) -> Result<SweepReport> {
    let catalog = config.catalog()?;
    let colormap: Colormap = config.heatmap.colormap.parse()?;
    let source = SqliteSource::open(&config.database.path)?;
    debug!(
        database = %config.database.path.display(),
        types = catalog.len(),
        jobs = plan.len(),
        "starting sweep"
    );

    let fs_cache;
    let cache: &dyn ArtifactCache = if config.output.cache {
        fs_cache = FsCache::new(&config.output.results_dir);
        &fs_cache
    } else {
        &NoCache
    };
    let pipeline = CoOccurrence::new(&catalog, &config.database, &source, cache);

    let renderer = PngRenderer::new(config.heatmap.cell_size);
    let mut sweep = Sweep::new(&pipeline);
    if config.heatmap.enabled {
        sweep = sweep.with_heatmaps(HeatmapOutput {
            renderer: &renderer,
            colormap,
            dir: &config.output.results_dir,
        });
    }

    let progress = if std::io::stderr().is_terminal() {
        let pb = indicatif::ProgressBar::new(plan.len() as u64);
        pb.set_style(
            indicatif::ProgressStyle::with_template(
                "{bar:30.cyan/blue} {pos}/{len} {msg} ({elapsed})",
            )
            .into_diagnostic()?,
        );
        Some(pb)
    } else {
        None
    };

    let result = sweep.run(plan, &mut |job, done| {
        if let Some(pb) = &progress {
            pb.set_position(done as u64);
            pb.set_message(format!("{} @ {}", job.scope, format_threshold(job.threshold)));
        }
    });

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    Ok(result?)
}

fn print_report(report: &SweepReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", report.to_json()?);
        }
        OutputFormat::Markdown => {
            println!("## Co-occurrence sweep\n");
            println!("| Scope | Threshold | Shape | Source | Heatmap |");
            println!("|-------|-----------|-------|--------|---------|");
            for e in &report.entries {
                let heatmap = e
                    .heatmap
                    .as_ref()
                    .map(|p| format!("`{}`", p.display()))
                    .unwrap_or_else(|| "-".into());
                println!(
                    "| {} | {} | {}x{} | {} | {} |",
                    e.scope,
                    format_threshold(e.threshold),
                    e.rows,
                    e.cols,
                    e.provenance,
                    heatmap
                );
            }
            println!(
                "\n{} results, {} cached, {} heatmaps in {:.1}s",
                report.entries.len(),
                report.cached(),
                report.heatmaps(),
                report.elapsed_secs
            );
        }
        OutputFormat::Text => {
            println!(
                "{:<26} {:>9} {:>7}  {:<8}  HEATMAP",
                "SCOPE", "THRESHOLD", "SHAPE", "SOURCE"
            );
            for e in &report.entries {
                let heatmap = e
                    .heatmap
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".into());
                println!(
                    "{:<26} {:>9} {:>7}  {:<8}  {}",
                    e.scope,
                    format_threshold(e.threshold),
                    format!("{}x{}", e.rows, e.cols),
                    e.provenance.to_string(),
                    heatmap
                );
            }
            println!(
                "\n{} results ({} cached), {} heatmaps in {:.1}s",
                report.entries.len(),
                report.cached(),
                report.heatmaps(),
                report.elapsed_secs
            );
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();

    match &cli.command {
        Command::Init => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!("{CONFIG_FILE} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE} with default configuration");
            return Ok(());
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "refmine", &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(&cli)?;
    init_logging(cli.verbose, &config.logging.level);

    // an unknown statistic fails here, before the database is opened
    let plan = match &cli.command {
        Command::Window {
            hours, statistic, ..
        } => SweepPlan::window(*hours, statistic, &config.sweep.thresholds)?,
        Command::Commit { .. } => SweepPlan::commit(&config.sweep.thresholds),
        _ => SweepPlan::from_config(&config.sweep),
    };

    let report = run_sweep(&config, &plan)?;
    print_report(&report, cli.format)?;
    Ok(())
}
