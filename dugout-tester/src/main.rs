mod reports;
mod runner;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use dugout_league::{LeagueConfig, Stat};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;

use runner::{RunPlan, run_season};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored terminal summary
    Console,
    /// Pretty-printed JSON summary
    Json,
    /// Markdown tables
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "dugout-tester", version = "0.1.0")]
#[command(about = "Drive a Dugout season and report how the view cache behaved")]
struct Args {
    /// League seed (defaults to the configured seed)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of days to simulate
    #[arg(long, default_value_t = 30)]
    days: u32,

    /// League configuration JSON (defaults to the embedded league)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the age-sweep threshold in milliseconds
    #[arg(long)]
    max_age_ms: Option<i64>,

    /// Override the age-sweep cadence in days (0 disables it)
    #[arg(long)]
    sweep_every: Option<u32>,

    /// Leaderboard stats to read (comma-separated)
    #[arg(long, default_value = "avg,hr,ops")]
    stats: String,

    /// Leaders to keep per stat
    #[arg(long, default_value_t = 5)]
    leaders: usize,

    /// Player profiles to read per pass
    #[arg(long, default_value_t = 25)]
    profiles: usize,

    /// Also read standings while a generation bump lands mid-fetch
    #[arg(long)]
    interleave: bool,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(&args)?;
    let plan = build_plan(&args)?;

    if args.report == ReportFormat::Console {
        announce_banner();
    }
    if args.verbose {
        eprintln!(
            "Simulating {} days of season {} ({} teams, seed {})",
            plan.days,
            config.season,
            config.teams.len(),
            config.seed
        );
    }

    let summary = run_season(config, &plan).await?;

    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Console => {
            reports::generate_console_report(output_target.writer(), &summary)?;
        }
        ReportFormat::Json => reports::generate_json_report(output_target.writer(), &summary)?,
        ReportFormat::Markdown => {
            reports::generate_markdown_report(output_target.writer(), &summary)?;
        }
    }
    output_target.flush_inner()?;
    Ok(())
}

fn announce_banner() {
    println!("{}", "⚾ Dugout Season Tester".bright_cyan().bold());
    println!("{}", "=======================".cyan());
}

fn load_config(args: &Args) -> Result<LeagueConfig> {
    let mut config = if let Some(path) = &args.config {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        LeagueConfig::from_json(&json)
            .with_context(|| format!("invalid league config {}", path.display()))?
    } else {
        LeagueConfig::default_config()
    };

    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(max_age_ms) = args.max_age_ms {
        config.cache.max_age_ms = max_age_ms;
    }
    if let Some(sweep_every) = args.sweep_every {
        config.cache.sweep_every_days = sweep_every;
    }
    Ok(config)
}

fn build_plan(args: &Args) -> Result<RunPlan> {
    let stats = split_csv(&args.stats)
        .iter()
        .map(|token| token.parse::<Stat>())
        .collect::<Result<Vec<_>, _>>()
        .context("invalid --stats")?;
    Ok(RunPlan {
        days: args.days,
        stats,
        leaders: args.leaders,
        profile_sample: args.profiles,
        interleave: args.interleave,
    })
}

fn split_csv(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
