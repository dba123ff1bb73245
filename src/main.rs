mod aggregate;
mod calendar;
mod classify;
mod config;
mod error;
mod extract;
mod kingdom;
mod news;
mod report;

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use news_types::KingdomKey;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use aggregate::{NewsAnalysis, NoiseFilter, Side, analyze, on_side, unique_attacks};
use config::{AnalysisConfig, Overrides, parse_kingdom_arg};
use error::Result;
use news::{NewsLog, parse_news};

const OUTPUT_DIR: &str = "output";

#[derive(Parser)]
#[command(
    name = "utopia_news",
    about = "Utopia kingdom news analyzer",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the full text report for one news paste
    Report {
        /// News paste; stdin when omitted or "-"
        input: Option<PathBuf>,
        #[command(flatten)]
        analysis: AnalysisArgs,
        /// Print the aggregate as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the classified event records as JSON
    Records {
        /// News paste; stdin when omitted or "-"
        input: Option<PathBuf>,
    },
    /// Compare unique-attack counts across several window sizes
    Uniques {
        /// News paste; stdin when omitted or "-"
        input: Option<PathBuf>,
        #[command(flatten)]
        analysis: AnalysisArgs,
        /// Extra window sizes in game days, e.g. --windows 3 10; the
        /// configured window always comes first
        #[arg(long, num_args = 1..)]
        windows: Vec<f64>,
    },
    /// Analyze every *.txt paste under a directory → output/
    Batch {
        /// Directory of news pastes
        #[arg(default_value = ".")]
        dir: PathBuf,
        #[command(flatten)]
        analysis: AnalysisArgs,
    },
}

#[derive(Args, Clone)]
struct AnalysisArgs {
    /// Home kingdom, e.g. 3:12
    #[arg(long, value_parser = parse_kingdom_arg)]
    home: Option<KingdomKey>,
    /// Counterpart kingdom, e.g. 6:7
    #[arg(long, value_parser = parse_kingdom_arg)]
    enemy: Option<KingdomKey>,
    /// Unique-attack window in game days
    #[arg(long)]
    window: Option<f64>,
    /// TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl AnalysisArgs {
    fn resolve(&self) -> Result<AnalysisConfig> {
        AnalysisConfig::resolve(
            self.config.as_deref(),
            Overrides {
                home: self.home.clone(),
                enemy: self.enemy.clone(),
                unique_window: self.window,
            },
        )
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Report {
            input,
            analysis,
            json,
        } => run_report(input.as_deref(), &analysis, json),
        Command::Records { input } => run_records(input.as_deref()),
        Command::Uniques {
            input,
            analysis,
            windows,
        } => run_uniques(input.as_deref(), &analysis, &windows),
        Command::Batch { dir, analysis } => run_batch(&dir, &analysis),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  INPUT / OUTPUT HELPERS
// ═══════════════════════════════════════════════════════════════════════

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => {
            info!(path = %path.display(), "reading news");
            Ok(std::fs::read_to_string(path)?)
        }
        _ => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn output_path(name: &str) -> PathBuf {
    Path::new(OUTPUT_DIR).join(name)
}

fn write_text(name: &str, text: &str) -> Result<()> {
    let path = output_path(name);
    std::fs::write(&path, text)?;
    info!(path = %path.display(), bytes = text.len(), "wrote");
    Ok(())
}

fn write_json<T: serde::Serialize>(name: &str, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    write_text(name, &json)
}

fn analyze_text(text: &str, config: &AnalysisConfig) -> Result<(NewsLog, NewsAnalysis)> {
    let noise = NoiseFilter::from_config(config)?;
    let log = parse_news(text);
    let analysis = analyze(&log, config, &noise);
    Ok((log, analysis))
}

// ═══════════════════════════════════════════════════════════════════════
//  REPORT / RECORDS MODE: one paste → stdout
// ═══════════════════════════════════════════════════════════════════════

fn run_report(input: Option<&Path>, args: &AnalysisArgs, json: bool) -> Result<()> {
    let config = args.resolve()?;
    let text = read_input(input)?;
    let (_, analysis) = analyze_text(&text, &config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print!("{}", report::render_report(&analysis));
    }
    Ok(())
}

fn run_records(input: Option<&Path>) -> Result<()> {
    let text = read_input(input)?;
    let log = parse_news(&text);
    info!(
        lines = log.lines.len(),
        records = log.records.len(),
        "classified news"
    );
    println!("{}", serde_json::to_string_pretty(&log.records)?);
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
//  UNIQUES MODE: the same paste under several window sizes
// ═══════════════════════════════════════════════════════════════════════

fn run_uniques(input: Option<&Path>, args: &AnalysisArgs, extra: &[f64]) -> Result<()> {
    let config = args.resolve()?;
    let windows = config.compare_windows(extra);
    let text = read_input(input)?;
    let (log, analysis) = analyze_text(&text, &config)?;

    println!("Unique attacks, made / suffered");
    let mut header = format!("{:<10}", "Kingdom");
    for w in &windows {
        header.push_str(&format!("{:>18}", format!("window {w}")));
    }
    println!("{header}");

    for section in &analysis.kingdoms {
        let mut row = format!("{:<10}", section.kingdom.to_string());
        for &w in &windows {
            let count = |side: Side| {
                unique_attacks(
                    log.records.iter().filter(|r| on_side(r, side, &section.kingdom)),
                    side,
                    w,
                )
            };
            row.push_str(&format!(
                "{:>18}",
                format!("{} / {}", count(Side::Made), count(Side::Suffered))
            ));
        }
        println!("{row}");
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
//  BATCH MODE: every paste in a directory → output/
// ═══════════════════════════════════════════════════════════════════════

fn run_batch(dir: &Path, args: &AnalysisArgs) -> Result<()> {
    let config = args.resolve()?;
    std::fs::create_dir_all(OUTPUT_DIR)?;

    let mut done = 0usize;
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != OUTPUT_DIR);
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("skipping unreadable entry: {e}");
                continue;
            }
        };
        let path = entry.path();
        let is_paste = path.extension().is_some_and(|e| e == "txt")
            && !path.to_string_lossy().ends_with(".report.txt");
        if !entry.file_type().is_file() || !is_paste {
            continue;
        }
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };

        let text = std::fs::read_to_string(path)?;
        let (_, analysis) = analyze_text(&text, &config)?;
        write_text(&format!("{stem}.report.txt"), &report::render_report(&analysis))?;
        write_json(&format!("{stem}.json"), &analysis)?;
        done += 1;
    }

    info!(files = done, dir = %dir.display(), "batch complete");
    Ok(())
}
