//! # Framescope CLI
//!
//! Replays recorded frame durations through the sampler, compares saved
//! benchmark reports and exports them in the supported formats.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

use framescope::{
    export_to, replay_durations, BenchmarkReport, BenchmarkSession, ExportFormat, FileSink, FrameSampler,
    FramescopeConfig, RegressionAnalyzer, ReportSink, RunCapture, StdoutSink,
};

#[derive(Parser)]
#[command(name = "framescope")]
#[command(about = "Frame-timing sampler, jank classifier and benchmark regression reports")]
#[command(version = long_version())]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/framescope/framescope.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Feed recorded frame durations (ms) through the sampler, one file per run
    Replay {
        /// Files of frame durations separated by whitespace or commas
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Subject name for every run (defaults to each file's stem)
        #[arg(short, long)]
        subject: Option<String>,

        /// Output format (json, csv, markdown, text)
        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// Also save the JSON report to this path
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Analyze the latest pair of runs of each subject in a saved report
    Compare {
        report: PathBuf,

        /// Only analyze this subject
        #[arg(short, long)]
        subject: Option<String>,
    },

    /// Re-export a saved JSON report
    Export {
        report: PathBuf,

        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// Write into this directory instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (built ",
        env!("BUILD_DATE"),
        ", ",
        env!("TARGET_TRIPLE"),
        ")"
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    info!("🎬 Framescope {}", env!("CARGO_PKG_VERSION"));
    if let Some(commit) = option_env!("GIT_COMMIT") {
        debug!("commit {}", commit);
    }

    // Load configuration
    let config = match FramescopeConfig::load(&cli.config) {
        Ok(config) => {
            info!("✅ Configuration loaded from: {}", cli.config);
            config
        }
        Err(e) => {
            if Path::new(&cli.config).exists() {
                error!("❌ Failed to load configuration: {:#}", e);
            } else {
                debug!("no configuration at {}: {:#}", cli.config, e);
            }
            info!("📝 Using default configuration");
            FramescopeConfig::default()
        }
    };

    let default_format: ExportFormat = config.export.default_format.parse()?;

    match cli.command {
        Command::Replay {
            files,
            subject,
            format,
            save,
        } => {
            let report = replay(&config, &files, subject.as_deref())?;
            if let Some(path) = save {
                std::fs::write(&path, report.to_json()?)
                    .with_context(|| format!("Failed to save report: {}", path.display()))?;
                info!("💾 Report saved to {}", path.display());
            }
            print!("{}", report.render(format.unwrap_or(default_format))?);
        }
        Command::Compare { report, subject } => {
            let report = load_report(&report)?;
            compare(&config, report, subject.as_deref())?;
        }
        Command::Export { report, format, output } => {
            let report = load_report(&report)?;
            let format = format.unwrap_or(default_format);
            let sink: Box<dyn ReportSink> = match output {
                Some(dir) => Box::new(FileSink::new(dir)),
                None => Box::new(StdoutSink),
            };
            export_to(&report, format, &config.export.filename_prefix, sink.as_ref());
        }
    }

    Ok(())
}

fn replay(config: &FramescopeConfig, files: &[PathBuf], subject: Option<&str>) -> Result<BenchmarkReport> {
    let mut session = BenchmarkSession::new();

    for file in files {
        let durations = read_durations(file)?;
        let name = match subject {
            Some(name) => name.to_string(),
            None => file
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "replay".to_string()),
        };

        let mut sampler = FrameSampler::from_config(config);
        let metrics = replay_durations(&mut sampler, &durations);
        info!(
            "📊 {}: {} samples, avg {:.1} FPS, {} jank, score {:.0}",
            name, metrics.sample_count, metrics.average_fps, metrics.jank_count, metrics.performance_score
        );
        session.record(&name, metrics, RunCapture::default());
    }

    let analyzer = RegressionAnalyzer::new(config.regression.clone());
    Ok(BenchmarkReport::from_session("Frame replay", &session, &analyzer))
}

fn compare(config: &FramescopeConfig, report: BenchmarkReport, subject: Option<&str>) -> Result<()> {
    let mut session = BenchmarkSession::new();
    for result in report.results {
        session.import(result);
    }

    let analyzer = RegressionAnalyzer::new(config.regression.clone());
    let analyses = match subject {
        Some(subject) => analyzer.analyze_latest(&session, subject).into_iter().collect(),
        None => analyzer.analyze_session(&session),
    };

    if analyses.is_empty() {
        warn!("⚠️ No subject has two runs to compare");
        return Ok(());
    }

    for analysis in &analyses {
        println!(
            "{}: run #{} vs #{} overall {:+.1}",
            analysis.subject, analysis.current_run, analysis.previous_run, analysis.overall_improvement
        );
        for (metric, c) in &analysis.metrics {
            println!(
                "  {:<26} {:>10.2} -> {:>10.2} ({:+.1}%) {:?}{}",
                metric.label(),
                c.previous,
                c.current,
                c.change_percent,
                c.status,
                if c.significant { " ⚠️" } else { "" }
            );
        }
    }
    Ok(())
}

fn load_report(path: &Path) -> Result<BenchmarkReport> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report: {}", path.display()))?;
    BenchmarkReport::from_json(&json).with_context(|| format!("Failed to parse report: {}", path.display()))
}

/// Parses frame durations in milliseconds separated by whitespace or commas
fn read_durations(path: &Path) -> Result<Vec<f64>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read durations: {}", path.display()))?;

    let durations = contents
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<f64>()
                .with_context(|| format!("Invalid frame duration '{}' in {}", token, path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    if durations.is_empty() {
        bail!("No frame durations in {}", path.display());
    }
    Ok(durations)
}
