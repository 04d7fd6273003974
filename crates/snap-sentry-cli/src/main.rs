mod commands;
mod logging;
mod progress;

use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{ClassifyArgs, Cli, Commands, RunArgs};
use dotenv::dotenv;
use progress::CliReporter;
use snap_sentry_core::classify::{CopyProbe, GlobProbe, NoCopyProbe};
use snap_sentry_core::decision::Verdict;
use snap_sentry_core::progress::StageTimer;
use snap_sentry_core::runner::SnapraidRunner;
use snap_sentry_core::{AppConfig, GuardEngine, SilentReporter};
use tracing::{error, info};

/// Exit status when the run stops short of the confirmation gate.
const EXIT_NEEDS_REVIEW: u8 = 2;

fn main() -> ExitCode {
    dotenv().ok();

    let args = Cli::parse();

    let config = match snap_sentry_core::config::load_configuration(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            let _guard = logging::init_logger(None);
            error!("Error loading configuration: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let _guard = logging::init_logger(Some(&config));

    let result = match args.command {
        Some(Commands::Run(run_args)) => run_guard(&config, &run_args),
        Some(Commands::Classify(classify_args)) => run_classify(&config, &classify_args),
        Some(Commands::PrintConfig) => print_config(&config),
        None => {
            let _ = Cli::command().print_long_help();
            Ok(ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            error!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run_guard(config: &AppConfig, args: &RunArgs) -> anyhow::Result<ExitCode> {
    let mut engine =
        GuardEngine::new(config.clone()).ignore_delete_threshold(args.ignore_delete_threshold);
    if let Some(script) = &args.script {
        engine = engine.with_script_path(script);
    }

    let tool = SnapraidRunner::new(&config.snapraid_binary, &config.snapraid_config);
    let probe = build_probe(config, !args.no_probe);
    let reporter = CliReporter::new();

    let result = engine.run(&tool, probe.as_ref(), &reporter)?;

    println!();
    let total: Duration = result.timings.iter().map(|(_, d)| *d).sum();
    info!(
        "Finished in {}, script at {}",
        format!("{:.2}s", total.as_secs_f64()).green(),
        result.script_path.display()
    );
    Ok(report_verdict(&result.classification.verdict))
}

fn run_classify(config: &AppConfig, args: &ClassifyArgs) -> anyhow::Result<ExitCode> {
    let diff_lines = read_lines(&args.diff)?;
    let dup_lines = match &args.dup {
        Some(path) => read_lines(path)?,
        None => Vec::new(),
    };

    let engine =
        GuardEngine::new(config.clone()).ignore_delete_threshold(args.ignore_delete_threshold);
    let probe = build_probe(config, args.probe);
    let mut timer = StageTimer::new(
        &SilentReporter,
        Duration::from_millis(config.slow_stage_warn_ms),
    );

    let classification =
        engine.classify(&diff_lines, |_| Ok(dup_lines), probe.as_ref(), &mut timer)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&classification)?);
    } else {
        for section in classification.sections() {
            println!("{}", section);
            println!("{}", "-".repeat(10));
        }
    }
    Ok(report_verdict(&classification.verdict))
}

fn print_config(config: &AppConfig) -> anyhow::Result<ExitCode> {
    let rendered = toml::to_string_pretty(config).context("rendering configuration")?;
    println!("{}", rendered);
    Ok(ExitCode::SUCCESS)
}

fn build_probe(config: &AppConfig, enabled: bool) -> Box<dyn CopyProbe> {
    if enabled {
        Box::new(GlobProbe::new(&config.storage_root))
    } else {
        Box::new(NoCopyProbe)
    }
}

fn read_lines(path: &Path) -> anyhow::Result<Vec<String>> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::to_string)
        .collect())
}

fn report_verdict(verdict: &Verdict) -> ExitCode {
    if verdict.proceed {
        info!("{} {}", "Proceed:".green(), verdict);
        ExitCode::SUCCESS
    } else {
        error!("{} {}", "Manual review required:".red(), verdict);
        ExitCode::from(EXIT_NEEDS_REVIEW)
    }
}
