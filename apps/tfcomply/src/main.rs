//! tfcomply CLI binary entry point.
//! Resolves configuration, runs the scan pipeline and prints results.

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tfcomply::catalog::Catalog;
use tfcomply::cli::{Cli, Commands, ScanArgs};
use tfcomply::config::{self, CliOverrides, Effective};
use tfcomply::discover::discover;
use tfcomply::error::RunError;
use tfcomply::models::ScanSummary;
use tfcomply::report::{render_report, ReportMeta};
use tfcomply::utils::{error_prefix, note_prefix};
use tfcomply::{output, Engine};
use tracing::debug;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);
    let result = match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        Commands::Check { scan, output } => cmd_check(scan, output),
        Commands::Report {
            scan,
            out,
            module_name,
        } => cmd_report(scan, out, module_name),
        Commands::Rules {
            root,
            rules_file,
            output,
        } => cmd_rules(root, rules_file, output),
    };
    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("{} {}", error_prefix(), err);
            ExitCode::from(err.exit_code())
        }
    }
}

/// Initialize tracing based on CLI flags; `RUST_LOG` wins when set.
fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
    debug!("logging initialized at level: {}", level);
}

fn resolve(scan: ScanArgs, output: Option<String>) -> Result<Effective, RunError> {
    let eff = config::resolve_effective(&CliOverrides {
        root: scan.root,
        paths: scan.paths,
        output,
        rules_file: scan.rules_file,
        timeout_ms: scan.timeout_ms,
        jobs: scan.jobs,
    })?;
    if eff.config_file.is_none() && !eff.output.is_json() {
        eprintln!("{} No tfcomply.toml found; using defaults.", note_prefix());
    }
    Ok(eff)
}

fn run_scan(eff: &Effective, announce: bool) -> Result<ScanSummary, RunError> {
    let catalog = Catalog::load(eff.rules_file.as_deref(), &eff.overrides)?;
    // empty corpus aborts here, before any rule runs
    let files = discover(&eff.root, &eff.patterns)?;
    if announce {
        println!(
            "Checking {} Terraform files for HIPAA compliance...",
            files.len()
        );
    }
    let engine = Engine::new(catalog);
    Ok(engine.scan_files_with_jobs(&eff.root, &files, eff.limits, eff.jobs)?)
}

fn cmd_check(scan: ScanArgs, mode: Option<String>) -> Result<u8, RunError> {
    let eff = resolve(scan, mode)?;
    let summary = run_scan(&eff, !eff.output.is_json())?;
    output::print_check(&summary, eff.output);
    Ok(summary.verdict().exit_code() as u8)
}

fn cmd_report(
    scan: ScanArgs,
    out: Option<String>,
    module_name: Option<String>,
) -> Result<u8, RunError> {
    let eff = resolve(scan, None)?;
    let summary = run_scan(&eff, false)?;
    let meta = ReportMeta::now(module_name.unwrap_or_else(|| eff.module_name.clone()));
    let md = render_report(&summary, &meta);
    match out {
        Some(path) => {
            let path = PathBuf::from(path);
            fs::write(&path, md).map_err(|source| RunError::Write {
                path: path.clone(),
                source,
            })?;
            eprintln!("{} report written to {}", note_prefix(), path.display());
        }
        None => print!("{}", md),
    }
    Ok(0)
}

fn cmd_rules(
    root: Option<String>,
    rules_file: Option<String>,
    output: Option<String>,
) -> Result<u8, RunError> {
    let eff = config::resolve_effective(&CliOverrides {
        root,
        rules_file,
        output,
        ..CliOverrides::default()
    })?;
    let catalog = Catalog::load(eff.rules_file.as_deref(), &eff.overrides)?;
    output::print_rules(&catalog.rules, eff.output);
    Ok(0)
}
