//! CLI argument parsing via `clap`.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tfcomply",
    version,
    about = "Audit Terraform modules against HIPAA security controls",
    long_about = "tfcomply: a small, fast CLI that checks Terraform files for encryption, access control, logging, versioning and retention controls.\n\nConfiguration precedence: CLI > tfcomply.toml > defaults.",
    after_help = "Examples:\n  tfcomply check\n  tfcomply check --path 'stacks/**/*.tf' --output json\n  tfcomply report --out COMPLIANCE.md\n  tfcomply rules --output json",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[arg(short, long, global = true, help = "Log progress (info level)")]
    pub verbose: bool,
    #[arg(long, global = true, help = "Log debug details")]
    pub debug: bool,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Args, Default)]
/// Options shared by commands that scan files.
pub struct ScanArgs {
    #[arg(long, help = "Scan root (default: current dir, or nearest ancestor with tfcomply.toml/.git)")]
    pub root: Option<String>,
    #[arg(long = "path", help = "Glob relative to the root; repeatable (default: modules/**/*.tf)")]
    pub paths: Vec<String>,
    #[arg(long, help = "Extra rules file (TOML) extending the builtin table")]
    pub rules_file: Option<String>,
    #[arg(long, help = "Per-file read timeout in milliseconds (default: 5000)")]
    pub timeout_ms: Option<u64>,
    #[arg(long, help = "Worker threads (default: number of CPUs)")]
    pub jobs: Option<usize>,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current tfcomply version.")]
    Version,
    /// Pass/fail compliance gate
    #[command(
        about = "Run compliance checks",
        long_about = "Evaluate every rule against the discovered Terraform files. Exits 1 when any error finding exists or no files are found.",
        after_help = "Examples:\n  tfcomply check\n  tfcomply check --output json"
    )]
    Check {
        #[command(flatten)]
        scan: ScanArgs,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Narrative markdown report
    #[command(
        about = "Generate a markdown compliance report",
        long_about = "Render findings grouped by compliance dimension as a markdown document. Always exits 0 once the report is written.",
        after_help = "Examples:\n  tfcomply report\n  tfcomply report --out COMPLIANCE.md"
    )]
    Report {
        #[command(flatten)]
        scan: ScanArgs,
        #[arg(long, help = "Write the report to this file instead of stdout")]
        out: Option<String>,
        #[arg(long, help = "Module name shown in the report header")]
        module_name: Option<String>,
    },
    /// List the effective rule table
    #[command(
        about = "List rules",
        long_about = "Print the builtin rules, extended by --rules-file and filtered by [rules] overrides."
    )]
    Rules {
        #[arg(long, help = "Scan root used to find tfcomply.toml")]
        root: Option<String>,
        #[arg(long, help = "Extra rules file (TOML)")]
        rules_file: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}
