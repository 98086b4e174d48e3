use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use notesite_config::{Config, LoadOptions};
use notesite_ops::{
    BacklinksOptions, BuildOptions, CheckOptions, OperationError, Operations, ReportFormat,
};

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();

    let mut load = LoadOptions::default();
    if let Some(path) = cli.config {
        load = load.with_override_path(path);
    }
    let config = Config::load(load)?;
    let ops = Operations::new(config);

    match cli.command {
        Command::Build(args) => handle_build(&ops, args),
        Command::Check(args) => handle_check(&ops, args),
        Command::Backlinks(args) => handle_backlinks(&ops, args),
    }
}

fn handle_build(ops: &Operations, args: BuildArgs) -> Result<i32> {
    let BuildArgs {
        output,
        drafts,
        strict,
        format,
        quiet,
    } = args;

    let options = BuildOptions {
        output,
        include_drafts: drafts.then_some(true),
        strict,
        format: format.unwrap_or(FormatValue::Plain).into(),
    };

    match ops.build(options) {
        Ok(outcome) => {
            if !quiet {
                emit(&outcome.rendered)?;
                println!(
                    "wrote {} page(s), copied {} asset(s)",
                    outcome.pages_written.len(),
                    outcome.assets_copied
                );
            }
            Ok(outcome.exit_code)
        }
        Err(OperationError::Io { path, source }) => {
            eprintln!("I/O error on {}: {}", path.display(), source);
            Ok(4)
        }
        Err(err) => Err(err.into()),
    }
}

fn handle_check(ops: &Operations, args: CheckArgs) -> Result<i32> {
    let CheckArgs { drafts, format } = args;

    let options = CheckOptions {
        include_drafts: drafts.then_some(true),
        format: format.unwrap_or(FormatValue::Plain).into(),
    };

    match ops.check(options) {
        Ok(outcome) => {
            emit(&outcome.rendered)?;
            Ok(outcome.exit_code)
        }
        Err(OperationError::Io { path, source }) => {
            eprintln!("I/O error on {}: {}", path.display(), source);
            Ok(4)
        }
        Err(err) => Err(err.into()),
    }
}

fn handle_backlinks(ops: &Operations, args: BacklinksArgs) -> Result<i32> {
    let BacklinksArgs { reference, format } = args;

    let options = BacklinksOptions {
        reference,
        format: format.unwrap_or(FormatValue::Plain).into(),
    };

    match ops.backlinks(options) {
        Ok(outcome) => {
            emit(&outcome.rendered)?;
            Ok(outcome.exit_code)
        }
        Err(OperationError::InvalidInput(message)) => {
            eprintln!("{message}");
            Ok(1)
        }
        Err(err) => Err(err.into()),
    }
}

fn emit(content: &str) -> Result<()> {
    print!("{}", content);
    if !content.is_empty() && !content.ends_with('\n') {
        println!();
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "notesite static wiki builder",
    propagate_version = true
)]
struct Cli {
    /// Use a specific config file instead of the discovered one
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the site into the output directory
    Build(BuildArgs),
    /// Report issues without writing output
    Check(CheckArgs),
    /// List inbound references to a note
    Backlinks(BacklinksArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Override the configured output directory
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,
    /// Include documents flagged as drafts
    #[arg(long)]
    drafts: bool,
    /// Exit non-zero on warnings as well as errors
    #[arg(long)]
    strict: bool,
    /// Report format (plain or json)
    #[arg(long, value_enum)]
    format: Option<FormatValue>,
    /// Suppress the issue summary
    #[arg(long)]
    quiet: bool,
}

#[derive(Args)]
struct CheckArgs {
    /// Include documents flagged as drafts
    #[arg(long)]
    drafts: bool,
    /// Report format (plain or json)
    #[arg(long, value_enum)]
    format: Option<FormatValue>,
}

#[derive(Args)]
struct BacklinksArgs {
    /// Slug or title of the note to inspect
    #[arg(value_name = "NOTE")]
    reference: String,
    /// Report format (plain or json)
    #[arg(long, value_enum)]
    format: Option<FormatValue>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatValue {
    Plain,
    Json,
}

impl From<FormatValue> for ReportFormat {
    fn from(value: FormatValue) -> Self {
        match value {
            FormatValue::Plain => ReportFormat::Plain,
            FormatValue::Json => ReportFormat::Json,
        }
    }
}
