//! CLI entry point for polsat.
//!
//! This module is intentionally thin: it handles argument parsing, I/O, and exit codes.
//! All business logic lives in the `polsat-app` crate.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use polsat_app::{
    AuthorizeInput, ExplainOutput, decision_exit_code, format_explanation, format_not_found,
    parse_report_json, render_markdown, run_authorize, run_explain, runtime_error_report,
    to_renderable, write_report, write_text,
};
use polsat_settings::Overrides;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(
    name = "polsat",
    version,
    about = "Policy satisfiability engine for authorization decisions"
)]
struct Cli {
    /// Path to polsat config TOML.
    #[arg(long, default_value = "polsat.toml", global = true)]
    config: Utf8PathBuf,

    /// Override profile (strict|lenient|fetch-only).
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Override strict access (true|false).
    #[arg(long, global = true)]
    strict_access: Option<bool>,

    /// Skip checking and only fetch must-fetch requests.
    #[arg(long, global = true)]
    fetch_only: bool,

    /// Log the final report at info level on the `polsat_domain::report` target.
    #[arg(long, global = true)]
    log_final_report: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decide a request document and write artifacts.
    Authorize {
        /// Request document (TOML) with the user, requests, and data sources.
        #[arg(long)]
        input: Utf8PathBuf,

        /// Where to write the JSON report.
        #[arg(long, default_value = "artifacts/polsat/report.json")]
        report_out: Utf8PathBuf,

        /// Write a Markdown report alongside the JSON.
        #[arg(long)]
        write_markdown: bool,

        /// Where to write the Markdown report (if enabled).
        #[arg(long, default_value = "artifacts/polsat/comment.md")]
        markdown_out: Utf8PathBuf,
    },

    /// Render markdown from an existing JSON report.
    Md {
        /// Path to the JSON report file.
        #[arg(long, default_value = "artifacts/polsat/report.json")]
        report: Utf8PathBuf,

        /// Where to write the Markdown output (if not specified, prints to stdout).
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },

    /// Explain a rule kind or error code.
    Explain {
        /// The rule kind (e.g., "forbid_unless") or code (e.g., "dependency_deadlock").
        identifier: String,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match &cli.cmd {
        Commands::Authorize {
            input,
            report_out,
            write_markdown,
            markdown_out,
        } => cmd_authorize(&cli, input, report_out, *write_markdown, markdown_out),
        Commands::Md { report, output } => cmd_md(report, output.as_deref()),
        Commands::Explain { identifier } => cmd_explain(identifier),
    }
}

/// Logs go to stderr so stdout stays clean for `md` and `explain` output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn overrides(cli: &Cli) -> Overrides {
    Overrides {
        profile: cli.profile.clone(),
        strict_access: cli.strict_access,
        fetch_only: cli.fetch_only.then_some(true),
        log_final_report: cli.log_final_report.then_some(true),
    }
}

fn cmd_authorize(
    cli: &Cli,
    input: &Utf8Path,
    report_out: &Utf8Path,
    write_markdown: bool,
    markdown_out: &Utf8Path,
) -> anyhow::Result<()> {
    let result = (|| -> anyhow::Result<i32> {
        // Missing config file is allowed (defaults apply).
        let config_text = std::fs::read_to_string(&cli.config).unwrap_or_default();
        let document_text = std::fs::read_to_string(input)
            .with_context(|| format!("read request document: {input}"))?;
        debug!(%input, config = %cli.config, "authorize");

        let output = run_authorize(AuthorizeInput {
            document_text: &document_text,
            config_text: &config_text,
            overrides: overrides(cli),
        })?;

        write_report(report_out, &output.envelope).context("write report json")?;
        if write_markdown {
            let md = render_markdown(&to_renderable(&output.envelope));
            write_text(markdown_out, &md).context("write markdown")?;
        }

        Ok(decision_exit_code(output.decision))
    })();

    match result {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(err) => {
            let report = runtime_error_report(&format!("{err:#}"));
            let _ = write_report(report_out, &report);
            eprintln!("polsat error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn cmd_md(report_path: &Utf8Path, output: Option<&Utf8Path>) -> anyhow::Result<()> {
    let report_text = std::fs::read_to_string(report_path)
        .with_context(|| format!("read report: {report_path}"))?;
    let report = parse_report_json(&report_text)?;
    let md = render_markdown(&to_renderable(&report));

    if let Some(out_path) = output {
        write_text(out_path, &md).context("write markdown output")?;
    } else {
        print!("{md}");
    }

    Ok(())
}

fn cmd_explain(identifier: &str) -> anyhow::Result<()> {
    match run_explain(identifier) {
        ExplainOutput::Found(topic) => {
            print!("{}", format_explanation(&topic));
            Ok(())
        }
        ExplainOutput::NotFound { identifier } => {
            eprint!("{}", format_not_found(&identifier));
            std::process::exit(1);
        }
    }
}
