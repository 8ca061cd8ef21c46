#[macro_use]
extern crate prettytable;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Command, CommandFactory, Parser};
use clap_complete::{generate, Generator, Shell};
use clap_verbosity_flag::Verbosity;
use console::style;
use tracing::warn;
use tracing_log::AsTrace;
use std::ffi::OsString;
use std::io;

mod core;
mod fetcher;
mod gitlab;
mod report;
mod settings;
mod table;

use crate::gitlab::merge_request::State;
use crate::report::markdown::MarkdownReport;
use crate::report::{Report, ReportRequest};
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Markdown,
}

impl std::convert::From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => OutputFormat::Markdown,
            _ => OutputFormat::Table,
        }
    }
}

/// List a GitLab user's open or merged merge requests, grouped by project.
///
/// GITLAB_URL and GITLAB_TOKEN must point at the instance and carry an access
/// token with `read_api` scope.
#[derive(Debug, Parser)]
#[command(name = "mrs", author, version, about, long_about)] // Read from `Cargo.toml`
struct Cli {
    // If provided, outputs the completion file for given shell
    #[arg(long = "generate", value_enum)]
    generator: Option<Shell>,

    /// YAML file with `url`, `token` and `timeout_secs`
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    config: Option<std::path::PathBuf>,

    #[command(flatten)]
    verbose: Verbosity,

    /// GitLab username whose merge requests are listed
    #[arg(required_unless_present = "generator", value_parser = clap::builder::NonEmptyStringValueParser::new())]
    username: Option<String>,

    #[arg(value_enum, required_unless_present = "generator")]
    state: Option<State>,

    /// Project ids or `namespace/path`s; all projects when omitted
    projects: Vec<String>,

    /// Drop merge requests merged before this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", required_if_eq("state", "merged"))]
    since: Option<NaiveDate>,

    /// Markdown output, same as `--output markdown`
    #[arg(long)]
    md: bool,

    /// `table` or `markdown`; anything else falls back to `table`
    #[arg(short, long, default_value = "table")]
    output: OutputFormat,

    /// How many projects to query at the same time
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    jobs: u16,

    /// Unrecognized flags dropped by `parse_lenient`
    #[arg(skip)]
    ignored: Vec<String>,
}

impl Cli {
    /// Like `try_parse_from`, except that an unrecognized flag such as `--csv`
    /// is dropped and leaves the output in table mode.
    fn parse_lenient<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let mut ignored = Vec::new();

        loop {
            match Self::try_parse_from(args.iter().cloned()) {
                Ok(mut cli) => {
                    cli.ignored = ignored;
                    return Ok(cli);
                }
                Err(e) if e.kind() == ErrorKind::UnknownArgument => {
                    let Some(ContextValue::String(unknown)) = e.get(ContextKind::InvalidArg) else {
                        return Err(e);
                    };
                    let unknown = unknown.clone();

                    let before = args.len();
                    args.retain(|arg| arg.to_str() != Some(unknown.as_str()));
                    if args.len() == before {
                        return Err(e);
                    }

                    ignored.push(unknown);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn output_format(&self) -> OutputFormat {
        if self.md {
            OutputFormat::Markdown
        } else {
            self.output
        }
    }

    fn report_request(&self) -> Option<ReportRequest> {
        Some(ReportRequest {
            username: self.username.clone()?,
            state: self.state?,
            projects: self.projects.clone(),
            since: self.since,
            jobs: usize::from(self.jobs),
        })
    }
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_lenient(std::env::args_os()).unwrap_or_else(|e| e.exit());

    tracing_subscriber::fmt()
        .with_max_level(cli.verbose.log_level_filter().as_trace())
        .with_writer(io::stderr)
        .init();

    for flag in &cli.ignored {
        warn!("Ignoring unknown flag {flag}, printing tables");
    }

    if let Some(generator) = cli.generator {
        let mut cmd = Cli::command();
        eprintln!("Generating completion file for {generator:?}...");
        print_completions(generator, &mut cmd);

        return Ok(());
    }

    let Some(request) = cli.report_request() else {
        Cli::command().print_help()?;
        std::process::exit(2);
    };

    let settings = Settings::new(cli.config.as_deref())?;
    let client = gitlab::Client::new(&settings.gitlab)?;

    match Report::generate(&client, &request, Utc::now()).await? {
        None => {
            eprintln!(
                "{}",
                style(format!("User with username {} not found", request.username)).yellow()
            );
        }
        Some(report) => match cli.output_format() {
            OutputFormat::Markdown => println!("{}", report.to_markdown()?),
            OutputFormat::Table => print!("{}", table::render(&report)),
        },
    }

    Ok(())
}
