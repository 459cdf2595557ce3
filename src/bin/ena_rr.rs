use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use ena_run_resolver::app::Reconciler;
use ena_run_resolver::config::ConfigLoader;
use ena_run_resolver::domain::{AccessionPattern, ProjectId};
use ena_run_resolver::ena::EnaHttpClient;
use ena_run_resolver::error::ResolverError;
use ena_run_resolver::output::{JsonOutput, OutputMode, TextOutput};
use ena_run_resolver::range::RangeExpander;

#[derive(Parser)]
#[command(name = "ena-rr")]
#[command(about = "Resolve ENA project samples (ERS) to their sequencing runs (ERR)")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true, help = "Print results as a single JSON document")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Resolve every pool member of a project to its run accession")]
    Resolve(ResolveArgs),
    #[command(about = "Expand a comma-separated accession list (offline)")]
    Expand(ExpandArgs),
}

#[derive(Args)]
struct ResolveArgs {
    #[arg(help = "Project accession, e.g. PRJEB211")]
    project: String,

    #[arg(long)]
    config: Option<String>,

    #[arg(long, help = "Run alias prefix prepended to member names")]
    alias_prefix: Option<String>,

    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Args)]
struct ExpandArgs {
    #[arg(help = "Accession list, e.g. ERS000001-ERS000010,ERS000042")]
    tokens: String,

    #[arg(long, default_value = "ERS")]
    prefix: String,

    #[arg(long, default_value_t = 6)]
    width: usize,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<ResolverError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &ResolverError) -> u8 {
    match error {
        ResolverError::SampleLinkNotFound { .. } | ResolverError::AmbiguousSampleLink { .. } => 2,
        error if error.is_retrieval() => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    match cli.command {
        Commands::Resolve(args) => run_resolve(args, output_mode),
        Commands::Expand(args) => run_expand(args, output_mode),
    }
}

fn run_resolve(args: ResolveArgs, output_mode: OutputMode) -> miette::Result<()> {
    let project = args.project.parse::<ProjectId>()?;
    let mut config = ConfigLoader::resolve(args.config.as_deref())?;
    if let Some(prefix) = args.alias_prefix {
        config.options.alias_prefix = prefix;
    }
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }

    let client = EnaHttpClient::with_settings(&config.base_url, config.timeout)?;
    let reconciler = Reconciler::new(client.clone(), client, config.options);

    match output_mode {
        OutputMode::Text => {
            let mut output = TextOutput::stdout();
            let summary = reconciler.run(&project, &mut output)?;
            output.print_summary(&summary);
            output.finish().into_diagnostic()?;
            Ok(())
        }
        OutputMode::Json => {
            let mut output = JsonOutput::new();
            let summary = reconciler.run(&project, &mut output)?;
            output.print_report(&summary).into_diagnostic()?;
            Ok(())
        }
    }
}

fn run_expand(args: ExpandArgs, output_mode: OutputMode) -> miette::Result<()> {
    let expander = RangeExpander::new(AccessionPattern::new(args.prefix, args.width))?;
    let ids = expander.expand(&args.tokens)?;
    match output_mode {
        OutputMode::Text => {
            for id in ids.iter() {
                println!("{id}");
            }
            Ok(())
        }
        OutputMode::Json => JsonOutput::print_identifiers(&ids).into_diagnostic(),
    }
}
