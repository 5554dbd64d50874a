use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use bugtrail_core::{Algorithm, BugtrailConfig, OutputFormat};
use bugtrail_dataset::features::{compute_features, NameDates, ReleaseCatalog};
use bugtrail_dataset::history::GitRepository;
use bugtrail_dataset::pipeline::build_dataset;
use bugtrail_dataset::reducer::Dataset;
use bugtrail_dataset::tickets::JsonTicketExport;
use clap::{Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "bugtrail",
    version,
    about = "Build release-aligned defect datasets from git history",
    long_about = "Bugtrail links commits, releases and bug tickets into one timeline.\n\n\
                   Revert pairs are dropped, commits are assigned to half-open release\n\
                   windows, tickets are placed on their opening, fixed and affected\n\
                   releases, and everything is truncated to the first half of the releases.\n\n\
                   Examples:\n  \
                     bugtrail init\n  \
                     bugtrail build --repo ../bookkeeper --tickets bookkeeper.json --project BOOKKEEPER\n  \
                     bugtrail build --output dataset.json --algorithm increment"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .bugtrail.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable summary (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose output (debug logging unless RUST_LOG is set)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build the defect dataset for a project
    #[command(long_about = "Build the defect dataset for a project.\n\n\
        Reads the full history and tags of a git repository plus an exported\n\
        list of tracker tickets, links them, and truncates the result to the\n\
        observation horizon.\n\n\
        Examples:\n  bugtrail build --repo . --tickets tickets.json --project ABC\n  \
        bugtrail build --output dataset.json")]
    Build {
        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Exported ticket file (JSON array)
        #[arg(long)]
        tickets: Option<PathBuf>,

        /// Project name; selects tickets keyed `<PROJECT>-<n>`
        #[arg(long)]
        project: Option<String>,

        /// Estimation algorithm for the downstream stage
        #[arg(long)]
        algorithm: Option<Algorithm>,

        /// Branch to walk instead of HEAD
        #[arg(long)]
        branch: Option<String>,

        /// Write the dataset as JSON to this file
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Create a default .bugtrail.toml in the current directory
    Init,
}

const DEFAULT_CONFIG: &str = r#"# Bugtrail configuration

[history]
# Walk this branch instead of HEAD.
# branch = "master"

[tracker]
# Tickets are selected by key prefix, e.g. BOOKKEEPER-123.
# project = "BOOKKEEPER"
# export = "tickets.json"

[dataset]
# proportion | increment
algorithm = "proportion"
"#;

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<BugtrailConfig> {
    match path {
        Some(path) => BugtrailConfig::from_file(path)
            .into_diagnostic()
            .wrap_err(format!("reading {}", path.display())),
        None => {
            let default_path = Path::new(".bugtrail.toml");
            if default_path.exists() {
                BugtrailConfig::from_file(default_path).into_diagnostic()
            } else {
                Ok(BugtrailConfig::default())
            }
        }
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    setup_logging(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Build {
            ref repo,
            ref tickets,
            ref project,
            algorithm,
            ref branch,
            ref output,
        } => {
            let Some(project) = project.clone().or_else(|| config.tracker.project.clone()) else {
                miette::bail!(miette::miette!(
                    help = "Pass --project or set [tracker] project in .bugtrail.toml",
                    "No project name given"
                ));
            };
            let Some(export) = tickets.clone().or_else(|| config.tracker.export.clone()) else {
                miette::bail!(miette::miette!(
                    help = "Pass --tickets or set [tracker] export in .bugtrail.toml",
                    "No ticket export given"
                ));
            };
            let algorithm = algorithm.unwrap_or(config.dataset.algorithm);
            let branch = branch.clone().or_else(|| config.history.branch.clone());

            let source = GitRepository::open(repo)
                .into_diagnostic()
                .wrap_err(format!("Not a git repository: {}", repo.display()))?
                .with_branch(branch);
            let tracker = JsonTicketExport::new(export);

            let spinner = if std::io::stderr().is_terminal() {
                let pb = indicatif::ProgressBar::new_spinner();
                pb.set_style(
                    indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
                        .into_diagnostic()?,
                );
                pb.set_message(format!("Mining {} ...", repo.display()));
                pb.enable_steady_tick(std::time::Duration::from_millis(120));
                Some(pb)
            } else {
                None
            };

            let result = build_dataset(&source, &tracker, &project);
            drop(source);
            if let Some(pb) = &spinner {
                pb.finish_and_clear();
            }
            let dataset = result.into_diagnostic()?;
            let names = compute_features(&dataset.releases, &dataset.tickets, &mut ReleaseCatalog)
                .into_diagnostic()?;

            if let Some(path) = output {
                let json = dataset_json(&dataset, &names, &project, algorithm)?;
                std::fs::write(path, serde_json::to_string_pretty(&json).into_diagnostic()?)
                    .into_diagnostic()
                    .wrap_err(format!("writing {}", path.display()))?;
                eprintln!("Wrote dataset to {}", path.display());
            }

            match cli.format {
                OutputFormat::Json => {
                    let json = dataset_json(&dataset, &names, &project, algorithm)?;
                    println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
                }
                OutputFormat::Markdown => print_markdown(&dataset, &project, algorithm),
                OutputFormat::Text => print_text(&dataset, &project, algorithm),
            }
        }
        Command::Init => {
            let path = Path::new(".bugtrail.toml");
            if path.exists() {
                miette::bail!(".bugtrail.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .bugtrail.toml with default configuration");
        }
    }

    Ok(())
}

fn dataset_json(
    dataset: &Dataset,
    names: &NameDates,
    project: &str,
    algorithm: Algorithm,
) -> Result<serde_json::Value> {
    let mut json = serde_json::Map::new();
    json.insert("project".into(), serde_json::Value::from(project));
    json.insert(
        "algorithm".into(),
        serde_json::to_value(algorithm).into_diagnostic()?,
    );
    json.insert(
        "horizon".into(),
        serde_json::to_value(dataset.horizon_date()).into_diagnostic()?,
    );
    json.insert(
        "releases".into(),
        serde_json::to_value(&dataset.releases).into_diagnostic()?,
    );
    json.insert(
        "tickets".into(),
        serde_json::to_value(&dataset.tickets).into_diagnostic()?,
    );
    json.insert(
        "commits".into(),
        serde_json::to_value(&dataset.commits).into_diagnostic()?,
    );
    json.insert(
        "nameDates".into(),
        serde_json::to_value(names).into_diagnostic()?,
    );
    Ok(serde_json::Value::Object(json))
}

fn print_text(dataset: &Dataset, project: &str, algorithm: Algorithm) {
    println!("Dataset for {project} (algorithm: {algorithm})");
    match dataset.horizon_date() {
        Some(date) => println!("Horizon: {}", date.format("%Y-%m-%d")),
        None => println!("Horizon: none (fewer than two releases)"),
    }
    println!(
        "{} releases, {} commits, {} bug tickets\n",
        dataset.releases.len(),
        dataset.commits.len(),
        dataset.tickets.len()
    );

    for release in &dataset.releases {
        println!(
            "  {:>3}  {:<24} {}  {} commits",
            release.index,
            release.version_name,
            release.date.format("%Y-%m-%d"),
            release.commits.len()
        );
    }
}

fn print_markdown(dataset: &Dataset, project: &str, algorithm: Algorithm) {
    println!("# Defect Dataset: {project}\n");
    println!("**Algorithm:** {algorithm}\n");
    if let Some(date) = dataset.horizon_date() {
        println!("**Horizon:** {}\n", date.format("%Y-%m-%d"));
    }

    println!("## Releases\n");
    if dataset.releases.is_empty() {
        println!("No releases within the horizon.\n");
    } else {
        println!("| Index | Version | Date | Commits |");
        println!("|-------|---------|------|---------|");
        for r in &dataset.releases {
            println!(
                "| {} | `{}` | {} | {} |",
                r.index,
                r.version_name,
                r.date.format("%Y-%m-%d"),
                r.commits.len()
            );
        }
        println!();
    }

    println!("## Bug Tickets\n");
    if dataset.tickets.is_empty() {
        println!("No linked tickets.\n");
    } else {
        println!("| Key | Opening | Fixed | Affected |");
        println!("|-----|---------|-------|----------|");
        for t in &dataset.tickets {
            let affected: Vec<String> = t
                .affected_releases
                .iter()
                .map(|r| r.index.to_string())
                .collect();
            println!(
                "| {} | {} | {} | {} |",
                t.key,
                t.opening_release.index,
                t.fixed_release.index,
                affected.join(", ")
            );
        }
        println!();
    }
}
