use anyhow::Result;
use clap::{Parser, Subcommand};
use notefind::index::stats::show_stats;
use notefind::index::NoteIndex;
use notefind::new_note::NewNote;
use notefind::output::{print_hits, OutputFormat};
use notefind::query::{CompileMode, QueryCompiler};
use notefind::utils::logging::{self, LogTarget};
use notefind::utils::{get_config_path, AppConfig};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;

/// Exit codes follow fzf: 0 selected, 1 nothing selected, 2 error, 130 aborted.
const EXIT_NO_MATCH: u8 = 1;
const EXIT_ERROR: u8 = 2;
#[cfg(feature = "interactive")]
const EXIT_ABORTED: u8 = 130;

#[derive(Parser)]
#[command(name = "notefind")]
#[command(version, about = "Search-as-you-type for a directory of markdown notes")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Initial query for interactive search (when no subcommand is given)
    #[arg(trailing_var_arg = true)]
    query: Vec<String>,

    /// Notes directory
    #[arg(short = 'C', long = "directory", default_value = ".", global = true)]
    directory: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Search notes interactively and print the selected path
    Search {
        /// Initial query
        query: Option<String>,

        /// Hide the preview pane
        #[arg(long)]
        no_preview: bool,

        /// Comma-separated keys that also accept; the key used is printed first
        #[arg(long, value_delimiter = ',')]
        expect: Vec<String>,
    },
    /// Print the notes matching a query, best first
    Filter {
        #[arg(required = true)]
        query: Vec<String>,

        /// Maximum number of results
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Print score, title and tags
        #[arg(short, long)]
        long: bool,

        /// Print JSON lines
        #[arg(long, conflicts_with = "long")]
        json: bool,
    },
    /// Print the compiled query tree as JSON
    Dumpquery {
        query: Vec<String>,

        /// Compile as the interactive search would
        #[arg(long)]
        interactive: bool,
    },
    /// Index the notes and show statistics
    Stats,
    /// Create a note from the configured templates and print its path
    New {
        #[arg(required = true)]
        title: Vec<String>,

        /// Comma-separated tags for the header
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Print the configuration, or write the defaults with --init
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,

        /// Replace an existing configuration file
        #[arg(long, requires = "init")]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let interactive = matches!(cli.command, None | Some(Commands::Search { .. }));
    init_logging(interactive);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("notefind: {e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn init_logging(interactive: bool) {
    let target = if interactive {
        notefind::utils::get_log_path()
            .map(LogTarget::File)
            .unwrap_or(LogTarget::Stderr)
    } else {
        LogTarget::Stderr
    };
    if let Err(e) = logging::init(target) {
        eprintln!("notefind: {e:#}");
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %format!("{e:#}"), "using default configuration");
        AppConfig::default()
    });
    let root = cli.directory;

    match cli.command {
        Some(Commands::Search {
            query,
            no_preview,
            expect,
        }) => interactive(&root, &config, query.unwrap_or_default(), !no_preview, expect),
        Some(Commands::Filter {
            query,
            limit,
            long,
            json,
        }) => {
            let format = if json {
                OutputFormat::Json
            } else if long {
                OutputFormat::Long
            } else {
                OutputFormat::Paths
            };
            filter(&root, &config, &query.join(" "), limit.unwrap_or(config.filter_limit), format)
        }
        Some(Commands::Dumpquery { query, interactive }) => {
            let mode = if interactive {
                CompileMode::Interactive
            } else {
                CompileMode::Batch
            };
            let compiler = QueryCompiler::new(mode, config.recency_config());
            let node = compiler.compile(&query.join(" "))?;
            println!("{}", serde_json::to_string_pretty(&node)?);
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Stats) => {
            let (index, report) = NoteIndex::build(&root, config.build_options(io::stderr().is_terminal()))?;
            show_stats(index.root(), &report)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::New { title, tags }) => {
            let note = NewNote::new(title.join(" "), tags);
            let rel = note.create(&root, &config.new_note)?;
            println!("{}", display_path(&root, &rel).display());
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Config { init: true, force }) => {
            let path = AppConfig::default().save(force)?;
            println!("{}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Config { init: false, .. }) => {
            eprintln!("{}", get_config_path()?.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
        None => interactive(&root, &config, cli.query.join(" "), config.show_preview, Vec::new()),
    }
}

fn filter(root: &Path, config: &AppConfig, query: &str, limit: usize, format: OutputFormat) -> Result<ExitCode> {
    // Compile before indexing so a bad query fails fast.
    let node = QueryCompiler::new(CompileMode::Batch, config.recency_config()).compile(query)?;
    let (index, _) = NoteIndex::build(root, config.build_options(io::stderr().is_terminal()))?;

    let mut hits = index.search(&node, limit)?.documents;
    for hit in &mut hits {
        hit.path = display_path(root, &hit.path);
    }
    print_hits(&hits, format, io::stdout().is_terminal())?;

    Ok(if hits.is_empty() {
        ExitCode::from(EXIT_NO_MATCH)
    } else {
        ExitCode::SUCCESS
    })
}

#[cfg(feature = "interactive")]
fn interactive(
    root: &Path,
    config: &AppConfig,
    query: String,
    show_preview: bool,
    expect: Vec<String>,
) -> Result<ExitCode> {
    use anyhow::Context;
    use notefind::coordinator::Coordinator;
    use notefind::tui::{self, key::parse_key, Outcome, TuiOptions};
    use std::sync::Arc;

    let expect = expect
        .into_iter()
        .map(|name| {
            let key = parse_key(&name).with_context(|| format!("Invalid --expect key {name:?}"))?;
            Ok((name, key))
        })
        .collect::<Result<Vec<_>>>()?;
    let print_key = !expect.is_empty();

    let (index, _) = NoteIndex::build(root, config.build_options(io::stderr().is_terminal()))?;
    let coordinator = Coordinator::new();
    let compiler = QueryCompiler::new(CompileMode::Interactive, config.recency_config());
    let options = TuiOptions {
        initial_query: query,
        show_preview,
        expect,
    };

    match tui::run(&coordinator, Arc::new(index), compiler, options)? {
        Outcome::Accepted { key, hit } => {
            if print_key {
                println!("{key}");
            }
            match hit {
                Some(hit) => {
                    println!("{}", display_path(root, &hit.path).display());
                    Ok(ExitCode::SUCCESS)
                }
                None => Ok(ExitCode::from(EXIT_NO_MATCH)),
            }
        }
        Outcome::Aborted => Ok(ExitCode::from(EXIT_ABORTED)),
    }
}

#[cfg(not(feature = "interactive"))]
fn interactive(
    _root: &Path,
    _config: &AppConfig,
    _query: String,
    _show_preview: bool,
    _expect: Vec<String>,
) -> Result<ExitCode> {
    anyhow::bail!("interactive search is not available: built without the `interactive` feature")
}

/// Paths are printed relative to the working directory the user gave.
fn display_path(root: &Path, rel: &Path) -> PathBuf {
    if root == Path::new(".") {
        rel.to_path_buf()
    } else {
        root.join(rel)
    }
}
