//! CLI entry point for treeverse

use std::io;
use std::path::PathBuf;
use std::process;
use std::time::{Duration, SystemTime};

use clap::{Parser, Subcommand, ValueEnum};
use treeverse::{
    CallbackKind, CallbackRegistry, Error, Format, Result, WalkerConfig, map_tree_parallel,
    read_tree, reduce_tree, traverse, write_tree,
};

/// Depth limit used when `--level` is not given.
const DEFAULT_DEPTH_LIMIT: usize = 100;

/// Document format on stdin/stdout
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum DocumentFormat {
    /// YAML documents
    #[default]
    Yaml,
    /// Pretty-printed JSON documents
    Json,
}

impl From<DocumentFormat> for Format {
    fn from(format: DocumentFormat) -> Self {
        match format {
            DocumentFormat::Yaml => Format::Yaml,
            DocumentFormat::Json => Format::Json,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "treeverse")]
#[command(about = "Build a file tree, then filter, map and reduce it in stages")]
#[command(version)]
struct Args {
    /// Format of the tree document read from stdin and written to stdout
    #[arg(long = "format", value_name = "FORMAT", default_value = "yaml", global = true)]
    format: DocumentFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk a directory, filter the tree and print it (optionally mapped)
    Traverse(TraverseArgs),

    /// Read a tree from stdin and rewrite every annotation with a mapper
    Map {
        /// Registered mapper name
        #[arg(short = 'c', long = "mapper")]
        mapper: String,

        /// Number of parallel workers
        /// (0 = auto-detect, 1 = sequential, N = use N workers)
        #[arg(short = 'j', long = "jobs", default_value = "1")]
        jobs: usize,
    },

    /// Read a tree from stdin and fold it bottom-up with a reducer
    Reduce {
        /// Registered reducer name
        #[arg(short = 'r', long = "reducer")]
        reducer: String,
    },

    /// List the registered predicates, mappers and reducers
    Callbacks,
}

#[derive(clap::Args, Debug)]
struct TraverseArgs {
    /// Directory (or file) to start from
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Descend only N levels deep (default: 100)
    #[arg(short = 'L', long = "level")]
    level: Option<usize>,

    /// File extensions to include (comma-separated, case-insensitive)
    #[arg(short = 'e', long = "extensions", value_delimiter = ',')]
    extensions: Vec<String>,

    /// Keep files that are not text
    #[arg(long = "include-binary")]
    include_binary: bool,

    /// Registered predicate to apply (can be used multiple times)
    #[arg(short = 'f', long = "filter", value_name = "NAME")]
    filters: Vec<String>,

    /// Ignore files matching pattern (can be used multiple times)
    #[arg(short = 'I', long = "ignore")]
    ignore: Vec<String>,

    /// Only keep files modified more recently than DURATION ago
    /// Duration format: 30s, 5m, 1h, 7d, 2w, 3M, 1y
    #[arg(long = "newer", value_name = "DURATION")]
    newer: Option<String>,

    /// Only keep files modified longer than DURATION ago
    /// Duration format: 30s, 5m, 1h, 7d, 2w, 3M, 1y
    #[arg(long = "older", value_name = "DURATION")]
    older: Option<String>,

    /// Registered mapper to run on the filtered tree
    #[arg(short = 'c', long = "mapper")]
    mapper: Option<String>,

    /// Number of parallel workers for the mapper
    /// (0 = auto-detect, 1 = sequential, N = use N workers)
    #[arg(short = 'j', long = "jobs", default_value = "1")]
    jobs: usize,
}

/// Parse a duration string like "1h", "7d", "2w" into a Duration.
fn parse_duration_string(s: &str) -> std::result::Result<Duration, String> {
    humantime::parse_duration(s.trim()).map_err(|e| e.to_string())
}

/// Turn a `--newer`/`--older` value into the cutoff time it describes.
fn cutoff(flag: &str, value: Option<&String>) -> Result<Option<SystemTime>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let duration = parse_duration_string(value)
        .map_err(|e| Error::InvalidArgument(format!("invalid {} duration '{}': {}", flag, value, e)))?;
    SystemTime::now()
        .checked_sub(duration)
        .map(Some)
        .ok_or_else(|| Error::InvalidArgument(format!("{} duration '{}' is too large", flag, value)))
}

fn run_traverse(args: TraverseArgs, registry: &CallbackRegistry, format: Format) -> Result<()> {
    // Resolve every callback before touching the filesystem.
    let extra = registry.predicates(&args.filters)?;
    let mapper = args.mapper.as_deref().map(|name| registry.mapper(name)).transpose()?;

    let config = WalkerConfig {
        max_depth: Some(args.level.unwrap_or(DEFAULT_DEPTH_LIMIT)),
        text_only: !args.include_binary,
        extensions: args.extensions,
        ignore_patterns: args.ignore,
        newer_than: cutoff("--newer", args.newer.as_ref())?,
        older_than: cutoff("--older", args.older.as_ref())?,
        parallel_workers: args.jobs,
    };

    let tree = match traverse(&args.path, &config, extra)? {
        Some(t) => t,
        None => {
            eprintln!("No files found matching the specified criteria.");
            process::exit(1);
        }
    };
    log::info!("traverse kept {} nodes", tree.node_count());

    let tree = match mapper {
        Some(mapper) => map_tree_parallel(tree, &*mapper, config.parallel_workers),
        None => tree,
    };
    write_tree(io::stdout().lock(), &tree, format)
}

fn run(args: Args) -> Result<()> {
    let registry = CallbackRegistry::with_builtins();
    let format = Format::from(args.format);

    match args.command {
        Command::Traverse(traverse_args) => run_traverse(traverse_args, &registry, format),
        Command::Map { mapper, jobs } => {
            let mapper = registry.mapper(&mapper)?;
            let tree = read_tree(io::stdin().lock(), format)?;
            let tree = map_tree_parallel(tree, &*mapper, jobs);
            log::info!("mapped {} nodes", tree.node_count());
            write_tree(io::stdout().lock(), &tree, format)
        }
        Command::Reduce { reducer } => {
            let reducer = registry.reducer(&reducer)?;
            let tree = read_tree(io::stdin().lock(), format)?;
            let tree = reduce_tree(tree, &*reducer);
            log::info!("reduced {} nodes", tree.node_count());
            write_tree(io::stdout().lock(), &tree, format)
        }
        Command::Callbacks => {
            for kind in [CallbackKind::Predicate, CallbackKind::Mapper, CallbackKind::Reducer] {
                println!("{}s:", kind);
                for name in registry.names(kind) {
                    println!("  {}", name);
                }
            }
            Ok(())
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("treeverse: {}", e);
        process::exit(1);
    }
}
