use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use usage_schema_core::{
    ArgumentParser, ParsedValue, ParserError, TypeListPolicy, UsageDocument, UsagePackage,
    validate_package,
};
use usage_schema_db::{
    DatabaseError, DocumentFormat, ParserConfig, UsageDatabase, bundle_documents, load_document,
};

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for parse results.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

/// Type-list policy as exposed on the command line.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliPolicy {
    FirstMatch,
    LastAttempted,
}

impl From<CliPolicy> for TypeListPolicy {
    fn from(policy: CliPolicy) -> Self {
        match policy {
            CliPolicy::FirstMatch => Self::FirstMatch,
            CliPolicy::LastAttempted => Self::LastAttempted,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "usage-parse")]
#[command(about = "Schema-driven positional argument validation and transformation")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load and validate usage documents.
    Check(CheckArgs),
    /// Parse arguments against a single usage document.
    Parse(ParseArgs),
    /// Parse arguments against a command from the configured database.
    Run(RunArgs),
    /// List commands available in the configured database.
    List(ListArgs),
    /// Bundle usage documents into a hashed UsagePackage file.
    Bundle(BundleArgs),
    /// Parse one JSON array of arguments per input line, in parallel.
    Batch(BatchArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Usage files and/or directories containing usage files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Usage document (JSON or YAML).
    #[arg(long)]
    usage: PathBuf,
    /// Decode each argument as a JSON literal; undecodable ones stay strings.
    #[arg(long)]
    typed: bool,
    /// Policy used when the document does not set one.
    #[arg(long)]
    policy: Option<CliPolicy>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Positional arguments to parse.
    #[arg(last = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Parser configuration file (YAML).
    #[arg(long)]
    config: PathBuf,
    /// Command whose usage should be applied.
    #[arg(long)]
    command: String,
    /// Decode each argument as a JSON literal; undecodable ones stay strings.
    #[arg(long)]
    typed: bool,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Positional arguments to parse.
    #[arg(last = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Parser configuration file (YAML).
    #[arg(long)]
    config: PathBuf,
}

#[derive(Debug, Args)]
struct BundleArgs {
    /// Usage files and/or directories containing usage files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Output JSON bundle path.
    #[arg(long)]
    output: PathBuf,
    /// Optional bundle name metadata.
    #[arg(long)]
    name: Option<String>,
    /// Optional bundle description metadata.
    #[arg(long)]
    description: Option<String>,
}

#[derive(Debug, Args)]
struct BatchArgs {
    /// Usage document (JSON or YAML).
    #[arg(long)]
    usage: PathBuf,
    /// File with one JSON array of arguments per line.
    #[arg(long)]
    input: PathBuf,
    /// Policy used when the document does not set one.
    #[arg(long)]
    policy: Option<CliPolicy>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Parse(args) => run_parse(args),
        Command::Run(args) => run_run(args),
        Command::List(args) => run_list(args),
        Command::Bundle(args) => run_bundle(args),
        Command::Batch(args) => run_batch(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let paths = collect_usage_paths(&args.inputs)?;
    let mut documents = Vec::with_capacity(paths.len());
    let mut failures = Vec::new();

    for path in &paths {
        match load_document(path) {
            Ok(document) => documents.push(document),
            Err(err) => failures.push(format!("{}: {err}", path.display())),
        }
    }

    // Duplicate commands only show up across files
    let mut package = UsagePackage::new(PACKAGE_VERSION, "");
    package.documents = documents;
    failures.extend(validate_package(&package).iter().map(|e| e.to_string()));

    if !failures.is_empty() {
        for failure in &failures {
            eprintln!("{failure}");
        }
        return Err(format!("{} usage problem(s) found", failures.len()));
    }

    println!(
        "Checked {} usage file(s) for {} command(s).",
        paths.len(),
        package.document_count()
    );
    Ok(())
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let document = load_usage(&args.usage)?;
    let parser = parser_for(&document, args.policy);
    let values = to_values(&args.args, args.typed);

    let parsed = parser
        .parse(&values, &document.arguments)
        .map_err(|err| describe_parser_error(&err))?;
    print_parsed(&parsed, args.format)
}

fn run_run(args: RunArgs) -> Result<(), String> {
    let db = open_config(&args.config)?;
    let values = to_values(&args.args, args.typed);

    let parsed = db.parse(&args.command, &values).map_err(|err| match err {
        DatabaseError::Parser(err) => describe_parser_error(&err),
        other => other.to_string(),
    })?;
    print_parsed(&parsed, args.format)
}

fn run_list(args: ListArgs) -> Result<(), String> {
    let db = open_config(&args.config)?;
    let mut commands: Vec<&str> = db.commands().collect();
    commands.sort_unstable();

    for command in commands {
        match db.get(command).and_then(|d| d.description.as_deref()) {
            Some(description) => println!("{command}\t{description}"),
            None => println!("{command}"),
        }
    }
    Ok(())
}

fn run_bundle(args: BundleArgs) -> Result<(), String> {
    let paths = collect_usage_paths(&args.inputs)?;
    let documents = paths
        .iter()
        .map(|path| load_usage(path))
        .collect::<Result<Vec<_>, _>>()?;

    let generated_at = chrono::Utc::now().to_rfc3339();
    let mut package =
        bundle_documents(documents, PACKAGE_VERSION, &generated_at).map_err(|e| e.to_string())?;
    package.name = args.name;
    package.description = args.description;

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                format!(
                    "Failed to create output directory '{}': {err}",
                    parent.display()
                )
            })?;
        }
    }

    let raw = serde_json::to_string_pretty(&package)
        .map_err(|err| format!("Failed to serialize usage bundle: {err}"))?;
    fs::write(&args.output, raw)
        .map_err(|err| format!("Failed to write '{}': {err}", args.output.display()))?;

    println!(
        "Bundled {} usage document(s) into '{}'.",
        package.document_count(),
        args.output.display()
    );
    Ok(())
}

/// One output line of `batch`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum BatchLine {
    Parsed(Vec<ParsedValue>),
    Failed { error: BatchFailure },
}

#[derive(Debug, Serialize)]
struct BatchFailure {
    id: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<usize>,
    message: String,
}

fn run_batch(args: BatchArgs) -> Result<(), String> {
    let document = load_usage(&args.usage)?;
    let parser = parser_for(&document, args.policy);
    let raw = fs::read_to_string(&args.input)
        .map_err(|err| format!("Failed to read '{}': {err}", args.input.display()))?;

    let lines: Vec<&str> = raw.lines().filter(|l| !l.trim().is_empty()).collect();
    info!(lines = lines.len(), command = %document.command, "Parsing batch");

    let results: Vec<BatchLine> = lines
        .par_iter()
        .map(|line| parse_batch_line(&parser, &document, line))
        .collect();

    let mut failed = 0usize;
    for result in &results {
        if matches!(result, BatchLine::Failed { .. }) {
            failed += 1;
        }
        let out = serde_json::to_string(result)
            .map_err(|err| format!("Failed to serialize batch result: {err}"))?;
        println!("{out}");
    }

    if failed > 0 {
        eprintln!("{failed} of {} line(s) failed to parse.", results.len());
    }
    Ok(())
}

fn parse_batch_line(parser: &ArgumentParser, document: &UsageDocument, line: &str) -> BatchLine {
    let args = match serde_json::from_str::<Value>(line) {
        Ok(Value::Array(args)) => args,
        Ok(_) => {
            return BatchLine::Failed {
                error: BatchFailure {
                    id: "INVALID_INPUT",
                    index: None,
                    message: "batch line must be a JSON array".to_string(),
                },
            };
        }
        Err(err) => {
            return BatchLine::Failed {
                error: BatchFailure {
                    id: "INVALID_INPUT",
                    index: None,
                    message: err.to_string(),
                },
            };
        }
    };

    match parser.parse(&args, &document.arguments) {
        Ok(parsed) => BatchLine::Parsed(parsed),
        Err(err) => BatchLine::Failed {
            error: BatchFailure {
                id: err.id(),
                index: err.index(),
                message: describe_parser_error(&err),
            },
        },
    }
}

fn load_usage(path: &Path) -> Result<UsageDocument, String> {
    load_document(path).map_err(|err| format!("Failed to load '{}': {err}", path.display()))
}

fn open_config(path: &Path) -> Result<UsageDatabase, String> {
    let config = ParserConfig::load(path)
        .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?;
    config.open_database().map_err(|err| err.to_string())
}

fn parser_for(document: &UsageDocument, fallback: Option<CliPolicy>) -> ArgumentParser {
    let policy = document
        .policy
        .or(fallback.map(TypeListPolicy::from))
        .unwrap_or_default();
    ArgumentParser::new().with_policy(policy)
}

fn to_values(args: &[String], typed: bool) -> Vec<Value> {
    args.iter()
        .map(|arg| {
            if typed {
                serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.clone()))
            } else {
                Value::String(arg.clone())
            }
        })
        .collect()
}

fn describe_parser_error(err: &ParserError) -> String {
    match err {
        ParserError::Argument(arg) => match &arg.value {
            Some(value) => format!("{arg}: value {value}"),
            None => arg.to_string(),
        },
        ParserError::Message(_) => err.to_string(),
    }
}

fn print_parsed(parsed: &[ParsedValue], format: CliOutputFormat) -> Result<(), String> {
    let output = match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(parsed)
            .map_err(|err| format!("Failed to serialize output: {err}"))?,
        CliOutputFormat::Yaml => serde_yaml::to_string(parsed)
            .map_err(|err| format!("Failed to serialize output: {err}"))?,
    };
    println!("{}", output.trim_end());
    Ok(())
}

fn collect_usage_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, String> {
    let mut paths = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(input)
                .map_err(|err| format!("Failed to read '{}': {err}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| DocumentFormat::from_path(path).is_some())
                .collect();
            entries.sort();
            debug!(dir = %input.display(), count = entries.len(), "Collected usage files");
            paths.extend(entries);
        } else if input.is_file() {
            paths.push(input.clone());
        } else {
            return Err(format!("Input path '{}' does not exist", input.display()));
        }
    }

    if paths.is_empty() {
        return Err("No usage files found in the given inputs".to_string());
    }
    Ok(paths)
}
