//! CLI entry point for treeb

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use treeb::exclusion::RulesHandle;
use treeb::flatten::FlattenRequest;
use treeb::{
    BinaryPolicy, ExclusionRuleSet, FlattenConfig, Flattener, ListingNode, ModelWindow,
    PresetStore, TiktokenTokenizer, default_models, list_directory, print_json, print_summary,
};

/// Color output mode
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and environment
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Determine whether to color the summary written to stderr.
fn should_use_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            // Respect NO_COLOR environment variable (https://no-color.org/)
            if std::env::var_os("NO_COLOR").is_some() {
                return false;
            }
            if std::env::var_os("FORCE_COLOR").is_some() {
                return true;
            }
            if std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false) {
                return false;
            }
            io::stderr().is_terminal()
        }
    }
}

/// How to treat files that are not valid UTF-8
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum BinaryArg {
    /// Replace the content with a marker
    #[default]
    Skip,
    /// Decode with replacement characters
    Lossy,
}

impl From<BinaryArg> for BinaryPolicy {
    fn from(arg: BinaryArg) -> Self {
        match arg {
            BinaryArg::Skip => BinaryPolicy::Skip,
            BinaryArg::Lossy => BinaryPolicy::Lossy,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "treeb")]
#[command(about = "Flatten selected files and directories into one document for LLM context")]
#[command(version)]
struct Args {
    /// Application root holding the presets directory
    #[arg(long = "root", value_name = "DIR", global = true)]
    root: Option<PathBuf>,

    /// Exclusion rules file (JSON); built-in defaults when absent
    #[arg(long = "exclusions", value_name = "FILE", global = true)]
    exclusions: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Flatten paths into a single document on stdout
    Flatten {
        /// Files and directories to include
        paths: Vec<String>,

        /// Add the paths stored in a preset (e.g. user/work)
        #[arg(long = "preset", value_name = "ID")]
        preset: Option<String>,

        /// Read a {"paths": [...]} request from FILE, or stdin with '-'
        #[arg(long = "request", value_name = "FILE")]
        request: Option<String>,

        /// Output the document and token statistics as JSON
        #[arg(long = "json")]
        json: bool,

        /// Handling of non-UTF-8 files
        #[arg(long = "binary", value_name = "POLICY", default_value = "skip")]
        binary: BinaryArg,

        /// Context window to report, as NAME=WINDOW (replaces the defaults)
        #[arg(long = "model", value_name = "NAME=WINDOW", value_parser = ModelWindow::parse)]
        models: Vec<ModelWindow>,

        /// Control color of the token summary: auto, always, never
        #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
        color: ColorMode,
    },
    /// List a directory one level deep with exclusion verdicts
    Ls {
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output the listing as JSON
        #[arg(long = "json")]
        json: bool,
    },
    /// Manage saved selections
    Preset {
        #[command(subcommand)]
        action: PresetAction,
    },
    /// Print the active exclusion rules as JSON
    Rules {
        /// Write the rules to FILE instead of printing them
        #[arg(long = "write", value_name = "FILE")]
        write: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum PresetAction {
    /// List default and user presets
    List,
    /// Show the resolved paths of a preset
    Show { id: String },
    /// Save paths as a user preset
    Save {
        name: String,
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Delete a user preset
    Delete { id: String },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("treeb: {}", message);
    process::exit(1);
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let rules = ExclusionRuleSet::load_or_default(args.exclusions.as_deref())
        .unwrap_or_else(|e| fail(e));
    let app_root = args
        .root
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let result = match args.command {
        Command::Flatten {
            mut paths,
            preset,
            request,
            json,
            binary,
            models,
            color,
        } => {
            if let Some(source) = request {
                paths.extend(read_request(&source).paths);
            }
            if let Some(id) = preset {
                let store = PresetStore::new(&app_root);
                let stored = store.load(&id).unwrap_or_else(|e| fail(e));
                paths.extend(stored.iter().map(|p| p.display().to_string()));
            }

            let config = FlattenConfig {
                binary_policy: binary.into(),
                models: if models.is_empty() {
                    default_models()
                } else {
                    models
                },
                ..Default::default()
            };
            let mut flattener = Flattener::new(RulesHandle::new(rules), config);
            match TiktokenTokenizer::cl100k() {
                Ok(tokenizer) => flattener = flattener.with_tokenizer(tokenizer),
                Err(e) => tracing::warn!(error = %e, "continuing without a tokenizer"),
            }

            let flattened = flattener.flatten(&paths);
            tracing::info!(
                files = flattened.summary.files,
                directories = flattened.summary.directories,
                tokens = flattened.token_count,
                "flattened selection"
            );
            if json {
                print_json(&flattened)
            } else {
                print!("{}", flattened.text);
                print_summary(&flattened, should_use_color(color))
            }
        }
        Command::Ls { path, json } => {
            let node = list_directory(&path, &rules);
            if json {
                print_json(&node)
            } else {
                print_listing(&node);
                Ok(())
            }
        }
        Command::Preset { action } => run_preset(action, &app_root),
        Command::Rules { write } => match write {
            Some(path) => {
                rules.save(&path).unwrap_or_else(|e| fail(e));
                eprintln!("treeb: wrote rules to {}", path.display());
                Ok(())
            }
            None => print_json(&rules.to_rule_file()),
        },
    };

    if let Err(e) = result {
        fail(format!("error writing output: {}", e));
    }
}

fn read_request(source: &str) -> FlattenRequest {
    let raw = if source == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .unwrap_or_else(|e| fail(format!("cannot read request from stdin: {}", e)));
        buf
    } else {
        fs::read_to_string(source)
            .unwrap_or_else(|e| fail(format!("cannot read request '{}': {}", source, e)))
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| fail(format!("invalid request: {}", e)))
}

fn run_preset(action: PresetAction, app_root: &Path) -> io::Result<()> {
    let store = PresetStore::new(app_root);
    match action {
        PresetAction::List => {
            for preset in store.list().unwrap_or_else(|e| fail(e)) {
                println!("{}", preset.id);
            }
        }
        PresetAction::Show { id } => {
            for path in store.load(&id).unwrap_or_else(|e| fail(e)) {
                println!("{}", path.display());
            }
        }
        PresetAction::Save { name, paths } => {
            store.ensure_default().unwrap_or_else(|e| fail(e));
            let id = store.save(&name, &paths).unwrap_or_else(|e| fail(e));
            println!("{}", id);
        }
        PresetAction::Delete { id } => {
            store.delete(&id).unwrap_or_else(|e| fail(e));
            eprintln!("treeb: deleted {}", id);
        }
    }
    Ok(())
}

fn print_listing(node: &ListingNode) {
    match node {
        ListingNode::Folder { text, children, .. } => {
            println!("{}/", text);
            for child in children {
                println!("  {}", listing_line(child));
            }
        }
        other => println!("{}", listing_line(other)),
    }
}

fn listing_line(node: &ListingNode) -> String {
    match node {
        ListingNode::Folder {
            text,
            excluded_info,
            ..
        } => with_verdict(format!("{}/", text), excluded_info.as_ref()),
        ListingNode::File {
            text,
            excluded_info,
            ..
        } => with_verdict(text.clone(), excluded_info.as_ref()),
        ListingNode::Error { text, .. } => text.clone(),
    }
}

fn with_verdict(label: String, verdict: Option<&treeb::ExclusionVerdict>) -> String {
    match verdict {
        Some(v) => format!("{}  [excluded: {}]", label, v),
        None => label,
    }
}
