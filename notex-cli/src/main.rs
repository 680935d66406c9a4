//! Command-line interface for notex
//! This binary reindents and highlights a markup fragment as one code block.
//!
//! Usage:
//!   notex process `<path>` [--language `<lang>`] [--rules `<lang>=<file>`]... [--config `<file>`]
//!   notex engines [--rules `<lang>=<file>`]... [--config `<file>`] [--json]
//!
//! Log output goes to stderr; set `RUST_LOG` (e.g. `RUST_LOG=notex=debug`) to see more.

use clap::{Arg, ArgAction, ArgMatches, Command};
use notex::{parse_fragment, process_code_block, Element, Engine, EngineRegistry};
use notex_config::{Loader, NotexConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn main() {
    init_tracing();

    let matches = Command::new("notex")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Dedent and highlight code fragments embedded in markup")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .subcommand(
            Command::new("process")
                .about("Process a markup fragment as the content of one code element")
                .arg(
                    Arg::new("path")
                        .help("Path to the markup fragment")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("language")
                        .long("language")
                        .short('l')
                        .help("Language set on the code element (selects the highlight engine)"),
                )
                .arg(
                    Arg::new("collapse-blank-lines")
                        .long("collapse-blank-lines")
                        .help("Delete the line break of blank lines while reindenting")
                        .action(ArgAction::SetTrue),
                )
                .args(engine_args()),
        )
        .subcommand(
            Command::new("engines")
                .about("List the languages that have a highlight engine")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the list as JSON")
                        .action(ArgAction::SetTrue),
                )
                .args(engine_args()),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("process", sub)) => handle_process_command(sub),
        Some(("engines", sub)) => handle_engines_command(sub),
        _ => {
            eprintln!("Unknown command");
            std::process::exit(2);
        }
    }
}

/// Console logging: warnings and up unless `RUST_LOG` says otherwise.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(filter);
    tracing_subscriber::registry().with(console_layer).init();
}

/// Arguments shared by every command that builds a registry.
fn engine_args() -> [Arg; 2] {
    [
        Arg::new("config")
            .long("config")
            .short('c')
            .value_name("FILE")
            .help("Configuration file layered over the built-in defaults"),
        Arg::new("rules")
            .long("rules")
            .short('r')
            .value_name("LANG=FILE")
            .help("Register a rule file for a language (.json is read as JSON, anything else as YAML)")
            .action(ArgAction::Append)
            .value_parser(parse_rule_spec),
    ]
}

fn parse_rule_spec(value: &str) -> Result<(String, PathBuf), String> {
    match value.split_once('=') {
        Some((language, path)) if !language.is_empty() && !path.is_empty() => {
            Ok((language.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected LANG=FILE, got '{}'", value)),
    }
}

/// Handle the process command
fn handle_process_command(matches: &ArgMatches) {
    let config = load_config(matches);
    let registry = build_registry(matches, &config);
    let mut options = config.process_options();
    if matches.get_flag("collapse-blank-lines") {
        options.reindent.collapse_blank_lines = true;
    }

    let path = matches.get_one::<String>("path").expect("path is required");
    let source = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", path, e);
        std::process::exit(1);
    });
    let mut fragment = parse_fragment(&source).unwrap_or_else(|e| {
        eprintln!("Error parsing {}: {}", path, e);
        std::process::exit(1);
    });

    let mut code = Element::new("code");
    if let Some(language) = matches.get_one::<String>("language") {
        code = code.with_attribute(options.markers.language.as_str(), language.as_str());
    }
    let root = fragment.root();
    let processed = fragment
        .wrap_children(root, code)
        .and_then(|code| process_code_block(&mut fragment, code, &registry, &options))
        .unwrap_or_else(|e| {
            eprintln!("Error processing {}: {}", path, e);
            std::process::exit(1);
        });
    tracing::debug!(?processed, "processed code block");

    println!("{}", fragment);
}

/// Handle the engines command
fn handle_engines_command(matches: &ArgMatches) {
    let config = load_config(matches);
    let registry = build_registry(matches, &config);
    let languages = registry.languages();

    if matches.get_flag("json") {
        let json = serde_json::to_string_pretty(&languages).unwrap_or_else(|e| {
            eprintln!("Error formatting languages: {}", e);
            std::process::exit(1);
        });
        println!("{}", json);
        return;
    }

    if languages.is_empty() {
        println!("No highlight engines registered.");
        return;
    }
    println!("Registered highlight engines:\n");
    for language in languages {
        println!("  {}", language);
    }
}

fn load_config(matches: &ArgMatches) -> NotexConfig {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    loader.build().unwrap_or_else(|e| {
        eprintln!("Error loading configuration: {}", e);
        std::process::exit(1);
    })
}

/// Engines from the configuration file first, then from `--rules` (which win on conflict).
///
/// Relative paths in the configuration are resolved against the configuration file's
/// directory.
fn build_registry(matches: &ArgMatches, config: &NotexConfig) -> EngineRegistry {
    let base = matches
        .get_one::<String>("config")
        .and_then(|path| Path::new(path).parent())
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let mut registry = EngineRegistry::new();
    for (language, path) in &config.engines {
        load_rule_file(&mut registry, language, &base.join(path));
    }
    if let Some(specs) = matches.get_many::<(String, PathBuf)>("rules") {
        for (language, path) in specs {
            load_rule_file(&mut registry, language, path);
        }
    }
    registry
}

/// Register a rule file. Failures are logged and leave a no-op engine registered.
fn load_rule_file(registry: &mut EngineRegistry, language: &str, path: &Path) {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            tracing::error!(language, path = %path.display(), "can't read rule file: {}", e);
            registry.add(language, Engine::Noop);
            return;
        }
    };

    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let result = if is_json {
        registry.add_json(language, &source)
    } else {
        registry.add_yaml(language, &source)
    };
    if result.is_err() {
        tracing::warn!(language, path = %path.display(), "rule file registered as a no-op engine");
    }
}
