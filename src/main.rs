#![forbid(unsafe_code)]

use std::process::exit;

use tracing_subscriber::EnvFilter;
use yaml_codec::{Budget, dump};

const USAGE: &str = "Usage: yaml-codec [--json] <file.yaml>

Loads every document of the file and prints it back in canonical dumper style.
Can also be used as a YAML validator. Set RUST_LOG=debug to trace document boundaries.

Options:
  --json      JSON compatibility mode (duplicate keys allowed, last one wins)
  -h, --help  Print this help";

struct Args {
    path: String,
    json: bool,
}

fn parse_args() -> Result<Option<Args>, String> {
    let mut path = None;
    let mut json = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--json" => json = true,
            flag if flag.starts_with('-') => return Err(format!("Unknown option: {flag}")),
            _ if path.is_some() => return Err(format!("Unexpected extra argument: {arg}")),
            _ => path = Some(arg),
        }
    }
    match path {
        Some(path) => Ok(Some(Args { path, json })),
        None => Err("Expected a path to a YAML file as the first argument".to_owned()),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{USAGE}");
            return;
        }
        Err(err) => {
            eprintln!("{err}\n\n{USAGE}");
            exit(1);
        }
    };

    let content = match std::fs::read_to_string(&args.path) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("Failed to read {}: {err}", args.path);
            exit(2);
        }
    };

    let options = yaml_codec::load_options! {
        filename: Some(args.path.clone()),
        json: args.json,
        budget: Some(Budget::default()),
    };

    let documents = match yaml_codec::load_all_with_options(&content, &options) {
        Ok(documents) => documents,
        Err(err) => {
            eprintln!("{} invalid:\n{err}", args.path);
            exit(3);
        }
    };

    for (i, document) in documents.iter().enumerate() {
        match dump(document) {
            Ok(text) => {
                if i > 0 {
                    println!("---");
                }
                print!("{text}");
            }
            Err(err) => {
                eprintln!("Failed to dump document {}: {err}", i + 1);
                exit(4);
            }
        }
    }
}
