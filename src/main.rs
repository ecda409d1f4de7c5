//! svelte-mode - command line front end
//!
//! Lists regions, reindents, or prints a fontified Svelte file.

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use tracing::warn;
use tracing_subscriber::EnvFilter;

use svelte_mode::render::{write_highlighted, write_regions};
use svelte_mode::{auto_mode, Config, Document, ModeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Regions,
    Indent,
    Highlight,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut mode = Mode::Highlight;
    let mut write = false;
    let mut file = None;
    for arg in &args {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            "--version" | "-V" => {
                print_version();
                return Ok(());
            }
            "--regions" | "-r" => mode = Mode::Regions,
            "--indent" | "-i" => mode = Mode::Indent,
            "--write" | "-w" => write = true,
            "--highlight" | "-l" => mode = Mode::Highlight,
            other if other.starts_with('-') => {
                return Err(ModeError::Message(format!("unknown option: {other}")));
            }
            other => file = Some(PathBuf::from(other)),
        }
    }

    let Some(path) = file else {
        print_usage();
        return Err(ModeError::Message("no input file".into()));
    };
    if !auto_mode(&path) {
        warn!(path = %path.display(), "not a .svelte file, continuing anyway");
    }

    let mut doc = Document::open(&path, Config::load())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match mode {
        Mode::Regions => write_regions(&mut out, &mut doc)?,
        Mode::Indent => {
            let len = doc.len();
            doc.indent_region(0..len)?;
            if write {
                doc.save()?;
            } else {
                out.write_all(doc.text().as_bytes())?;
            }
        }
        Mode::Highlight => {
            doc.fontify_buffer();
            write_highlighted(&mut out, &doc)?;
        }
    }

    Ok(())
}

fn print_usage() {
    println!("svelte-mode {} - region-aware Svelte indentation and highlighting", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: svelte-mode [OPTIONS] FILE");
    println!();
    println!("Options:");
    println!("  -r, --regions    List embedded script and style regions");
    println!("  -i, --indent     Print the file reindented");
    println!("  -w, --write      With --indent, rewrite the file in place");
    println!("  -l, --highlight  Print the file with syntax highlighting (default)");
    println!("  -h, --help       Show this help message");
    println!("  -V, --version    Show version information");
    println!();
    println!("Settings are read from ~/.svelte-mode.toml.");
    println!("Set RUST_LOG=svelte_mode=debug to trace region switching.");
}

fn print_version() {
    println!("svelte-mode {}", env!("CARGO_PKG_VERSION"));
}
