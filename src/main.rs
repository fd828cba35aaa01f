//! lucid-doc: generate API reference documentation from a compiled module
//! and the XML comment file next to it.
//!
//! `lucid-doc bin/Acme.Widgets.dll -p packages -o docs/Acme.Widgets.md`

use anyhow::{Context, Result};
use clap::Parser;
use lucid_doc::{render, DocumentationBuilder};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "lucid-doc",
    about = "Generate API documentation from a compiled module and its XML comments"
)]
struct Cli {
    /// Compiled module; its comment file is the same path with `.xml`
    module: PathBuf,

    /// Package resolution root searched recursively for referenced modules.
    /// Defaults to the module's directory.
    #[arg(short = 'p', long)]
    packages: Option<PathBuf>,

    /// Output file. If omitted, writes to stdout.
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output format: markdown (default), json
    #[arg(short = 'f', long, default_value = "markdown")]
    format: String,

    /// Log resolution details to stderr
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("lucid_doc={}", level).parse()?),
        )
        .with_target(false)
        .init();

    let renderer = render::create_renderer(&cli.format)?;

    let packages = match cli.packages {
        Some(ref p) => p.clone(),
        None => cli
            .module
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let doc = DocumentationBuilder::new(packages)
        .build_documentation(&cli.module)
        .with_context(|| format!("failed to document {}", cli.module.display()))?;
    let output = renderer.render(&doc)?;

    match cli.output {
        Some(ref path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create directory: {}", dir.display()))?;
            }
            fs::write(path, output)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => print!("{}", output),
    }

    Ok(())
}
