//! Kryon CLI
//!
//! Build, inspect, render, and watch Kryon documents.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kryon_core::Size;
use kryon_html::emit_page;
use kryon_layout::LayoutEngine;
use kryon_markdown::markdown_to_document;
use kryon_runtime::{FileWatcher, Runtime};

mod config;

use config::KryonConfig;

#[derive(Parser)]
#[command(name = "kryon")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Kryon UI compiler and runtime", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a KIR document to HTML
    Build {
        /// Input .kir file
        source: PathBuf,

        /// Output path (defaults to the input with .html)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a KIR document and print a summary
    Inspect {
        /// Input .kir file
        source: PathBuf,
    },

    /// Render a markdown file to HTML through the IR
    Render {
        /// Input .md file
        source: PathBuf,

        /// Output path (defaults to the input with .html)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build, then rebuild on every filesystem change
    Watch {
        /// Input .kir file
        source: PathBuf,

        /// Output path (defaults to the input with .html)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Build { source, output } => build(&source, output.as_deref()),
        Commands::Inspect { source } => inspect(&source),
        Commands::Render { source, output } => render_markdown(&source, output.as_deref()),
        Commands::Watch { source, output } => watch(&source, output.as_deref()),
    }
}

fn output_path(source: &Path, output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => source.with_extension("html"),
    }
}

fn load_runtime(source: &Path) -> Result<Runtime> {
    let bytes = fs::read(source).with_context(|| format!("reading {}", source.display()))?;
    if kryon_kir::is_binary(&bytes) {
        let (major, minor) = kryon_kir::read_header(&bytes)?;
        anyhow::bail!(
            "{} is a binary IR file (v{major}.{minor}); only KIR JSON is supported here",
            source.display()
        );
    }
    let text = String::from_utf8(bytes)
        .with_context(|| format!("{} is not valid UTF-8", source.display()))?;
    let doc = kryon_kir::from_str(&text)
        .with_context(|| format!("parsing {}", source.display()))?;
    Ok(Runtime::from_document(doc))
}

fn build(source: &Path, output: Option<&Path>) -> Result<()> {
    let config = KryonConfig::load(source.parent().unwrap_or(Path::new(".")))?;
    let mut runtime = load_runtime(source)?;

    if let Some(title) = &config.app.title {
        runtime.context.app.window_title = title.clone();
    }

    runtime.expand_templates();

    let viewport = Size::new(
        if runtime.context.app.window_width > 0.0 {
            runtime.context.app.window_width
        } else {
            config.app.width
        },
        if runtime.context.app.window_height > 0.0 {
            runtime.context.app.window_height
        } else {
            config.app.height
        },
    );
    let engine = LayoutEngine::new(viewport);
    engine.compute_root(&mut runtime.context.tree);

    let page = emit_page(&runtime.context);
    let out = output_path(source, output);
    fs::write(&out, page).with_context(|| format!("writing {}", out.display()))?;
    info!(
        components = runtime.context.tree.len(),
        output = %out.display(),
        "build complete"
    );
    Ok(())
}

fn inspect(source: &Path) -> Result<()> {
    let runtime = load_runtime(source)?;
    let tree = &runtime.context.tree;

    let registry = kryon_core::HandlerRegistry::with_defaults();
    for (id, message) in registry.validate_tree(tree) {
        warn!(component = id.0, "validation: {message}");
    }

    println!("document: {}", source.display());
    println!("  components: {}", tree.len());
    if let Some(root) = tree.root() {
        if let Some(node) = tree.get(root) {
            println!("  root: {} #{}", node.kind.canonical_name(), node.id);
        }
    }
    println!("  variables: {}", runtime.manifest.variables.len());
    for var in &runtime.manifest.variables {
        println!(
            "    {} {} = {} (v{})",
            var.ty.name(),
            var.name,
            var.value,
            var.version
        );
    }
    println!("  bindings: {}", runtime.manifest.bindings.len());
    println!("  conditionals: {}", runtime.manifest.conditionals.len());
    println!("  for_loops: {}", runtime.manifest.for_loops.len());
    println!("  component_defs: {}", runtime.manifest.component_defs.len());
    println!("  functions: {}", runtime.logic.functions.len());
    for function in &runtime.logic.functions {
        println!(
            "    #{} {} ({} instructions)",
            function.id,
            function.name,
            function.code.len()
        );
    }
    println!("  host_functions: {}", runtime.logic.host_functions.len());
    println!("  sources: {}", runtime.manifest.sources.len());
    Ok(())
}

fn render_markdown(source: &Path, output: Option<&Path>) -> Result<()> {
    let text = fs::read_to_string(source)
        .with_context(|| format!("reading {}", source.display()))?;
    let mut ctx = markdown_to_document(&text);
    ctx.app.window_title = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let engine = LayoutEngine::new(Size::new(ctx.app.window_width, ctx.app.window_height));
    engine.compute_root(&mut ctx.tree);

    let page = emit_page(&ctx);
    let out = output_path(source, output);
    fs::write(&out, page).with_context(|| format!("writing {}", out.display()))?;
    info!(output = %out.display(), "markdown rendered");
    Ok(())
}

fn watch(source: &Path, output: Option<&Path>) -> Result<()> {
    build(source, output)?;

    let mut watcher = FileWatcher::new().context("starting file watcher")?;
    let watch_dir = source.parent().unwrap_or(Path::new("."));
    if !watcher.add_path(watch_dir, false) {
        anyhow::bail!("cannot watch {}", watch_dir.display());
    }
    info!(path = %watch_dir.display(), "watching for changes (ctrl-c to stop)");

    loop {
        let events = watcher.poll(500);
        if events == 0 {
            continue;
        }
        info!(events, "change detected, rebuilding");
        if let Err(e) = build(source, output) {
            warn!("rebuild failed: {e:#}");
        }
    }
}
