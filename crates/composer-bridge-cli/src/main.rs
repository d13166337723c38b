use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use composer_bridge_core::{
    Affinity, BridgeConfig, BufferOffset, CanonicalOffset, DecorationBuilder, DocNode, Generation,
    Located, NodePath, Rendering, count_through, locate, to_buffer_with_affinity, to_canonical,
};
use miette::{IntoDiagnostic, Result, WrapErr};

mod config;

#[derive(Parser)]
#[command(
    version,
    about = "Render composer documents and translate offsets between model and buffer",
    long_about = None
)]
#[command(propagate_version = true)]
struct Cli {
    /// Renderer configuration (TOML). `$VAR`s are substituted from the environment.
    #[arg(long, global = true, env = "COMPOSER_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the rendered tree, buffer and decorations of a document
    Render {
        /// Canonical document (JSON)
        doc: PathBuf,

        /// Print buffer and decorations as JSON
        #[arg(long)]
        json: bool,
    },
    /// Map canonical offsets to buffer offsets
    ToBuffer {
        doc: PathBuf,

        #[arg(required = true, allow_negative_numbers = true)]
        offsets: Vec<i64>,

        /// Land after decorations that start at the offset
        #[arg(long)]
        after: bool,
    },
    /// Map buffer offsets to canonical offsets
    ToCanonical {
        doc: PathBuf,

        #[arg(required = true, allow_negative_numbers = true)]
        offsets: Vec<i64>,
    },
    /// Find the tree position of a canonical offset
    Locate {
        doc: PathBuf,

        #[arg(allow_negative_numbers = true)]
        offset: i64,
    },
    /// Canonical offset of a tree position, e.g. `count doc.json 0.1.2 4`
    Count {
        doc: PathBuf,

        /// Child-index path, `(root)` for the root
        path: NodePath,

        offset: usize,
    },
}

fn main() -> Result<()> {
    init_miette();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => config::load(path)?,
        None => BridgeConfig::default(),
    };

    match cli.command {
        Commands::Render { doc, json } => {
            let rendering = render(&config, &doc)?;
            if json {
                println!("{}", render_json(&rendering)?);
            } else {
                print!("{}", render_report(&rendering));
            }
        }
        Commands::ToBuffer {
            doc,
            offsets,
            after,
        } => {
            let rendering = render(&config, &doc)?;
            let affinity = if after {
                Affinity::After
            } else {
                config.mapping.caret_affinity
            };
            for offset in offsets {
                let canonical = CanonicalOffset::try_from(offset)?;
                let buffer = to_buffer_with_affinity(canonical, &rendering.catalog, affinity)?;
                println!("{canonical} -> {buffer}");
            }
        }
        Commands::ToCanonical { doc, offsets } => {
            let rendering = render(&config, &doc)?;
            for offset in offsets {
                let buffer = BufferOffset::try_from(offset)?;
                let canonical = to_canonical(buffer, &rendering.catalog)?;
                println!("{buffer} -> {canonical}");
            }
        }
        Commands::Locate { doc, offset } => {
            let rendering = render(&config, &doc)?;
            let canonical = CanonicalOffset::try_from(offset)?;
            match locate(&rendering.tree, canonical)? {
                Located::At(position) => println!("{} @ {}", position.path, position.offset),
                Located::PastEnd => println!("past end"),
            }
        }
        Commands::Count { doc, path, offset } => {
            let rendering = render(&config, &doc)?;
            let canonical = count_through(&rendering.tree, &path, offset)?;
            println!("{canonical}");
        }
    }

    Ok(())
}

fn render(config: &BridgeConfig, path: &Path) -> Result<Rendering> {
    let raw = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("error reading document {}", path.display()))?;
    let doc: DocNode = serde_json::from_str(&raw)
        .into_diagnostic()
        .wrap_err_with(|| format!("error parsing document {}", path.display()))?;
    let rendering = DecorationBuilder::new(config.clone()).build(&doc, Generation::new(1));
    for warning in &rendering.warnings {
        eprintln!("warning: skipped node at {}: {}", warning.path, warning.reason);
    }
    Ok(rendering)
}

fn render_report(rendering: &Rendering) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "tree:      {}", rendering.tree);
    let _ = writeln!(out, "buffer:    {}", rendering.buffer.to_escaped_string());
    let _ = writeln!(
        out,
        "length:    {} buffer, {} canonical",
        rendering.buffer_len(),
        rendering.canonical_len()
    );
    for span in rendering.catalog.iter() {
        let text = rendering
            .buffer
            .slice(span.range())
            .map(|text| text.to_escaped_string())
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "  {:>4}..{:<4} {:?} {:?}",
            span.start.get(),
            span.end().get(),
            span.kind,
            text
        );
    }
    out
}

fn render_json(rendering: &Rendering) -> Result<String> {
    let value = serde_json::json!({
        "generation": rendering.generation,
        "buffer": rendering.buffer,
        "canonical_len": rendering.canonical_len(),
        "decorations": rendering.catalog.spans(),
    });
    serde_json::to_string_pretty(&value).into_diagnostic()
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}
