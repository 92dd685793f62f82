//! cadkit CLI - run part scripts, import parts and manage the build cache

use anyhow::{Context, Result};
use cadkit_cache::{ArtifactCache, CacheConfig};
use cadkit_core::Shape;
use cadkit_script::{ScriptEngine, WorkshopConfig};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cadkit")]
#[command(about = "Parametric parts through scripts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a part script and write its exports
    Run {
        /// Script file to run
        script: PathBuf,

        /// Directory exported parts are written to
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Base directory for import_part paths
        #[arg(long)]
        parts_dir: Option<PathBuf>,

        /// Always call builders instead of reading the cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Import one named part from a script and describe it
    Import {
        /// Script file to import from
        script: PathBuf,

        /// Exported name (empty for the untitled export)
        #[arg(default_value = "")]
        name: String,
    },

    /// Inspect or clear the build cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Print the cache directory
    Path,
    /// List cached entries
    List,
    /// Delete every cached entry
    Clear,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = WorkshopConfig::from_env();

    match cli.command {
        Commands::Run {
            script,
            out_dir,
            parts_dir,
            no_cache,
        } => {
            let mut config = config;
            if let Some(dir) = out_dir {
                config.out_dir = dir;
            }
            if let Some(dir) = parts_dir {
                config.parts_dir = dir;
            }
            if no_cache {
                config.cache.enabled = false;
            }
            run_script(config, &script)?;
        }
        Commands::Import { script, name } => {
            let engine = ScriptEngine::new(config);
            let part = engine.import_part(&script, &name)?;
            let label = if name.is_empty() { "<untitled>" } else { name.as_str() };
            println!("{} from {}", label, script.display());
            describe(&part);
        }
        Commands::Cache { action } => run_cache(&config.cache, &action)?,
    }

    Ok(())
}

fn run_script(config: WorkshopConfig, script: &Path) -> Result<()> {
    let engine = ScriptEngine::new(config);
    let run = engine
        .run_file(script)
        .with_context(|| format!("Failed to run {}", script.display()))?;

    if run.exported.is_empty() {
        println!("No parts exported");
    }
    for path in &run.exported {
        println!("Exported {}", path.display());
    }
    if let Some(shape) = run.shape() {
        describe(&shape);
    }
    Ok(())
}

fn describe(shape: &Shape) {
    let bbox = shape.bounding_box();
    let size = bbox.size();
    println!(
        "  bounds: ({:.3}, {:.3}, {:.3}) .. ({:.3}, {:.3}, {:.3})",
        bbox.xmin(),
        bbox.ymin(),
        bbox.zmin(),
        bbox.xmax(),
        bbox.ymax(),
        bbox.zmax()
    );
    println!("  size:   {:.3} x {:.3} x {:.3}", size.x, size.y, size.z);
    println!("  volume: {:.3}", shape.volume());
}

fn run_cache(config: &CacheConfig, action: &CacheAction) -> Result<()> {
    let cache = ArtifactCache::new(config);
    match action {
        CacheAction::Path => {
            println!("{}", cache.root().display());
            if !cache.is_enabled() {
                println!("(disabled)");
            }
        }
        CacheAction::List => {
            let entries = cache.entries()?;
            for key in &entries {
                println!("{}", key);
            }
            tracing::info!("{} cached entries in {}", entries.len(), cache.root().display());
        }
        CacheAction::Clear => {
            let removed = cache.clear()?;
            println!("Removed {} entries from {}", removed, cache.root().display());
        }
    }
    Ok(())
}
