//! Errors raised while running part scripts

use cadkit_cache::CacheError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PartError {
    /// The imported script ran but never exported the requested name
    #[error(
        "{} does not export {name:?} (exported: {})",
        script.display(),
        list_names(available)
    )]
    ImportNotFound {
        script: PathBuf,
        name: String,
        available: Vec<String>,
    },

    /// A script imported itself, directly or through other scripts
    #[error("Import cycle: {}", show_chain(chain))]
    ImportCycle { chain: Vec<PathBuf> },

    #[error("Failed to read script file {}: {source}", path.display())]
    ScriptNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Compilation or evaluation failure inside the script
    #[error("Error in script {}: {message}", path.display())]
    Script { path: PathBuf, message: String },

    /// An exported part could not be written
    #[error("Failed to write exported part {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Core(#[from] cadkit_core::Error),
}

fn show_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn list_names(names: &[String]) -> String {
    if names.is_empty() {
        return "nothing".to_string();
    }
    names
        .iter()
        .map(|n| {
            if n.is_empty() {
                "<untitled>".to_string()
            } else {
                format!("{n:?}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
