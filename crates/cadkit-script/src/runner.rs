//! Script execution and `import_part`

use crate::capture::EarlyExit;
use crate::error::PartError;
use crate::workshop::Workshop;
use cadkit_core::Shape;
use rhai::{Dynamic, Engine, EvalAltResult};
use std::path::Path;

/// How a script run ended
#[derive(Debug, Clone)]
pub enum ScriptOutcome {
    /// Ran to the end and produced this value
    Completed(Dynamic),
    /// Stopped right after exporting the name an import wanted
    ShortCircuited(String),
}

impl ScriptOutcome {
    /// The script's value; a short-circuited run has none
    pub fn into_value(self) -> Dynamic {
        match self {
            ScriptOutcome::Completed(value) => value,
            ScriptOutcome::ShortCircuited(_) => Dynamic::UNIT,
        }
    }
}

/// Run a script file from source, end to end.
///
/// An early exit is turned into [`ScriptOutcome::ShortCircuited`] only when it
/// belongs to the innermost open capture; anything else is a script error.
pub fn execute(engine: &Engine, shop: &Workshop, path: &Path) -> Result<ScriptOutcome, PartError> {
    let source = std::fs::read_to_string(path).map_err(|source| PartError::ScriptNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    let _frame = shop.enter_script(path, &source)?;

    let mut ast = engine.compile(&source).map_err(|e| PartError::Script {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    ast.set_source(path.to_string_lossy().as_ref());

    match engine.eval_ast::<Dynamic>(&ast) {
        Ok(value) => Ok(ScriptOutcome::Completed(value)),
        Err(err) => match find_early_exit(&err) {
            Some(exit) if shop.captures().is_current(exit.session) => {
                Ok(ScriptOutcome::ShortCircuited(exit.name))
            }
            _ => Err(PartError::Script {
                path: path.to_path_buf(),
                message: err.to_string(),
            }),
        },
    }
}

/// Dig an [`EarlyExit`] out of an evaluation error, looking through the
/// wrappers Rhai adds when the export happened inside a function
fn find_early_exit(err: &EvalAltResult) -> Option<EarlyExit> {
    match err {
        EvalAltResult::ErrorTerminated(token, _) => token.clone().try_cast::<EarlyExit>(),
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _)
        | EvalAltResult::ErrorInModule(_, inner, _) => find_early_exit(inner),
        _ => None,
    }
}

/// Run `script` under a capture and return the shape it exports as `name`
pub fn import_part(
    engine: &Engine,
    shop: &Workshop,
    script: &Path,
    name: &str,
) -> Result<Shape, PartError> {
    tracing::debug!("Importing {:?} from {}", name, script.display());

    let guard = shop.captures().begin(name);
    let outcome = execute(engine, shop, script)?;
    let mut session = guard.finish();

    match outcome {
        ScriptOutcome::ShortCircuited(_) => {
            tracing::debug!("{} stopped after exporting {:?}", script.display(), session.wanted());
        }
        ScriptOutcome::Completed(_) => {
            tracing::debug!("{} ran to the end looking for {:?}", script.display(), session.wanted());
        }
    }

    session.take(name).ok_or_else(|| PartError::ImportNotFound {
        script: script.to_path_buf(),
        name: name.to_string(),
        available: session.names(),
    })
}
