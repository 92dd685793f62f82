//! Script engine for running part scripts

use crate::config::WorkshopConfig;
use crate::error::PartError;
use crate::part_api::register_part_api;
use crate::runner;
use crate::shape_api::register_shape_api;
use crate::workshop::Workshop;
use anyhow::{Result, anyhow};
use cadkit_core::Shape;
use rhai::{Dynamic, Engine};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What a top-level script run produced
#[derive(Debug, Clone)]
pub struct PartRun {
    /// Value of the script's last expression
    pub value: Dynamic,
    /// First shape passed to `show`
    pub shown: Option<Shape>,
    /// Files written by `export`, in order
    pub exported: Vec<PathBuf>,
}

impl PartRun {
    /// The shown shape, or the script's value if it is a shape
    pub fn shape(&self) -> Option<Shape> {
        self.shown
            .clone()
            .or_else(|| self.value.clone().try_cast::<Shape>())
    }
}

/// cadkit script engine
pub struct ScriptEngine {
    engine: Engine,
    workshop: Arc<Workshop>,
}

impl ScriptEngine {
    /// Create an engine with the shape and part APIs registered
    pub fn new(config: WorkshopConfig) -> Self {
        Self::with_workshop(Arc::new(Workshop::new(config)))
    }

    /// Create an engine around an existing workshop
    pub fn with_workshop(workshop: Arc<Workshop>) -> Self {
        let mut engine = Engine::new();

        register_shape_api(&mut engine);
        register_part_api(&mut engine, &workshop);

        // Configure engine for better errors
        engine.set_max_expr_depths(64, 64);

        Self { engine, workshop }
    }

    pub fn workshop(&self) -> &Arc<Workshop> {
        &self.workshop
    }

    /// Run a part script as a top-level run.
    ///
    /// Exports are written to the configured output directory and the first
    /// `show` call is kept in the result.
    pub fn run_file(&self, path: &Path) -> std::result::Result<PartRun, PartError> {
        self.workshop.begin_run();
        let outcome = runner::execute(&self.engine, &self.workshop, path)?;
        Ok(PartRun {
            value: outcome.into_value(),
            shown: self.workshop.shown(),
            exported: self.workshop.exported(),
        })
    }

    /// Run `script` and return the shape it exports as `name` (empty for the
    /// untitled export). Relative paths resolve against the parts directory.
    pub fn import_part(&self, script: impl AsRef<Path>, name: &str) -> std::result::Result<Shape, PartError> {
        let path = self.workshop.resolve_part(script);
        runner::import_part(&self.engine, &self.workshop, &path, name)
    }

    /// Evaluate a snippet that must end in a shape
    ///
    /// # Example
    ///
    /// ```ignore
    /// let engine = ScriptEngine::default();
    /// let plate = engine.eval_shape("cuboid(40.0, 20.0, 2.0)")?;
    /// ```
    pub fn eval_shape(&self, script: &str) -> Result<Shape> {
        let result: Dynamic = self
            .engine
            .eval(script)
            .map_err(|e| anyhow!("Failed to evaluate script: {}", e))?;

        result.try_cast::<Shape>().ok_or_else(|| {
            let trimmed = script.trim();
            if trimmed.ends_with(';') {
                anyhow!(
                    "Script did not return a shape.\n\n\
                    HINT: Your script ends with ';' which returns nothing.\n\
                    Add the variable name at the end:\n\n\
                      let part = cube(10.0);\n\
                      part  // <- return it!"
                )
            } else {
                anyhow!("Script did not return a shape. The last expression must be a shape.")
            }
        })
    }

    /// Compile a script to check for syntax errors without running it
    pub fn compile(&self, script: &str) -> Result<()> {
        self.engine
            .compile(script)
            .map_err(|e| anyhow!("Script compilation failed: {}", e))?;
        Ok(())
    }

    /// Get a reference to the underlying Rhai engine
    pub fn inner(&self) -> &Engine {
        &self.engine
    }

    /// Get a mutable reference to the underlying Rhai engine
    pub fn inner_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new(WorkshopConfig::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn eval_cube() {
        let engine = ScriptEngine::default();
        let shape = engine.eval_shape("cube(2.0)").unwrap();
        assert_eq!(shape, Shape::cube(2.0));
    }

    #[test]
    fn trailing_semicolon_hint() {
        let engine = ScriptEngine::default();
        let err = engine.eval_shape("let part = cube(1.0);").unwrap_err();
        assert!(err.to_string().contains("HINT"));
    }

    #[test]
    fn compile_reports_syntax_errors() {
        let engine = ScriptEngine::default();
        assert!(engine.compile("cube(1.0").is_err());
        assert!(engine.compile("cube(1.0)").is_ok());
    }
}
