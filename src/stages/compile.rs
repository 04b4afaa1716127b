//! Compile stage
//!
//! For each selected source:
//!
//! 1.  Skip entries that are not file records or whose contents are not
//!     UTF-8.
//! 2.  Compute the destination name with the renamer.
//! 3.  Look for an existing key naming the same path. Without `overwrite`
//!     the source is skipped and left untouched; with it, the existing key's
//!     spelling becomes the destination key.
//! 4.  Compile the source, naming its absolute path for diagnostics and
//!     includes. A compile error fails the stage.
//! 5.  Publish an empty record under the destination key, optionally
//!     copying the source's attributes, and associate the compiled template
//!     with it. The source key is removed when the name changed.
//!
//! Rendering is left to [`Render`](super::Render).

use std::sync::Arc;

use log::trace;

use super::{compile_selected, publish};
use crate::config::{CompileOptions, CompileOverrides};
use crate::defaults::compile_defaults;
use crate::engine::{MiniJinjaEngine, TemplateEngine};
use crate::error::Result;
use crate::filesystem::Files;
use crate::merge::Merge;
use crate::pipeline::{Pipeline, Plugin};

/// Compiles template sources and defers rendering
pub struct Compile {
    options: CompileOptions,
    engine: Arc<dyn TemplateEngine>,
}

impl Compile {
    /// Compile with [`MiniJinjaEngine`]
    pub fn new(overrides: CompileOverrides) -> Self {
        Self::with_engine(overrides, Arc::new(MiniJinjaEngine::new()))
    }

    pub fn with_engine(overrides: CompileOverrides, engine: Arc<dyn TemplateEngine>) -> Self {
        Self {
            options: compile_defaults().merged(&overrides),
            engine,
        }
    }

    /// The options every `Compile` starts from
    pub fn default_options() -> &'static CompileOptions {
        compile_defaults()
    }

    /// The resolved options of this stage
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }
}

impl Plugin for Compile {
    fn name(&self) -> &str {
        "compile"
    }

    fn run(&self, files: &mut Files, pipeline: &Pipeline) -> Result<()> {
        let templates = pipeline.templates();
        templates.release_missing(files)?;

        let selected = files.select(self.options.pattern.as_ref())?;
        let compiled = compile_selected(
            &selected,
            files,
            pipeline,
            &self.options,
            self.engine.as_ref(),
        )?;

        for unit in compiled {
            trace!("Compiled {}", unit.source_path.display());
            if let Some((id, template)) = publish(files, pipeline, unit, self.options.overwrite) {
                templates.associate(id, template)?;
            }
        }

        Ok(())
    }
}
