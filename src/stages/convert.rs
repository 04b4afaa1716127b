//! Convert stage
//!
//! Compile and render in one pass. The destination record is published
//! with its rendered contents, so no empty placeholder is ever visible to
//! other stages and nothing is left in the pipeline's template map. The
//! output is the same as running [`Compile`](super::Compile) and then
//! [`Render`](super::Render) with the equivalent options.

use std::sync::Arc;

use rayon::prelude::*;

use super::{compile_file, publish, CompiledFile};
use crate::config::{ConvertOptions, ConvertOverrides};
use crate::defaults::convert_defaults;
use crate::engine::{MiniJinjaEngine, TemplateEngine};
use crate::error::Result;
use crate::filesystem::Files;
use crate::merge::{build_scope, Merge};
use crate::pipeline::{Pipeline, Plugin};

/// Compiles and renders template sources in a single stage
pub struct Convert {
    options: ConvertOptions,
    engine: Arc<dyn TemplateEngine>,
}

impl Convert {
    /// Convert with [`MiniJinjaEngine`]
    pub fn new(overrides: ConvertOverrides) -> Self {
        Self::with_engine(overrides, Arc::new(MiniJinjaEngine::new()))
    }

    pub fn with_engine(overrides: ConvertOverrides, engine: Arc<dyn TemplateEngine>) -> Self {
        Self {
            options: convert_defaults().merged(&overrides),
            engine,
        }
    }

    /// The options every `Convert` starts from
    pub fn default_options() -> &'static ConvertOptions {
        convert_defaults()
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }
}

impl Plugin for Convert {
    fn name(&self) -> &str {
        "convert"
    }

    fn run(&self, files: &mut Files, pipeline: &Pipeline) -> Result<()> {
        pipeline.templates().release_missing(files)?;

        let (compile, render) = self.options.split();
        let selected = files.select(compile.pattern.as_ref())?;
        let engine = self.engine.as_ref();

        let converted = {
            let files = &*files;
            selected
                .par_iter()
                .filter_map(|filename| {
                    compile_file(filename, files, pipeline, &compile, engine).transpose()
                })
                .map(|unit| -> Result<CompiledFile> {
                    let mut unit = unit?;
                    let scope = build_scope(
                        &render.locals,
                        render.use_metadata,
                        pipeline.metadata_map(),
                        &unit.record.attributes,
                    );
                    let output = unit.template.render(&scope)?;
                    unit.record.set_contents_string(output);
                    Ok(unit)
                })
                .collect::<Result<Vec<_>>>()?
        };

        for unit in converted {
            publish(files, pipeline, unit, compile.overwrite);
        }

        Ok(())
    }
}
