//! Render stage
//!
//! Renders every selected record that has a compiled template associated
//! with it and replaces the record's contents with the output. The record
//! itself is kept: same key, same identity, same attributes. Records
//! without an association (plain assets, already rendered pages) are left
//! alone.

use log::{debug, trace};
use rayon::prelude::*;

use crate::config::{RenderOptions, RenderOverrides};
use crate::defaults::render_defaults;
use crate::error::Result;
use crate::filesystem::{FileId, Files};
use crate::merge::build_scope;
use crate::pipeline::{Pipeline, Plugin};

/// Renders records published by [`Compile`](super::Compile)
#[derive(Debug, Clone, Default)]
pub struct Render {
    overrides: RenderOverrides,
}

struct Rendered {
    filename: String,
    id: FileId,
    output: String,
}

impl Render {
    /// Create a render stage
    ///
    /// Options are resolved when the stage runs, since `reuse` depends on
    /// the previous render of the same pipeline.
    pub fn new(overrides: RenderOverrides) -> Self {
        Self { overrides }
    }

    /// The options every `Render` starts from
    pub fn default_options() -> &'static RenderOptions {
        render_defaults()
    }

    pub fn overrides(&self) -> &RenderOverrides {
        &self.overrides
    }

    fn render_file(
        &self,
        filename: &str,
        files: &Files,
        pipeline: &Pipeline,
        options: &RenderOptions,
    ) -> Result<Option<Rendered>> {
        let Some(file) = files.get_file(filename) else {
            return Ok(None);
        };
        let Some(template) = pipeline.templates().lookup(file.id())? else {
            trace!("Skipping {filename}: no compiled template");
            return Ok(None);
        };

        let scope = build_scope(
            &options.locals,
            options.use_metadata,
            pipeline.metadata_map(),
            &file.attributes,
        );
        let output = template.render(&scope)?;

        Ok(Some(Rendered {
            filename: filename.to_string(),
            id: file.id(),
            output,
        }))
    }
}

impl Plugin for Render {
    fn name(&self) -> &str {
        "render"
    }

    fn run(&self, files: &mut Files, pipeline: &Pipeline) -> Result<()> {
        let history = pipeline.render_history();
        let (options, partial) = history.plan(render_defaults(), &self.overrides)?;
        let templates = pipeline.templates();
        templates.release_missing(files)?;

        // A pattern that fails to select leaves the reuse baseline alone
        let selected = files.select(options.pattern.as_ref())?;
        history.record(partial)?;
        let rendered = {
            let files = &*files;
            selected
                .par_iter()
                .filter_map(|filename| {
                    self.render_file(filename, files, pipeline, &options)
                        .transpose()
                })
                .collect::<Result<Vec<_>>>()?
        };

        for Rendered {
            filename,
            id,
            output,
        } in rendered
        {
            if let Some(file) = files.get_file_mut(&filename) {
                file.set_contents_string(output);
            }
            templates.take(id)?;
            debug!("Rendered {filename}");
        }

        Ok(())
    }
}
