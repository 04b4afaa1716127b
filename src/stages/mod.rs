//! Template stages.
//!
//! ## Overview
//!
//! Three plugins turn template sources in a [`Files`] registry into rendered
//! output:
//!
//! 1. [`Compile`] - compiles each selected source, publishes an empty record
//!    under the destination name and remembers the compiled template for it
//! 2. [`Render`] - renders every record that has a remembered template and
//!    overwrites its contents in place
//! 3. [`Convert`] - both of the above in one pass, never publishing the
//!    empty record
//!
//! Compile and Render can be separated by any number of other stages: the
//! association between a published record and its template follows the
//! record's identity, not its key or its bytes.
//!
//! Within a stage every selected file is an independent unit of work run on
//! the rayon pool. The first failing unit fails the whole stage. Registry
//! changes are applied once all units have finished, in selection order; a
//! destination published by an earlier unit counts as existing for the
//! units after it.

use std::path::PathBuf;

use log::{debug, trace};
use rayon::prelude::*;

use crate::config::CompileOptions;
use crate::engine::{CompiledTemplate, TemplateEngine};
use crate::error::Result;
use crate::filesystem::{FileId, FileRecord, Files};
use crate::path::find_equal_path;
use crate::pipeline::Pipeline;

pub mod compile;
pub mod convert;
pub mod render;

pub use compile::Compile;
pub use convert::Convert;
pub use render::Render;

/// A compiled source waiting to be published
pub(crate) struct CompiledFile {
    /// Key of the template source
    pub source: String,
    /// Key the destination record is published under
    pub destination: String,
    /// Absolute path of the template source
    pub source_path: PathBuf,
    pub template: CompiledTemplate,
    /// The destination record, still without contents
    pub record: FileRecord,
}

/// Compile one selected file
///
/// Returns `Ok(None)` when the file is skipped: not a file record, not
/// UTF-8, or its destination already exists and may not be overwritten.
pub(crate) fn compile_file(
    filename: &str,
    files: &Files,
    pipeline: &Pipeline,
    options: &CompileOptions,
    engine: &dyn TemplateEngine,
) -> Result<Option<CompiledFile>> {
    let Some(file) = files.get_file(filename) else {
        trace!("Skipping {filename}: not a file record");
        return Ok(None);
    };
    let Some(source) = file.contents_str() else {
        trace!("Skipping {filename}: contents are not UTF-8");
        return Ok(None);
    };

    let new_filename = options.renamer.rename(filename)?;
    let source_path = pipeline.source_path().join(filename);

    let existing = find_equal_path(
        &pipeline.destination_path(),
        &new_filename,
        files.iter().map(|(key, _)| key.as_str()),
    );
    let destination = match existing {
        Some(existing) if !options.overwrite => {
            trace!("Skipping {filename}: {existing} exists and overwrite is disabled");
            return Ok(None);
        }
        Some(existing) => existing,
        None => new_filename,
    };

    let template = engine.compile(source, &options.engine_options, &source_path)?;
    let base = options.copy_file_data.then_some(file);

    Ok(Some(CompiledFile {
        source: filename.to_string(),
        destination,
        source_path,
        template,
        record: FileRecord::from_string("", base),
    }))
}

/// Compile every selected file, failing on the first error
pub(crate) fn compile_selected(
    selected: &[String],
    files: &Files,
    pipeline: &Pipeline,
    options: &CompileOptions,
    engine: &dyn TemplateEngine,
) -> Result<Vec<CompiledFile>> {
    selected
        .par_iter()
        .filter_map(|filename| compile_file(filename, files, pipeline, options, engine).transpose())
        .collect()
}

/// Insert a destination record and drop its source key when renamed
///
/// The destination is checked again against the live registry, since an
/// earlier unit of the same stage may have published under the same path.
/// Returns `None` when that path is taken and `overwrite` is off; the
/// source is then left untouched.
pub(crate) fn publish(
    files: &mut Files,
    pipeline: &Pipeline,
    unit: CompiledFile,
    overwrite: bool,
) -> Option<(FileId, CompiledTemplate)> {
    let CompiledFile {
        source,
        destination,
        source_path,
        template,
        record,
    } = unit;

    let existing = find_equal_path(
        &pipeline.destination_path(),
        &destination,
        files.iter().map(|(key, _)| key.as_str()),
    );
    let destination = match existing {
        Some(existing) if !overwrite => {
            trace!("Skipping {}: {existing} was published by this stage", source_path.display());
            return None;
        }
        Some(existing) => existing,
        None => destination,
    };

    let id = files.insert_file(destination.as_str(), record);
    if destination != source {
        files.remove(&source);
    }
    debug!("Published {source} -> {destination}");
    Some((id, template))
}
