//! Option merging and variable precedence
//!
//! Three layering rules live here:
//!
//! - **Default merge**: a resolved option set is the defaults with every
//!   field the caller supplied replaced wholesale. Engine options merge key
//!   by key. Locals are copied, never shared with the caller.
//! - **Reuse**: the render stage can carry the previous call's overrides
//!   forward. The carried state is kept per [`Pipeline`](crate::pipeline::Pipeline)
//!   in a [`RenderHistory`].
//! - **Scope**: the variables a template sees are `locals`, then pipeline
//!   metadata, then the file's own attributes, later layers winning.

use crate::config::{
    CompileOptions, CompileOverrides, ConvertOptions, ConvertOverrides, EngineOptions, Locals,
    RenderOptions, RenderOverrides,
};
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::sync::{Mutex, MutexGuard};

/// Resolve a partial option set against defaults
pub trait Merge<O> {
    fn merged(&self, overrides: &O) -> Self;
}

impl Merge<CompileOverrides> for CompileOptions {
    fn merged(&self, overrides: &CompileOverrides) -> Self {
        Self {
            pattern: overrides.pattern.clone().or_else(|| self.pattern.clone()),
            renamer: overrides.renamer.clone().unwrap_or_else(|| self.renamer.clone()),
            overwrite: overrides.overwrite.unwrap_or(self.overwrite),
            copy_file_data: overrides.copy_file_data.unwrap_or(self.copy_file_data),
            engine_options: merge_engine_options(&self.engine_options, &overrides.engine_options),
        }
    }
}

impl Merge<RenderOverrides> for RenderOptions {
    fn merged(&self, overrides: &RenderOverrides) -> Self {
        Self {
            pattern: overrides.pattern.clone().or_else(|| self.pattern.clone()),
            locals: overrides.locals.clone().unwrap_or_else(|| self.locals.clone()),
            use_metadata: overrides.use_metadata.unwrap_or(self.use_metadata),
            reuse: overrides.reuse.unwrap_or(self.reuse),
        }
    }
}

impl Merge<ConvertOverrides> for ConvertOptions {
    fn merged(&self, overrides: &ConvertOverrides) -> Self {
        Self {
            pattern: overrides.pattern.clone().or_else(|| self.pattern.clone()),
            renamer: overrides.renamer.clone().unwrap_or_else(|| self.renamer.clone()),
            overwrite: overrides.overwrite.unwrap_or(self.overwrite),
            copy_file_data: overrides.copy_file_data.unwrap_or(self.copy_file_data),
            locals: overrides.locals.clone().unwrap_or_else(|| self.locals.clone()),
            use_metadata: overrides.use_metadata.unwrap_or(self.use_metadata),
            engine_options: merge_engine_options(&self.engine_options, &overrides.engine_options),
        }
    }
}

/// Merge engine options key by key, `overrides` winning
pub fn merge_engine_options(defaults: &EngineOptions, overrides: &EngineOptions) -> EngineOptions {
    let mut merged = defaults.clone();
    merged.extend(overrides.iter().map(|(key, value)| (key.clone(), value.clone())));
    merged
}

/// Split a raw option map into recognized keys and everything else
///
/// Values are moved, not inspected: the second map is exactly what the
/// template engine should receive.
pub fn split_options(
    options: Map<String, Value>,
    recognized: &[&str],
) -> (Map<String, Value>, Map<String, Value>) {
    options
        .into_iter()
        .partition(|(key, _)| recognized.contains(&key.as_str()))
}

impl RenderOverrides {
    /// Shallow merge of two override sets, `next` winning per field
    pub fn layered(previous: &RenderOverrides, next: &RenderOverrides) -> RenderOverrides {
        RenderOverrides {
            pattern: next.pattern.clone().or_else(|| previous.pattern.clone()),
            locals: next.locals.clone().or_else(|| previous.locals.clone()),
            use_metadata: next.use_metadata.or(previous.use_metadata),
            reuse: next.reuse.or(previous.reuse),
        }
    }
}

/// The overrides of the most recent render on one pipeline
#[derive(Debug, Default)]
pub struct RenderHistory {
    previous: Mutex<Option<RenderOverrides>>,
}

impl RenderHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the effective render options for one invocation
    ///
    /// When the caller asks for `reuse` and an earlier render exists, the
    /// earlier call's overrides are layered under the caller's. The layered
    /// overrides (or the caller's own, without reuse) become the baseline
    /// for the next call either way.
    pub fn resolve(
        &self,
        defaults: &RenderOptions,
        overrides: &RenderOverrides,
    ) -> Result<RenderOptions> {
        let (resolved, partial) = self.plan(defaults, overrides)?;
        self.record(partial)?;
        Ok(resolved)
    }

    /// Resolve options like [`resolve`](Self::resolve) without moving the
    /// baseline
    ///
    /// Returns the resolved options and the overrides to hand to
    /// [`record`](Self::record) once the invocation is known to proceed.
    pub fn plan(
        &self,
        defaults: &RenderOptions,
        overrides: &RenderOverrides,
    ) -> Result<(RenderOptions, RenderOverrides)> {
        let previous = self.lock()?;

        let requested = defaults.merged(overrides);
        let partial = match previous.as_ref() {
            Some(earlier) if requested.reuse => RenderOverrides::layered(earlier, overrides),
            _ => overrides.clone(),
        };

        Ok((defaults.merged(&partial), partial))
    }

    /// Make `partial` the baseline for the next reusing render
    pub fn record(&self, partial: RenderOverrides) -> Result<()> {
        *self.lock()? = Some(partial);
        Ok(())
    }

    /// The baseline the next reusing render will start from
    pub fn previous(&self) -> Result<Option<RenderOverrides>> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<RenderOverrides>>> {
        self.previous.lock().map_err(|_| Error::LockPoisoned {
            context: "render history".to_string(),
        })
    }
}

/// Build the variables a template is rendered with
///
/// Starts from `locals`; with `use_metadata`, pipeline `metadata` and then
/// the file's `attributes` are layered on top. The `contents` key never
/// enters the scope. The returned map is owned and independent of every
/// input.
pub fn build_scope(
    locals: &Locals,
    use_metadata: bool,
    metadata: &Map<String, Value>,
    attributes: &Map<String, Value>,
) -> Locals {
    let mut scope = locals.clone();
    if use_metadata {
        scope.extend(metadata.iter().map(|(key, value)| (key.clone(), value.clone())));
        scope.extend(
            attributes
                .iter()
                .filter(|(key, _)| key.as_str() != "contents")
                .map(|(key, value)| (key.clone(), value.clone())),
        );
    }
    scope
}
