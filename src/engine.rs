//! Template engine abstraction.
//!
//! This module defines the [`TemplateEngine`] trait, the seam between the
//! stages and whatever turns template source into text. Compiling yields a
//! [`CompiledTemplate`] that the render stage can invoke much later, after
//! any number of other pipeline stages have run.
//!
//! The default implementation is [`MiniJinjaEngine`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::warn;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};

use crate::config::{EngineOptions, Locals};
use crate::error::{Error, Result};

type RenderFn = dyn Fn(&Locals) -> Result<String> + Send + Sync;

/// A compiled template, ready to be rendered with a variable scope
#[derive(Clone)]
pub struct CompiledTemplate {
    render: Arc<RenderFn>,
}

impl CompiledTemplate {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&Locals) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            render: Arc::new(render),
        }
    }

    /// Render the template with `scope`
    pub fn render(&self, scope: &Locals) -> Result<String> {
        (self.render)(scope)
    }
}

impl fmt::Debug for CompiledTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CompiledTemplate")
    }
}

/// A template engine that compiles source text into invocable templates.
pub trait TemplateEngine: Send + Sync {
    /// Compiles `source`.
    ///
    /// `options` are the stage's unrecognized options, forwarded untouched.
    /// `filename` is the absolute source path, used in diagnostics and to
    /// resolve relative includes.
    fn compile(
        &self,
        source: &str,
        options: &EngineOptions,
        filename: &Path,
    ) -> Result<CompiledTemplate>;
}

/// MiniJinja-based template engine.
///
/// Each compiled template owns its own environment. Recognized engine
/// options:
///
/// - `trimBlocks`, `lstripBlocks`, `keepTrailingNewline`, `autoescape`: booleans
/// - `undefined`: `"lenient"`, `"chainable"` or `"strict"`
/// - `basedir`: directory for `include`/`extends` lookups; defaults to the
///   directory of the template itself
///
/// Other keys are ignored.
///
/// # Example
///
/// ```rust
/// use render_stages::engine::{MiniJinjaEngine, TemplateEngine};
/// use render_stages::config::EngineOptions;
/// use serde_json::json;
/// use std::path::Path;
///
/// let engine = MiniJinjaEngine::new();
/// let template = engine
///     .compile("Hello, {{ name }}!", &EngineOptions::new(), Path::new("/site/src/hello.pug"))
///     .unwrap();
/// let scope = json!({ "name": "World" }).as_object().cloned().unwrap();
/// assert_eq!(template.render(&scope).unwrap(), "Hello, World!");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MiniJinjaEngine;

impl MiniJinjaEngine {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn compile(
        &self,
        source: &str,
        options: &EngineOptions,
        filename: &Path,
    ) -> Result<CompiledTemplate> {
        let mut env = Environment::new();
        configure(&mut env, options, filename);

        let name = filename.to_string_lossy().into_owned();
        env.add_template_owned(name.clone(), source.to_string())
            .map_err(|e| template_error(e, filename))?;

        let env = Arc::new(env);
        let path = filename.to_path_buf();
        Ok(CompiledTemplate::new(move |scope| {
            let template = env
                .get_template(&name)
                .map_err(|e| template_error(e, &path))?;
            template.render(scope).map_err(|e| template_error(e, &path))
        }))
    }
}

fn template_error(error: minijinja::Error, filename: &Path) -> Error {
    Error::Template {
        message: error.to_string(),
        file: Some(filename.display().to_string()),
    }
}

fn configure(env: &mut Environment<'static>, options: &EngineOptions, filename: &Path) {
    for (key, value) in options {
        match key.as_str() {
            "trimBlocks" => {
                if let Some(yes) = bool_option(key, value) {
                    env.set_trim_blocks(yes);
                }
            }
            "lstripBlocks" => {
                if let Some(yes) = bool_option(key, value) {
                    env.set_lstrip_blocks(yes);
                }
            }
            "keepTrailingNewline" => {
                if let Some(yes) = bool_option(key, value) {
                    env.set_keep_trailing_newline(yes);
                }
            }
            "autoescape" => {
                if let Some(yes) = bool_option(key, value) {
                    env.set_auto_escape_callback(move |_| {
                        if yes { AutoEscape::Html } else { AutoEscape::None }
                    });
                }
            }
            "undefined" => match value.as_str() {
                Some("lenient") => env.set_undefined_behavior(UndefinedBehavior::Lenient),
                Some("chainable") => env.set_undefined_behavior(UndefinedBehavior::Chainable),
                Some("strict") => env.set_undefined_behavior(UndefinedBehavior::Strict),
                _ => warn!("Ignoring engine option undefined={value}: expected lenient, chainable or strict"),
            },
            _ => {}
        }
    }

    let basedir = match options.get("basedir") {
        Some(value) => match value.as_str() {
            Some(dir) => Some(PathBuf::from(dir)),
            None => {
                warn!("Ignoring engine option basedir={value}: expected a path");
                filename.parent().map(Path::to_path_buf)
            }
        },
        None => filename.parent().map(Path::to_path_buf),
    };
    if let Some(dir) = basedir {
        env.set_loader(minijinja::path_loader(dir));
    }
}

fn bool_option(key: &str, value: &serde_json::Value) -> Option<bool> {
    let flag = value.as_bool();
    if flag.is_none() {
        warn!("Ignoring engine option {key}={value}: expected a boolean");
    }
    flag
}
