//! # Stage Options and Pipeline Configuration
//!
//! This module defines the option sets accepted by the compile, render and
//! convert stages, and the parser for pipeline documents that wire those
//! stages together.
//!
//! ## Key Components
//!
//! - **`CompileOptions` / `RenderOptions` / `ConvertOptions`**: fully
//!   resolved option sets. Defaults live in [`crate::defaults`].
//!
//! - **`CompileOverrides` / `RenderOverrides` / `ConvertOverrides`**: the
//!   partial option sets callers supply. Every field is optional; unset
//!   fields fall back to the defaults (see [`crate::merge`]).
//!
//! - **`EngineOptions`**: every key a stage does not recognize. It is passed
//!   to the template engine untouched, so engine knobs flow through without
//!   this crate knowing their names.
//!
//! ## Pipeline documents
//!
//! [`parse`] reads a YAML document in the shape of a `metalsmith.json`:
//!
//! ```yaml
//! source: src
//! destination: build
//! metadata:
//!   site: Example
//! plugins:
//!   - compile:
//!       pattern: "**/*.jade"
//!   - render:
//!       useMetadata: true
//! ```
//!
//! A `renamer` is written as a regex mapping `{ from, to }`.

use crate::error::{Error, Result};
use crate::merge::split_options;
use crate::path::regex_replace;
use crate::pipeline::{Pipeline, Plugin};
use crate::stages::{Compile, Convert, Render};
use crate::suggestions;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Variables made available to a template at render time
pub type Locals = Map<String, Value>;

/// Options forwarded verbatim to the template engine
pub type EngineOptions = Map<String, Value>;

/// Keys recognized by the compile stage
pub const COMPILE_KEYS: &[&str] = &["pattern", "renamer", "overwrite", "copyFileData"];

/// Keys recognized by the render stage
pub const RENDER_KEYS: &[&str] = &["pattern", "locals", "useMetadata", "reuse"];

/// Keys recognized by the convert stage
pub const CONVERT_KEYS: &[&str] = &[
    "pattern",
    "renamer",
    "overwrite",
    "copyFileData",
    "locals",
    "useMetadata",
];

/// One glob or an ordered list of globs
///
/// Globs starting with `!` remove files from the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilePattern {
    One(String),
    Many(Vec<String>),
}

impl FilePattern {
    /// The globs in evaluation order
    pub fn globs(&self) -> Vec<&str> {
        match self {
            FilePattern::One(glob) => vec![glob.as_str()],
            FilePattern::Many(globs) => globs.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for FilePattern {
    fn from(glob: &str) -> Self {
        FilePattern::One(glob.to_string())
    }
}

impl From<Vec<&str>> for FilePattern {
    fn from(globs: Vec<&str>) -> Self {
        FilePattern::Many(globs.into_iter().map(str::to_string).collect())
    }
}

/// Rename mapping as written in configuration documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameMapping {
    /// A regular expression matched against the source path.
    pub from: String,
    /// Replacement for the first match; may reference capture groups (`$1`).
    pub to: String,
}

type RenameFn = dyn Fn(&str) -> Result<String> + Send + Sync;

/// Maps a source path to its destination path
#[derive(Clone)]
pub struct Renamer {
    rename: Arc<RenameFn>,
    description: String,
}

impl Renamer {
    /// Wrap an infallible function
    pub fn new<F>(rename: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            rename: Arc::new(move |filename: &str| Ok(rename(filename))),
            description: "custom".to_string(),
        }
    }

    /// Wrap a function that can reject a filename
    pub fn try_new<F>(rename: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            rename: Arc::new(rename),
            description: "custom".to_string(),
        }
    }

    /// Replace the first match of `from` with `to`; unmatched paths are kept
    pub fn regex(from: &str, to: &str) -> Result<Self> {
        let regex = Regex::new(from).map_err(|e| suggestions::invalid_regex(from, &e))?;
        let replacement = to.to_string();
        Ok(Self {
            description: format!("{from} -> {to}"),
            rename: Arc::new(move |filename: &str| {
                Ok(regex_replace(&regex, &replacement, filename)
                    .unwrap_or_else(|| filename.to_string()))
            }),
        })
    }

    /// Keep every path unchanged
    pub fn identity() -> Self {
        Self {
            rename: Arc::new(|filename: &str| Ok(filename.to_string())),
            description: "identity".to_string(),
        }
    }

    pub(crate) fn described(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Compute the destination path for `filename`
    pub fn rename(&self, filename: &str) -> Result<String> {
        (self.rename)(filename)
    }
}

impl fmt::Debug for Renamer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Renamer").field(&self.description).finish()
    }
}

impl<'de> Deserialize<'de> for Renamer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mapping = RenameMapping::deserialize(deserializer)?;
        Renamer::regex(&mapping.from, &mapping.to).map_err(serde::de::Error::custom)
    }
}

/// Resolved options of the compile stage
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Files to compile; `None` selects every file
    pub pattern: Option<FilePattern>,
    pub renamer: Renamer,
    /// Replace an existing destination instead of skipping the source
    pub overwrite: bool,
    /// Give the destination a copy of the source's attributes
    pub copy_file_data: bool,
    pub engine_options: EngineOptions,
}

/// Resolved options of the render stage
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Files to render; `None` selects every file
    pub pattern: Option<FilePattern>,
    pub locals: Locals,
    /// Layer pipeline metadata and file attributes over `locals`
    pub use_metadata: bool,
    /// Fall back to the previous render's overrides instead of the defaults
    pub reuse: bool,
}

/// Resolved options of the convert stage
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub pattern: Option<FilePattern>,
    pub renamer: Renamer,
    pub overwrite: bool,
    pub copy_file_data: bool,
    pub locals: Locals,
    pub use_metadata: bool,
    pub engine_options: EngineOptions,
}

impl ConvertOptions {
    /// The equivalent compile and render option sets
    pub fn split(&self) -> (CompileOptions, RenderOptions) {
        let compile = CompileOptions {
            pattern: self.pattern.clone(),
            renamer: self.renamer.clone(),
            overwrite: self.overwrite,
            copy_file_data: self.copy_file_data,
            engine_options: self.engine_options.clone(),
        };
        let render = RenderOptions {
            pattern: self.pattern.clone(),
            locals: self.locals.clone(),
            use_metadata: self.use_metadata,
            reuse: false,
        };
        (compile, render)
    }
}

/// Caller-supplied compile options
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompileOverrides {
    pub pattern: Option<FilePattern>,
    pub renamer: Option<Renamer>,
    pub overwrite: Option<bool>,
    pub copy_file_data: Option<bool>,
    #[serde(skip)]
    pub engine_options: EngineOptions,
}

/// Caller-supplied render options
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RenderOverrides {
    pub pattern: Option<FilePattern>,
    pub locals: Option<Locals>,
    pub use_metadata: Option<bool>,
    pub reuse: Option<bool>,
}

/// Caller-supplied convert options
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConvertOverrides {
    pub pattern: Option<FilePattern>,
    pub renamer: Option<Renamer>,
    pub overwrite: Option<bool>,
    pub copy_file_data: Option<bool>,
    pub locals: Option<Locals>,
    pub use_metadata: Option<bool>,
    #[serde(skip)]
    pub engine_options: EngineOptions,
}

impl CompileOverrides {
    /// Build overrides from a raw option map
    ///
    /// Recognized keys are typed; everything else becomes engine options.
    pub fn from_map(options: Map<String, Value>) -> Result<Self> {
        let (recognized, other) = split_options(options, COMPILE_KEYS);
        let mut overrides: Self = serde_json::from_value(Value::Object(recognized))?;
        overrides.engine_options = other;
        Ok(overrides)
    }
}

impl RenderOverrides {
    /// Build overrides from a raw option map
    ///
    /// The render stage never calls the engine, so unrecognized keys are
    /// dropped.
    pub fn from_map(options: Map<String, Value>) -> Result<Self> {
        let (recognized, _other) = split_options(options, RENDER_KEYS);
        Ok(serde_json::from_value(Value::Object(recognized))?)
    }
}

impl ConvertOverrides {
    /// Build overrides from a raw option map
    ///
    /// Recognized keys are typed; everything else becomes engine options.
    pub fn from_map(options: Map<String, Value>) -> Result<Self> {
        let (recognized, other) = split_options(options, CONVERT_KEYS);
        let mut overrides: Self = serde_json::from_value(Value::Object(recognized))?;
        overrides.engine_options = other;
        Ok(overrides)
    }
}

/// One entry of a pipeline document's `plugins` list
#[derive(Debug, Clone)]
pub enum StageConfig {
    Compile(CompileOverrides),
    Render(RenderOverrides),
    Convert(ConvertOverrides),
}

/// Names accepted in a pipeline document's `plugins` list
pub const STAGE_NAMES: &[&str] = &["compile", "render", "convert"];

impl StageConfig {
    /// Instantiate the stage with the default template engine
    pub fn into_plugin(self) -> Box<dyn Plugin> {
        match self {
            StageConfig::Compile(overrides) => Box::new(Compile::new(overrides)),
            StageConfig::Render(overrides) => Box::new(Render::new(overrides)),
            StageConfig::Convert(overrides) => Box::new(Convert::new(overrides)),
        }
    }
}

/// A parsed pipeline document
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Source directory, relative to the working directory
    pub source: PathBuf,
    /// Destination directory, relative to the working directory
    pub destination: PathBuf,
    /// Pipeline-wide metadata
    pub metadata: Map<String, Value>,
    /// Stages in execution order
    pub plugins: Vec<StageConfig>,
}

impl PipelineConfig {
    /// Build a pipeline rooted at `directory` running the configured stages
    pub fn build<P: AsRef<Path>>(self, directory: P) -> Pipeline {
        let mut pipeline = Pipeline::new(directory)
            .source(self.source)
            .destination(self.destination)
            .metadata(self.metadata);
        for stage in self.plugins {
            pipeline = pipeline.use_boxed_plugin(stage.into_plugin());
        }
        pipeline
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPipelineConfig {
    #[serde(default = "default_source")]
    source: PathBuf,
    #[serde(default = "default_destination")]
    destination: PathBuf,
    #[serde(default)]
    metadata: Map<String, Value>,
    #[serde(default)]
    plugins: Vec<Value>,
}

fn default_source() -> PathBuf {
    PathBuf::from("src")
}

fn default_destination() -> PathBuf {
    PathBuf::from("build")
}

/// Parses a YAML pipeline document
pub fn parse(yaml_content: &str) -> Result<PipelineConfig> {
    let raw: RawPipelineConfig = serde_yaml::from_str(yaml_content)?;

    let plugins = raw
        .plugins
        .into_iter()
        .map(parse_stage)
        .collect::<Result<Vec<_>>>()?;

    Ok(PipelineConfig {
        source: raw.source,
        destination: raw.destination,
        metadata: raw.metadata,
        plugins,
    })
}

fn parse_stage(value: Value) -> Result<StageConfig> {
    let Value::Object(entry) = value else {
        return Err(Error::ConfigParse {
            message: "Expected a mapping for each plugin entry".to_string(),
            hint: Some("Write plugins as `- compile: { ... }`".to_string()),
        });
    };
    if entry.len() != 1 {
        return Err(Error::ConfigParse {
            message: format!("Plugin entry must have exactly one key, found {}", entry.len()),
            hint: Some("Split multiple plugins into separate list items".to_string()),
        });
    }

    let Some((name, options)) = entry.into_iter().next() else {
        return Err(Error::ConfigParse {
            message: "Empty plugin entry".to_string(),
            hint: None,
        });
    };
    let options = match options {
        Value::Null => Map::new(),
        Value::Object(options) => options,
        _ => {
            return Err(Error::ConfigParse {
                message: format!("Options for plugin '{name}' must be a mapping"),
                hint: None,
            });
        }
    };

    match name.as_str() {
        "compile" => Ok(StageConfig::Compile(CompileOverrides::from_map(options)?)),
        "render" => Ok(StageConfig::Render(RenderOverrides::from_map(options)?)),
        "convert" => Ok(StageConfig::Convert(ConvertOverrides::from_map(options)?)),
        other => Err(suggestions::unknown_stage(other)),
    }
}

/// Parse a pipeline document from a YAML file path
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<PipelineConfig> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}
