//! Shared test utilities for integration tests.
//!
//! This module provides a small line-oriented markup engine, fixtures and
//! helper functions to reduce duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let engine = MarkupEngine::shared();
//!     let mut files = files_from(&[("index.pug", "h1 Hello World")]);
//!     // ... test code
//! }
//! ```

use render_stages::config::{EngineOptions, Locals};
use render_stages::engine::{CompiledTemplate, TemplateEngine};
use render_stages::error::{Error, Result};
use render_stages::filesystem::Files;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Re-export commonly used test helpers for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use super::{files_from, map, site, CompileCall, MarkupEngine};
}

/// Elements rendered without a closing tag under the default doctype.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

/// One parsed line of markup.
#[derive(Debug, Clone)]
enum Node {
    Doctype(String),
    Text(String),
    Element { tag: String, text: String },
    Interpolated { tag: String, variable: String },
}

/// The arguments of one `compile` call seen by a [`MarkupEngine`].
#[derive(Debug, Clone)]
pub struct CompileCall {
    pub options: EngineOptions,
    pub filename: PathBuf,
}

/// A tiny indentation-free markup language, enough to exercise the stages.
///
/// One element per line:
///
/// - `h1 Hello` renders `<h1>Hello</h1>`
/// - `p= name` (or `p=name`) renders the `name` variable inside `<p>`
/// - `| text` renders `text` as is
/// - `br` renders a bare element; void elements have no closing tag unless
///   the `doctype` engine option is `"xml"`
/// - `doctype html` renders `<!DOCTYPE html>`
///
/// Output lines are concatenated without separators. A line starting with
/// `=` is a syntax error. Every call to `compile` is recorded.
#[derive(Debug, Default)]
pub struct MarkupEngine {
    calls: Mutex<Vec<CompileCall>>,
}

impl MarkupEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine ready to hand to `Compile::with_engine`.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Every `compile` call so far, in order.
    #[allow(dead_code)]
    pub fn calls(&self) -> Vec<CompileCall> {
        self.calls.lock().unwrap().clone()
    }

    fn parse(source: &str, filename: &Path) -> Result<Vec<Node>> {
        source
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| parse_line(line, filename))
            .collect()
    }
}

fn parse_line(line: &str, filename: &Path) -> Result<Node> {
    if line.starts_with('=') {
        return Err(Error::Template {
            message: format!("unexpected '=' in line: {line}"),
            file: Some(filename.display().to_string()),
        });
    }
    if let Some(text) = line.strip_prefix('|') {
        return Ok(Node::Text(text.trim_start().to_string()));
    }
    if let Some(kind) = line.strip_prefix("doctype ") {
        return Ok(Node::Doctype(kind.trim().to_string()));
    }

    let tag_end = line
        .find(|c: char| c == ' ' || c == '=')
        .unwrap_or(line.len());
    let (tag, rest) = line.split_at(tag_end);
    let tag = tag.to_string();

    if let Some(variable) = rest.strip_prefix('=') {
        return Ok(Node::Interpolated {
            tag,
            variable: variable.trim().to_string(),
        });
    }
    Ok(Node::Element {
        tag,
        text: rest.trim_start().to_string(),
    })
}

fn display(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn render(nodes: &[Node], xml: bool, scope: &Locals) -> String {
    nodes
        .iter()
        .map(|node| match node {
            Node::Doctype(kind) if kind == "html" => "<!DOCTYPE html>".to_string(),
            Node::Doctype(kind) => format!("<!DOCTYPE {kind}>"),
            Node::Text(text) => text.clone(),
            Node::Element { tag, text } if text.is_empty() && VOID_TAGS.contains(&tag.as_str()) => {
                if xml {
                    format!("<{tag}></{tag}>")
                } else {
                    format!("<{tag}>")
                }
            }
            Node::Element { tag, text } => format!("<{tag}>{text}</{tag}>"),
            Node::Interpolated { tag, variable } => {
                format!("<{tag}>{}</{tag}>", display(scope.get(variable)))
            }
        })
        .collect()
}

impl TemplateEngine for MarkupEngine {
    fn compile(
        &self,
        source: &str,
        options: &EngineOptions,
        filename: &Path,
    ) -> Result<CompiledTemplate> {
        self.calls.lock().unwrap().push(CompileCall {
            options: options.clone(),
            filename: filename.to_path_buf(),
        });

        let nodes = Self::parse(source, filename)?;
        let xml = options.get("doctype").and_then(Value::as_str) == Some("xml");
        Ok(CompiledTemplate::new(move |scope| Ok(render(&nodes, xml, scope))))
    }
}

/// Build a registry from `(key, contents)` pairs.
#[allow(dead_code)]
pub fn files_from(entries: &[(&str, &str)]) -> Files {
    let mut files = Files::new();
    for (name, contents) in entries {
        files.add_file(*name, contents, None);
    }
    files
}

/// Convert a `json!` object into a map.
#[allow(dead_code)]
pub fn map(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

/// The working directory used by pipelines in tests.
#[allow(dead_code)]
pub fn site() -> PathBuf {
    PathBuf::from("/site")
}
