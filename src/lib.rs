//! # Render Stages Library
//!
//! This library provides pipeline stages that turn template sources held in
//! an in-memory file registry into rendered output files. It is meant to be
//! embedded in a static site pipeline: the host reads the source tree into a
//! [`filesystem::Files`] registry, runs the stages, and writes the result.
//!
//! ## Quick Example
//!
//! ```
//! use render_stages::filesystem::Files;
//! use render_stages::pipeline::Pipeline;
//! use render_stages::config::{CompileOverrides, RenderOverrides};
//! use render_stages::stages::{Compile, Render};
//! use serde_json::json;
//!
//! let mut files = Files::new();
//! files.add_file("index.pug", "<h1>{{ title }}</h1>", None);
//!
//! let pipeline = Pipeline::new("/site")
//!     .metadata(json!({ "title": "Hello World" }).as_object().cloned().unwrap())
//!     .use_plugin(Compile::new(CompileOverrides::default()))
//!     .use_plugin(Render::new(RenderOverrides {
//!         use_metadata: Some(true),
//!         ..Default::default()
//!     }));
//!
//! pipeline.run(&mut files).unwrap();
//! assert!(!files.exists("index.pug"));
//! assert_eq!(
//!     files.get_file("index.html").unwrap().contents_str(),
//!     Some("<h1>Hello World</h1>")
//! );
//! ```
//!
//! ## Core Concepts
//!
//! - **File registry (`filesystem`)**: keys are paths relative to the source
//!   root; every file record has a stable identity that survives renames.
//! - **Stages (`stages`)**: `Compile` compiles sources and publishes empty
//!   destination records, `Render` fills them in later, `Convert` does both
//!   at once.
//! - **Options (`config`, `defaults`, `merge`)**: partial option sets are
//!   merged over immutable defaults; unrecognized keys go to the template
//!   engine.
//! - **Template engine (`engine`)**: a trait with a MiniJinja
//!   implementation.
//! - **Pipeline (`pipeline`)**: the host boundary holding directories,
//!   metadata and the state shared between stages of one pipeline.

pub mod config;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod filesystem;
pub mod merge;
pub mod path;
pub mod pipeline;
pub mod stages;
pub mod suggestions;
pub mod template_map;

#[cfg(test)]
mod path_proptest;
