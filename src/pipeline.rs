//! Host pipeline boundary
//!
//! A [`Pipeline`] holds what stages need from their host: the working,
//! source and destination directories, the pipeline-wide metadata, and the
//! per-pipeline state the stages share (compiled template associations and
//! render option history). [`Pipeline::run`] passes a [`Files`] registry
//! through each plugin in order and stops at the first error.

use std::path::{Path, PathBuf};

use log::debug;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::filesystem::Files;
use crate::merge::RenderHistory;
use crate::template_map::TemplateMap;

/// One step of a pipeline
pub trait Plugin: Send + Sync {
    /// Name used in log messages
    fn name(&self) -> &str;

    /// Process the registry in place
    ///
    /// Returning an error aborts the pipeline run.
    fn run(&self, files: &mut Files, pipeline: &Pipeline) -> Result<()>;
}

/// An ordered list of plugins plus the context they run in
pub struct Pipeline {
    directory: PathBuf,
    source: PathBuf,
    destination: PathBuf,
    metadata: Map<String, Value>,
    plugins: Vec<Box<dyn Plugin>>,
    templates: TemplateMap,
    render_history: RenderHistory,
}

impl Pipeline {
    /// Create a pipeline working in `directory`, with `src` and `build` as
    /// source and destination
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            source: PathBuf::from("src"),
            destination: PathBuf::from("build"),
            metadata: Map::new(),
            plugins: Vec::new(),
            templates: TemplateMap::new(),
            render_history: RenderHistory::new(),
        }
    }

    /// Set the source directory, relative to the working directory
    pub fn source<P: AsRef<Path>>(mut self, source: P) -> Self {
        self.source = source.as_ref().to_path_buf();
        self
    }

    /// Set the destination directory, relative to the working directory
    pub fn destination<P: AsRef<Path>>(mut self, destination: P) -> Self {
        self.destination = destination.as_ref().to_path_buf();
        self
    }

    /// Replace the pipeline-wide metadata
    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Append a plugin
    pub fn use_plugin<P: Plugin + 'static>(self, plugin: P) -> Self {
        self.use_boxed_plugin(Box::new(plugin))
    }

    /// Append an already boxed plugin
    pub fn use_boxed_plugin(mut self, plugin: Box<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Absolute source directory
    pub fn source_path(&self) -> PathBuf {
        self.directory.join(&self.source)
    }

    /// Absolute destination directory
    pub fn destination_path(&self) -> PathBuf {
        self.directory.join(&self.destination)
    }

    /// Join `parts` onto the working directory
    pub fn path<I, P>(&self, parts: I) -> PathBuf
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        parts
            .into_iter()
            .fold(self.directory.clone(), |path, part| path.join(part))
    }

    pub fn metadata_map(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Compiled templates waiting to be rendered
    pub fn templates(&self) -> &TemplateMap {
        &self.templates
    }

    /// Options of the most recent render on this pipeline
    pub fn render_history(&self) -> &RenderHistory {
        &self.render_history
    }

    /// Number of plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Run every plugin over `files` in order
    pub fn run(&self, files: &mut Files) -> Result<()> {
        for plugin in &self.plugins {
            debug!("Running plugin {} over {} entries", plugin.name(), files.len());
            plugin.run(files, self)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("directory", &self.directory)
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Touch {
        key: &'static str,
        calls: Arc<AtomicUsize>,
    }

    impl Plugin for Touch {
        fn name(&self) -> &str {
            "touch"
        }

        fn run(&self, files: &mut Files, _pipeline: &Pipeline) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            files.add_file(self.key, "", None);
            Ok(())
        }
    }

    struct Fail;

    impl Plugin for Fail {
        fn name(&self) -> &str {
            "fail"
        }

        fn run(&self, _files: &mut Files, _pipeline: &Pipeline) -> Result<()> {
            Err(Error::Template {
                message: "boom".to_string(),
                file: None,
            })
        }
    }

    #[test]
    fn test_paths() {
        let pipeline = Pipeline::new("/site").source("pages").destination("public");
        assert_eq!(pipeline.source_path(), PathBuf::from("/site/pages"));
        assert_eq!(pipeline.destination_path(), PathBuf::from("/site/public"));
        assert_eq!(
            pipeline.path(["pages", "blog/index.pug"]),
            PathBuf::from("/site/pages/blog/index.pug")
        );
    }

    #[test]
    fn test_default_directories() {
        let pipeline = Pipeline::new("/site");
        assert_eq!(pipeline.source_path(), PathBuf::from("/site/src"));
        assert_eq!(pipeline.destination_path(), PathBuf::from("/site/build"));
        assert!(pipeline.is_empty());
    }

    #[test]
    fn test_metadata() {
        let metadata = json!({ "site": "Example" }).as_object().cloned().unwrap();
        let pipeline = Pipeline::new("/site").metadata(metadata.clone());
        assert_eq!(pipeline.metadata_map(), &metadata);
    }

    #[test]
    fn test_run_in_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new("/site")
            .use_plugin(Touch {
                key: "a",
                calls: Arc::clone(&calls),
            })
            .use_plugin(Touch {
                key: "b",
                calls: Arc::clone(&calls),
            });

        let mut files = Files::new();
        pipeline.run(&mut files).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(files.exists("a"));
        assert!(files.exists("b"));
        assert_eq!(pipeline.len(), 2);
    }

    #[test]
    fn test_run_stops_at_first_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new("/site").use_plugin(Fail).use_plugin(Touch {
            key: "never",
            calls: Arc::clone(&calls),
        });

        let mut files = Files::new();
        assert!(pipeline.run(&mut files).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!files.exists("never"));
    }
}
