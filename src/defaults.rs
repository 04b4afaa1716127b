//! Default option sets for the compile, render and convert stages.
//!
//! The defaults are built once and only ever handed out by shared
//! reference. Resolving a stage's options clones from them, so nothing a
//! caller does to its own option values can reach back into the defaults.

use crate::config::{
    CompileOptions, ConvertOptions, EngineOptions, FilePattern, Locals, RenderOptions, Renamer,
};
use std::sync::LazyLock;

/// Glob selecting the files the compile and convert stages process by default
pub const DEFAULT_PATTERN: &str = "**/*.pug";

/// Extensions replaced by the default renamer
const TEMPLATE_EXTENSIONS: &[&str] = &[".pug", ".jade"];

static COMPILE_DEFAULTS: LazyLock<CompileOptions> = LazyLock::new(|| CompileOptions {
    pattern: Some(FilePattern::Many(vec![DEFAULT_PATTERN.to_string()])),
    renamer: default_renamer(),
    overwrite: true,
    copy_file_data: false,
    engine_options: EngineOptions::new(),
});

static RENDER_DEFAULTS: LazyLock<RenderOptions> = LazyLock::new(|| RenderOptions {
    pattern: None,
    locals: Locals::new(),
    use_metadata: false,
    reuse: false,
});

static CONVERT_DEFAULTS: LazyLock<ConvertOptions> = LazyLock::new(|| {
    let compile = compile_defaults();
    let render = render_defaults();
    ConvertOptions {
        pattern: compile.pattern.clone(),
        renamer: compile.renamer.clone(),
        overwrite: compile.overwrite,
        copy_file_data: compile.copy_file_data,
        locals: render.locals.clone(),
        use_metadata: render.use_metadata,
        engine_options: compile.engine_options.clone(),
    }
});

/// Default options of the compile stage
pub fn compile_defaults() -> &'static CompileOptions {
    &COMPILE_DEFAULTS
}

/// Default options of the render stage
pub fn render_defaults() -> &'static RenderOptions {
    &RENDER_DEFAULTS
}

/// Default options of the convert stage
pub fn convert_defaults() -> &'static ConvertOptions {
    &CONVERT_DEFAULTS
}

/// Replaces a trailing `.pug` or `.jade` with `.html`
pub fn default_renamer() -> Renamer {
    Renamer::new(|filename: &str| {
        TEMPLATE_EXTENSIONS
            .iter()
            .find_map(|extension| filename.strip_suffix(extension))
            .map(|stem| format!("{stem}.html"))
            .unwrap_or_else(|| filename.to_string())
    })
    .described("replace .pug/.jade with .html")
}
