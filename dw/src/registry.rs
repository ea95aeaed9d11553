//! Template Registry
//!
//! Wraps a Handlebars instance holding every named template of a compilation.
//! Names are unique; registering a name again replaces the earlier template.

use std::io::Write;
use std::path::Path;

use handlebars::{Context, Handlebars, Helper, HelperResult, Output, RenderContext, Template};
use tracing::{debug, info};

use crate::error::{CompileError, Result};
use crate::helpers::Capabilities;
use crate::scope::Scope;

/// Opening marker used in place of `{{` inside markup files
pub const MARKUP_OPEN: &str = "<!--{{";

/// Closing marker used in place of `}}` inside markup files
pub const MARKUP_CLOSE: &str = "}}-->";

/// Helper that re-emits backslashes lifted out from before a `{{` in markup files
const BACKSLASHES_HELPER: &str = "markup_backslashes";

/// Delimiter syntax applied to markup files at compile time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiters {
    /// `{{ ... }}` everywhere
    #[default]
    Standard,
    /// `<!--{{ ... }}-->` inside files with a markup extension
    Markup,
}

/// Construction-time registry settings
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    pub delimiters: Delimiters,
    /// Extensions (without the dot, lowercase) that count as markup
    pub markup_extensions: Vec<String>,
    /// Fail rendering on missing variables instead of substituting nothing
    pub strict: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            delimiters: Delimiters::Standard,
            markup_extensions: ["html", "htm", "xml", "svg", "xhtml"].iter().map(|s| s.to_string()).collect(),
            strict: false,
        }
    }
}

/// Store of compiled, named templates
pub struct TemplateRegistry {
    hbs: Handlebars<'static>,
    options: RegistryOptions,
}

impl TemplateRegistry {
    pub fn new(options: RegistryOptions) -> Self {
        debug!(?options, "TemplateRegistry::new: called");
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        hbs.set_strict_mode(options.strict);
        hbs.register_helper(BACKSLASHES_HELPER, Box::new(backslashes_helper));
        Self { hbs, options }
    }

    /// Inject the helper functions reachable from template bodies
    pub fn install(&mut self, capabilities: Capabilities) {
        for (name, helper) in capabilities.into_helpers() {
            debug!(%name, "TemplateRegistry::install: registering helper");
            self.hbs.register_helper(name, helper);
        }
    }

    /// Compile `text` under `name`, rewriting markup delimiters when enabled
    pub fn compile(&mut self, name: &str, text: &str) -> Result<()> {
        debug!(%name, len = text.len(), "TemplateRegistry::compile: called");
        if self.uses_markup_delimiters(name) {
            debug!(%name, "TemplateRegistry::compile: applying markup delimiters");
            let rewritten = rewrite_markup(name, text)?;
            self.register(name, &rewritten)
        } else {
            self.register(name, text)
        }
    }

    /// Read `root/relative` and compile it under its relative path
    pub fn compile_file(&mut self, root: &Path, relative: &str) -> Result<()> {
        let path = root.join(relative);
        let text = std::fs::read_to_string(&path).map_err(|source| CompileError::Read { path, source })?;
        info!("Compiling template {}", relative);
        self.compile(relative, &text)
    }

    /// Register an in-memory template, never rewriting delimiters
    ///
    /// For callers that own the registry. Helpers running inside a render
    /// only hold a shared borrow, so file-mode markdown bodies are rendered
    /// as anonymous templates instead (see `helpers::markdown`).
    pub fn parse_inline(&mut self, name: &str, text: &str) -> Result<()> {
        debug!(%name, len = text.len(), "TemplateRegistry::parse_inline: called");
        self.register(name, text)
    }

    /// Compiled template registered under `name`
    ///
    /// Library API; the render paths go through [`Self::contains`] and the
    /// engine's own lookup.
    pub fn lookup(&self, name: &str) -> Option<&Template> {
        self.hbs.get_template(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.hbs.has_template(name)
    }

    /// Registered template names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.hbs.get_templates().keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Execute `name` against `scope` and return the rendered text
    pub fn render(&self, name: &str, scope: &Scope) -> Result<String> {
        debug!(%name, depth = scope.depth(), "TemplateRegistry::render: called");
        if !self.contains(name) {
            return Err(CompileError::TemplateNotFound { name: name.to_string() });
        }
        let ctx = Context::wraps(scope.to_json()).map_err(|e| render_error(name, e))?;
        self.hbs.render_with_context(name, &ctx).map_err(|e| render_error(name, e))
    }

    /// Execute `name` against `scope`, streaming into `writer`
    pub fn render_to<W: Write>(&self, name: &str, scope: &Scope, writer: W) -> Result<()> {
        debug!(%name, depth = scope.depth(), "TemplateRegistry::render_to: called");
        if !self.contains(name) {
            return Err(CompileError::TemplateNotFound { name: name.to_string() });
        }
        self.hbs
            .render_to_write(name, &scope.to_json(), writer)
            .map_err(|e| render_error(name, e))
    }

    fn register(&mut self, name: &str, text: &str) -> Result<()> {
        if self.contains(name) {
            debug!(%name, "TemplateRegistry::register: replacing existing template");
        }
        self.hbs
            .register_template_string(name, text)
            .map_err(|e| CompileError::Parse {
                name: name.to_string(),
                message: e.to_string(),
            })
    }

    fn uses_markup_delimiters(&self, name: &str) -> bool {
        if self.options.delimiters != Delimiters::Markup {
            return false;
        }
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .is_some_and(|e| self.options.markup_extensions.iter().any(|m| *m == e))
    }
}

fn render_error(name: &str, err: handlebars::RenderError) -> CompileError {
    CompileError::Render {
        name: name.to_string(),
        message: err.to_string(),
    }
}

/// Translate `<!--{{ ... }}-->` into `{{ ... }}` and escape bare `{{`
fn rewrite_markup(name: &str, text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    loop {
        let open = rest.find(MARKUP_OPEN);
        let bare = rest.find("{{");
        match (open, bare) {
            (Some(o), b) if b.is_none_or(|b| o <= b) => {
                out.push_str(&rest[..o]);
                let after = &rest[o + MARKUP_OPEN.len()..];
                let Some(c) = after.find(MARKUP_CLOSE) else {
                    return Err(CompileError::Parse {
                        name: name.to_string(),
                        message: format!("unterminated {} at byte {}", MARKUP_OPEN, text.len() - rest.len() + o),
                    });
                };
                push_open(&mut out, "{{");
                out.push_str(&after[..c]);
                out.push_str("}}");
                rest = &after[c + MARKUP_CLOSE.len()..];
            }
            (_, Some(b)) => {
                out.push_str(&rest[..b]);
                push_open(&mut out, "\\{{");
                rest = &rest[b + 2..];
            }
            (_, None) => {
                out.push_str(rest);
                return Ok(out);
            }
        }
    }
}

/// Push `marker`, lifting trailing backslashes of `out` into a helper call
///
/// Handlebars treats a backslash directly before `{{` as an escape, so
/// literal backslashes there must not reach the parser.
fn push_open(out: &mut String, marker: &str) {
    let kept = out.trim_end_matches('\\').len();
    let count = out.len() - kept;
    if count > 0 {
        out.truncate(kept);
        out.push_str(&format!("{{{{{} {}}}}}", BACKSLASHES_HELPER, count));
    }
    out.push_str(marker);
}

fn backslashes_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let count = h.param(0).and_then(|v| v.value().as_u64()).unwrap_or(0) as usize;
    out.write(&"\\".repeat(count))?;
    Ok(())
}
