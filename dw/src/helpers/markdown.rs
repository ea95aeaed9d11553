//! `markdown` helper: expand a markdown body as a template, then convert it

use std::sync::Arc;

use handlebars::{Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext};
use tracing::{debug, info};

use super::{Invoker, params_from, render_error, required_param};
use crate::args::{flag, parse_args};
use crate::error::CompileError;
use crate::markdown::MarkdownRenderer;

/// Argument key that turns on the table of contents
pub const TOC_KEY: &str = "toc";

/// `{{markdown "target" "k=v" ...}}`
///
/// `target` names a registered template when one exists, otherwise a file
/// relative to the document's source root. Either way the body is rendered
/// through the template engine in a child scope before HTML conversion.
pub struct MarkdownHelper {
    invoker: Arc<Invoker>,
    renderer: MarkdownRenderer,
}

impl MarkdownHelper {
    pub fn new(invoker: Arc<Invoker>, renderer: MarkdownRenderer) -> Self {
        Self { invoker, renderer }
    }

    fn expand(&self, r: &Handlebars<'_>, target: &str, ctx: &Context) -> Result<String, CompileError> {
        if r.has_template(target) {
            debug!(%target, "MarkdownHelper::expand: using registered template");
            return r.render_with_context(target, ctx).map_err(|e| CompileError::Render {
                name: target.to_string(),
                message: e.to_string(),
            });
        }

        let path = self.invoker.source_root().join(target);
        debug!(?path, "MarkdownHelper::expand: reading file");
        let source = std::fs::read_to_string(&path).map_err(|source| CompileError::Read { path, source })?;
        r.render_template_with_context(&source, ctx)
            .map_err(|e| CompileError::Render {
                name: target.to_string(),
                message: e.to_string(),
            })
    }
}

impl HelperDef for MarkdownHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let target = required_param(h, 0)?;
        let args = params_from(h, 1);
        info!("markdown {} {}", target, args.join(","));

        let bindings = parse_args(&args).map_err(render_error)?;
        let with_toc = flag(&bindings, TOC_KEY);

        let guard = self.invoker.enter(&target, &bindings).map_err(render_error)?;
        let ctx = Context::wraps(guard.scope().to_json())?;
        let expanded = self.expand(r, &target, &ctx).map_err(render_error)?;
        let html = self
            .renderer
            .render(&target, &expanded, with_toc)
            .map_err(render_error)?;
        drop(guard);

        out.write(&html)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::{Capabilities, MacroHelper};
    use crate::registry::{RegistryOptions, TemplateRegistry};
    use crate::scope::Scope;
    use tempfile::TempDir;

    fn setup(dir: &TempDir) -> (TemplateRegistry, Arc<Invoker>) {
        let invoker = Arc::new(Invoker::new(Scope::empty(), dir.path(), 8));
        let mut registry = TemplateRegistry::new(RegistryOptions::default());
        registry.install(
            Capabilities::new()
                .with("macro", MacroHelper::new(invoker.clone()))
                .with("markdown", MarkdownHelper::new(invoker.clone(), MarkdownRenderer::default())),
        );
        (registry, invoker)
    }

    #[test]
    fn test_file_mode_expands_variables() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("intro.md"), "# {{title}}\n\nBody text.\n").unwrap();
        let (mut reg, invoker) = setup(&dir);
        reg.compile("root", "{{markdown \"intro.md\" \"title=Welcome\"}}").unwrap();

        let html = reg.render("root", &invoker.current()).unwrap();
        assert!(html.contains("<h1 id=\"intro-welcome\">Welcome</h1>"));
        assert!(html.contains("<p>Body text.</p>"));
        assert!(!html.contains("<nav"));
        assert_eq!(invoker.nesting(), 0);
    }

    #[test]
    fn test_registry_mode_with_toc() {
        let dir = TempDir::new().unwrap();
        let (mut reg, invoker) = setup(&dir);
        reg.compile("notes/guide.md", "# Title\n\nBody text.\n").unwrap();
        reg.compile("root", "{{markdown \"notes/guide.md\" \"toc=true\"}}").unwrap();

        let html = reg.render("root", &invoker.current()).unwrap();
        assert!(html.contains("<nav class=\"toc\">"));
        assert!(html.contains("href=\"#guide-title\""));
        assert!(html.contains("<h1 id=\"guide-title\">Title</h1>"));
    }

    #[test]
    fn test_unparsable_toc_is_false() {
        let dir = TempDir::new().unwrap();
        let (mut reg, invoker) = setup(&dir);
        reg.compile("doc.md", "# Title\n").unwrap();
        reg.compile("root", "{{markdown \"doc.md\" \"toc=maybe\"}}").unwrap();
        assert!(!reg.render("root", &invoker.current()).unwrap().contains("<nav"));
    }

    #[test]
    fn test_macros_inside_markdown() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("body.md"), "Say *{{macro \"hello\" \"who=you\"}}*\n").unwrap();
        let (mut reg, invoker) = setup(&dir);
        reg.compile("hello", "hi {{who}}").unwrap();
        reg.compile("root", "{{markdown \"body.md\"}}").unwrap();

        let html = reg.render("root", &invoker.current()).unwrap();
        assert!(html.contains("<p>Say <em>hi you</em></p>"));
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let (mut reg, invoker) = setup(&dir);
        reg.compile("root", "{{markdown \"absent.md\"}}").unwrap();
        let err = reg.render("root", &invoker.current()).unwrap_err();
        assert!(err.to_string().contains("absent.md"));
        assert_eq!(invoker.nesting(), 0);
    }
}
