//! `macro` helper: call a registered template as a parameterized function

use std::sync::Arc;

use handlebars::{Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext};
use tracing::{debug, info};

use super::{Invoker, params_from, render_error, required_param};
use crate::args::parse_args;
use crate::error::CompileError;

/// `{{macro "name" "k1=v1" "k2=v2"}}`
///
/// Renders template `name` against a child scope built from the arguments and
/// substitutes the result inline.
pub struct MacroHelper {
    invoker: Arc<Invoker>,
}

impl MacroHelper {
    pub fn new(invoker: Arc<Invoker>) -> Self {
        Self { invoker }
    }
}

impl HelperDef for MacroHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let name = required_param(h, 0)?;
        let args = params_from(h, 1);
        info!("macro {} {}", name, args.join(","));

        let bindings = parse_args(&args).map_err(render_error)?;
        let guard = self.invoker.enter(&name, &bindings).map_err(render_error)?;

        if !r.has_template(&name) {
            debug!(%name, "MacroHelper::call: template not registered");
            return Err(render_error(CompileError::MacroNotFound { name }));
        }

        let ctx = Context::wraps(guard.scope().to_json())?;
        let rendered = r.render_with_context(&name, &ctx).map_err(|e| {
            render_error(CompileError::Render {
                name: name.clone(),
                message: e.to_string(),
            })
        })?;
        drop(guard);

        debug!(%name, len = rendered.len(), "MacroHelper::call: rendered");
        out.write(&rendered)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{RegistryOptions, TemplateRegistry};
    use crate::scope::Scope;

    fn setup(root: &[&str], max_depth: usize) -> (TemplateRegistry, Arc<Invoker>) {
        let scope = Scope::root(&parse_args(root).unwrap());
        let invoker = Arc::new(Invoker::new(scope, ".", max_depth));
        let mut registry = TemplateRegistry::new(RegistryOptions::default());
        registry.install(crate::helpers::Capabilities::new().with("macro", MacroHelper::new(invoker.clone())));
        (registry, invoker)
    }

    #[test]
    fn test_macro_greets() {
        let (mut reg, invoker) = setup(&[], 8);
        reg.compile("greet", "{{who}}!").unwrap();
        reg.compile("root", "Hello {{macro \"greet\" \"who=World\"}}").unwrap();
        assert_eq!(reg.render("root", &invoker.current()).unwrap(), "Hello World!");
    }

    #[test]
    fn test_macro_does_not_leak_bindings() {
        let (mut reg, invoker) = setup(&["x=1"], 8);
        reg.compile("setx", "[{{x}}]").unwrap();
        reg.compile("root", "{{macro \"setx\" \"x=5\"}}{{x}}{{y}}").unwrap();
        assert_eq!(reg.render("root", &invoker.current()).unwrap(), "[5]1");
        assert_eq!(invoker.nesting(), 0);
    }

    #[test]
    fn test_nested_macros_see_outer_bindings() {
        let (mut reg, invoker) = setup(&["site=Docs"], 8);
        reg.compile("inner", "{{site}}/{{page}}/{{section}}").unwrap();
        reg.compile("outer", "{{macro \"inner\" \"section=intro\"}}").unwrap();
        reg.compile("root", "{{macro \"outer\" \"page=guide\"}}").unwrap();
        assert_eq!(reg.render("root", &invoker.current()).unwrap(), "Docs/guide/intro");
    }

    #[test]
    fn test_macro_value_may_contain_equals() {
        let (mut reg, invoker) = setup(&[], 8);
        reg.compile("show", "{{expr}}").unwrap();
        reg.compile("root", "{{macro \"show\" \"expr=a=b\"}}").unwrap();
        assert_eq!(reg.render("root", &invoker.current()).unwrap(), "a=b");
    }

    #[test]
    fn test_missing_macro_is_error() {
        let (mut reg, invoker) = setup(&[], 8);
        reg.compile("root", "{{macro \"nope\"}}").unwrap();
        let err = reg.render("root", &invoker.current()).unwrap_err();
        assert!(err.to_string().contains("Macro not found: nope"));
        assert_eq!(invoker.nesting(), 0);
    }

    #[test]
    fn test_bad_argument_is_error() {
        let (mut reg, invoker) = setup(&[], 8);
        reg.compile("m", "x").unwrap();
        reg.compile("root", "{{macro \"m\" \"noequals\"}}").unwrap();
        let err = reg.render("root", &invoker.current()).unwrap_err();
        assert!(err.to_string().contains("noequals"));
    }

    #[test]
    fn test_runaway_recursion_is_stopped() {
        let (mut reg, invoker) = setup(&[], 5);
        reg.compile("loop", "{{macro \"loop\"}}").unwrap();
        let err = reg.render("loop", &invoker.current()).unwrap_err();
        assert!(err.to_string().contains("Recursion limit of 5"));
        assert_eq!(invoker.nesting(), 0);
    }
}
