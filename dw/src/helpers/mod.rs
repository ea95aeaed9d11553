//! Template Helpers
//!
//! Functions reachable by name from template bodies. They are collected into
//! a [`Capabilities`] table once per compilation and injected into the
//! registry.
//!
//! - `macro "name" "k=v"...` - render a registered template in a child scope
//! - `markdown "target" "k=v"...` - expand and convert markdown to HTML
//! - `value "key"` - explicit scope-chain lookup
//! - `include "file"` - literal file contents via an external reader
//! - `closure "arg"...` - run the external minifier

mod external;
mod invoker;
mod macros;
mod markdown;
mod value;

use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;

use handlebars::{Helper, HelperDef, RenderError, RenderErrorReason};

use crate::config::ProcessConfig;
use crate::error::CompileError;
use crate::markdown::MarkdownRenderer;

pub use external::{ClosureHelper, IncludeHelper};
pub use invoker::{DEFAULT_MAX_DEPTH, Invoker, ScopeGuard};
pub use macros::MacroHelper;
pub use markdown::MarkdownHelper;
pub use value::ValueHelper;

type BoxedHelper = Box<dyn HelperDef + Send + Sync>;

/// Named helper functions to inject into a registry
#[derive(Default)]
pub struct Capabilities {
    helpers: Vec<(&'static str, BoxedHelper)>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard helper set bound to one compilation's invoker
    pub fn builtin(invoker: Arc<Invoker>, renderer: MarkdownRenderer, process: &ProcessConfig) -> Self {
        let timeout = Duration::from_millis(process.timeout_ms);
        Self::new()
            .with("macro", MacroHelper::new(invoker.clone()))
            .with("markdown", MarkdownHelper::new(invoker.clone(), renderer))
            .with("value", ValueHelper::new(invoker.clone()))
            .with(
                "include",
                IncludeHelper::new(invoker.clone(), process.include_program.clone(), timeout),
            )
            .with("closure", ClosureHelper::new(invoker, process.closure_program.clone(), timeout))
    }

    /// Add or replace the helper registered under `name`
    pub fn with(mut self, name: &'static str, helper: impl HelperDef + Send + Sync + 'static) -> Self {
        self.helpers.retain(|(n, _)| *n != name);
        self.helpers.push((name, Box::new(helper)));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.helpers.iter().map(|(n, _)| *n).collect()
    }

    pub fn into_helpers(self) -> Vec<(&'static str, BoxedHelper)> {
        self.helpers
    }
}

/// Wrap a compile error so it can travel through the template engine
pub(crate) fn render_error(err: CompileError) -> RenderError {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(&format!(": {}", cause));
        source = cause.source();
    }
    RenderErrorReason::Other(message).into()
}

/// Parameter `idx` as a string, failing when it is missing
pub(crate) fn required_param(h: &Helper<'_>, idx: usize) -> Result<String, RenderError> {
    h.param(idx)
        .map(|p| json_to_string(p.value()))
        .ok_or_else(|| RenderErrorReason::Other(format!("{} requires parameter {}", h.name(), idx + 1)).into())
}

/// Parameters from `start` onward as strings
pub(crate) fn params_from(h: &Helper<'_>, start: usize) -> Vec<String> {
    h.params().iter().skip(start).map(|p| json_to_string(p.value())).collect()
}

fn json_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
