//! `value` helper: explicit lookup through the scope chain

use std::sync::Arc;

use handlebars::{Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext};
use tracing::debug;

use super::{Invoker, required_param};

/// `{{value "key"}}` renders the nearest binding of `key`, or nothing
pub struct ValueHelper {
    invoker: Arc<Invoker>,
}

impl ValueHelper {
    pub fn new(invoker: Arc<Invoker>) -> Self {
        Self { invoker }
    }
}

impl HelperDef for ValueHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let key = required_param(h, 0)?;
        let scope = self.invoker.current();
        match scope.lookup(&key) {
            Some(value) => out.write(value)?,
            None => debug!(%key, "ValueHelper::call: not bound"),
        }
        Ok(())
    }
}
