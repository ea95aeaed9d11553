//! Helpers backed by external programs

use std::sync::Arc;
use std::time::Duration;

use handlebars::{Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext};
use tracing::info;

use super::{Invoker, params_from, render_error, required_param};
use crate::process::ExternalCommand;

/// `{{include "file"}}` - the file's literal contents, never expanded
pub struct IncludeHelper {
    invoker: Arc<Invoker>,
    program: String,
    timeout: Duration,
}

impl IncludeHelper {
    pub fn new(invoker: Arc<Invoker>, program: String, timeout: Duration) -> Self {
        Self {
            invoker,
            program,
            timeout,
        }
    }
}

impl HelperDef for IncludeHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let file = required_param(h, 0)?;
        info!("include {}", file);
        let output = ExternalCommand::new(&self.program, self.timeout)
            .arg(file)
            .current_dir(self.invoker.source_root())
            .run()
            .map_err(render_error)?;
        out.write(&output.stdout)?;
        Ok(())
    }
}

/// `{{closure "arg" ...}}` - arguments joined by spaces and handed to the minifier
pub struct ClosureHelper {
    invoker: Arc<Invoker>,
    program: String,
    timeout: Duration,
}

impl ClosureHelper {
    pub fn new(invoker: Arc<Invoker>, program: String, timeout: Duration) -> Self {
        Self {
            invoker,
            program,
            timeout,
        }
    }

    fn command_line(&self, args: &[String]) -> String {
        if args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, args.join(" "))
        }
    }
}

impl HelperDef for ClosureHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let line = self.command_line(&params_from(h, 0));
        info!("closure {}", line);
        let output = ExternalCommand::new("sh", self.timeout)
            .arg("-c")
            .arg(line)
            .current_dir(self.invoker.source_root())
            .run()
            .map_err(render_error)?;
        out.write(&output.stdout)?;
        Ok(())
    }
}
