//! Scope bookkeeping shared by the invoking helpers

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::args::Bindings;
use crate::error::{CompileError, Result};
use crate::scope::Scope;

/// Default maximum number of nested macro/markdown invocations
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Owns the active scope chain of one compilation
///
/// Macro and markdown invocations are the only callers of [`Invoker::enter`],
/// which pushes a frame and hands back a guard that restores the caller's
/// frame when dropped.
#[derive(Debug)]
pub struct Invoker {
    current: Mutex<Scope>,
    base_depth: usize,
    max_depth: usize,
    source_root: PathBuf,
}

impl Invoker {
    pub fn new(root: Scope, source_root: impl Into<PathBuf>, max_depth: usize) -> Self {
        let source_root = source_root.into();
        debug!(?source_root, %max_depth, "Invoker::new: called");
        Self {
            base_depth: root.depth(),
            current: Mutex::new(root),
            max_depth,
            source_root,
        }
    }

    /// The active scope
    pub fn current(&self) -> Scope {
        self.lock().clone()
    }

    /// Directory that relative file targets resolve against
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Number of invocation frames above the root scope
    pub fn nesting(&self) -> usize {
        self.lock().depth().saturating_sub(self.base_depth)
    }

    /// Push `bindings` as a new frame for the invocation of `name`
    pub fn enter(&self, name: &str, bindings: &Bindings) -> Result<ScopeGuard<'_>> {
        let mut current = self.lock();
        let nesting = current.depth().saturating_sub(self.base_depth);
        if nesting >= self.max_depth {
            debug!(%name, %nesting, "Invoker::enter: recursion limit reached");
            return Err(CompileError::RecursionLimit {
                name: name.to_string(),
                limit: self.max_depth,
            });
        }

        let previous = current.clone();
        let scope = previous.push(bindings);
        *current = scope.clone();
        debug!(%name, nesting = nesting + 1, "Invoker::enter: pushed frame");
        Ok(ScopeGuard {
            invoker: self,
            previous,
            scope,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Scope> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Active invocation frame; dropping it restores the caller's scope
#[derive(Debug)]
pub struct ScopeGuard<'a> {
    invoker: &'a Invoker,
    previous: Scope,
    scope: Scope,
}

impl ScopeGuard<'_> {
    /// The scope the invoked template executes against
    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        debug!(depth = self.previous.depth(), "ScopeGuard::drop: restoring caller scope");
        *self.invoker.lock() = self.previous.clone();
    }
}
