//! Scope chain
//!
//! A scope is an immutable, singly linked list of binding frames. Pushing a
//! frame returns a new scope that shares its tail with the old one, so popping
//! is just handing back the parent and the caller's view is never disturbed.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::args::Bindings;

#[derive(Debug)]
struct Frame {
    bindings: Bindings,
    parent: Option<Arc<Frame>>,
    depth: usize,
}

/// Handle to the top frame of a scope chain
#[derive(Debug, Clone, Default)]
pub struct Scope {
    head: Option<Arc<Frame>>,
}

impl Scope {
    /// An empty chain with no frames
    pub fn empty() -> Self {
        Self::default()
    }

    /// A chain holding a single root frame
    pub fn root(bindings: &Bindings) -> Self {
        Self::empty().push(bindings)
    }

    /// Push a frame holding a copy of `bindings`
    pub fn push(&self, bindings: &Bindings) -> Self {
        let depth = self.depth() + 1;
        debug!(%depth, keys = bindings.len(), "Scope::push: called");
        Self {
            head: Some(Arc::new(Frame {
                bindings: bindings.clone(),
                parent: self.head.clone(),
                depth,
            })),
        }
    }

    /// Drop the top frame and expose its parent
    ///
    /// Popping an empty chain yields an empty chain.
    pub fn pop(&self) -> Self {
        debug!(depth = self.depth(), "Scope::pop: called");
        Self {
            head: self.head.as_ref().and_then(|f| f.parent.clone()),
        }
    }

    /// Nearest value for `key`, walking toward the root
    pub fn lookup(&self, key: &str) -> Option<&str> {
        let mut frame = self.head.as_deref();
        while let Some(f) = frame {
            if let Some(value) = f.bindings.get(key) {
                return Some(value.as_str());
            }
            frame = f.parent.as_deref();
        }
        None
    }

    /// Number of frames in the chain
    pub fn depth(&self) -> usize {
        self.head.as_ref().map_or(0, |f| f.depth)
    }

    /// True when both handles point at the same frame
    pub fn same_frame(&self, other: &Scope) -> bool {
        match (&self.head, &other.head) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Flatten the chain into a JSON object, nearer frames shadowing outer ones
    pub fn to_json(&self) -> Value {
        let mut frames = Vec::with_capacity(self.depth());
        let mut frame = self.head.as_deref();
        while let Some(f) = frame {
            frames.push(&f.bindings);
            frame = f.parent.as_deref();
        }

        let mut map = Map::new();
        for bindings in frames.into_iter().rev() {
            for (key, value) in bindings {
                map.insert(key.clone(), Value::String(value.clone()));
            }
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::parse_args;
    use proptest::prelude::*;

    #[test]
    fn test_shadowing_and_pop() {
        let parent = Scope::root(&parse_args(["a=1"]).unwrap());
        let child = parent.push(&parse_args(["a=2", "b=3"]).unwrap());

        assert_eq!(child.lookup("a"), Some("2"));
        assert_eq!(child.lookup("b"), Some("3"));

        let popped = child.pop();
        assert_eq!(popped.lookup("b"), None);
        assert_eq!(popped.lookup("a"), Some("1"));
        assert!(popped.same_frame(&parent));
    }

    #[test]
    fn test_lookup_missing_is_none() {
        let scope = Scope::empty();
        assert_eq!(scope.lookup("anything"), None);
        assert_eq!(scope.pop().depth(), 0);
    }

    #[test]
    fn test_push_copies_bindings() {
        let mut bindings = parse_args(["a=1"]).unwrap();
        let scope = Scope::root(&bindings);
        bindings.insert("a".to_string(), "changed".to_string());
        bindings.insert("b".to_string(), "new".to_string());

        assert_eq!(scope.lookup("a"), Some("1"));
        assert_eq!(scope.lookup("b"), None);
    }

    #[test]
    fn test_to_json_flattens_with_shadowing() {
        let scope = Scope::root(&parse_args(["a=1", "c=root"]).unwrap()).push(&parse_args(["a=2", "b=3"]).unwrap());
        let json = scope.to_json();
        assert_eq!(json["a"], "2");
        assert_eq!(json["b"], "3");
        assert_eq!(json["c"], "root");
    }

    proptest! {
        #[test]
        fn prop_push_pop_restores_identity(n in 0usize..32) {
            let start = Scope::root(&parse_args(["base=1"]).unwrap());
            let mut scope = start.clone();
            for i in 0..n {
                scope = scope.push(&parse_args([format!("k{}={}", i, i)]).unwrap());
            }
            prop_assert_eq!(scope.depth(), n + 1);
            for _ in 0..n {
                scope = scope.pop();
            }
            prop_assert!(scope.same_frame(&start));
        }
    }
}
