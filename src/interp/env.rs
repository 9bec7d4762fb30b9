//! Lexically nested variable environments
//!
//! An [`Environment`] is a handle to one scope. Scopes are chained through
//! their parent pointer; lookups walk outward from the innermost scope and
//! bindings always land in the scope the handle points at.
//!
//! A procedure holds the scope it was created in, so a scope that binds a
//! procedure is part of a reference cycle. Every scope in a tree is recorded
//! weakly in a shared registry, and [`Environment::release`] empties them all
//! when the tree is retired.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use super::error::RuntimeError;
use super::value::Value;

type Bindings = IndexMap<String, Value, FxBuildHasher>;

/// Handle to a scope; clones share the same scope
#[derive(Clone)]
pub struct Environment {
    scope: Rc<Scope>,
}

struct Scope {
    bindings: RefCell<Bindings>,
    parent: Option<Environment>,
    depth: usize,
    registry: Rc<Registry>,
}

/// Weak handles to every scope of one tree
#[derive(Default)]
struct Registry {
    scopes: RefCell<Vec<Weak<Scope>>>,
}

impl Registry {
    fn track(&self, scope: &Rc<Scope>) {
        let mut scopes = self.scopes.borrow_mut();
        // Prune dropped scopes whenever the length reaches a power of two
        if scopes.len() >= 64 && scopes.len().is_power_of_two() {
            scopes.retain(|s| s.strong_count() > 0);
        }
        scopes.push(Rc::downgrade(scope));
    }
}

impl Environment {
    /// Create a global (root) scope
    pub fn new() -> Self {
        let registry = Rc::new(Registry::default());
        let scope = Rc::new(Scope {
            bindings: RefCell::new(Bindings::default()),
            parent: None,
            depth: 0,
            registry: Rc::clone(&registry),
        });
        registry.track(&scope);
        Environment { scope }
    }

    /// Child scope whose lookups fall back to `self`
    pub fn extend(&self) -> Self {
        let scope = Rc::new(Scope {
            bindings: RefCell::new(Bindings::default()),
            parent: Some(self.clone()),
            depth: self.scope.depth + 1,
            registry: Rc::clone(&self.scope.registry),
        });
        self.scope.registry.track(&scope);
        Environment { scope }
    }

    /// Empty every scope still alive in this tree
    ///
    /// Breaks the cycles formed by procedures bound in the scope they
    /// capture. Procedure values held elsewhere stay callable but no longer
    /// see any bindings of the tree.
    pub fn release(&self) {
        let scopes: Vec<Rc<Scope>> = self
            .scope
            .registry
            .scopes
            .borrow_mut()
            .drain(..)
            .filter_map(|s| s.upgrade())
            .collect();
        let mut released = 0;
        for scope in &scopes {
            let bindings = std::mem::take(&mut *scope.bindings.borrow_mut());
            released += bindings.len();
            drop(bindings);
        }
        tracing::trace!(scopes = scopes.len(), bindings = released, "released environment");
    }

    /// Find `name` in this scope or the nearest enclosing one
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut env = self;
        loop {
            if let Some(value) = env.scope.bindings.borrow().get(name) {
                return Some(value.clone());
            }
            env = env.scope.parent.as_ref()?;
        }
    }

    /// Like [`get`](Self::get), failing with `UnboundIdentifier`
    pub fn lookup(&self, name: &str) -> Result<Value, RuntimeError> {
        self.get(name).ok_or_else(|| RuntimeError::UnboundIdentifier {
            name: name.to_string(),
            span: None,
        })
    }

    /// Insert or overwrite `name` in this scope only
    pub fn bind(&self, name: impl Into<String>, value: Value) {
        self.scope.bindings.borrow_mut().insert(name.into(), value);
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_bound_locally(&self, name: &str) -> bool {
        self.scope.bindings.borrow().contains_key(name)
    }

    pub fn parent(&self) -> Option<&Environment> {
        self.scope.parent.as_ref()
    }

    /// Number of scopes between this one and the global scope
    pub fn depth(&self) -> usize {
        self.scope.depth
    }

    pub fn is_global(&self) -> bool {
        self.scope.parent.is_none()
    }

    /// Bindings of this scope in the order they were first made
    pub fn bindings(&self) -> Vec<(String, Value)> {
        self.scope
            .bindings
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Whether both handles point at the same scope
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.scope, &other.scope)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Environment {
    // Values may hold closures over this very scope, so only names are printed
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.scope.bindings.borrow().keys().cloned().collect();
        f.debug_struct("Environment")
            .field("depth", &self.scope.depth)
            .field("names", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;
    use crate::common::NodeId;
    use crate::interp::value::Procedure;

    #[test]
    fn lookup_falls_back_to_parent() {
        let global = Environment::new();
        global.bind("x", Value::Int(1));
        let child = global.extend();
        assert_eq!(child.lookup("x"), Ok(Value::Int(1)));
        assert_eq!(child.depth(), 1);
    }

    #[test]
    fn inner_binding_shadows_without_touching_parent() {
        let global = Environment::new();
        global.bind("x", Value::Int(1));
        let child = global.extend();
        child.bind("x", Value::Bool(true));
        assert_eq!(child.get("x"), Some(Value::Bool(true)));
        assert_eq!(global.get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn child_bindings_do_not_leak() {
        let global = Environment::new();
        let child = global.extend();
        child.bind("y", Value::Unit);
        assert!(!global.is_bound("y"));
        assert!(child.is_bound_locally("y"));
    }

    #[test]
    fn rebinding_overwrites_in_place() {
        let env = Environment::new();
        env.bind("a", Value::Int(1));
        env.bind("b", Value::Int(2));
        env.bind("a", Value::Int(3));
        let names: Vec<_> = env.bindings().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(env.get("a"), Some(Value::Int(3)));
    }

    #[test]
    fn unbound_lookup_names_the_identifier() {
        let env = Environment::new().extend();
        match env.lookup("missing") {
            Err(RuntimeError::UnboundIdentifier { name, .. }) => assert_eq!(name, "missing"),
            other => panic!("expected unbound identifier, got {:?}", other),
        }
    }

    #[test]
    fn release_breaks_self_capture() {
        let global = Environment::new();
        let child = global.extend();
        let body = Rc::new(Expr::int(1));
        let proc = Procedure {
            origin: NodeId::fresh(),
            params: vec![],
            body: Rc::clone(&body),
            env: child.clone(),
        };
        child.bind("f", Value::Proc(Rc::new(proc)));
        drop(child);
        assert_eq!(Rc::strong_count(&body), 2);

        global.release();
        assert_eq!(Rc::strong_count(&body), 1);
        assert!(global.bindings().is_empty());
    }

    #[test]
    fn dropped_scopes_are_pruned() {
        let global = Environment::new();
        for _ in 0..1000 {
            global.extend();
        }
        assert!(global.scope.registry.scopes.borrow().len() < 1000);
    }

    #[test]
    fn clones_share_scope() {
        let env = Environment::new();
        let alias = env.clone();
        alias.bind("z", Value::Int(9));
        assert!(env.ptr_eq(&alias));
        assert_eq!(env.get("z"), Some(Value::Int(9)));
    }
}
