//! Name resolution scopes for the bytecode generator.
//!
//! Scopes form a tree: the file scope holds globals and knot names, each
//! knot's member scope holds its parameters, stitches, and temps, and every
//! nested block gets a child scope so shadowing stays local.

use std::collections::HashMap;

pub(crate) type ScopeId = usize;

/// What a name resolves to.
#[derive(Debug, Clone)]
pub(crate) enum Symbol {
    /// A `VAR` or `CONST` global, addressed by name at runtime.
    Global { is_const: bool },
    /// A `~ temp` local in the current path's stack frame.
    Local { slot: usize },
    /// A declared parameter.
    Param { slot: usize },
    /// A knot, stitch, or function.
    Path {
        qualified: String,
        arity: usize,
        /// Scope holding the path's parameters, temps, and member stitches.
        members: ScopeId,
    },
}

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    names: HashMap<String, Symbol>,
}

#[derive(Debug)]
pub(crate) struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    pub fn root(&self) -> ScopeId {
        0
    }

    pub fn push_scope(&mut self, parent: ScopeId) -> ScopeId {
        self.scopes.push(Scope {
            parent: Some(parent),
            names: HashMap::new(),
        });
        self.scopes.len() - 1
    }

    /// Bind a name in one scope. Fails if the scope already binds it.
    pub fn define(&mut self, scope: ScopeId, name: &str, symbol: Symbol) -> Result<(), ()> {
        let names = &mut self.scopes[scope].names;
        if names.contains_key(name) {
            return Err(());
        }
        names.insert(name.to_string(), symbol);
        Ok(())
    }

    /// Resolve a name, walking outward through enclosing scopes.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id];
            if let Some(sym) = scope.names.get(name) {
                return Some(sym);
            }
            current = scope.parent;
        }
        None
    }

    /// Resolve a name in exactly one scope, for qualified `a.b` lookups.
    pub fn lookup_member(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        self.scopes[scope].names.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_the_scope_chain() {
        let mut table = SymbolTable::new();
        let outer = table.root();
        table
            .define(outer, "score", Symbol::Global { is_const: false })
            .unwrap();
        let inner = table.push_scope(outer);
        assert!(matches!(
            table.lookup(inner, "score"),
            Some(Symbol::Global { .. })
        ));
        assert!(table.lookup_member(inner, "score").is_none());
    }

    #[test]
    fn redefinition_in_one_scope_fails() {
        let mut table = SymbolTable::new();
        let root = table.root();
        table.define(root, "x", Symbol::Local { slot: 0 }).unwrap();
        assert!(table.define(root, "x", Symbol::Local { slot: 1 }).is_err());

        // Shadowing from a child scope is fine.
        let child = table.push_scope(root);
        assert!(table.define(child, "x", Symbol::Local { slot: 2 }).is_ok());
    }
}
