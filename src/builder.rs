use indexmap::IndexMap;

use crate::definition::{
    DefFlags, Definition, DefinitionKind, ExternDef, MergerFn, MultiPatchFn, PatchFn, ResourceFn, ScopeDef,
};
use crate::error::MixResult;
use crate::kwargs::KwargsMixin;
use crate::lexical::LexicalSite;
use crate::name::Name;
use crate::reference::RelativeReference;
use crate::scope::Scope;
use crate::value::{Aggregator, Value};

/// A host-code construction API standing in for the decorator-based
/// authoring surface of the system this crate reimplements: where that
/// system lets users write `@resource`/`@patch`/`@scope`-annotated
/// functions and classes, `ScopeBuilder` lets Rust callers build the same
/// `Definition` tree directly, fluently, and without reaching into
/// `definition`'s internals by hand.
pub struct ScopeBuilder {
    site: LexicalSite,
    children: IndexMap<Name, Vec<Definition>>,
    bases: Vec<RelativeReference>,
}

impl ScopeBuilder {
    pub fn new() -> Self {
        ScopeBuilder {
            site: LexicalSite::root(),
            children: IndexMap::new(),
            bases: Vec::new(),
        }
    }

    /// Declares a base this scope composes over, in declaration order.
    pub fn extends(mut self, base: RelativeReference) -> Self {
        self.bases.push(base);
        self
    }

    fn push(&mut self, name: impl Into<Name>, kind: DefinitionKind, flags: DefFlags) {
        let site = self.site.child();
        self.children
            .entry(name.into())
            .or_insert_with(Vec::new)
            .push(Definition::new(kind, flags, site));
    }

    /// Registers a resource: an endofunction-merger evaluator that
    /// produces the base value patches fold over.
    pub fn resource<F>(mut self, name: impl Into<Name>, dependencies: &[&str], call: F) -> Self
    where
        F: Fn(&crate::definition::Bindings) -> MixResult<Value> + Send + Sync + 'static,
    {
        let kind = DefinitionKind::Resource(ResourceFn {
            dependencies: dependencies.iter().map(|s| Name::from(*s)).collect(),
            call: std::sync::Arc::new(call),
        });
        self.push(name, kind, DefFlags::default());
        self
    }

    /// Registers a functional merger: produces an `Aggregator` applied
    /// once to the full patch sequence instead of folding endofunctions.
    pub fn merger<F>(mut self, name: impl Into<Name>, dependencies: &[&str], call: F) -> Self
    where
        F: Fn(&crate::definition::Bindings) -> MixResult<Aggregator> + Send + Sync + 'static,
    {
        let kind = DefinitionKind::Merger(MergerFn {
            dependencies: dependencies.iter().map(|s| Name::from(*s)).collect(),
            call: std::sync::Arc::new(call),
        });
        self.push(name, kind, DefFlags::default());
        self
    }

    /// Registers a single patch value.
    pub fn patch<F>(mut self, name: impl Into<Name>, dependencies: &[&str], call: F) -> Self
    where
        F: Fn(&crate::definition::Bindings) -> MixResult<Value> + Send + Sync + 'static,
    {
        let kind = DefinitionKind::SinglePatch(PatchFn {
            dependencies: dependencies.iter().map(|s| Name::from(*s)).collect(),
            call: std::sync::Arc::new(call),
        });
        self.push(name, kind, DefFlags::default());
        self
    }

    /// Registers a sequence of patch values produced from one evaluator.
    pub fn patches<F>(mut self, name: impl Into<Name>, dependencies: &[&str], call: F) -> Self
    where
        F: Fn(&crate::definition::Bindings) -> MixResult<Vec<Value>> + Send + Sync + 'static,
    {
        let kind = DefinitionKind::MultiplePatch(MultiPatchFn {
            dependencies: dependencies.iter().map(|s| Name::from(*s)).collect(),
            call: std::sync::Arc::new(call),
        });
        self.push(name, kind, DefFlags::default());
        self
    }

    /// Registers an extern slot: no evaluator, satisfied by a base, an
    /// explicit default, or kwargs at evaluation time.
    pub fn extern_slot(mut self, name: impl Into<Name>, default: Option<Value>) -> Self {
        self.push(
            name,
            DefinitionKind::Extern(ExternDef { default }),
            DefFlags::default(),
        );
        self
    }

    /// Registers a nested namespace, built by a closure over a fresh
    /// `ScopeBuilder`.
    pub fn scope(mut self, name: impl Into<Name>, build: impl FnOnce(ScopeBuilder) -> ScopeBuilder) -> Self {
        let nested = build(ScopeBuilder::new());
        let site = self.site.child();
        let scope_def = ScopeDef {
            children: nested.children,
            bases: nested.bases,
        };
        self.children
            .entry(name.into())
            .or_insert_with(Vec::new)
            .push(Definition::new(DefinitionKind::Scope(scope_def), DefFlags::default(), site));
        self
    }

    /// Marks the most recently pushed definition at `name` as local
    /// (hidden from `Scope::get`/`Scope::scope`, still reachable as a
    /// sibling dependency) and/or eager (forced at construction).
    pub fn flags(mut self, name: &str, flags: DefFlags) -> Self {
        if let Some(defs) = self.children.get_mut(name) {
            if let Some(last) = defs.last_mut() {
                last.flags = flags;
            }
        }
        self
    }

    /// Finishes the tree and constructs a `Scope`, interning the whole
    /// graph and forcing every eager definition.
    pub fn build(self, kwargs: Option<KwargsMixin>) -> MixResult<Scope> {
        let scope_def = ScopeDef {
            children: self.children,
            bases: self.bases,
        };
        let root_def = Definition::new(DefinitionKind::Scope(scope_def), DefFlags::default(), self.site);
        Scope::construct(root_def, kwargs)
    }
}

impl Default for ScopeBuilder {
    fn default() -> Self {
        ScopeBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_with_patch_folds_in_declaration_order() {
        use crate::value::endofunction_value;

        let scope = ScopeBuilder::new()
            .resource("greeting", &[], |_| Ok(Value::new("hi".to_string())))
            .patch("greeting", &[], |_| {
                Ok(endofunction_value(std::sync::Arc::new(|v: Value| {
                    Ok(Value::new(format!("{}!", v.downcast_ref::<String>().unwrap())))
                })))
            })
            .build(None)
            .unwrap();

        let value = scope.get("greeting").unwrap();
        assert_eq!(value.downcast_ref::<String>().unwrap(), "hi!");
    }

    #[test]
    fn extern_without_default_or_kwargs_errors() {
        let scope = ScopeBuilder::new().extern_slot("name", None).build(None).unwrap();
        assert!(scope.get("name").is_err());
    }

    #[test]
    fn extern_satisfied_by_kwargs() {
        let kwargs = KwargsMixin::from_pairs(vec![("name", Value::new("Ada".to_string()))]);
        let scope = ScopeBuilder::new().extern_slot("name", None).build(Some(kwargs)).unwrap();
        let value = scope.get("name").unwrap();
        assert_eq!(value.downcast_ref::<String>().unwrap(), "Ada");
    }
}
