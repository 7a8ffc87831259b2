use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::definition::{Bindings, DefinitionKind};
use crate::error::{unreachable_elected_index, unreachable_patch_type_mismatch, MixError, MixResult};
use crate::kwargs::KwargsMixin;
use crate::name::Name;
use crate::symbol::{SymbolArena, SymbolData, SymbolId};
use crate::value::{as_endofunction, Value};

/// One runtime instance of a composed symbol. A `Mixin` is built once per
/// composition site reached while walking the graph from a root call, and
/// memoizes its own evaluated value exactly once — the same node is never
/// recomputed even if several siblings depend on it.
pub struct Mixin {
    id: SymbolId,
    arena: Arc<SymbolArena>,
    outer: Option<Arc<Mixin>>,
    kwargs: Option<Arc<KwargsMixin>>,
    children: OnceCell<IndexMap<Name, Arc<Mixin>>>,
    evaluated: OnceCell<Value>,
    evaluating: AtomicBool,
}

impl Mixin {
    pub fn new(
        id: SymbolId,
        arena: Arc<SymbolArena>,
        outer: Option<Arc<Mixin>>,
        kwargs: Option<Arc<KwargsMixin>>,
    ) -> Arc<Mixin> {
        Arc::new(Mixin {
            id,
            arena,
            outer,
            kwargs,
            children: OnceCell::new(),
            evaluated: OnceCell::new(),
            evaluating: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> SymbolId {
        self.id
    }

    fn data(&self) -> Arc<SymbolData> {
        self.arena.get(self.id)
    }

    pub fn is_scope(&self) -> bool {
        self.data().is_scope()
    }

    pub fn flags(&self) -> crate::definition::DefFlags {
        self.data().flags()
    }

    /// Every named child reached from this scope mixin, built once and
    /// shared by every subsequent lookup. Includes locally-flagged
    /// children; callers that present a scope externally (`Scope::get`)
    /// filter those out themselves.
    pub fn children(self: &Arc<Self>) -> MixResult<&IndexMap<Name, Arc<Mixin>>> {
        if let Some(c) = self.children.get() {
            return Ok(c);
        }
        let symbol_children = self.arena.children(self.id)?;
        let mut out = IndexMap::new();
        for (name, child_id) in symbol_children {
            out.insert(name, Mixin::new(child_id, Arc::clone(&self.arena), Some(Arc::clone(self)), None));
        }
        let _ = self.children.set(out);
        Ok(self.children.get().unwrap())
    }

    /// The enclosing scope a definition's dependencies resolve against —
    /// the mixin this one was built as a child of.
    fn binding_scope(&self) -> MixResult<&Arc<Mixin>> {
        self.outer.as_ref().ok_or_else(|| MixError::UnresolvedName {
            name: self.data().name.clone(),
            at_path: self.data().path.clone(),
        })
    }

    /// Climbs `self`'s kwargs, then every enclosing scope's, looking for
    /// `name`. This is how an `Extern` with no default, or a patch chain
    /// with no elected merger, finds a value supplied from outside the
    /// composed graph.
    fn find_kwargs(&self, name: &Name) -> Option<Value> {
        if let Some(kw) = &self.kwargs {
            if let Some(v) = kw.get(name.as_str()) {
                return Some(v.clone());
            }
        }
        self.outer.as_ref().and_then(|o| o.find_kwargs(name))
    }

    /// Resolves a dependency name against a binding scope: first among
    /// that scope's own children (a sibling), then climbing its ancestor
    /// scopes. Forces evaluation of whatever mixin the name resolves to.
    fn resolve_dependency(scope: &Arc<Mixin>, name: &Name) -> MixResult<Value> {
        let mut current = Arc::clone(scope);
        loop {
            if let Some(child) = current.children()?.get(name) {
                return child.evaluated();
            }
            let next = match &current.outer {
                Some(o) => Arc::clone(o),
                None => {
                    return Err(MixError::UnresolvedName {
                        name: name.clone(),
                        at_path: current.data().path.clone(),
                    })
                }
            };
            current = next;
        }
    }

    /// Binds `names` against `scope`, applying the same-name-skip rule: a
    /// parameter that names this very symbol (`foo(foo)` written inside
    /// `foo`) resolves one scope further out than usual, so a child's
    /// evaluator can see the `foo` a level above it rather than itself.
    fn bind(&self, own_name: &Name, scope: &Arc<Mixin>, names: &[Name]) -> MixResult<Bindings> {
        let mut bindings = Bindings::new();
        for name in names {
            let start = if name == own_name {
                scope.outer.as_ref().ok_or_else(|| MixError::UnresolvedName {
                    name: name.clone(),
                    at_path: scope.data().path.clone(),
                })?
            } else {
                scope
            };
            bindings.insert(name.clone(), Mixin::resolve_dependency(start, name)?);
        }
        Ok(bindings)
    }

    /// Every patch value contributed at this symbol, in declaration order
    /// (base contributions first, local ones last), each computed with
    /// its own dependencies bound against `scope`.
    fn collect_patch_values(&self, scope: &Arc<Mixin>, data: &SymbolData) -> MixResult<Vec<Value>> {
        let mut out = Vec::new();
        for def in &data.origin {
            match &def.kind {
                DefinitionKind::SinglePatch(p) => {
                    let bindings = self.bind(&data.name, scope, &p.dependencies)?;
                    out.push((p.call)(&bindings)?);
                }
                DefinitionKind::MultiplePatch(p) => {
                    let bindings = self.bind(&data.name, scope, &p.dependencies)?;
                    out.extend((p.call)(&bindings)?);
                }
                _ => {}
            }
        }
        Ok(out)
    }

    fn evaluate_extern(&self, data: &SymbolData) -> MixResult<Value> {
        let default = data.origin.iter().rev().find_map(|d| match &d.kind {
            DefinitionKind::Extern(e) => Some(e.default.clone()),
            _ => None,
        });
        match default.flatten() {
            Some(v) => Ok(v),
            None => self.find_kwargs(&data.name).ok_or_else(|| MixError::KwargsMissing {
                name: data.name.clone(),
                at_path: data.path.clone(),
            }),
        }
    }

    fn fold_patches(&self, scope: &Arc<Mixin>, data: &SymbolData, mut base: Value) -> MixResult<Value> {
        let patches = self.collect_patch_values(scope, data)?;
        log::trace!("folding {} patch(es) over `{}`", patches.len(), data.path);
        for patch_value in patches {
            let endo = as_endofunction(&patch_value)
                .unwrap_or_else(|| unreachable_patch_type_mismatch(line!(), &data.path));
            base = endo(base)?;
        }
        Ok(base)
    }

    fn compute_evaluated(self: &Arc<Self>) -> MixResult<Value> {
        let data = self.data();
        let scope = Arc::clone(self.binding_scope()?);
        let elected = self.arena.elected_merger_index(self.id)?;
        log::debug!("evaluating `{}` (elected origin index {:?})", data.path, elected);

        match elected {
            Some(idx) => match &data.origin[idx].kind {
                DefinitionKind::Resource(r) => {
                    let bindings = self.bind(&data.name, &scope, &r.dependencies)?;
                    let base = (r.call)(&bindings)?;
                    self.fold_patches(&scope, &data, base)
                }
                DefinitionKind::Merger(m) => {
                    let bindings = self.bind(&data.name, &scope, &m.dependencies)?;
                    let aggregator = (m.call)(&bindings)?;
                    let patches = self.collect_patch_values(&scope, &data)?;
                    aggregator(&mut patches.into_iter())
                }
                other => unreachable_elected_index(line!(), &other.label()),
            },
            None if data.has_patches() => {
                // No merger was elected, but there are patches to fold:
                // an injected kwargs value supplies the base they apply to.
                log::trace!("`{}` has no elected merger, falling back to kwargs", data.path);
                let base = self
                    .find_kwargs(&data.name)
                    .ok_or_else(|| MixError::NoMerger { at_path: data.path.clone() })?;
                self.fold_patches(&scope, &data, base)
            }
            None => self.evaluate_extern(&data),
        }
    }

    /// The fully composed, memoized value at this mixin. Reentering this
    /// call while it is already in flight on the same evaluation chain
    /// (a dependency cycle) is reported rather than left to overflow the
    /// stack.
    pub fn evaluated(self: &Arc<Self>) -> MixResult<Value> {
        if let Some(v) = self.evaluated.get() {
            return Ok(v.clone());
        }
        if self.evaluating.swap(true, Ordering::SeqCst) {
            return Err(MixError::CircularDependency {
                at_path: self.data().path.clone(),
            });
        }
        let result = self.compute_evaluated();
        self.evaluating.store(false, Ordering::SeqCst);
        let value = result?;
        let _ = self.evaluated.set(value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{DefFlags, Definition, ResourceFn, ScopeDef};
    use crate::lexical::LexicalSite;

    fn resource(call: impl Fn(&Bindings) -> MixResult<Value> + Send + Sync + 'static, root: &LexicalSite) -> Definition {
        Definition::new(
            DefinitionKind::Resource(ResourceFn {
                dependencies: Vec::new(),
                call: Arc::new(call),
            }),
            DefFlags {
                is_public: true,
                ..Default::default()
            },
            root.child(),
        )
    }

    #[test]
    fn single_resource_evaluates_once() {
        let arena = Arc::new(SymbolArena::new());
        let root_site = LexicalSite::root();
        let mut scope = ScopeDef::new();
        scope.push_child(Name::from("greeting"), resource(|_| Ok(Value::new("hello".to_string())), &root_site));
        let root_def = Definition::new(DefinitionKind::Scope(scope), DefFlags::default(), root_site);
        let root_id = arena.alloc_root(root_def);

        let root_mixin = Mixin::new(root_id, Arc::clone(&arena), None, None);
        let greeting = root_mixin.children().unwrap().get("greeting").unwrap().clone();
        let value = greeting.evaluated().unwrap();
        assert_eq!(value.downcast_ref::<String>().unwrap(), "hello");
    }

    #[test]
    fn circular_dependency_is_reported_not_overflowed() {
        use crate::reference::RelativeReference;

        let arena = Arc::new(SymbolArena::new());
        let root_site = LexicalSite::root();
        let mut scope = ScopeDef::new();
        let dep_fn = |deps: Vec<Name>| ResourceFn {
            dependencies: deps,
            call: Arc::new(|b: &Bindings| Ok(b.get("a").or_else(|| b.get("b")).cloned().unwrap_or(Value::new(0_i64)))),
        };
        scope.push_child(
            Name::from("a"),
            Definition::new(
                DefinitionKind::Resource(dep_fn(vec![Name::from("b")])),
                DefFlags::default(),
                root_site.child(),
            ),
        );
        scope.push_child(
            Name::from("b"),
            Definition::new(
                DefinitionKind::Resource(dep_fn(vec![Name::from("a")])),
                DefFlags::default(),
                root_site.child(),
            ),
        );
        let root_def = Definition::new(DefinitionKind::Scope(scope), DefFlags::default(), root_site);
        let root_id = arena.alloc_root(root_def);
        let _ = RelativeReference::sibling("a");

        let root_mixin = Mixin::new(root_id, Arc::clone(&arena), None, None);
        let a = root_mixin.children().unwrap().get("a").unwrap().clone();
        let err = a.evaluated().unwrap_err();
        assert!(matches!(err, MixError::CircularDependency { .. }));
    }
}
