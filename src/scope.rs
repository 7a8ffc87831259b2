use std::sync::Arc;

use crate::definition::Definition;
use crate::error::MixResult;
use crate::kwargs::KwargsMixin;
use crate::mixin::Mixin;
use crate::name::Name;
use crate::symbol::{SymbolArena, SymbolId};
use crate::value::Value;

/// The externally usable surface over a composed root definition: interns
/// the symbol graph once, then hands out evaluated values by name.
///
/// Construction has two phases. Interning the symbol graph (`SymbolArena`)
/// is eager and total — every name reachable from the root is resolved the
/// moment `Scope::construct` runs, so a dangling reference anywhere in the
/// tree surfaces immediately rather than only when some caller happens to
/// reach it. Evaluating those symbols into actual `Value`s stays lazy:
/// `Mixin::evaluated` runs a definition's function only the first time
/// something asks for it, with one exception — a definition flagged eager
/// is forced as part of construction, so an eager resource that fails
/// fails at construction time, not on first use.
pub struct Scope {
    arena: Arc<SymbolArena>,
    root_id: SymbolId,
    root_mixin: Arc<Mixin>,
}

impl Scope {
    /// Builds a `Scope` from a root `ScopeDef` definition and an optional
    /// set of per-instance kwargs visible to every `Extern`/unmerged-patch
    /// site under it. Eagerly walks every child, forcing evaluation of
    /// anything flagged `is_eager` so failures surface immediately.
    pub fn construct(root_def: Definition, kwargs: Option<KwargsMixin>) -> MixResult<Scope> {
        let arena = Arc::new(SymbolArena::new());
        let root_id = arena.alloc_root(root_def);
        let root_mixin = Mixin::new(root_id, Arc::clone(&arena), None, kwargs.map(Arc::new));
        force_eager(&root_mixin)?;
        Ok(Scope {
            arena,
            root_id,
            root_mixin,
        })
    }

    pub fn root_id(&self) -> SymbolId {
        self.root_id
    }

    /// Looks up a public, non-local child by name and forces it.
    /// Only public children are exposed to outside callers; locals stay
    /// reachable only from same-scope dependency resolution.
    pub fn get(&self, name: &str) -> MixResult<Value> {
        let child = self.public_child(name)?;
        child.evaluated()
    }

    /// Descends into a nested scope by name, returning a `Scope` handle
    /// rooted there. Errors if the name isn't a namespace.
    pub fn scope(&self, name: &str) -> MixResult<Scope> {
        let child = self.public_child(name)?;
        Ok(Scope {
            arena: Arc::clone(&self.arena),
            root_id: child.id(),
            root_mixin: child,
        })
    }

    fn is_hidden(&self, child: &Arc<Mixin>) -> bool {
        let flags = self.arena.get(child.id()).flags();
        flags.is_local || !flags.is_public
    }

    fn public_child(&self, name: &str) -> MixResult<Arc<Mixin>> {
        let children = self.root_mixin.children()?;
        match children.get(name) {
            Some(child) if self.is_hidden(child) => Err(crate::error::MixError::UnresolvedName {
                name: Name::from(name),
                at_path: self.arena.get(self.root_id).path.clone(),
            }),
            Some(child) => Ok(Arc::clone(child)),
            None => Err(crate::error::MixError::UnresolvedName {
                name: Name::from(name),
                at_path: self.arena.get(self.root_id).path.clone(),
            }),
        }
    }

    /// Every public (non-local) name reachable directly under this scope,
    /// in declaration order.
    pub fn public_names(&self) -> MixResult<Vec<Name>> {
        let children = self.root_mixin.children()?;
        Ok(children
            .iter()
            .filter(|(_, child)| !self.is_hidden(child))
            .map(|(name, _)| name.clone())
            .collect())
    }

    /// Resolves a dotted path of names relative to this scope, descending
    /// through nested scopes for every segment but the last, which is
    /// fetched as a value. `"Inner.counter"` looks up `Inner` as a scope
    /// and then `counter` within it.
    pub fn get_path(&self, dotted: &str) -> MixResult<Value> {
        let segments: Vec<&str> = dotted.split('.').collect();
        let (last, ancestors) = segments.split_last().ok_or_else(|| crate::error::MixError::UnresolvedName {
            name: Name::from(dotted),
            at_path: self.arena.get(self.root_id).path.clone(),
        })?;
        let mut current = Scope {
            arena: Arc::clone(&self.arena),
            root_id: self.root_id,
            root_mixin: Arc::clone(&self.root_mixin),
        };
        for segment in ancestors {
            current = current.scope(segment)?;
        }
        current.get(last)
    }

    /// Re-instantiates this scope with a fresh `KwargsMixin` layered on
    /// top, the runtime equivalent of calling a parsed class with keyword
    /// arguments. The symbol graph is reused; only evaluation state is
    /// fresh.
    pub fn call(&self, kwargs: KwargsMixin) -> MixResult<Scope> {
        let root_mixin = Mixin::new(self.root_id, Arc::clone(&self.arena), None, Some(Arc::new(kwargs)));
        force_eager(&root_mixin)?;
        Ok(Scope {
            arena: Arc::clone(&self.arena),
            root_id: self.root_id,
            root_mixin,
        })
    }
}

/// Walks every child reachable from `mixin`, forcing `.evaluated()` on
/// any leaf flagged eager and recursing into nested scopes. Construction
/// fails as soon as one eager definition fails, rather than silently
/// deferring the error to whichever caller happens to touch it first.
///
/// A local child is skipped outright, before the eager check even runs:
/// a local definition exists only to be seen by same-scope dependency
/// resolution, never as something construction itself forces.
fn force_eager(mixin: &Arc<Mixin>) -> MixResult<()> {
    if !mixin.is_scope() {
        return Ok(());
    }
    for (name, child) in mixin.children()?.iter() {
        if child.flags().is_local {
            continue;
        }
        if child.is_scope() {
            force_eager(child)?;
        } else if child.flags().is_eager {
            log::trace!("forcing eager evaluation of `{}`", name);
            child.evaluated()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{DefFlags, DefinitionKind, ResourceFn, ScopeDef};
    use crate::lexical::LexicalSite;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn eager_resource_is_forced_at_construction() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let root_site = LexicalSite::root();
        let mut scope_def = ScopeDef::new();
        scope_def.push_child(
            Name::from("startup"),
            Definition::new(
                DefinitionKind::Resource(ResourceFn {
                    dependencies: Vec::new(),
                    call: Arc::new(|_| {
                        CALLS.fetch_add(1, Ordering::SeqCst);
                        Ok(Value::new(()))
                    }),
                }),
                DefFlags {
                    is_public: true,
                    is_eager: true,
                    ..Default::default()
                },
                root_site.child(),
            ),
        );
        let root_def = Definition::new(DefinitionKind::Scope(scope_def), DefFlags::default(), root_site);
        let _scope = Scope::construct(root_def, None).unwrap();
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn local_eager_resource_is_not_forced_at_construction() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let root_site = LexicalSite::root();
        let mut scope_def = ScopeDef::new();
        scope_def.push_child(
            Name::from("hidden_startup"),
            Definition::new(
                DefinitionKind::Resource(ResourceFn {
                    dependencies: Vec::new(),
                    call: Arc::new(|_| {
                        CALLS.fetch_add(1, Ordering::SeqCst);
                        Ok(Value::new(()))
                    }),
                }),
                DefFlags {
                    is_local: true,
                    is_eager: true,
                    ..Default::default()
                },
                root_site.child(),
            ),
        );
        let root_def = Definition::new(DefinitionKind::Scope(scope_def), DefFlags::default(), root_site);
        let _scope = Scope::construct(root_def, None).unwrap();
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn local_children_are_hidden_from_get() {
        let root_site = LexicalSite::root();
        let mut scope_def = ScopeDef::new();
        scope_def.push_child(
            Name::from("hidden"),
            Definition::new(
                DefinitionKind::Resource(ResourceFn {
                    dependencies: Vec::new(),
                    call: Arc::new(|_| Ok(Value::new(1_i64))),
                }),
                DefFlags {
                    is_local: true,
                    ..Default::default()
                },
                root_site.child(),
            ),
        );
        let root_def = Definition::new(DefinitionKind::Scope(scope_def), DefFlags::default(), root_site);
        let scope = Scope::construct(root_def, None).unwrap();
        assert!(scope.get("hidden").is_err());
    }

    #[test]
    fn same_name_override_resolves_one_scope_out() {
        use crate::builder::ScopeBuilder;

        let scope = ScopeBuilder::new()
            .resource("counter", &[], |_| Ok(Value::new(0_i64)))
            .scope("Inner", |b| {
                b.resource("counter", &["counter"], |deps| {
                    let outer = *deps.get("counter").unwrap().downcast_ref::<i64>().unwrap();
                    Ok(Value::new(outer + 1))
                })
            })
            .build(None)
            .unwrap();

        assert_eq!(*scope.get("counter").unwrap().downcast_ref::<i64>().unwrap(), 0);
        assert_eq!(*scope.get_path("Inner.counter").unwrap().downcast_ref::<i64>().unwrap(), 1);
    }
}
