use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::MixResult;
use crate::lexical::LexicalSite;
use crate::name::Name;
use crate::reference::RelativeReference;
use crate::value::{Aggregator, Value};

/// Named values handed to an evaluator function at call time: the
/// already-resolved dependencies a resource, patch, or merger asked for
/// by parameter name.
#[derive(Clone, Default)]
pub struct Bindings(HashMap<Name, Value>);

impl Bindings {
    pub fn new() -> Self {
        Bindings(HashMap::new())
    }

    pub fn insert(&mut self, name: Name, value: Value) {
        self.0.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

/// A resource evaluator: the endofunction-merger flavor. `call` resolves
/// dependencies and produces the base value; patches are folded over it
/// afterward as endofunctions.
#[derive(Clone)]
pub struct ResourceFn {
    pub dependencies: Vec<Name>,
    pub call: Arc<dyn Fn(&Bindings) -> MixResult<Value> + Send + Sync>,
}

/// A merger evaluator: the functional-merger flavor. `call` resolves
/// dependencies and produces an aggregator, which is then applied once to
/// the full patch sequence.
#[derive(Clone)]
pub struct MergerFn {
    pub dependencies: Vec<Name>,
    pub call: Arc<dyn Fn(&Bindings) -> MixResult<Aggregator> + Send + Sync>,
}

/// A single-patch evaluator: produces one patch value from resolved
/// dependencies.
#[derive(Clone)]
pub struct PatchFn {
    pub dependencies: Vec<Name>,
    pub call: Arc<dyn Fn(&Bindings) -> MixResult<Value> + Send + Sync>,
}

/// A multiple-patch evaluator: produces a finite sequence of patch values
/// from resolved dependencies.
#[derive(Clone)]
pub struct MultiPatchFn {
    pub dependencies: Vec<Name>,
    pub call: Arc<dyn Fn(&Bindings) -> MixResult<Vec<Value>> + Send + Sync>,
}

/// An externally-supplied value: no evaluator of its own, satisfied either
/// by a base's contribution at the same key or, failing that, by a
/// `KwargsMixin` at evaluation time.
#[derive(Clone)]
pub struct ExternDef {
    pub default: Option<Value>,
}

/// A nested namespace: an ordered mapping from child name to the union of
/// contributions at that name, plus the base references it composes over.
#[derive(Clone)]
pub struct ScopeDef {
    pub children: IndexMap<Name, Vec<Definition>>,
    pub bases: Vec<RelativeReference>,
}

impl ScopeDef {
    pub fn new() -> Self {
        ScopeDef {
            children: IndexMap::new(),
            bases: Vec::new(),
        }
    }

    pub fn push_child(&mut self, name: Name, def: Definition) {
        self.children.entry(name).or_insert_with(Vec::new).push(def);
    }
}

impl Default for ScopeDef {
    fn default() -> Self {
        ScopeDef::new()
    }
}

/// The six shapes a definition site can take, kept as an enum of data
/// rather than a trait-object hierarchy so every dispatch is a match.
#[derive(Clone)]
pub enum DefinitionKind {
    Resource(ResourceFn),
    Merger(MergerFn),
    SinglePatch(PatchFn),
    MultiplePatch(MultiPatchFn),
    Extern(ExternDef),
    Scope(ScopeDef),
}

impl DefinitionKind {
    pub fn is_scope(&self) -> bool {
        matches!(self, DefinitionKind::Scope(_))
    }

    /// Resources and mergers both supply a symbol's base value — the only
    /// difference is whether patches fold over it as endofunctions
    /// (`Resource`) or are handed to a custom aggregator in one shot
    /// (`Merger`). Both compete for merger election.
    pub fn is_merger(&self) -> bool {
        matches!(self, DefinitionKind::Resource(_) | DefinitionKind::Merger(_))
    }

    pub fn is_patch(&self) -> bool {
        matches!(
            self,
            DefinitionKind::SinglePatch(_) | DefinitionKind::MultiplePatch(_)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            DefinitionKind::Resource(_) => "resource",
            DefinitionKind::Merger(_) => "merger",
            DefinitionKind::SinglePatch(_) => "patch",
            DefinitionKind::MultiplePatch(_) => "patches",
            DefinitionKind::Extern(_) => "extern",
            DefinitionKind::Scope(_) => "scope",
        }
    }

    /// Named parameters this definition's function resolves against its
    /// lexical scope. Empty for `Extern`/`Scope`, which have no function.
    pub fn dependencies(&self) -> &[Name] {
        match self {
            DefinitionKind::Resource(r) => &r.dependencies,
            DefinitionKind::Merger(m) => &m.dependencies,
            DefinitionKind::SinglePatch(p) => &p.dependencies,
            DefinitionKind::MultiplePatch(p) => &p.dependencies,
            DefinitionKind::Extern(_) | DefinitionKind::Scope(_) => &[],
        }
    }
}

/// Visibility/evaluation flags attached to a definition site: public vs.
/// local, lazy vs. eager. Defaults to public, non-local, non-eager.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefFlags {
    pub is_public: bool,
    pub is_local: bool,
    pub is_eager: bool,
}

impl Default for DefFlags {
    fn default() -> Self {
        DefFlags {
            is_public: true,
            is_local: false,
            is_eager: false,
        }
    }
}

/// One authored definition: a kind, its flags, and the lexical address it
/// was declared at. `MixinSymbol::origin` is an ordered tuple of these.
#[derive(Clone)]
pub struct Definition {
    pub kind: DefinitionKind,
    pub flags: DefFlags,
    pub lexical_site: LexicalSite,
}

impl Definition {
    pub fn new(kind: DefinitionKind, flags: DefFlags, lexical_site: LexicalSite) -> Self {
        Definition {
            kind,
            flags,
            lexical_site,
        }
    }

    pub fn as_scope(&self) -> Option<&ScopeDef> {
        match &self.kind {
            DefinitionKind::Scope(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Definition")
            .field("kind", &self.kind.label())
            .field("flags", &self.flags)
            .field("lexical_site", &self.lexical_site)
            .finish()
    }
}
