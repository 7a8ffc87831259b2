use crate::name::Name;
use crate::symbol::SymbolId;

/// A symbolic reference as written at its definition site: a de Bruijn
/// count of lexical scopes to escape, then a path to descend.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RelativeReference {
    pub levels_up: u32,
    pub path: Vec<Name>,
}

impl RelativeReference {
    pub fn new(levels_up: u32, path: Vec<Name>) -> Self {
        assert!(!path.is_empty(), "RelativeReference path must be non-empty");
        RelativeReference { levels_up, path }
    }

    /// A same-scope reference to a single name, the common case for a
    /// function parameter naming a sibling resource.
    pub fn sibling(name: impl Into<Name>) -> Self {
        RelativeReference::new(0, vec![name.into()])
    }
}

/// The re-interpretation of a [`RelativeReference`] at one particular
/// composition site: pinned to the `MixinSymbol` it actually lands on,
/// plus the effective `levels_up` actually walked to get there.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedReference {
    pub levels_up: u32,
    pub path: Vec<Name>,
    pub target: SymbolId,
}
