use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::Relaxed;
use std::sync::Arc;

/// Globally incrementing counter for fresh lexical-site serials: every
/// definition authored in source — every `ScopeDef`, every `Resource`,
/// every `Patch` — gets a unique serial purely by incrementing a counter,
/// giving it a single, permanent, identity-comparable address independent
/// of anything composition does to it later.
static LEXICAL_SERIAL: AtomicU64 = AtomicU64::new(0);

/// The lexical ancestor chain of a definition as it was *authored*, entirely
/// independent of how mixin composition later unions, reorders, or flattens
/// scopes around it. Composition-site reference resolution
/// (`symbol::resolve_name_from_scope`) walks the interned symbol graph's own
/// `outer` pointers directly rather than re-deriving them from this chain.
///
/// `LexicalSite` identity (its `serial`, never its `parent` chain) is
/// load-bearing for two distinct things:
/// - Diamond-inheritance dedup — `SymbolArena::children` uses two
///   definitions' serials to recognize they are, in fact, the same physical
///   definition reached via two different base paths, and folds them into a
///   symbol's `origin` only once.
/// - Natural-home tracking — `SymbolArena::lexical_outer` maps a serial to
///   the symbol that first incorporated that definition locally, so a
///   nested `ScopeDef`'s own base references still resolve correctly after
///   the definition is copied, verbatim, into some other symbol's `origin`
///   by a later union-merge at a different composition depth.
#[derive(Clone)]
pub struct LexicalSite(Arc<LexicalSiteInner>);

struct LexicalSiteInner {
    parent: Option<LexicalSite>,
    serial: u64,
}

impl LexicalSite {
    /// The site of the outermost, unnamed definition tree — the "program
    /// root" every overlay or host namespace is parsed into.
    pub fn root() -> Self {
        let serial = LEXICAL_SERIAL.fetch_add(1, Relaxed);
        LexicalSite(Arc::new(LexicalSiteInner {
            parent: None,
            serial,
        }))
    }

    /// A fresh child site nested lexically inside `self` — called once per
    /// definition, at the moment it is added to its enclosing `ScopeDef`.
    pub fn child(&self) -> Self {
        let serial = LEXICAL_SERIAL.fetch_add(1, Relaxed);
        LexicalSite(Arc::new(LexicalSiteInner {
            parent: Some(self.clone()),
            serial,
        }))
    }

    pub fn parent(&self) -> Option<&LexicalSite> {
        self.0.parent.as_ref()
    }

    pub fn serial(&self) -> u64 {
        self.0.serial
    }
}

impl PartialEq for LexicalSite {
    fn eq(&self, other: &Self) -> bool {
        self.0.serial == other.0.serial
    }
}

impl Eq for LexicalSite {}

impl std::hash::Hash for LexicalSite {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.serial.hash(state);
    }
}

impl std::fmt::Debug for LexicalSite {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "LexicalSite({})", self.0.serial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_are_distinct_and_remember_their_parent() {
        let root = LexicalSite::root();
        let a = root.child();
        let b = root.child();
        assert_ne!(a, b);
        assert_eq!(a.parent().unwrap(), &root);
        assert_eq!(b.parent().unwrap(), &root);
    }

    #[test]
    fn cloning_preserves_identity() {
        let root = LexicalSite::root();
        let a = root.child();
        let a2 = a.clone();
        assert_eq!(a, a2);
    }
}
