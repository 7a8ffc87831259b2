//! A composition engine for mixin-style definition trees: resources,
//! patches, and mergers declared across a scope hierarchy are interned
//! into a symbol graph once, linearized the way a diamond-shaped base
//! list demands, and evaluated lazily into memoized runtime values.

pub mod builder;
pub mod definition;
pub mod error;
pub mod kwargs;
pub mod lexical;
pub mod mixin;
pub mod name;
pub mod overlay;
pub mod reference;
pub mod scope;
pub mod symbol;
pub mod value;

pub use builder::ScopeBuilder;
pub use error::{MixError, MixResult};
pub use kwargs::KwargsMixin;
pub use name::{Name, Path};
pub use scope::Scope;
pub use value::Value;

/// Loads an overlay directory tree and constructs a `Scope` rooted at it,
/// with `kwargs` available to any extern or unmerged-patch site under it.
pub fn load_directory(dir: &std::path::Path, kwargs: Option<KwargsMixin>) -> MixResult<Scope> {
    let scope_def = overlay::load_directory_scope(dir)?;
    let root = definition::Definition::new(
        definition::DefinitionKind::Scope(scope_def),
        definition::DefFlags::default(),
        lexical::LexicalSite::root(),
    );
    Scope::construct(root, kwargs)
}
