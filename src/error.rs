use std::fmt::Debug;

use thiserror::Error;

use crate::name::{Name, Path};

/// Recoverable errors raised during symbol-graph construction and
/// evaluation. Every variant carries the fully-qualified composition-site
/// path for diagnostics.
#[derive(Debug, Clone, Error)]
pub enum MixError {
    #[error("no definition for `{name}` visible from `{at_path}`")]
    UnresolvedName { name: Name, at_path: Path },

    #[error("`{at_path}` has patches but no elected merger and no kwargs to supply a base")]
    NoMerger { at_path: Path },

    #[error("`{at_path}` has two merger candidates with no linearization preference")]
    MultipleMergersAmbiguous { at_path: Path },

    #[error("circular dependency detected while evaluating `{at_path}`")]
    CircularDependency { at_path: Path },

    #[error("`{at_path}` elected a patcher-only merger but kwargs supplies no `{name}`")]
    KwargsMissing { name: Name, at_path: Path },

    #[error("malformed overlay file `{path}`: {cause}")]
    InvalidOverlayFile { path: String, cause: String },

    #[error("reference `levels_up={levels_up}` from `{at_path}` walked outside the tree: {cause}")]
    InvalidReference {
        levels_up: u32,
        at_path: Path,
        cause: String,
    },
}

pub type MixResult<T> = Result<T, MixError>;

/// Panicking helpers for states that should be provably unreachable if the
/// symbol graph was built correctly — the graph builder's own bugs, not
/// user-facing evaluation failures.
pub fn unreachable_elected_index<T: Debug>(loc: u32, got: &T) -> ! {
    panic!(
        "error.rs line {}; elected_merger_index pointed at an evaluator slot that doesn't exist, got {:?}\n",
        loc, got
    )
}

pub fn unreachable_not_scope<T: Debug>(loc: u32, got: &T) -> ! {
    panic!(
        "error.rs line {}; expected every member of this symbol's origin to be a ScopeDef, got {:?}\n",
        loc, got
    )
}

pub fn unreachable_dangling_symbol(loc: u32, id: u32) -> ! {
    panic!(
        "error.rs line {}; SymbolId({}) has no backing slot in the arena\n",
        loc, id
    )
}

/// A patch definition's function returned a value that doesn't downcast to
/// an endofunction while folding under an elected `Resource` merger.
/// Validating user return types is out of scope; this is a contract
/// violation in the host code that authored the patch, not user data.
pub fn unreachable_patch_type_mismatch(loc: u32, at_path: &Path) -> ! {
    panic!(
        "error.rs line {}; patch at `{}` did not produce an endofunction value under an endofunction merger\n",
        loc, at_path
    )
}
