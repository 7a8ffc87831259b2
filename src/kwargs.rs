use std::collections::HashMap;

use crate::name::Name;
use crate::value::Value;

/// A throwaway, per-instance binding of names to values, supplied from
/// outside the symbol graph rather than composed from `Definition`s. Used
/// both to satisfy `Extern` definitions and, when a symbol has patches but
/// no elected merger, as the base value a merger would otherwise have
/// produced.
#[derive(Clone, Default)]
pub struct KwargsMixin(HashMap<Name, Value>);

impl KwargsMixin {
    pub fn new() -> Self {
        KwargsMixin(HashMap::new())
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<Name>,
    {
        let mut map = HashMap::new();
        for (k, v) in pairs {
            map.insert(k.into(), v);
        }
        KwargsMixin(map)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
}
