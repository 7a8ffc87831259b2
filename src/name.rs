use std::sync::Arc;

/// A hashable identifier for a child key, a function parameter, or a path
/// segment in a [`crate::reference::RelativeReference`]. `Name` is an `Arc`
/// wrapper around an interned string so it can be cloned and hashed cheaply
/// no matter how many symbols and references end up sharing the same
/// identifier — flat, since mixin composition keys are single segments
/// rather than a hierarchical path.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(Arc<str>);

impl Name {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Name {
        Name(Arc::from(s))
    }
}

impl From<String> for Name {
    fn from(s: String) -> Name {
        Name(Arc::from(s.as_str()))
    }
}

impl std::borrow::Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fully-qualified composition-site path, used in diagnostics and as the
/// `at_path` payload of most [`crate::error::MixError`] variants.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Path(pub Vec<Name>);

impl Path {
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn child(&self, name: Name) -> Self {
        let mut v = self.0.clone();
        v.push(name);
        Path(v)
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "<root>")
        } else {
            let rendered = self
                .0
                .iter()
                .map(|n| n.as_str())
                .collect::<Vec<&str>>()
                .join(".");
            write!(f, "{}", rendered)
        }
    }
}

impl std::fmt::Debug for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod name_tests {
    use super::*;

    #[test]
    fn interned_names_compare_by_value() {
        let a = Name::from("greeting");
        let b = Name::from("greeting");
        assert_eq!(a, b);
    }

    #[test]
    fn path_renders_dotted() {
        let p = Path::root().child(Name::from("Outer")).child(Name::from("counter"));
        assert_eq!(format!("{}", p), "Outer.counter");
    }

    #[test]
    fn root_path_renders_placeholder() {
        assert_eq!(format!("{}", Path::root()), "<root>");
    }
}
