use std::any::Any;
use std::sync::Arc;

/// An opaque, reference-counted user value. Resources evaluate to a `Value`;
/// patches, aggregators, and externs all move `Value`s around without the
/// core ever needing to know what's inside one — the payload is whatever
/// the host mixin author returned.
#[derive(Clone)]
pub struct Value(Arc<dyn Any + Send + Sync>);

impl Value {
    pub fn new<T: Any + Send + Sync>(inner: T) -> Self {
        Value(Arc::new(inner))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }

    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "<value@{:p}>", Arc::as_ptr(&self.0))
    }
}

/// An endofunction patch: `Value -> Value`. Used by the endofunction merger,
/// which folds these left-to-right over a base value.
pub type Endofunction = Arc<dyn Fn(Value) -> crate::error::MixResult<Value> + Send + Sync>;

/// An aggregator produced by a `Merger` definition: consumes the full patch
/// sequence at once and returns the merged value.
pub type Aggregator =
    Arc<dyn Fn(&mut dyn Iterator<Item = Value>) -> crate::error::MixResult<Value> + Send + Sync>;

pub fn endofunction_value(f: Endofunction) -> Value {
    Value::new(f)
}

pub fn as_endofunction(v: &Value) -> Option<Endofunction> {
    v.downcast_ref::<Endofunction>().cloned()
}
