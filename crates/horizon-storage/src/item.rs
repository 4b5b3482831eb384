//! Type-erased items and item identity.
//!
//! Storages hold heterogeneous models: one section may contain strings,
//! another a user-defined struct. [`AnyItem`] erases the concrete type while
//! keeping a cheap clone and a checked downcast. [`Identifiable`] is the
//! identity capability the diffing and accumulation strategies rely on.

use std::any::Any;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// A cloneable, type-erased item.
///
/// Cloning an `AnyItem` shares the underlying value. Reading the value back
/// requires naming its type; a mismatched type yields `None` rather than a
/// panic.
///
/// # Example
///
/// ```
/// use horizon_storage::AnyItem;
///
/// let item = AnyItem::new(42_i32);
/// assert!(item.is::<i32>());
/// assert_eq!(item.downcast_ref::<i32>(), Some(&42));
/// assert_eq!(item.downcast_ref::<String>(), None);
/// ```
#[derive(Clone)]
pub struct AnyItem {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl AnyItem {
    /// Wraps a value.
    ///
    /// Wrapping an `AnyItem` returns it unchanged instead of nesting it.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        let boxed: Box<dyn Any + Send + Sync> = Box::new(value);
        match boxed.downcast::<AnyItem>() {
            Ok(item) => *item,
            Err(boxed) => Self {
                value: Arc::from(boxed),
                type_name: std::any::type_name::<T>(),
            },
        }
    }

    /// Returns a reference to the value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Returns a clone of the value if it is a `T`.
    pub fn downcast<T: Any + Clone>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    /// Checks whether the value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// The name of the wrapped value's type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Checks whether both handles share the same allocation.
    pub fn ptr_eq(&self, other: &AnyItem) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for AnyItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyItem")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// A value with a stable identity.
///
/// Two values with the same identifier are considered "the same item" even
/// when their other fields differ. Diffing reports such pairs as updates or
/// moves rather than as a delete and an insert.
pub trait Identifiable {
    /// The identity type.
    type Identifier: Hash + Eq + Clone;

    /// Returns this value's identity.
    fn identifier(&self) -> Self::Identifier;
}

impl Identifiable for String {
    type Identifier = String;

    fn identifier(&self) -> String {
        self.clone()
    }
}

impl Identifiable for &str {
    type Identifier = String;

    fn identifier(&self) -> String {
        (*self).to_owned()
    }
}

macro_rules! identifiable_by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Identifiable for $ty {
                type Identifier = $ty;

                fn identifier(&self) -> $ty {
                    *self
                }
            }
        )*
    };
}

identifiable_by_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, char, bool);

static_assertions::assert_impl_all!(AnyItem: Send, Sync, Clone);
