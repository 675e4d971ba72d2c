use crate::mapping::{DeferredResolved, FromResolved};
use std::{fmt, sync::OnceLock};

///
/// Lazy
///
/// Deferred-evaluation field holder: a captured resolution closure plus a
/// memoization cell. Constructed eagerly during mapping, evaluated at most
/// once on first access. An unmappable or failing resolution surfaces as an
/// empty holder rather than an error; lazy access happens long after the
/// mapping that could have reported one.
///

pub struct Lazy<T> {
    cell: OnceLock<Option<T>>,
    deferred: Option<DeferredResolved>,
}

impl<T> Lazy<T> {
    /// Holder with no value; `get` always returns `None`.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            cell: OnceLock::new(),
            deferred: None,
        }
    }

    pub(crate) const fn deferred(deferred: DeferredResolved) -> Self {
        Self {
            cell: OnceLock::new(),
            deferred: Some(deferred),
        }
    }

    /// Whether the holder has been forced yet.
    #[must_use]
    pub fn is_evaluated(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T: FromResolved> Lazy<T> {
    /// Force the holder, memoizing the result.
    pub fn get(&self) -> Option<&T> {
        self.cell
            .get_or_init(|| {
                self.deferred.as_ref().and_then(|deferred| {
                    let value = deferred.force();
                    T::from_resolved(value, deferred.context()).ok().flatten()
                })
            })
            .as_ref()
    }
}

impl<T> Default for Lazy<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: fmt::Debug> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("Lazy").field(value).finish(),
            None if self.deferred.is_some() => f.write_str("Lazy(<deferred>)"),
            None => f.write_str("Lazy(<empty>)"),
        }
    }
}
