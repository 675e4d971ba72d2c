use crate::{
    error::ResolveError,
    mapping::MappingContext,
    model::{Lazy, ResourceModel},
    resource::{ResourceRef, Value},
};
use std::{fmt, sync::Arc};

///
/// Resolved
///
/// Outcome of resolving one field against a resource, before conversion
/// into the field's declared type. Absence is a value here, never an error.
///

#[derive(Clone)]
pub enum Resolved {
    /// Nothing at the declared path.
    Absent,
    /// A property value.
    Value(Value),
    /// The mapped resource itself.
    This(ResourceRef),
    /// A single referenced resource.
    Reference(ResourceRef),
    /// Referenced resources, in declaration order.
    References(Vec<ResourceRef>),
    /// Direct children of a resource, in tree order.
    Children(Vec<ResourceRef>),
    /// Resolution captured for later evaluation by a deferred holder.
    Deferred(DeferredResolved),
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("Absent"),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::This(resource) => f.debug_tuple("This").field(&resource.path()).finish(),
            Self::Reference(resource) => {
                f.debug_tuple("Reference").field(&resource.path()).finish()
            }
            Self::References(resources) => {
                let paths: Vec<&str> = resources.iter().map(|r| r.path()).collect();
                f.debug_tuple("References").field(&paths).finish()
            }
            Self::Children(resources) => {
                let paths: Vec<&str> = resources.iter().map(|r| r.path()).collect();
                f.debug_tuple("Children").field(&paths).finish()
            }
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

///
/// DeferredResolved
///
/// A field resolution captured as a thunk together with the mapping context
/// it must run under. Forcing it is pure with respect to the captured
/// resource; repeated forcing re-reads the tree.
///

#[derive(Clone)]
pub struct DeferredResolved {
    thunk: Arc<dyn Fn() -> Resolved + Send + Sync>,
    context: MappingContext,
}

impl DeferredResolved {
    pub(crate) fn new(
        thunk: Arc<dyn Fn() -> Resolved + Send + Sync>,
        context: MappingContext,
    ) -> Self {
        Self { thunk, context }
    }

    /// Deferred form of an already-materialized value.
    pub(crate) fn ready(value: Resolved, context: MappingContext) -> Self {
        Self {
            thunk: Arc::new(move || value.clone()),
            context,
        }
    }

    #[must_use]
    pub fn force(&self) -> Resolved {
        (self.thunk)()
    }

    #[must_use]
    pub fn context(&self) -> &MappingContext {
        &self.context
    }
}

///
/// ConversionError
///

#[derive(Debug)]
pub enum ConversionError {
    /// The resolved value cannot inhabit the field's declared type.
    Mismatch {
        expected: &'static str,
        got: String,
    },
    /// Adapting a referenced resource failed.
    Nested {
        path: String,
        source: Box<ResolveError>,
    },
}

///
/// FromResolved
///
/// Conversion from a [`Resolved`] outcome into a field's declared type.
/// `Ok(None)` means "leave the default in place": scalars keep their zero
/// value and collections stay empty, so mapped fields are never poisoned by
/// absent content.
///

pub trait FromResolved: Sized {
    fn from_resolved(
        value: Resolved,
        ctx: &MappingContext,
    ) -> Result<Option<Self>, ConversionError>;
}

fn mismatch(expected: &'static str, got: &Resolved) -> ConversionError {
    ConversionError::Mismatch {
        expected,
        got: format!("{got:?}"),
    }
}

macro_rules! scalar_from_resolved {
    ($ty:ty, $expected:literal, $accessor:ident) => {
        impl FromResolved for $ty {
            fn from_resolved(
                value: Resolved,
                _ctx: &MappingContext,
            ) -> Result<Option<Self>, ConversionError> {
                match value {
                    Resolved::Absent => Ok(None),
                    Resolved::Value(ref v) => v
                        .$accessor()
                        .map(|converted| Some(converted.into()))
                        .ok_or_else(|| mismatch($expected, &value)),
                    other => Err(mismatch($expected, &other)),
                }
            }
        }
    };
}

scalar_from_resolved!(bool, "bool", as_bool);
scalar_from_resolved!(i64, "i64", as_long);
scalar_from_resolved!(f64, "f64", as_double);
scalar_from_resolved!(String, "text", as_text);

impl FromResolved for Vec<String> {
    fn from_resolved(
        value: Resolved,
        _ctx: &MappingContext,
    ) -> Result<Option<Self>, ConversionError> {
        match value {
            Resolved::Absent => Ok(None),
            Resolved::Value(ref v) => v
                .as_text_list()
                .map(Some)
                .ok_or_else(|| mismatch("text list", &value)),
            other => Err(mismatch("text list", &other)),
        }
    }
}

impl FromResolved for Vec<i64> {
    fn from_resolved(
        value: Resolved,
        _ctx: &MappingContext,
    ) -> Result<Option<Self>, ConversionError> {
        match value {
            Resolved::Absent => Ok(None),
            Resolved::Value(ref v) => v
                .as_long_list()
                .map(Some)
                .ok_or_else(|| mismatch("long list", &value)),
            other => Err(mismatch("long list", &other)),
        }
    }
}

impl FromResolved for Value {
    fn from_resolved(
        value: Resolved,
        _ctx: &MappingContext,
    ) -> Result<Option<Self>, ConversionError> {
        match value {
            Resolved::Absent => Ok(None),
            Resolved::Value(v) => Ok(Some(v)),
            other => Err(mismatch("property value", &other)),
        }
    }
}

impl FromResolved for ResourceRef {
    fn from_resolved(
        value: Resolved,
        _ctx: &MappingContext,
    ) -> Result<Option<Self>, ConversionError> {
        match value {
            Resolved::Absent => Ok(None),
            Resolved::This(resource) | Resolved::Reference(resource) => Ok(Some(resource)),
            other => Err(mismatch("resource", &other)),
        }
    }
}

impl FromResolved for Vec<ResourceRef> {
    fn from_resolved(
        value: Resolved,
        _ctx: &MappingContext,
    ) -> Result<Option<Self>, ConversionError> {
        match value {
            Resolved::Absent => Ok(None),
            Resolved::References(resources) | Resolved::Children(resources) => {
                Ok(Some(resources))
            }
            other => Err(mismatch("resources", &other)),
        }
    }
}

// An optional field accepts absence as `None` rather than leaving the
// default untouched, so `Some(None)` is a meaningful assignment. A
// deferred value is evaluated on the spot since `Option` has no holder
// cell to park it in.
impl<T: FromResolved> FromResolved for Option<T> {
    fn from_resolved(
        value: Resolved,
        ctx: &MappingContext,
    ) -> Result<Option<Self>, ConversionError> {
        match value {
            Resolved::Deferred(deferred) => {
                T::from_resolved(deferred.force(), deferred.context()).map(Some)
            }
            other => T::from_resolved(other, ctx).map(Some),
        }
    }
}

impl<M: ResourceModel> FromResolved for Arc<M> {
    fn from_resolved(
        value: Resolved,
        ctx: &MappingContext,
    ) -> Result<Option<Self>, ConversionError> {
        match value {
            Resolved::Absent => Ok(None),
            Resolved::This(resource) | Resolved::Reference(resource) => {
                adapt_one(&resource, ctx)
            }
            other => Err(mismatch("mappable resource", &other)),
        }
    }
}

impl<M: ResourceModel> FromResolved for Vec<Arc<M>> {
    fn from_resolved(
        value: Resolved,
        ctx: &MappingContext,
    ) -> Result<Option<Self>, ConversionError> {
        match value {
            Resolved::Absent => Ok(None),
            Resolved::References(resources) | Resolved::Children(resources) => {
                let mut models = Vec::with_capacity(resources.len());
                for resource in &resources {
                    // Unmappable members are skipped, not errors.
                    if let Some(model) = adapt_one::<M>(resource, ctx)? {
                        models.push(model);
                    }
                }
                Ok(Some(models))
            }
            other => Err(mismatch("mappable resources", &other)),
        }
    }
}

impl<T: FromResolved> FromResolved for Lazy<T> {
    fn from_resolved(
        value: Resolved,
        ctx: &MappingContext,
    ) -> Result<Option<Self>, ConversionError> {
        match value {
            Resolved::Absent => Ok(None),
            Resolved::Deferred(deferred) => Ok(Some(Lazy::deferred(deferred))),
            already_materialized => Ok(Some(Lazy::deferred(DeferredResolved::ready(
                already_materialized,
                ctx.clone(),
            )))),
        }
    }
}

fn adapt_one<M: ResourceModel>(
    resource: &ResourceRef,
    ctx: &MappingContext,
) -> Result<Option<Arc<M>>, ConversionError> {
    ctx.adapt::<M>(resource).map_err(|source| ConversionError::Nested {
        path: resource.path().to_string(),
        source: Box::new(source),
    })
}
