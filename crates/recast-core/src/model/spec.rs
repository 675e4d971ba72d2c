use crate::{
    error::MappingError,
    mapping::{ConversionError, FromResolved, MappingContext, Resolved},
};
use std::{any::Any, fmt};

/// Boxed model instance as it travels through instantiation and hooks.
pub type BoxedModel = Box<dyn Any + Send + Sync>;

/// Field assignment callback stored in a [`FieldSpec`]; plain function
/// pointers keep the descriptor fully static.
pub type SetFn = fn(&mut dyn Any, Resolved, &MappingContext) -> Result<(), MappingError>;

///
/// ResourceModel
///
/// A statically described model type. `SPEC` is the one-time descriptor
/// consumed by the engine; nothing about a model is inspected at runtime
/// beyond it.
///

pub trait ResourceModel: Any + Send + Sync + Sized + 'static {
    const SPEC: &'static ModelSpec;
}

///
/// ModelSpec
/// Static runtime descriptor of one model type.
///

pub struct ModelSpec {
    /// Model type name for lookups by name and diagnostics.
    pub type_name: &'static str,
    /// Fresh default instance; hooks may substitute it before mapping.
    pub new: fn() -> BoxedModel,
    /// Ordered mappable field list (authoritative for the mapper).
    pub fields: &'static [FieldSpec],
}

impl fmt::Debug for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSpec")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .finish()
    }
}

///
/// FieldSpec
///

pub struct FieldSpec {
    /// Field name as declared on the model.
    pub name: &'static str,
    /// Declared path, possibly containing `${...}` placeholders. Empty means
    /// implicit: the field name for value-bearing kinds, the resource itself
    /// for `Children`.
    pub path: &'static str,
    pub kind: FieldKind,
    pub wrapper: FieldWrapper,
    pub set: SetFn,
}

impl FieldSpec {
    /// Effective declared path for kinds that read a property or resource:
    /// the explicit path, or the field name when none was declared.
    #[must_use]
    pub const fn declared_path(&self) -> &'static str {
        if self.path.is_empty() { self.name } else { self.path }
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("wrapper", &self.wrapper)
            .finish()
    }
}

///
/// FieldKind
///
/// Closed set of mapping strategies. The original's transitive annotation
/// resolution collapses into this tag at declaration time, so no runtime
/// dispatch on model shape remains.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    /// Read a property of the mapped resource.
    Property,
    /// A property holds the path of another resource; adapt its model.
    Reference,
    /// A multi-valued property holds paths; adapt each target.
    ReferenceCollection,
    /// Enumerate the children of the resource (or of the declared path).
    Children,
    /// Bind the mapped resource itself.
    This,
    /// The declared path names another resource directly; adapt its model.
    Nested,
}

///
/// FieldWrapper
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldWrapper {
    /// Resolve and assign during mapping.
    Eager,
    /// Deferred resolution; `Lazy<T>` targets park the deferral in the
    /// holder, `Option<T>` targets evaluate it on assignment and store
    /// `None` for an absent value.
    Optional,
    /// Deferred holder, evaluated at most once on first access.
    Lazy,
}

impl FieldWrapper {
    /// `Optional` and `Lazy` both defer resolution into a holder; they
    /// differ only in declared intent.
    #[must_use]
    pub const fn is_deferred(self) -> bool {
        !matches!(self, Self::Eager)
    }
}

/// Typed assignment helper used by `FieldSpec::set` callbacks: downcasts the
/// instance, converts the resolved value, and writes it. Absent values leave
/// the instance's default in place, so scalars keep their zero value and
/// collections stay empty.
pub fn assign<M, T>(
    model: &mut dyn Any,
    value: Resolved,
    ctx: &MappingContext,
    field: &'static str,
    write: fn(&mut M, T),
) -> Result<(), MappingError>
where
    M: ResourceModel,
    T: FromResolved,
{
    let Some(target) = model.downcast_mut::<M>() else {
        return Err(MappingError::Instantiation {
            model: M::SPEC.type_name,
        });
    };
    match T::from_resolved(value, ctx) {
        Ok(Some(converted)) => {
            write(target, converted);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(ConversionError::Mismatch { expected, got }) => Err(MappingError::Assignment {
            model: M::SPEC.type_name,
            field,
            expected,
            got,
        }),
        Err(ConversionError::Nested { path, source }) => {
            Err(MappingError::Nested { path, source })
        }
    }
}
