//! ## Crate layout
//! - `core::resource`: the resource contract, property values, and the
//!   type-hierarchy source.
//! - `core::model`: static model descriptors and deferred field holders.
//! - `core::registry`: the type-indexed model registry.
//! - `core::mapping`: field resolution, conversion, and processors.
//! - `core::cache`: the request-scoped result cache and its backends.
//! - `core::engine`: the engine composing all of the above.
//!
//! The `prelude` module mirrors the surface host integrations use.

pub use recast_core as core;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use recast_core::error::{MappingError, RegistrationError, ResolveError};

///
/// Host Prelude
///

pub mod prelude {
    pub use crate::core::{
        cache::{CacheConfig, CacheMode, RequestScope, RequestState},
        prelude::*,
    };
}
