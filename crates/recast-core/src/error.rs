//! Shared error taxonomy.
//!
//! A resolution miss is never an error; callers receive `Ok(None)` and decide
//! on fallback behavior themselves. Errors here are either configuration
//! mistakes to be fixed in model declarations (ambiguity, processor
//! conflicts) or mapping failures that abort the affected model instance.

use thiserror::Error as ThisError;

///
/// ResolveError
///
/// Raised by the adaptation surface. Ambiguity is never silently resolved;
/// the error names every candidate so the misdeclaration can be fixed.
///

#[derive(Debug, ThisError)]
pub enum ResolveError {
    #[error(
        "more than one model maps {path} to {target}: {}. Narrow the declaration or resolve by model name",
        .candidates.join(", ")
    )]
    Ambiguous {
        path: String,
        target: &'static str,
        candidates: Vec<String>,
    },

    #[error(transparent)]
    Mapping(#[from] MappingError),
}

///
/// MappingError
///
/// Failure while populating a single model instance. Partial models are
/// never returned; the first field failure aborts the mapping.
///

#[derive(Debug, ThisError)]
pub enum MappingError {
    #[error("cannot assign {got} to field `{field}` of model `{model}` (expected {expected})")]
    Assignment {
        model: &'static str,
        field: &'static str,
        expected: &'static str,
        got: String,
    },

    #[error("a mapping hook replaced model `{model}` with an incompatible instance")]
    Instantiation { model: &'static str },

    #[error("nested adaptation of `{path}` failed")]
    Nested {
        path: String,
        #[source]
        source: Box<ResolveError>,
    },
}

///
/// RegistrationError
///
/// Misconfiguration detected eagerly at registration time, not deferred to
/// the first mapping attempt.
///

#[derive(Debug, ThisError)]
pub enum RegistrationError {
    #[error(
        "field processors `{first}` and `{second}` both accept field `{field}` of model `{model}`; at most one processor may accept a field"
    )]
    ProcessorConflict {
        model: &'static str,
        field: &'static str,
        first: String,
        second: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_error_names_every_candidate() {
        let err = ResolveError::Ambiguous {
            path: "/content/page".to_string(),
            target: "Teaser",
            candidates: vec!["teaser".to_string(), "hero".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("teaser"));
        assert!(message.contains("hero"));
        assert!(message.contains("/content/page"));
    }

    #[test]
    fn nested_error_preserves_the_source() {
        let source = ResolveError::Ambiguous {
            path: "/a".to_string(),
            target: "M",
            candidates: vec!["x".to_string()],
        };
        let err = MappingError::Nested {
            path: "/a".to_string(),
            source: Box::new(source),
        };
        assert!(std::error::Error::source(&err).is_some());
    }
}
