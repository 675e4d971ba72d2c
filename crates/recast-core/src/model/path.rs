use std::sync::Arc;

///
/// PathTemplate
///
/// Pre-parsed form of a declared path. `${...}` placeholders are split out
/// once at descriptor-build time; expansion at mapping time is a plain
/// concatenation. An unresolvable variable keeps its literal `${...}` form.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathTemplate {
    segments: Vec<Segment>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Segment {
    Literal(String),
    Variable(String),
}

impl PathTemplate {
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let mut segments = Vec::new();
        let mut rest = path;
        while let Some(start) = rest.find("${") {
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                // Unterminated placeholder stays literal.
                break;
            };
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            segments.push(Segment::Variable(after[..end].to_string()));
            rest = &after[end + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        Self { segments }
    }

    #[must_use]
    pub fn has_variables(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Variable(_)))
    }

    #[must_use]
    pub fn expand(&self, resolvers: &PlaceholderResolvers) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Variable(name) => match resolvers.resolve(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    }
                },
            }
        }
        out
    }
}

///
/// PlaceholderResolver
/// Supplies values for `${...}` variables in declared paths.
///

pub trait PlaceholderResolver: Send + Sync {
    fn resolve(&self, variable: &str) -> Option<String>;
}

impl<F> PlaceholderResolver for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn resolve(&self, variable: &str) -> Option<String> {
        self(variable)
    }
}

///
/// PlaceholderResolvers
/// First resolver producing a value wins.
///

#[derive(Clone, Default)]
pub struct PlaceholderResolvers {
    resolvers: Vec<Arc<dyn PlaceholderResolver>>,
}

impl PlaceholderResolvers {
    #[must_use]
    pub fn new(resolvers: Vec<Arc<dyn PlaceholderResolver>>) -> Self {
        Self { resolvers }
    }

    #[must_use]
    pub fn resolve(&self, variable: &str) -> Option<String> {
        self.resolvers.iter().find_map(|r| r.resolve(variable))
    }
}
