//! URI-template route registration, matching, and building.

use crate::error::RouterError;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

impl Segment {
    /// Two segments are the same "shape" if they're both literals with the
    /// same text, or both variables (names may differ).
    fn same_shape(&self, other: &Segment) -> bool {
        match (self, other) {
            (Segment::Literal(a), Segment::Literal(b)) => a == b,
            (Segment::Variable(_), Segment::Variable(_)) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRoute {
    name: String,
    template: String,
    segments: Vec<Segment>,
}

/// The outcome of a successful [`Router::match_path`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// The name the template was registered under.
    pub name: String,
    /// The template string as registered.
    pub template: String,
    /// Captured path variables, keyed by name.
    pub vars: BTreeMap<String, String>,
}

/// A registry of named URI templates supporting path matching and building.
///
/// Templates use `{name}` for a single path-segment variable; at most one
/// variable is permitted per segment (`/users/{handle}/inbox` is valid,
/// `/users/{a}{b}` is not). Two templates that would match exactly the same
/// set of paths — same literal/variable shape regardless of variable names —
/// are rejected as [`RouterError::DuplicateTemplate`] at registration time,
/// so ambiguous routing can never silently pick "whichever registered
/// first".
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<CompiledRoute>,
}

impl Router {
    /// An empty router.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a named template.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::MalformedTemplate`] if a segment mixes literal
    /// text with `{}`, or declares more than one variable; returns
    /// [`RouterError::DuplicateTemplate`] if the template's shape collides
    /// with an already-registered one.
    pub fn register(&mut self, name: impl Into<String>, template: impl Into<String>) -> Result<(), RouterError> {
        let name = name.into();
        let template = template.into();
        let segments = parse_template(&template)?;

        if let Some(existing) = self.routes.iter().find(|r| shapes_match(&r.segments, &segments)) {
            return Err(RouterError::DuplicateTemplate(format!(
                "{template:?} collides with {:?} (registered as {:?})",
                existing.template, existing.name
            )));
        }

        self.routes.push(CompiledRoute { name, template, segments });
        Ok(())
    }

    /// Match `path` against every registered template, returning the first
    /// match (registration order) along with its captured variables.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        for route in &self.routes {
            if route.segments.len() != parts.len() {
                continue;
            }
            let mut vars = BTreeMap::new();
            let mut matched = true;
            for (segment, part) in route.segments.iter().zip(&parts) {
                match segment {
                    Segment::Literal(lit) if lit == part => {}
                    Segment::Literal(_) => {
                        matched = false;
                        break;
                    }
                    Segment::Variable(name) => {
                        vars.insert(name.clone(), (*part).to_string());
                    }
                }
            }
            if matched {
                return Some(RouteMatch { name: route.name.clone(), template: route.template.clone(), vars });
            }
        }
        None
    }

    /// Build a path from a registered template name and variable bindings.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::UnknownTemplate`] if `name` isn't registered,
    /// and [`RouterError::MissingVariable`] if a required variable is
    /// absent from `vars`.
    pub fn build(&self, name: &str, vars: &BTreeMap<String, String>) -> Result<String, RouterError> {
        let route = self
            .routes
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| RouterError::UnknownTemplate(name.to_string()))?;

        let mut parts = Vec::with_capacity(route.segments.len());
        for segment in &route.segments {
            match segment {
                Segment::Literal(lit) => parts.push(lit.clone()),
                Segment::Variable(var) => {
                    let value = vars.get(var).ok_or_else(|| RouterError::MissingVariable {
                        template: route.template.clone(),
                        variable: var.clone(),
                    })?;
                    parts.push(value.clone());
                }
            }
        }
        Ok(format!("/{}", parts.join("/")))
    }
}

fn shapes_match(a: &[Segment], b: &[Segment]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_shape(y))
}

fn parse_template(template: &str) -> Result<Vec<Segment>, RouterError> {
    let mut segments = Vec::new();
    for raw in template.split('/').filter(|s| !s.is_empty()) {
        let open = raw.find('{');
        let close = raw.find('}');
        segments.push(match (open, close) {
            (None, None) => Segment::Literal(raw.to_string()),
            (Some(0), Some(c)) if c == raw.len() - 1 => {
                let name = &raw[1..c];
                if name.is_empty() || name.contains('{') || name.contains('}') {
                    return Err(RouterError::MalformedTemplate {
                        template: template.to_string(),
                        reason: format!("invalid variable name in segment {raw:?}"),
                    });
                }
                Segment::Variable(name.to_string())
            }
            _ => {
                return Err(RouterError::MalformedTemplate {
                    template: template.to_string(),
                    reason: format!("segment {raw:?} must be a literal or a single `{{name}}` variable"),
                });
            }
        });
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_and_matches_a_literal_route() {
        let mut router = Router::new();
        router.register("inbox", "/inbox").unwrap();
        let m = router.match_path("/inbox").unwrap();
        assert_eq!(m.name, "inbox");
    }

    #[test]
    fn registers_and_matches_a_variable_route() {
        let mut router = Router::new();
        router.register("actor_inbox", "/users/{handle}/inbox").unwrap();
        let m = router.match_path("/users/alice/inbox").unwrap();
        assert_eq!(m.vars.get("handle"), Some(&"alice".to_string()));
    }

    #[test]
    fn no_match_for_wrong_segment_count() {
        let mut router = Router::new();
        router.register("actor", "/users/{handle}").unwrap();
        assert!(router.match_path("/users/alice/inbox").is_none());
    }

    #[test]
    fn duplicate_shape_is_rejected() {
        let mut router = Router::new();
        router.register("a", "/users/{handle}/inbox").unwrap();
        let err = router.register("b", "/users/{id}/inbox").unwrap_err();
        assert!(matches!(err, RouterError::DuplicateTemplate(_)));
    }

    #[test]
    fn distinct_shapes_do_not_collide() {
        let mut router = Router::new();
        router.register("inbox", "/users/{handle}/inbox").unwrap();
        router.register("outbox", "/users/{handle}/outbox").unwrap();
        assert_eq!(router.match_path("/users/alice/outbox").unwrap().name, "outbox");
    }

    #[test]
    fn build_fills_in_variables() {
        let mut router = Router::new();
        router.register("actor_inbox", "/users/{handle}/inbox").unwrap();
        let mut vars = BTreeMap::new();
        vars.insert("handle".to_string(), "alice".to_string());
        assert_eq!(router.build("actor_inbox", &vars).unwrap(), "/users/alice/inbox");
    }

    #[test]
    fn build_missing_variable_is_an_error() {
        let mut router = Router::new();
        router.register("actor_inbox", "/users/{handle}/inbox").unwrap();
        let err = router.build("actor_inbox", &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, RouterError::MissingVariable { .. }));
    }

    #[test]
    fn build_unknown_template_is_an_error() {
        let router = Router::new();
        let err = router.build("nope", &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, RouterError::UnknownTemplate(_)));
    }

    #[test]
    fn malformed_template_with_two_variables_in_one_segment_is_rejected() {
        let mut router = Router::new();
        let err = router.register("bad", "/users/{a}{b}").unwrap_err();
        assert!(matches!(err, RouterError::MalformedTemplate { .. }));
    }

    #[test]
    fn build_roundtrips_through_match() {
        let mut router = Router::new();
        router.register("object", "/objects/{id}").unwrap();
        let mut vars = BTreeMap::new();
        vars.insert("id".to_string(), "42".to_string());
        let path = router.build("object", &vars).unwrap();
        let matched = router.match_path(&path).unwrap();
        assert_eq!(matched.vars, vars);
    }
}
