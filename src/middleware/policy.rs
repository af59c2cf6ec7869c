use std::collections::HashMap;

use crate::error::Error;

/// How much authentication a route demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessPolicy {
    /// No credential needed; tokens are not inspected.
    Public,
    /// A valid credential personalizes the response; anything else is served as a guest.
    Optional,
    /// A valid, unrevoked access token is mandatory.
    Required,
}

/// Route matcher with exactly one variable segment, e.g. `/evaluations/{id}/detail`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RoutePattern {
    before: Vec<String>,
    after: Vec<String>,
}

impl RoutePattern {
    fn matches(&self, segments: &[&str]) -> bool {
        let n = self.before.len();
        segments.len() == n + 1 + self.after.len()
            && !segments[n].is_empty()
            && self.before.iter().zip(&segments[..n]).all(|(a, b)| a == b)
            && self.after.iter().zip(&segments[n + 1..]).all(|(a, b)| a == b)
    }
}

fn is_param(segment: &str) -> bool {
    (segment.starts_with('{') && segment.ends_with('}')) || segment.starts_with(':')
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

/// Immutable path → [`AccessPolicy`] table.
///
/// Built once at startup; lookups never mutate it. Exact routes win over
/// patterns, patterns are tried in insertion order, and unmatched paths get
/// the fallback policy.
///
/// ```rust,ignore
/// let table = PolicyTable::from_routes(AccessPolicy::Required, [
///     ("/evaluations/list/all", AccessPolicy::Optional),
///     ("/evaluations/{id}/detail", AccessPolicy::Optional),
///     ("/healthz", AccessPolicy::Public),
/// ])?;
/// ```
#[derive(Debug, Clone)]
pub struct PolicyTable {
    exact: HashMap<String, AccessPolicy>,
    patterns: Vec<(RoutePattern, AccessPolicy)>,
    fallback: AccessPolicy,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::new(AccessPolicy::Required)
    }
}

impl PolicyTable {
    #[must_use]
    pub fn new(fallback: AccessPolicy) -> Self {
        Self {
            exact: HashMap::new(),
            patterns: Vec::new(),
            fallback,
        }
    }

    /// Builds a table from `(route, policy)` pairs.
    ///
    /// # Errors
    ///
    /// As [`with_route`](Self::with_route).
    pub fn from_routes<'a>(
        fallback: AccessPolicy,
        routes: impl IntoIterator<Item = (&'a str, AccessPolicy)>,
    ) -> Result<Self, Error> {
        routes
            .into_iter()
            .try_fold(Self::new(fallback), |table, (route, policy)| {
                table.with_route(route, policy)
            })
    }

    /// Adds a route. `{name}` or `:name` marks the single variable segment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the route has more than one variable segment
    /// or a malformed one.
    pub fn with_route(mut self, route: &str, policy: AccessPolicy) -> Result<Self, Error> {
        let segments: Vec<&str> = normalize(route).split('/').collect();
        let params: Vec<usize> = segments
            .iter()
            .enumerate()
            .filter(|(_, s)| is_param(s))
            .map(|(i, _)| i)
            .collect();

        match params.as_slice() {
            [] => {
                if segments.iter().any(|s| s.contains('{') || s.contains('}')) {
                    return Err(Error::Config(format!("malformed route pattern '{route}'")));
                }
                self.exact.insert(normalize(route).to_owned(), policy);
            }
            [i] => {
                let name = segments[*i].trim_start_matches(':').trim_matches(['{', '}']);
                if name.is_empty() {
                    return Err(Error::Config(format!(
                        "unnamed variable segment in route '{route}'"
                    )));
                }
                let pattern = RoutePattern {
                    before: segments[..*i].iter().map(|s| (*s).to_owned()).collect(),
                    after: segments[*i + 1..].iter().map(|s| (*s).to_owned()).collect(),
                };
                self.patterns.push((pattern, policy));
            }
            _ => {
                return Err(Error::Config(format!(
                    "route '{route}' has more than one variable segment"
                )));
            }
        }
        Ok(self)
    }

    #[must_use]
    pub fn fallback(&self) -> AccessPolicy {
        self.fallback
    }

    /// Policy for a request path.
    #[must_use]
    pub fn classify(&self, path: &str) -> AccessPolicy {
        let path = normalize(path);
        if let Some(policy) = self.exact.get(path) {
            return *policy;
        }
        let segments: Vec<&str> = path.split('/').collect();
        self.patterns
            .iter()
            .find(|(pattern, _)| pattern.matches(&segments))
            .map_or(self.fallback, |(_, policy)| *policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PolicyTable {
        PolicyTable::from_routes(
            AccessPolicy::Required,
            [
                ("/users/login", AccessPolicy::Public),
                ("/evaluations/list/all", AccessPolicy::Optional),
                ("/evaluations/{evaluationId}/detail", AccessPolicy::Optional),
            ],
        )
        .unwrap()
    }

    #[test]
    fn exact_routes() {
        let t = table();
        assert_eq!(t.classify("/users/login"), AccessPolicy::Public);
        assert_eq!(t.classify("/evaluations/list/all"), AccessPolicy::Optional);
        assert_eq!(t.classify("/evaluations/list/all/"), AccessPolicy::Optional);
    }

    #[test]
    fn parametrized_route() {
        let t = table();
        assert_eq!(t.classify("/evaluations/123/detail"), AccessPolicy::Optional);
        assert_eq!(t.classify("evaluations/abc/detail"), AccessPolicy::Optional);
    }

    #[test]
    fn parametrized_route_shape_must_match() {
        let t = table();
        assert_eq!(t.classify("/evaluations//detail"), AccessPolicy::Required);
        assert_eq!(t.classify("/evaluations/123"), AccessPolicy::Required);
        assert_eq!(t.classify("/evaluations/123/detail/x"), AccessPolicy::Required);
        assert_eq!(t.classify("/evaluations/123/edit"), AccessPolicy::Required);
        assert_eq!(t.classify("/courses/123/detail"), AccessPolicy::Required);
    }

    #[test]
    fn unlisted_paths_use_fallback() {
        let t = table();
        assert_eq!(t.classify("/users/profile"), AccessPolicy::Required);
        assert_eq!(t.classify("/"), AccessPolicy::Required);

        let open = PolicyTable::new(AccessPolicy::Optional);
        assert_eq!(open.classify("/anything"), AccessPolicy::Optional);
    }

    #[test]
    fn exact_wins_over_pattern() {
        let t = PolicyTable::new(AccessPolicy::Required)
            .with_route("/evaluations/{id}/detail", AccessPolicy::Optional)
            .unwrap()
            .with_route("/evaluations/secret/detail", AccessPolicy::Required)
            .unwrap();
        assert_eq!(t.classify("/evaluations/secret/detail"), AccessPolicy::Required);
        assert_eq!(t.classify("/evaluations/7/detail"), AccessPolicy::Optional);
    }

    #[test]
    fn colon_params() {
        let t = PolicyTable::default()
            .with_route("/users/:userId/profile", AccessPolicy::Public)
            .unwrap();
        assert_eq!(t.classify("/users/9/profile"), AccessPolicy::Public);
    }

    #[test]
    fn rejects_multi_param_routes() {
        let result = PolicyTable::default().with_route("/a/{x}/b/{y}", AccessPolicy::Optional);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn rejects_malformed_routes() {
        assert!(PolicyTable::default().with_route("/a/{}/b", AccessPolicy::Optional).is_err());
        assert!(PolicyTable::default().with_route("/a/x{id}/b", AccessPolicy::Optional).is_err());
    }
}
