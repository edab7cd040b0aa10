//! Area access conventions.
//!
//! An [`AreaPolicy`] declares that every page rooted at an area's path
//! prefix requires a named authorization policy. Conventions are applied to
//! a [`ConventionTable`] once at startup; applying a rule whose policy name
//! is not registered is a fatal configuration error. At request time the
//! table answers "which policy, if any, protects this path".

use super::policy::{AuthzError, PolicyRegistry};

/// Binds an area's path prefix to a required authorization policy.
///
/// Constructed once during startup configuration and never mutated.
#[derive(Debug, Clone)]
pub struct AreaPolicy {
    /// Route segment of the area, e.g. `school-management`.
    pub area: String,
    /// Root path within the area the policy applies to (`/` for the whole
    /// area).
    pub path_prefix: String,
    /// Name of a policy registered in the [`PolicyRegistry`].
    pub policy: String,
}

impl AreaPolicy {
    pub fn new(
        area: impl Into<String>,
        path_prefix: impl Into<String>,
        policy: impl Into<String>,
    ) -> Self {
        Self {
            area: area.into(),
            path_prefix: path_prefix.into(),
            policy: policy.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct ConventionRule {
    /// Normalized `/{area}{path_prefix}` with no trailing slash.
    route_prefix: String,
    policy: String,
}

/// The set of applied area conventions.
///
/// Built during single-threaded startup, then shared read-only across the
/// request pipeline.
#[derive(Debug, Clone, Default)]
pub struct ConventionTable {
    rules: Vec<ConventionRule>,
}

impl ConventionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an area convention, validating the policy name against the
    /// registry.
    ///
    /// # Errors
    ///
    /// - `UnknownPolicy` if the named policy is not registered.
    /// - `EmptyArea` if the area name normalizes to nothing.
    /// - `DuplicateRule` if the same area/prefix pair was already applied.
    pub fn apply(
        &mut self,
        policy: AreaPolicy,
        registry: &PolicyRegistry,
    ) -> Result<(), AuthzError> {
        if !registry.contains(&policy.policy) {
            return Err(AuthzError::UnknownPolicy(policy.policy));
        }

        let area = policy.area.trim_matches('/');
        if area.is_empty() {
            return Err(AuthzError::EmptyArea);
        }

        let route_prefix = normalize_route_prefix(area, &policy.path_prefix);
        if self.rules.iter().any(|r| r.route_prefix == route_prefix) {
            return Err(AuthzError::DuplicateRule {
                area: policy.area,
                path_prefix: policy.path_prefix,
            });
        }

        tracing::debug!(
            area = %area,
            prefix = %policy.path_prefix,
            policy = %policy.policy,
            "Applying area convention"
        );

        self.rules.push(ConventionRule {
            route_prefix,
            policy: policy.policy,
        });
        Ok(())
    }

    /// The policy protecting `path`, if any.
    ///
    /// Matching is segment-aware, and when several rules match the most
    /// specific (longest) prefix wins. Paths outside every registered prefix
    /// return `None`: conventions are scoped, never global.
    pub fn required_policy(&self, path: &str) -> Option<&str> {
        self.rules
            .iter()
            .filter(|rule| prefix_matches(&rule.route_prefix, path))
            .max_by_key(|rule| rule.route_prefix.len())
            .map(|rule| rule.policy.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn normalize_route_prefix(area: &str, path_prefix: &str) -> String {
    let mut out = String::with_capacity(area.len() + path_prefix.len() + 2);
    out.push('/');
    out.push_str(area);
    let trimmed = path_prefix.trim_matches('/');
    if !trimmed.is_empty() {
        out.push('/');
        out.push_str(trimmed);
    }
    out
}

/// True when `path` equals the prefix or continues it at a `/` boundary, so
/// `/school-management` never captures `/school-managementx`.
fn prefix_matches(route_prefix: &str, path: &str) -> bool {
    match path.strip_prefix(route_prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
