//! Named authorization policies.
//!
//! A policy is a requirement evaluated against the claims of the current
//! request. Policies are registered by name at startup; conventions refer to
//! them by that name.

use std::collections::HashMap;

use crate::services::PortalClaims;

/// What a policy demands of the caller.
#[derive(Debug, Clone)]
pub enum PolicyRequirement {
    /// Any authenticated principal.
    Authenticated,
    /// The claims must carry the given role.
    RequireRole(String),
    /// The claims must carry at least one of the given roles.
    RequireAnyRole(Vec<String>),
}

/// Errors from registering, applying, or evaluating policies.
#[derive(Debug, Clone)]
pub enum AuthzError {
    /// A convention referenced a policy name nobody registered.
    UnknownPolicy(String),
    /// The same area/prefix pair was registered twice.
    DuplicateRule { area: String, path_prefix: String },
    /// An area policy was declared with an empty area name.
    EmptyArea,
    /// The policy evaluated the claims and said no.
    Denied { policy: String },
}

impl std::fmt::Display for AuthzError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthzError::UnknownPolicy(name) => {
                write!(f, "No authorization policy named '{}' is registered", name)
            }
            AuthzError::DuplicateRule { area, path_prefix } => {
                write!(
                    f,
                    "Area '{}' already has a convention for prefix '{}'",
                    area, path_prefix
                )
            }
            AuthzError::EmptyArea => write!(f, "Area name must not be empty"),
            AuthzError::Denied { policy } => {
                write!(f, "Request does not satisfy the '{}' policy", policy)
            }
        }
    }
}

impl std::error::Error for AuthzError {}

/// Registry of named policies, populated once at startup.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: HashMap<String, PolicyRequirement>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a policy under a name. Last registration wins.
    pub fn register(&mut self, name: impl Into<String>, requirement: PolicyRequirement) {
        self.policies.insert(name.into(), requirement);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.policies.contains_key(name)
    }

    /// Evaluate the named policy against the caller's claims.
    ///
    /// Returns `Ok(())` when the claims satisfy the requirement,
    /// `AuthzError::Denied` when they do not.
    pub fn evaluate(&self, name: &str, claims: &PortalClaims) -> Result<(), AuthzError> {
        let requirement = self
            .policies
            .get(name)
            .ok_or_else(|| AuthzError::UnknownPolicy(name.to_string()))?;

        let satisfied = match requirement {
            PolicyRequirement::Authenticated => true,
            PolicyRequirement::RequireRole(role) => claims.has_role(role),
            PolicyRequirement::RequireAnyRole(roles) => {
                roles.iter().any(|role| claims.has_role(role))
            }
        };

        if satisfied {
            Ok(())
        } else {
            Err(AuthzError::Denied {
                policy: name.to_string(),
            })
        }
    }
}
