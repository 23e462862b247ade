//! Access policy: ordered rule table, first match wins.
//!
//! Pure decision function over (path, method, auth context). It never looks at
//! the token itself; the auth filter has already turned that into `AuthCtx` (or
//! nothing).

use axum::http::Method;

use crate::api::extractors::AuthCtx;
use crate::services::auth::principal::role_granted;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Any,
    Exact(String),
    /// `base` itself or anything below `base/`.
    Prefix(String),
    Suffix(String),
}

impl PathPattern {
    /// Ant-style subset:
    /// - `/**`        -> any path
    /// - `**/login`   -> any path ending in `/login`
    /// - `/docs/**`   -> `/docs` and everything under it
    /// - otherwise    -> exact match
    pub fn parse(pattern: &str) -> Self {
        if pattern == "/**" || pattern == "**" {
            return Self::Any;
        }
        if let Some(suffix) = pattern.strip_prefix("**") {
            return Self::Suffix(suffix.to_string());
        }
        if let Some(base) = pattern.strip_suffix("/**") {
            return Self::Prefix(base.to_string());
        }
        Self::Exact(pattern.to_string())
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(p) => path == p,
            Self::Prefix(base) => {
                path == base
                    || path
                        .strip_prefix(base.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            Self::Suffix(suffix) => path.ends_with(suffix.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Public,
    Authenticated,
    Role(String),
}

#[derive(Debug, Clone)]
pub struct AccessRule {
    pub pattern: PathPattern,
    /// `None` matches every method.
    pub method: Option<Method>,
    pub requirement: Requirement,
}

impl AccessRule {
    pub fn new(pattern: &str, method: Option<Method>, requirement: Requirement) -> Self {
        Self {
            pattern: PathPattern::parse(pattern),
            method,
            requirement,
        }
    }

    fn matches(&self, path: &str, method: &Method) -> bool {
        self.method.as_ref().is_none_or(|m| m == method) && self.pattern.matches(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    Forbidden { required_role: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
}

impl AccessPolicy {
    pub fn new(rules: Vec<AccessRule>) -> Self {
        Self { rules }
    }

    /// The service's rule table.
    pub fn standard() -> Self {
        use Requirement::{Authenticated, Public, Role};

        let mut rules = vec![
            AccessRule::new("/**", Some(Method::OPTIONS), Public),
            AccessRule::new("**/login", Some(Method::POST), Public),
            AccessRule::new("**/register", Some(Method::POST), Public),
        ];
        for docs in ["/swagger-ui.html", "/v3/api-docs/**", "/swagger-ui/**"] {
            rules.push(AccessRule::new(docs, None, Public));
        }
        for probe in ["/actuator/health", "/actuator/info"] {
            rules.push(AccessRule::new(probe, None, Public));
        }
        rules.push(AccessRule::new("/actuator/**", None, Role("ADMIN".into())));
        rules.push(AccessRule::new("/**", None, Authenticated));

        Self::new(rules)
    }

    /// Unmatched requests fall back to "authenticated".
    pub fn authorize(&self, path: &str, method: &Method, ctx: Option<&AuthCtx>) -> Decision {
        let requirement = self
            .rules
            .iter()
            .find(|rule| rule.matches(path, method))
            .map(|rule| &rule.requirement)
            .unwrap_or(&Requirement::Authenticated);

        match (requirement, ctx) {
            (Requirement::Public, _) => Decision::Allow,
            (_, None) => Decision::Deny(DenyReason::Unauthenticated),
            (Requirement::Authenticated, Some(_)) => Decision::Allow,
            (Requirement::Role(role), Some(ctx)) => {
                if role_granted(&ctx.roles, role) {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::Forbidden {
                        required_role: role.clone(),
                    })
                }
            }
        }
    }
}
