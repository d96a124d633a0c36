//! Role-aware chunk filtering.
//!
//! A role is a consumer persona (`backend`, `frontend`, `devops`, ...)
//! that decides which retrieved chunks are worth showing the model. The
//! [`RoleRegistry`] maps lower-cased role names to a [`RoleFilter`]:
//!
//! | Role | Filter |
//! |------|--------|
//! | `backend` | path contains `controller` or `service` |
//! | `frontend` | path contains `frontend` or `.jsx` |
//! | `devops` | path contains `dockerfile` |
//! | `refactor`, `default` | pass-through |
//! | `security` | [`RolePolicy`] keyword / file-pattern matcher |
//! | anything unregistered | pass-through |
//!
//! New roles are added with [`RoleRegistry::register`] (custom predicate)
//! or [`RoleRegistry::register_policy`] (keyword / file-pattern lists).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::models::Chunk;

/// Role used when a request names none.
pub const DEFAULT_ROLE: &str = "default";

/// A chunk predicate. Returns `true` to keep the chunk.
pub type RolePredicate = Arc<dyn Fn(&Chunk) -> bool + Send + Sync>;

/// How a role filters candidate chunks.
#[derive(Clone)]
pub enum RoleFilter {
    /// Keep every chunk.
    PassThrough,
    /// Keep the chunks the predicate accepts.
    Predicate(RolePredicate),
}

impl RoleFilter {
    pub fn apply(&self, chunks: &[Chunk]) -> Vec<Chunk> {
        match self {
            RoleFilter::PassThrough => chunks.to_vec(),
            RoleFilter::Predicate(p) => chunks.iter().filter(|c| p(c)).cloned().collect(),
        }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, RoleFilter::PassThrough)
    }
}

impl fmt::Debug for RoleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleFilter::PassThrough => f.write_str("PassThrough"),
            RoleFilter::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Generic keyword / file-pattern matcher.
///
/// A chunk matches if its lower-cased `file_path` contains any file
/// pattern, or its lower-cased `content` contains any keyword. A policy
/// with neither is a pass-through.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RolePolicy {
    pub keywords: Vec<String>,
    pub file_patterns: Vec<String>,
}

impl RolePolicy {
    pub fn new<K, P>(keywords: K, file_patterns: P) -> Self
    where
        K: IntoIterator,
        K::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(|k| k.into().to_lowercase()).collect(),
            file_patterns: file_patterns
                .into_iter()
                .map(|p| p.into().to_lowercase())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.file_patterns.is_empty()
    }

    pub fn matches(&self, chunk: &Chunk) -> bool {
        let path = chunk.file_path.to_lowercase();
        if self.file_patterns.iter().any(|p| path.contains(p.as_str())) {
            return true;
        }
        let content = chunk.content.to_lowercase();
        self.keywords.iter().any(|k| content.contains(k.as_str()))
    }

    fn into_filter(self) -> RoleFilter {
        if self.is_empty() {
            RoleFilter::PassThrough
        } else {
            RoleFilter::Predicate(Arc::new(move |c: &Chunk| self.matches(c)))
        }
    }
}

fn path_contains_any(needles: &'static [&'static str]) -> RolePredicate {
    Arc::new(move |c: &Chunk| {
        let path = c.file_path.to_lowercase();
        needles.iter().any(|n| path.contains(n))
    })
}

/// Registry of role name → filter.
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    roles: BTreeMap<String, RoleFilter>,
}

impl RoleRegistry {
    /// An empty registry. Every role is a pass-through until registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in roles.
    pub fn with_builtins() -> Self {
        let mut r = Self::new();
        r.register("backend", path_contains_any(&["controller", "service"]));
        r.register("frontend", path_contains_any(&["frontend", ".jsx"]));
        r.register("devops", path_contains_any(&["dockerfile"]));
        r.register_pass_through("refactor");
        r.register_pass_through(DEFAULT_ROLE);
        r.register_policy(
            "security",
            RolePolicy::new(
                [
                    "auth",
                    "authentication",
                    "authorization",
                    "permission",
                    "role",
                    "encrypt",
                    "decrypt",
                    "hash",
                    "token",
                    "jwt",
                    "oauth",
                ],
                ["auth", "security", "permission", "role", "encrypt", "policy"],
            ),
        );
        r
    }

    /// Register (or replace) a role with a custom predicate.
    pub fn register(&mut self, role: &str, predicate: RolePredicate) {
        self.roles
            .insert(role.to_lowercase(), RoleFilter::Predicate(predicate));
    }

    /// Register (or replace) a role with the generic keyword / file-pattern matcher.
    pub fn register_policy(&mut self, role: &str, policy: RolePolicy) {
        self.roles.insert(role.to_lowercase(), policy.into_filter());
    }

    pub fn register_pass_through(&mut self, role: &str) {
        self.roles.insert(role.to_lowercase(), RoleFilter::PassThrough);
    }

    /// Look up a role's filter (case-insensitive). Unknown roles pass through.
    pub fn filter_for(&self, role: &str) -> RoleFilter {
        self.roles
            .get(&role.to_lowercase())
            .cloned()
            .unwrap_or(RoleFilter::PassThrough)
    }

    pub fn contains(&self, role: &str) -> bool {
        self.roles.contains_key(&role.to_lowercase())
    }

    /// Registered role names, sorted.
    pub fn roles(&self) -> Vec<&str> {
        self.roles.keys().map(|s| s.as_str()).collect()
    }
}

/// Normalize a request's role: trimmed, lower-cased, `"default"` when blank.
pub fn normalize_role(role: Option<&str>) -> String {
    match role.map(str::trim) {
        Some(r) if !r.is_empty() => r.to_lowercase(),
        _ => DEFAULT_ROLE.to_string(),
    }
}
