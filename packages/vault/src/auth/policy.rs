use crate::engine::EngineConfig;
use std::fmt;
use std::sync::Arc;

/// Identity that bypasses allow lists by default
pub const ROOT_IDENTITY: &str = "root";

type PrivilegedPredicate = dyn Fn(&str) -> bool + Send + Sync;

/// Read authorization policy
///
/// Decisions are pure functions of the caller identity and the engine
/// config: no I/O, no panics, no state.
#[derive(Clone)]
pub struct AccessPolicy {
    privileged: Arc<PrivilegedPredicate>,
    label: String,
}

impl AccessPolicy {
    /// Policy where only [`ROOT_IDENTITY`] is privileged
    pub fn root_only() -> Self {
        Self::with_privileged_identities([ROOT_IDENTITY])
    }

    /// Policy where each of `identities` is privileged (exact match)
    pub fn with_privileged_identities<S: Into<String>>(
        identities: impl IntoIterator<Item = S>,
    ) -> Self {
        let identities: Vec<String> = identities.into_iter().map(Into::into).collect();
        let label = format!("identities{identities:?}");
        Self {
            privileged: Arc::new(move |caller: &str| identities.iter().any(|id| id == caller)),
            label,
        }
    }

    /// Policy with an arbitrary privileged-identity predicate
    pub fn with_predicate<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            privileged: Arc::new(predicate),
            label: "custom".to_string(),
        }
    }

    /// Whether `caller` bypasses allow lists
    pub fn is_privileged(&self, caller: &str) -> bool {
        (self.privileged)(caller)
    }

    /// Whether `caller` may read `config`
    pub fn is_authorized(&self, caller: &str, config: &EngineConfig) -> bool {
        self.is_privileged(caller) || config.allows(caller)
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::root_only()
    }
}

impl fmt::Debug for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessPolicy")
            .field("privileged", &self.label)
            .finish()
    }
}

/// Authorize `caller` against `config` with the default root-only policy
pub fn is_authorized(caller: &str, config: &EngineConfig) -> bool {
    caller == ROOT_IDENTITY || config.allows(caller)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineId;

    fn config(subjects: &[&str]) -> EngineConfig {
        EngineConfig {
            id: EngineId::new("payments").unwrap(),
            allowed_subjects: subjects.iter().map(|s| s.to_string()).collect(),
            issuer: "vault".to_string(),
            audience: "vault".to_string(),
            ttl: 3600,
        }
    }

    #[test]
    fn test_root_bypasses_empty_list() {
        assert!(is_authorized("root", &config(&[])));
        assert!(AccessPolicy::default().is_authorized("root", &config(&[])));
    }

    #[test]
    fn test_membership_is_exact() {
        let config = config(&["alice"]);
        assert!(is_authorized("alice", &config));
        assert!(!is_authorized("Alice", &config));
        assert!(!is_authorized("Root", &config));
        assert!(!is_authorized("", &config));
    }

    #[test]
    fn test_custom_privileged_identities() {
        let policy = AccessPolicy::with_privileged_identities(["admin", "ops"]);
        assert!(policy.is_authorized("ops", &config(&[])));
        assert!(!policy.is_authorized("root", &config(&[])));
        assert!(policy.is_authorized("bob", &config(&["bob"])));
    }

    #[test]
    fn test_predicate_policy() {
        let policy = AccessPolicy::with_predicate(|caller| caller.starts_with("svc:"));
        assert!(policy.is_authorized("svc:billing", &config(&[])));
        assert!(!policy.is_authorized("billing", &config(&[])));
        assert_eq!(format!("{policy:?}"), "AccessPolicy { privileged: \"custom\" }");
    }
}
