//! Stored engine configuration record

use super::id::EngineId;
use serde::{Deserialize, Serialize};

/// Configuration persisted under `config/<id>`
///
/// Field names on the wire match the records written by existing
/// deployments (`Id`, `AllowedSubjects`, `Issuer`, `Audience`, `TTL`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine this record belongs to
    #[serde(rename = "Id")]
    pub id: EngineId,

    /// Identities allowed to read the engine
    #[serde(rename = "AllowedSubjects", default)]
    pub allowed_subjects: Vec<String>,

    /// `iss` claim of issued tokens
    #[serde(rename = "Issuer")]
    pub issuer: String,

    /// `aud` claim of issued tokens
    #[serde(rename = "Audience")]
    pub audience: String,

    /// Token lifetime in seconds
    #[serde(rename = "TTL")]
    pub ttl: u64,
}

impl EngineConfig {
    /// Exact, case-sensitive membership in the allow list
    pub fn allows(&self, subject: &str) -> bool {
        self.allowed_subjects.iter().any(|s| s == subject)
    }
}
