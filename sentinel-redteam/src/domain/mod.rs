//! Red-team domain: attack scenarios and result persistence

use async_trait::async_trait;
use uuid::Uuid;

use sentinel_core::domain::{AttackSimulationResult, VulnerabilityType};

/// One named attack pattern applicable to a vulnerability class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackScenario {
    pub name: &'static str,
    pub description: &'static str,
}

/// Attack scenarios applicable to a vulnerability class.
///
/// IDOR findings reuse the BOLA catalogue; the exploitation path is the
/// same object-reference manipulation.
pub fn scenarios_for(vulnerability_type: VulnerabilityType) -> &'static [AttackScenario] {
    match vulnerability_type {
        VulnerabilityType::Bola | VulnerabilityType::Idor => &[
            AttackScenario {
                name: "IDOR User Enumeration",
                description: "Iterate sequential object identifiers in the request path to read other users' records.",
            },
            AttackScenario {
                name: "Horizontal Privilege Escalation",
                description: "Replay an authenticated request substituting another user's object identifier.",
            },
            AttackScenario {
                name: "Object Reference Manipulation",
                description: "Tamper with object references in the body or query string to reach unowned resources.",
            },
        ],
        VulnerabilityType::PrivilegeEscalation => &[
            AttackScenario {
                name: "Vertical Privilege Escalation",
                description: "Invoke the privileged operation with an ordinary user's credentials.",
            },
            AttackScenario {
                name: "Role Bypass",
                description: "Submit forged or client-supplied role claims to satisfy the role check.",
            },
            AttackScenario {
                name: "Token Manipulation",
                description: "Modify token scopes or reuse a stale token to retain elevated access.",
            },
        ],
        VulnerabilityType::Other => &[
            AttackScenario {
                name: "Unauthenticated Probe",
                description: "Call the endpoint without credentials and inspect what it returns.",
            },
            AttackScenario {
                name: "Parameter Fuzzing",
                description: "Mutate request parameters looking for authorization checks that depend on client input.",
            },
        ],
    }
}

/// Red-team persistence failure
#[derive(Debug, thiserror::Error)]
pub enum RedTeamError {
    #[error("Attack result storage error: {0}")]
    Storage(String),
}

/// Storage for simulated attack results.
///
/// Keyed by `(finding_ref, attack_name, model_source)`: re-running a scope
/// overwrites its own results while different source models stack.
#[async_trait]
pub trait AttackResultRepository: Send + Sync {
    async fn upsert(&self, result: AttackSimulationResult) -> Result<(), RedTeamError>;

    /// All results for a repository, newest first
    async fn list_for_repo(&self, repo_id: &str)
    -> Result<Vec<AttackSimulationResult>, RedTeamError>;

    /// Results targeting one finding
    async fn list_for_finding(
        &self,
        finding_ref: Uuid,
    ) -> Result<Vec<AttackSimulationResult>, RedTeamError>;

    /// Count of successful simulated attacks for a repository
    async fn successful_count(&self, repo_id: &str) -> Result<usize, RedTeamError>;

    /// Drop all results for a repository
    async fn reset(&self, repo_id: &str) -> Result<(), RedTeamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idor_reuses_the_bola_catalogue() {
        assert_eq!(
            scenarios_for(VulnerabilityType::Idor),
            scenarios_for(VulnerabilityType::Bola)
        );
    }

    #[test]
    fn every_class_has_scenarios() {
        for ty in [
            VulnerabilityType::Bola,
            VulnerabilityType::Idor,
            VulnerabilityType::PrivilegeEscalation,
            VulnerabilityType::Other,
        ] {
            assert!(!scenarios_for(ty).is_empty());
        }
    }
}
