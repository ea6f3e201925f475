//! Sentinel Red Team - attack simulation against confirmed findings
//!
//! Takes persisted vulnerability verdicts and asks the reasoning backends
//! whether concrete attacks against them would succeed. Results are
//! read-only downstream artifacts; a simulation never mutates the verdict
//! or scan it targets.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::simulator::{AttackSimulationEngine, FindingContext};
pub use domain::{AttackResultRepository, AttackScenario, RedTeamError, scenarios_for};
pub use infrastructure::memory::InMemoryAttackResultRepository;
