// ABOUTME: Blue/green deployment orchestration across foundations.
// ABOUTME: Exports the orchestrator, deployment info, and phase-typed errors.

mod bluegreen;
mod error;
mod info;

pub use bluegreen::BlueGreen;
pub use error::{DeployError, FoundationError, PhaseErrors};
pub use info::DeploymentInfo;
