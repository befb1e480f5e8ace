// ABOUTME: Capability traits for per-foundation deployment workers.
// ABOUTME: Defines Pusher, PusherFactory, and the worker error type.

mod cf;
mod courier;

pub use cf::{CfPusher, CfPusherFactory};
pub use courier::Courier;

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::deploy::DeploymentInfo;
use crate::output::OutputHandle;

/// A stateful worker that deploys to exactly one foundation.
///
/// The orchestrator drives a pusher through `login`, `exists`, `push`, and
/// then exactly one of `rollback` or `finish_push`. A pusher belongs to a
/// single deployment and is dropped when that deployment ends.
#[async_trait]
pub trait Pusher: Send {
    /// Authenticate against the foundation, streaming human-readable output
    /// to `out`.
    async fn login(
        &mut self,
        foundation_url: &str,
        info: &DeploymentInfo,
        out: &mut OutputHandle,
    ) -> Result<(), PusherError>;

    /// Record whether `app_name` already exists on the foundation.
    ///
    /// The result determines whether a later rollback has a previous version
    /// to restore. A worker that cannot determine existence reports `false`.
    async fn exists(&mut self, app_name: &str) -> bool;

    /// Deploy the extracted artifact at `app_path`, streaming output to `out`.
    /// Failure is recoverable via `rollback`.
    async fn push(
        &mut self,
        app_path: &Path,
        info: &DeploymentInfo,
        out: &mut OutputHandle,
    ) -> Result<(), PusherError>;

    /// Restore the foundation to its pre-push state, using the existence flag
    /// recorded by `exists`.
    async fn rollback(&mut self, info: &DeploymentInfo) -> Result<(), PusherError>;

    /// Finalize the deployment by retiring the venerable version.
    async fn finish_push(&mut self, info: &DeploymentInfo) -> Result<(), PusherError>;
}

/// Creates one [`Pusher`] per foundation at the start of a deployment.
///
/// Errors here are fatal for the whole deployment: no workers are invoked.
#[async_trait]
pub trait PusherFactory: Send + Sync {
    async fn create_pusher(
        &self,
        foundation_url: &str,
        out: OutputHandle,
    ) -> Result<Box<dyn Pusher>, PusherError>;
}

/// Errors from worker operations.
#[derive(Debug, thiserror::Error)]
pub enum PusherError {
    /// The CLI binary could not be started.
    #[error("cannot spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The CLI ran and reported failure.
    #[error("{0}")]
    CommandFailed(String),

    /// Forwarding CLI output to the response stream failed.
    #[error("cannot stream command output: {0}")]
    Output(#[source] std::io::Error),

    /// Preparing the worker's scratch space failed.
    #[error("cannot prepare CF_HOME: {0}")]
    Workspace(#[source] std::io::Error),

    /// A per-call deadline elapsed before the foundation answered.
    #[error("operation timed out after {0:?}")]
    TimedOut(Duration),
}
