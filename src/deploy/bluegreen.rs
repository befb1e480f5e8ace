// ABOUTME: The blue/green orchestrator - drives every foundation through
// ABOUTME: login, exists, push, and rollback-or-finish with strict barriers.

use futures::future::join_all;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Environment;
use crate::output::OutputMux;
use crate::pusher::{Pusher, PusherError, PusherFactory};

use super::error::{DeployError, PhaseErrors};
use super::info::DeploymentInfo;

/// Coordinates a blue/green deployment across all foundations of an
/// environment.
///
/// Each phase fans out to every worker and joins before the next phase
/// starts. A deployment succeeds only when every foundation completes both
/// push and finish-push; any push failure rolls every foundation back.
pub struct BlueGreen {
    factory: Arc<dyn PusherFactory>,
    deadline: Option<Duration>,
}

impl BlueGreen {
    pub fn new(factory: Arc<dyn PusherFactory>) -> Self {
        Self {
            factory,
            deadline: None,
        }
    }

    /// Bound every worker call. A triggered deadline cancels the in-flight
    /// call and aggregates as a timeout error in whatever phase was active.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deploy the extracted artifact at `app_path` to every foundation of
    /// `env`, forwarding worker output to `out`.
    ///
    /// Workers are released on every exit path; they live only for the
    /// duration of this call.
    pub async fn push(
        &self,
        env: &Environment,
        app_path: &Path,
        info: &DeploymentInfo,
        out: &OutputMux,
    ) -> Result<(), DeployError> {
        tracing::info!(
            environment = %env.name,
            app = %info.app_name,
            uuid = %info.uuid,
            foundations = env.foundations.len(),
            "starting blue green deployment"
        );

        // Create one worker per foundation, in order. A factory failure
        // aborts before any worker is invoked.
        let mut pushers: Vec<Box<dyn Pusher>> = Vec::with_capacity(env.foundations.len());
        for foundation_url in &env.foundations {
            let pusher = self
                .factory
                .create_pusher(foundation_url, out.handle())
                .await
                .map_err(DeployError::Factory)?;
            pushers.push(pusher);
        }

        // Login barrier.
        let results = join_all(pushers.iter_mut().zip(&env.foundations).map(
            |(pusher, foundation_url)| {
                let mut handle = out.handle();
                async move {
                    self.bounded(pusher.login(foundation_url, info, &mut handle))
                        .await
                }
            },
        ))
        .await;
        let errors = PhaseErrors::collect(&env.foundations, results);
        if !errors.is_empty() {
            return Err(DeployError::Login(errors));
        }
        tracing::debug!("logged in to every foundation");

        // Exists check on every worker. The recorded flags drive the
        // first-deploy rollback policy; a worker that cannot tell reports
        // "does not exist" and the deployment continues.
        let existed: Vec<bool> = join_all(
            pushers
                .iter_mut()
                .map(|pusher| self.bounded_exists(pusher.exists(&info.app_name))),
        )
        .await;

        // Push barrier.
        let results = join_all(pushers.iter_mut().map(|pusher| {
            let mut handle = out.handle();
            async move {
                self.bounded(pusher.push(app_path, info, &mut handle))
                    .await
            }
        }))
        .await;
        let push_errors = PhaseErrors::collect(&env.foundations, results);

        if !push_errors.is_empty() {
            return Err(self.rollback_all(env, info, &mut pushers, &existed, push_errors).await);
        }

        // Finish-push barrier: retire the venerable release everywhere.
        let results =
            join_all(pushers.iter_mut().map(|pusher| self.bounded(pusher.finish_push(info))))
                .await;
        let errors = PhaseErrors::collect(&env.foundations, results);
        if !errors.is_empty() {
            for err in errors.iter() {
                tracing::error!(foundation = %err.foundation, "finish push error: {}", err.error);
            }
            return Err(DeployError::FinishPush(errors));
        }

        tracing::info!(environment = %env.name, app = %info.app_name, "deployment successful");
        Ok(())
    }

    /// Roll back every worker, including those whose push succeeded, and
    /// fold the outcomes into the returned error.
    async fn rollback_all(
        &self,
        env: &Environment,
        info: &DeploymentInfo,
        pushers: &mut [Box<dyn Pusher>],
        existed: &[bool],
        push_errors: PhaseErrors,
    ) -> DeployError {
        let results =
            join_all(pushers.iter_mut().map(|pusher| self.bounded(pusher.rollback(info)))).await;
        let rollback_errors = PhaseErrors::collect(&env.foundations, results);

        for err in rollback_errors.iter() {
            tracing::error!(foundation = %err.foundation, "rollback error: {}", err.error);
        }

        // A failed first deploy claims no rollback guarantee: the workers
        // were still told to clean up, but only the push errors surface.
        if is_first_deploy(existed) {
            return DeployError::Push(push_errors);
        }

        if rollback_errors.is_empty() {
            DeployError::Push(push_errors)
        } else {
            DeployError::Rollback {
                push: push_errors,
                rollback: rollback_errors,
            }
        }
    }

    async fn bounded<F>(&self, call: F) -> Result<(), PusherError>
    where
        F: Future<Output = Result<(), PusherError>>,
    {
        match self.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, call).await {
                Ok(result) => result,
                Err(_) => Err(PusherError::TimedOut(deadline)),
            },
            None => call.await,
        }
    }

    async fn bounded_exists<F>(&self, call: F) -> bool
    where
        F: Future<Output = bool>,
    {
        match self.deadline {
            // A timed-out existence check means "does not exist".
            Some(deadline) => tokio::time::timeout(deadline, call).await.unwrap_or(false),
            None => call.await,
        }
    }
}

/// True when no foundation had the app before this deployment.
///
/// On a first deploy everywhere, rollback outcomes are suppressed from the
/// returned error: there is no previous release to restore, so the
/// deployment must not claim a rollback it cannot provide.
fn is_first_deploy(existed: &[bool]) -> bool {
    existed.iter().all(|existed| !existed)
}
