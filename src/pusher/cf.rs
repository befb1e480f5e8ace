// ABOUTME: Cloud Foundry pusher driving the cf CLI through a Courier.
// ABOUTME: Implements the venerable rename dance for blue/green pushes.

use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::courier::Courier;
use super::{Pusher, PusherError, PusherFactory};
use crate::deploy::DeploymentInfo;
use crate::output::OutputHandle;

/// Name under which the previous release is parked during a push.
fn venerable_name(app_name: &str) -> String {
    format!("{app_name}-venerable")
}

/// Deploys to one Cloud Foundry foundation via the cf CLI.
pub struct CfPusher {
    courier: Courier,
    out: OutputHandle,
    app_existed: bool,
}

impl CfPusher {
    pub fn new(courier: Courier, out: OutputHandle) -> Self {
        Self {
            courier,
            out,
            app_existed: false,
        }
    }
}

#[async_trait]
impl Pusher for CfPusher {
    async fn login(
        &mut self,
        foundation_url: &str,
        info: &DeploymentInfo,
        out: &mut OutputHandle,
    ) -> Result<(), PusherError> {
        tracing::debug!(foundation = foundation_url, "logging in");

        let mut args = vec![
            "login",
            "-a",
            foundation_url,
            "-u",
            info.username.as_str(),
            "-p",
            info.password.as_str(),
            "-o",
            info.org.as_str(),
            "-s",
            info.space.as_str(),
        ];
        if info.skip_ssl {
            args.push("--skip-ssl-validation");
        }

        self.courier.run(&args, out).await
    }

    async fn exists(&mut self, app_name: &str) -> bool {
        // A failed lookup means "does not exist"; the caller never sees the
        // error.
        self.app_existed = self.courier.run_quiet(&["app", app_name]).await.is_ok();
        self.app_existed
    }

    async fn push(
        &mut self,
        app_path: &Path,
        info: &DeploymentInfo,
        out: &mut OutputHandle,
    ) -> Result<(), PusherError> {
        let venerable = venerable_name(&info.app_name);

        if self.app_existed {
            tracing::debug!(app = %info.app_name, "renaming live app to {venerable}");
            self.courier
                .run_quiet(&["rename", &info.app_name, &venerable])
                .await?;
        }

        self.courier
            .set_working_dir(app_path.to_path_buf());

        let instances = info.instances.to_string();
        self.courier
            .run(&["push", &info.app_name, "-i", &instances], out)
            .await?;

        if info.has_environment_variables() {
            for (name, value) in &info.environment_variables {
                self.courier
                    .run_quiet(&["set-env", &info.app_name, name, value])
                    .await?;
            }
            self.courier.run(&["restage", &info.app_name], out).await?;
        }

        if !info.domain.is_empty() {
            self.courier
                .run(
                    &["map-route", &info.app_name, &info.domain, "-n", &info.app_name],
                    out,
                )
                .await?;
        }

        Ok(())
    }

    async fn rollback(&mut self, info: &DeploymentInfo) -> Result<(), PusherError> {
        let _ = writeln!(self.out, "rolling back deploy of {}", info.app_name);

        self.courier
            .run_quiet(&["delete", &info.app_name, "-f"])
            .await?;

        if self.app_existed {
            let venerable = venerable_name(&info.app_name);
            self.courier
                .run_quiet(&["rename", &venerable, &info.app_name])
                .await?;
        }

        Ok(())
    }

    async fn finish_push(&mut self, info: &DeploymentInfo) -> Result<(), PusherError> {
        if !self.app_existed {
            return Ok(());
        }

        let venerable = venerable_name(&info.app_name);
        let _ = writeln!(self.out, "deleting {venerable}");

        self.courier.run_quiet(&["delete", &venerable, "-f"]).await?;
        Ok(())
    }
}

/// Creates one [`CfPusher`] per foundation, each with its own CF_HOME.
pub struct CfPusherFactory {
    binary: PathBuf,
    scratch_dir: PathBuf,
}

impl CfPusherFactory {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("cf"),
            scratch_dir: std::env::temp_dir().join("stolos"),
        }
    }

    /// Use a specific cf binary instead of resolving `cf` from PATH.
    pub fn with_binary(mut self, binary: PathBuf) -> Self {
        self.binary = binary;
        self
    }
}

impl Default for CfPusherFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PusherFactory for CfPusherFactory {
    async fn create_pusher(
        &self,
        foundation_url: &str,
        out: OutputHandle,
    ) -> Result<Box<dyn Pusher>, PusherError> {
        let cf_home = self
            .scratch_dir
            .join(format!("cf-home-{}", uuid::Uuid::new_v4()));

        tracing::debug!(foundation = foundation_url, cf_home = %cf_home.display(), "creating pusher");

        tokio::fs::create_dir_all(&cf_home)
            .await
            .map_err(PusherError::Workspace)?;

        let courier = Courier::new(self.binary.clone(), cf_home);
        Ok(Box::new(CfPusher::new(courier, out)))
    }
}
