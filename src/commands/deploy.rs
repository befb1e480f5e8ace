// ABOUTME: Deploy command implementation.
// ABOUTME: Extracts the artifact, builds DeploymentInfo, and runs the orchestrator.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use stolos::config::Config;
use stolos::deploy::{BlueGreen, DeploymentInfo};
use stolos::error::{Error, Result};
use stolos::extractor::{Extractor, OsFileSystem};
use stolos::output::OutputMux;
use stolos::pusher::CfPusherFactory;

pub struct DeployArgs {
    pub environment: String,
    pub artifact: PathBuf,
    pub org: String,
    pub space: String,
    pub app: String,
    pub manifest: Option<PathBuf>,
}

/// Deploy one artifact to every foundation of the chosen environment.
pub async fn deploy(config: Config, args: DeployArgs) -> Result<()> {
    let environment = config.environment(&args.environment)?;

    let username = require_env("CF_USERNAME")?;
    let password = require_env("CF_PASSWORD")?;

    let manifest = match &args.manifest {
        Some(path) => std::fs::read_to_string(path)?,
        None => String::new(),
    };

    let uuid = uuid::Uuid::new_v4().to_string();
    let app_path = env::temp_dir().join(format!("stolos-{uuid}"));

    println!(
        "Deploying {} to {} foundation(s) in {}",
        args.app,
        environment.foundations.len(),
        environment.name
    );

    let extractor = Extractor::new(OsFileSystem);
    extractor.unzip(&args.artifact, &app_path, &manifest)?;

    let info = DeploymentInfo {
        artifact_url: args.artifact.display().to_string(),
        manifest,
        username,
        password,
        environment: environment.name.clone(),
        org: args.org,
        space: args.space,
        app_name: args.app,
        uuid,
        skip_ssl: environment.skip_ssl,
        instances: environment.instances,
        domain: environment.domain.clone().unwrap_or_default(),
        app_path: app_path.display().to_string(),
        ..Default::default()
    };

    let mut bluegreen = BlueGreen::new(Arc::new(CfPusherFactory::new()));
    if let Some(deadline) = config.push_timeout {
        bluegreen = bluegreen.with_deadline(deadline);
    }

    let out = OutputMux::new(std::io::stdout());
    bluegreen.push(environment, &app_path, &info, &out).await?;

    println!("Deployment of {} complete", info.app_name);
    Ok(())
}

fn require_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::MissingEnvVar(name.to_string()))
}
