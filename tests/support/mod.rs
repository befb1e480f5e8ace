// ABOUTME: Shared test doubles for orchestrator tests.
// ABOUTME: Scripted pushers and factories recording every call they receive.

use async_trait::async_trait;
use nonempty::NonEmpty;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stolos::config::Environment;
use stolos::deploy::DeploymentInfo;
use stolos::output::OutputHandle;
use stolos::pusher::{Pusher, PusherError, PusherFactory};

/// Everything one scripted pusher was asked to do.
#[derive(Debug, Default)]
pub struct CallLog {
    pub logins: Vec<(String, DeploymentInfo)>,
    pub exists: Vec<String>,
    pub pushes: Vec<(PathBuf, DeploymentInfo)>,
    pub rollbacks: Vec<DeploymentInfo>,
    pub finish_pushes: Vec<DeploymentInfo>,
}

/// A pusher whose outcomes are scripted up front.
pub struct ScriptedPusher {
    pub log: Arc<Mutex<CallLog>>,
    pub app_exists: bool,
    pub login_output: String,
    pub push_output: String,
    pub login_error: Option<String>,
    pub push_error: Option<String>,
    pub push_delay: Option<Duration>,
    pub rollback_error: Option<String>,
    pub finish_push_error: Option<String>,
}

impl ScriptedPusher {
    /// A pusher that succeeds at everything, plus a handle on its call log.
    pub fn healthy() -> (Self, Arc<Mutex<CallLog>>) {
        let log = Arc::new(Mutex::new(CallLog::default()));
        let pusher = Self {
            log: Arc::clone(&log),
            app_exists: false,
            login_output: String::new(),
            push_output: String::new(),
            login_error: None,
            push_error: None,
            push_delay: None,
            rollback_error: None,
            finish_push_error: None,
        };
        (pusher, log)
    }
}

fn scripted(outcome: &Option<String>) -> Result<(), PusherError> {
    match outcome {
        Some(message) => Err(PusherError::CommandFailed(message.clone())),
        None => Ok(()),
    }
}

#[async_trait]
impl Pusher for ScriptedPusher {
    async fn login(
        &mut self,
        foundation_url: &str,
        info: &DeploymentInfo,
        out: &mut OutputHandle,
    ) -> Result<(), PusherError> {
        self.log
            .lock()
            .unwrap()
            .logins
            .push((foundation_url.to_string(), info.clone()));
        if !self.login_output.is_empty() {
            out.write_all(self.login_output.as_bytes()).unwrap();
        }
        scripted(&self.login_error)
    }

    async fn exists(&mut self, app_name: &str) -> bool {
        self.log.lock().unwrap().exists.push(app_name.to_string());
        self.app_exists
    }

    async fn push(
        &mut self,
        app_path: &Path,
        info: &DeploymentInfo,
        out: &mut OutputHandle,
    ) -> Result<(), PusherError> {
        self.log
            .lock()
            .unwrap()
            .pushes
            .push((app_path.to_path_buf(), info.clone()));
        if let Some(delay) = self.push_delay {
            tokio::time::sleep(delay).await;
        }
        if !self.push_output.is_empty() {
            out.write_all(self.push_output.as_bytes()).unwrap();
        }
        scripted(&self.push_error)
    }

    async fn rollback(&mut self, info: &DeploymentInfo) -> Result<(), PusherError> {
        self.log.lock().unwrap().rollbacks.push(info.clone());
        scripted(&self.rollback_error)
    }

    async fn finish_push(&mut self, info: &DeploymentInfo) -> Result<(), PusherError> {
        self.log.lock().unwrap().finish_pushes.push(info.clone());
        scripted(&self.finish_push_error)
    }
}

/// What the factory hands out for each successive foundation.
pub enum FactoryScript {
    Pusher(ScriptedPusher),
    Error(String),
}

/// Factory returning pre-built pushers in foundation order.
pub struct ScriptedFactory {
    script: Mutex<VecDeque<FactoryScript>>,
}

impl ScriptedFactory {
    pub fn new(script: Vec<FactoryScript>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
        }
    }
}

#[async_trait]
impl PusherFactory for ScriptedFactory {
    async fn create_pusher(
        &self,
        _foundation_url: &str,
        _out: OutputHandle,
    ) -> Result<Box<dyn Pusher>, PusherError> {
        match self.script.lock().unwrap().pop_front() {
            Some(FactoryScript::Pusher(pusher)) => Ok(Box::new(pusher)),
            Some(FactoryScript::Error(message)) => Err(PusherError::CommandFailed(message)),
            None => panic!("factory called more times than scripted"),
        }
    }
}

/// Clonable in-memory sink for response and log capture.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedBuffer {
    type Writer = SharedBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Capture tracing output for the duration of the returned guard.
pub fn capture_logs() -> (SharedBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}

/// An environment whose foundations are the given URLs, in order.
pub fn environment(foundations: &[&str]) -> Environment {
    Environment {
        name: "test".to_string(),
        foundations: NonEmpty::from_vec(foundations.iter().map(|f| f.to_string()).collect())
            .expect("at least one foundation"),
        skip_ssl: false,
        instances: 1,
        domain: None,
    }
}
