//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actor_controller::config::{RunContext, RunnerConfig};
use actor_controller::http::{ServerError, StandbyServer};
use actor_controller::lifecycle::{DrainOutcome, Shutdown};
use actor_controller::net::InFlightTracker;
use actor_controller::task::{TaskError, TaskErrorKind, TaskInput, TaskProcessor, TaskResult};
use async_trait::async_trait;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const TOKEN: &str = "T";

/// What a [`ScriptedProcessor`] does with each call.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Return the input as the payload.
    Echo,
    /// Return a fixed payload.
    Fixed(Value),
    /// Fail with the given kind, message and code.
    Fail(TaskErrorKind, &'static str, &'static str),
    /// Sleep without looking at the cancellation token, then echo.
    Sleep(Duration),
    /// Panic inside the processor.
    Panic,
}

/// Processor that records every input it receives.
pub struct ScriptedProcessor {
    behavior: Behavior,
    calls: AtomicUsize,
    inputs: Mutex<Vec<TaskInput>>,
}

impl ScriptedProcessor {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<TaskInput> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskProcessor for ScriptedProcessor {
    async fn process(&self, input: TaskInput, _cancel: CancellationToken) -> Result<TaskResult, TaskError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(input.clone());

        match &self.behavior {
            Behavior::Echo => Ok(TaskResult::new(Value::Object(input))),
            Behavior::Fixed(value) => Ok(TaskResult::new(value.clone())),
            Behavior::Fail(kind, message, code) => Err(TaskError::new(*kind, *message).with_code(*code)),
            Behavior::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(TaskResult::new(Value::Object(input)))
            }
            Behavior::Panic => panic!("processor exploded"),
        }
    }
}

/// Standby config with auth on, token [`TOKEN`] and short timeouts.
pub fn standby_config() -> RunnerConfig {
    let mut config = RunnerConfig::default();
    config.run.origin = Some("STANDBY".to_string());
    config.run.token = Some(TOKEN.to_string());
    config.timeouts.request_secs = 5;
    config.shutdown.grace_secs = 5;
    config
}

/// A standby server running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub in_flight: InFlightTracker,
    pub handle: JoinHandle<Result<DrainOutcome, ServerError>>,
}

impl TestServer {
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }

    /// Request shutdown and wait for the server to finish draining.
    pub async fn stop(self) -> DrainOutcome {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("server did not stop in time")
            .unwrap()
            .unwrap()
    }
}

pub async fn spawn_standby(processor: Arc<ScriptedProcessor>) -> TestServer {
    spawn_standby_with(processor, standby_config()).await
}

pub async fn spawn_standby_with(processor: Arc<ScriptedProcessor>, config: RunnerConfig) -> TestServer {
    let context = RunContext::from_config(&config).unwrap();
    let shutdown = Shutdown::new();
    let server = StandbyServer::new(&config, &context, processor, shutdown.clone()).unwrap();
    let in_flight = server.in_flight();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(server.run(listener));

    TestServer {
        addr,
        shutdown,
        in_flight,
        handle,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(15))
        .build()
        .unwrap()
}

/// Poll `condition` until it holds or a second passes.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
