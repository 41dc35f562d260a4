//! Backend API client
//!
//! Async access to the dashboard proxy endpoints, plus the coordination
//! pieces the view layer needs: last-request-wins fetch supersession and a
//! polling timer that cannot outlive its view.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, span, trace, warn, Level};

use crate::core::{MapError, RawConnections, RawGraph};
use crate::graph::{Scene, ScenePipeline};

/// HTTP client for the dashboard's backend proxy
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the given base URL (scheme + host, no trailing path)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Create a client reusing an existing `reqwest::Client`
    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Fetch the full dependency map for one system
    ///
    /// An empty `{nodes: [], edges: []}` body is a valid empty graph. A
    /// payload with a populated `error` field is returned as-is; the caller
    /// decides whether partial data is worth rendering.
    pub async fn fetch_dependency_map(
        &self,
        system: &str,
        max_nodes: Option<u32>,
    ) -> Result<RawGraph, MapError> {
        let fetch_span = span!(Level::INFO, "fetch_dependency_map", system);
        let _enter = fetch_span.enter();

        let mut request = self
            .http
            .get(self.url("/api/proxy/dependency-map/full"))
            .query(&[("systemName", system)]);
        if let Some(max) = max_nodes {
            request = request.query(&[("max_nodes", max.to_string())]);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(MapError::transport(
                Some(status.as_u16()),
                format!("dependency-map fetch returned {}", status),
            ));
        }

        let body = response.text().await.map_err(transport_error)?;
        let raw: RawGraph = serde_json::from_str(&body)?;
        if let Some(error) = &raw.error {
            warn!(error = %error, "Backend reported a degraded dependency map");
        }
        debug!(
            nodes = raw.nodes.len(),
            edges = raw.edges.len(),
            "Dependency map fetched"
        );
        Ok(raw)
    }

    /// Fetch inbound/outbound connections for one resource (drill-in flow)
    pub async fn fetch_connections(
        &self,
        resource_id: &str,
    ) -> Result<RawConnections, MapError> {
        let fetch_span = span!(Level::INFO, "fetch_connections", resource_id);
        let _enter = fetch_span.enter();

        let url = self.url(&format!(
            "/api/proxy/resource-view/{}/connections",
            resource_id
        ));
        let response = self.http.get(url).send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(MapError::transport(
                Some(status.as_u16()),
                format!("connections fetch returned {}", status),
            ));
        }
        let body = response.text().await.map_err(transport_error)?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn transport_error(e: reqwest::Error) -> MapError {
    MapError::transport(e.status().map(|s| s.as_u16()), e.to_string())
}

struct CoordinatorState {
    generation: u64,
    scene: Option<Scene>,
}

/// Last-request-wins fetch supersession
///
/// Each `begin` aborts the in-flight fetch task and bumps a generation
/// counter; a fetch that completes anyway installs its scene only if its
/// generation is still current. A superseded fetch is therefore a true
/// no-op: it can neither overwrite a newer snapshot nor partially update
/// state.
pub struct FetchCoordinator {
    state: Arc<Mutex<CoordinatorState>>,
    pipeline: Arc<ScenePipeline>,
    task: Option<JoinHandle<()>>,
}

impl FetchCoordinator {
    pub fn new() -> Self {
        Self::with_pipeline(ScenePipeline::new())
    }

    pub fn with_pipeline(pipeline: ScenePipeline) -> Self {
        Self {
            state: Arc::new(Mutex::new(CoordinatorState {
                generation: 0,
                scene: None,
            })),
            pipeline: Arc::new(pipeline),
            task: None,
        }
    }

    /// Start a fetch, superseding any fetch still in flight
    pub fn begin<F>(&mut self, fetch: F)
    where
        F: Future<Output = Result<RawGraph, MapError>> + Send + 'static,
    {
        if let Some(task) = self.task.take() {
            trace!("Aborting superseded fetch task");
            task.abort();
        }
        let generation = {
            let mut state = self.state.lock().expect("coordinator state poisoned");
            state.generation += 1;
            state.generation
        };

        let state = Arc::clone(&self.state);
        let pipeline = Arc::clone(&self.pipeline);
        self.task = Some(tokio::spawn(async move {
            match fetch.await {
                Ok(raw) => {
                    let scene = pipeline.build(&raw);
                    let mut state = state.lock().expect("coordinator state poisoned");
                    if state.generation == generation {
                        state.scene = Some(scene);
                    } else {
                        debug!(generation, "Discarding stale fetch result");
                    }
                }
                Err(error) => {
                    // Last-known-good scene stays in place on failure
                    warn!(error = %error, "Fetch failed");
                }
            }
        }));
    }

    /// The most recently installed scene, if any
    pub fn latest(&self) -> Option<Scene> {
        self.state
            .lock()
            .expect("coordinator state poisoned")
            .scene
            .clone()
    }

    /// Wait for the current fetch task to finish or be aborted
    pub async fn settle(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Default for FetchCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FetchCoordinator {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Fixed-interval refresh timer
///
/// The spawned task is aborted on `stop()` and on drop, so a disposed view
/// never leaks a timer that re-triggers fetches against it.
pub struct Poller {
    task: JoinHandle<()>,
}

impl Poller {
    /// Spawn a timer calling `tick` once per period
    ///
    /// The first tick fires immediately, serving as the initial fetch.
    pub fn spawn<F>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tick();
            }
        });
        Self { task }
    }

    /// Cancel the timer
    pub fn stop(&self) {
        self.task.abort();
    }

    /// Returns true once the timer task has fully terminated
    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.task.abort();
    }
}
