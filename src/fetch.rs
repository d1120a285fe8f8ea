//! Network fetch gate: one outbound request behind a timeout, outcome classified.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::FetchFailure;

/// Raw HTTP response as seen by the gate.
#[derive(Debug, Clone)]
pub struct HttpResponse {
  pub status: u16,
  pub body: String,
}

/// Issues GET requests. Errors are transport-level descriptions.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn get(&self, url: &str) -> Result<HttpResponse, String>;
}

/// reqwest-backed transport
#[derive(Clone)]
pub struct ReqwestTransport {
  client: reqwest::Client,
}

impl ReqwestTransport {
  pub fn new() -> Result<Self> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("rickdex/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client })
  }
}

#[async_trait]
impl Transport for ReqwestTransport {
  async fn get(&self, url: &str) -> Result<HttpResponse, String> {
    let response = self.client.get(url).send().await.map_err(|e| e.to_string())?;
    let status = response.status().as_u16();
    let body = response.text().await.map_err(|e| e.to_string())?;
    Ok(HttpResponse { status, body })
  }
}

/// Wraps a transport with a timeout boundary and outcome classification.
#[derive(Clone)]
pub struct FetchGate {
  transport: Arc<dyn Transport>,
  timeout: Duration,
}

impl FetchGate {
  pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

  pub fn new(transport: Arc<dyn Transport>) -> Self {
    Self {
      transport,
      timeout: Self::DEFAULT_TIMEOUT,
    }
  }

  /// Set the timeout used by [`FetchGate::fetch`].
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn timeout(&self) -> Duration {
    self.timeout
  }

  /// Fetch with the gate's configured timeout.
  pub async fn fetch(&self, url: &str) -> Result<Value, FetchFailure> {
    self.fetch_with_timeout(url, self.timeout).await
  }

  pub async fn fetch_with_timeout(&self, url: &str, timeout: Duration) -> Result<Value, FetchFailure> {
    self.fetch_until(url, Instant::now() + timeout).await
  }

  /// Fetch, giving up at `deadline`. Several requests can share one deadline.
  ///
  /// On timeout the request future is dropped, which cancels it.
  pub async fn fetch_until(&self, url: &str, deadline: Instant) -> Result<Value, FetchFailure> {
    debug!(url, "Fetching");

    let response = match tokio::time::timeout_at(deadline, self.transport.get(url)).await {
      Ok(Ok(response)) => response,
      Ok(Err(e)) => {
        warn!(url, error = %e, "Request failed");
        return Err(FetchFailure::NetworkError(e));
      }
      Err(_) => {
        warn!(url, "Request timed out");
        return Err(FetchFailure::Timeout);
      }
    };

    classify(response)
  }
}

/// Turn a raw response into data or a classified failure.
fn classify(response: HttpResponse) -> Result<Value, FetchFailure> {
  let success = (200..300).contains(&response.status);

  let body: Value = match serde_json::from_str(&response.body) {
    Ok(body) => body,
    Err(e) if success => {
      return Err(FetchFailure::NetworkError(format!(
        "Invalid JSON in response: {}",
        e
      )))
    }
    Err(_) => return Err(FetchFailure::ApiError(format!("HTTP {}", response.status))),
  };

  // The API reports errors as {"error": "..."}
  if let Some(message) = body.get("error").and_then(Value::as_str) {
    return Err(FetchFailure::ApiError(message.to_string()));
  }

  if !success {
    return Err(FetchFailure::ApiError(format!("HTTP {}", response.status)));
  }

  Ok(body)
}

/// Scripted transport for tests.
#[cfg(test)]
pub(crate) mod mock {
  use super::*;
  use std::collections::HashMap;
  use std::sync::atomic::{AtomicBool, Ordering};
  use std::sync::Mutex;

  #[derive(Clone)]
  struct Route {
    delay: Duration,
    outcome: Result<HttpResponse, String>,
  }

  pub(crate) struct MockTransport {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<String>>,
    reachable: AtomicBool,
  }

  impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
      Arc::new(Self {
        routes: Mutex::new(HashMap::new()),
        calls: Mutex::new(Vec::new()),
        reachable: AtomicBool::new(true),
      })
    }

    fn route(&self, url: &str, delay: Duration, outcome: Result<HttpResponse, String>) {
      self
        .routes
        .lock()
        .unwrap()
        .insert(url.to_string(), Route { delay, outcome });
    }

    pub(crate) fn ok(&self, url: &str, body: Value) {
      self.ok_after(url, body, Duration::ZERO);
    }

    pub(crate) fn ok_after(&self, url: &str, body: Value, delay: Duration) {
      self.route(
        url,
        delay,
        Ok(HttpResponse {
          status: 200,
          body: body.to_string(),
        }),
      );
    }

    pub(crate) fn status(&self, url: &str, status: u16, body: &str) {
      self.route(
        url,
        Duration::ZERO,
        Ok(HttpResponse {
          status,
          body: body.to_string(),
        }),
      );
    }

    pub(crate) fn fail(&self, url: &str, error: &str) {
      self.route(url, Duration::ZERO, Err(error.to_string()));
    }

    /// Never answers within any sane deadline.
    pub(crate) fn hang(&self, url: &str) {
      self.route(url, Duration::from_secs(3600), Err("hung".to_string()));
    }

    /// When unreachable every request fails with a transport error.
    pub(crate) fn set_reachable(&self, reachable: bool) {
      self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
      self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self, url: &str) -> usize {
      self.calls().iter().filter(|c| c.as_str() == url).count()
    }
  }

  #[async_trait]
  impl Transport for MockTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, String> {
      self.calls.lock().unwrap().push(url.to_string());
      if !self.reachable.load(Ordering::SeqCst) {
        return Err("network unreachable".to_string());
      }
      let route = self.routes.lock().unwrap().get(url).cloned();
      match route {
        Some(route) => {
          if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
          }
          route.outcome
        }
        None => Err(format!("connection refused: {}", url)),
      }
    }
  }
}
