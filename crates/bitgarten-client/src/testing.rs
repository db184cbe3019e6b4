//! Scripted in-memory transport.
//!
//! Enabled with the `test-util` feature so dependent crates can drive the
//! gateway without a server.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

/// One request as seen by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: Method,
    /// Path and query string.
    pub path: String,
    /// `Authorization` header value, empty when absent.
    pub authorization: String,
    /// `Accept` header value, empty when absent.
    pub accept: String,
    /// JSON body, if any.
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
enum Outcome {
    Respond(HttpResponse),
    Fail(String),
}

#[derive(Debug, Clone)]
struct Route {
    outcome: Outcome,
    delay: Option<Duration>,
}

/// Answers requests from a table keyed by method and path-with-query.
///
/// Unscripted requests get `501 Not Implemented`.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), Route>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    /// Creates a transport with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, method: Method, path: &str, route: Route) {
        self.routes.lock().insert((method, path.to_string()), route);
    }

    /// Answers `method path` with `response`, replacing any earlier route.
    pub fn on(&self, method: Method, path: &str, response: HttpResponse) {
        self.insert(
            method,
            path,
            Route {
                outcome: Outcome::Respond(response),
                delay: None,
            },
        );
    }

    /// Answers with a JSON body.
    pub fn on_json(&self, method: Method, path: &str, status: u16, body: &Value) {
        self.on(method, path, HttpResponse::json(status, body));
    }

    /// Answers after `delay` has elapsed.
    pub fn on_delayed(&self, method: Method, path: &str, response: HttpResponse, delay: Duration) {
        self.insert(
            method,
            path,
            Route {
                outcome: Outcome::Respond(response),
                delay: Some(delay),
            },
        );
    }

    /// Fails `method path` with a network error.
    pub fn fail(&self, method: Method, path: &str, message: &str) {
        self.insert(
            method,
            path,
            Route {
                outcome: Outcome::Fail(message.to_string()),
                delay: None,
            },
        );
    }

    /// All requests received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received for `path`, any method.
    #[must_use]
    pub fn count(&self, path: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.path == path).count()
    }

    /// Forgets recorded requests; routes are kept.
    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let path = request.path_and_query();
        self.requests.lock().push(RecordedRequest {
            method: request.method.clone(),
            path: path.clone(),
            authorization: request.header.authorization.clone(),
            accept: request.header.accept.clone(),
            body: request.body.clone(),
        });

        let route = self.routes.lock().get(&(request.method, path)).cloned();
        let Some(route) = route else {
            return Ok(HttpResponse::empty(501));
        };
        if let Some(delay) = route.delay {
            tokio::time::sleep(delay).await;
        }
        match route.outcome {
            Outcome::Respond(response) => Ok(response),
            Outcome::Fail(message) => Err(Error::network(message)),
        }
    }
}
