//! Test utilities: an in-process mock of the Vitodata SOAP endpoint.
//!
//! [`MockVitodata`] serves scripted responses per SOAP action and records
//! every request it receives, so tests can drive a real [`Session`] over
//! HTTP without the production server.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use parking_lot::Mutex;
use tokio::net::TcpListener;

use crate::{Result, Session};

/// Wrap an action response payload in the SOAP response envelope, the way
/// the production server does.
pub fn soap_response(payload: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <soap:Envelope xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\" \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
         xmlns:xsd=\"http://www.w3.org/2001/XMLSchema\">\
         <soap:Body>{payload}</soap:Body></soap:Envelope>"
    )
}

/// One request as seen by the mock server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Action name, without the namespace prefix.
    pub action: String,
    /// Raw request body.
    pub body: String,
    /// Cookie header values sent by the client.
    pub cookies: Vec<String>,
}

#[derive(Debug)]
struct QueuedResponse {
    status: StatusCode,
    body: String,
}

#[derive(Debug, Default)]
struct MockState {
    responses: HashMap<String, VecDeque<QueuedResponse>>,
    requests: Vec<RecordedRequest>,
    set_cookies: Vec<String>,
}

/// A scripted Vitodata server that shuts down when dropped.
pub struct MockVitodata {
    pub addr: SocketAddr,
    state: Arc<Mutex<MockState>>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl MockVitodata {
    /// Bind to an ephemeral port and start serving.
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = Arc::new(Mutex::new(MockState::default()));
        let router = Router::new()
            .route("/", post(handle_soap))
            .with_state(state.clone());

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give the server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        Ok(Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// A session pointed at this mock.
    pub fn session(&self) -> Result<Session> {
        Session::with_endpoint(&self.url())
    }

    /// Queue a successful response for `action`. The payload is the inner
    /// `<XxxResponse>` element; the SOAP envelope is added automatically.
    pub fn respond(&self, action: &str, payload: &str) {
        self.respond_raw(action, StatusCode::OK, &soap_response(payload));
    }

    /// Queue a raw response body with an arbitrary HTTP status.
    pub fn respond_raw(&self, action: &str, status: StatusCode, body: &str) {
        self.state
            .lock()
            .responses
            .entry(action.to_string())
            .or_default()
            .push_back(QueuedResponse {
                status,
                body: body.to_string(),
            });
    }

    /// Cookies to send with every response from now on.
    pub fn set_cookies(&self, cookies: &[&str]) {
        self.state.lock().set_cookies = cookies.iter().map(|c| c.to_string()).collect();
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// Number of requests received for `action`.
    pub fn request_count(&self, action: &str) -> usize {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| r.action == action)
            .count()
    }

    /// Shut the server down gracefully.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for MockVitodata {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn handle_soap(
    State(state): State<Arc<Mutex<MockState>>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    // "http://.../vii/GetData" -> "GetData"
    let action = headers
        .get("SOAPAction")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.rsplit('/').next().unwrap_or(v).to_string())
        .unwrap_or_default();

    let cookies = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect();

    let (queued, set_cookies) = {
        let mut state = state.lock();
        state.requests.push(RecordedRequest {
            action: action.clone(),
            body,
            cookies,
        });
        let queued = state
            .responses
            .get_mut(&action)
            .and_then(VecDeque::pop_front);
        (queued, state.set_cookies.clone())
    };

    let Some(queued) = queued else {
        let mut response = Response::new(Body::from(format!(
            "no scripted response for action `{action}'"
        )));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        return response;
    };

    let mut response = Response::new(Body::from(queued.body));
    *response.status_mut() = queued.status;
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/xml; charset=utf-8"),
    );
    for cookie in set_cookies {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            headers.append(SET_COOKIE, value);
        }
    }
    response
}
