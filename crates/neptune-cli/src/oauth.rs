//! Local HTTP listener that receives the OAuth redirect after browser login.
//!
//! The listener runs on its own thread with a private tokio runtime so the
//! rest of the CLI can keep using the blocking HTTP client.

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Router,
};
use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::oneshot;

/// How long to wait for the browser to come back.
pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(300);

type TokenSlot = Arc<Mutex<Option<oneshot::Sender<String>>>>;

pub struct CallbackServer {
    pub port: u16,
    handle: JoinHandle<Option<String>>,
}

impl CallbackServer {
    /// Bind `127.0.0.1` on a free port and start serving `/callback`.
    pub fn start(timeout: Duration) -> anyhow::Result<Self> {
        let (port_tx, port_rx) = mpsc::channel::<std::io::Result<u16>>();

        let handle = std::thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = port_tx.send(Err(e));
                    return None;
                }
            };
            rt.block_on(serve(port_tx, timeout))
        });

        let port = port_rx
            .recv()
            .map_err(|_| anyhow::anyhow!("login callback server exited before binding"))??;
        Ok(CallbackServer { port, handle })
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/callback", self.port)
    }

    pub fn login_url(&self, api_base_url: &str) -> String {
        format!(
            "{}/auth/login?redirect_uri={}",
            api_base_url.trim_end_matches('/'),
            encode_query_value(&self.redirect_uri())
        )
    }

    /// Block until a token arrives or the timeout passes.
    pub fn wait(self) -> Option<String> {
        self.handle.join().ok().flatten()
    }
}

async fn serve(port_tx: mpsc::Sender<std::io::Result<u16>>, timeout: Duration) -> Option<String> {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:0").await {
        Ok(l) => l,
        Err(e) => {
            let _ = port_tx.send(Err(e));
            return None;
        }
    };
    let port = match listener.local_addr() {
        Ok(addr) => addr.port(),
        Err(e) => {
            let _ = port_tx.send(Err(e));
            return None;
        }
    };
    let _ = port_tx.send(Ok(port));
    tracing::debug!(port, "login callback listening");

    let (token_tx, token_rx) = oneshot::channel::<String>();
    let app = router(Arc::new(Mutex::new(Some(token_tx))));

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await;
    });

    let token = tokio::time::timeout(timeout, token_rx).await.ok().and_then(Result::ok);
    let _ = stop_tx.send(());
    let _ = server.await;
    token
}

fn router(slot: TokenSlot) -> Router {
    Router::new()
        .route("/callback", get(callback))
        .with_state(slot)
}

async fn callback(
    State(slot): State<TokenSlot>,
    Query(params): Query<HashMap<String, String>>,
) -> Html<&'static str> {
    let token = params
        .get("token")
        .or_else(|| params.get("access_token"))
        .filter(|t| !t.is_empty());
    let Some(token) = token else {
        return Html("<h1>Login failed</h1><p>No access token was provided.</p>");
    };
    let sender = slot.lock().ok().and_then(|mut s| s.take());
    if let Some(tx) = sender {
        let _ = tx.send(token.clone());
    }
    Html("<h1>Login successful</h1><p>You can close this window and return to the terminal.</p>")
}

/// Percent-encode everything outside the unreserved set.
fn encode_query_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
