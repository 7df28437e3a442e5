//! Out-of-band HTTP trigger.
//!
//! `/action` (any method) pushes its raw body to the extension as an echo message,
//! through the same [`Sender`] the stdio loop uses. Everything else answers
//! with a fixed acknowledgement.

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{debug, error, info, instrument};

use crate::error::NmError;
use crate::host::Sender;
use crate::message::OutgoingMessage;

/// Body returned by the home route.
pub const HOME_BODY: &str = "Home Endpoint hit";

#[derive(Clone)]
struct ServerState {
    sender: Sender,
}

/// Build the router. Unmatched paths behave like `/`.
pub fn router(sender: Sender) -> Router {
    Router::new()
        .route("/", any(home_handler))
        .route("/action", any(action_handler))
        .fallback(home_handler)
        .with_state(ServerState { sender })
}

/// Serve the router on an already bound listener until it fails.
pub async fn serve(listener: TcpListener, sender: Sender) -> Result<(), NmError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "http trigger listening");
    }
    axum::serve(listener, router(sender)).await?;
    Ok(())
}

/// Send `action` to the extension as `{query: action, response: action}`.
///
/// An empty action is logged and ignored. Send failures are logged only.
pub fn perform_action(sender: &Sender, action: &str) {
    if action.is_empty() {
        info!("action string is empty");
        return;
    }

    info!(action, "performing action");
    let msg = OutgoingMessage::echo(action);
    match sender.send(&msg) {
        Ok(()) => debug!(query = %msg.query, response = %msg.response, "action queued"),
        Err(e) => error!(error = %e, "unable to send action"),
    }
}

#[instrument(name = "http", skip_all)]
async fn home_handler() -> &'static str {
    info!("endpoint hit: home");
    HOME_BODY
}

// The caller always gets an empty 200, whatever happened to the body.
#[instrument(name = "http", skip_all)]
async fn action_handler(State(state): State<ServerState>, request: Request) {
    let body = match to_bytes(request.into_body(), usize::MAX).await {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, "error reading action body");
            return;
        }
    };

    perform_action(&state.sender, &String::from_utf8_lossy(&body));
}
