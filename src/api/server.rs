//! Listener loop with bounded graceful shutdown.
//!
//! On the shutdown signal the listener stops accepting and in-flight
//! requests get `grace` to finish. Whatever is still running after that is
//! cut off: pending handlers answer 503 and streaming bodies end with an
//! error, which aborts their connections.

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Router,
};
use futures::StreamExt;
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinError;

const SHUTTING_DOWN: &str = "server shutting down";

/// Time cut-off connections get to unwind before the server task is aborted.
const UNWIND: Duration = Duration::from_millis(500);

/// How [`serve`] finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeOutcome {
    /// The server stopped before any shutdown signal
    Stopped,
    /// Every connection finished within the grace period
    Drained,
    /// The grace period elapsed and remaining requests were cut off
    ForcedAfterGrace,
}

/// Serve `app` on `listener` until `shutdown` resolves, then drain for at
/// most `grace`.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    grace: Duration,
) -> io::Result<ServeOutcome>
where
    F: Future<Output = ()>,
{
    let (force_tx, force_rx) = watch::channel(false);
    let app = app.layer(axum::middleware::from_fn_with_state(force_rx, cut_off_on_force));

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                stop_rx.await.ok();
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            return join_result(result).map(|()| ServeOutcome::Stopped);
        }
        _ = shutdown => {}
    }

    tracing::info!(
        grace_ms = grace.as_millis() as u64,
        "Shutdown signal received, draining in-flight requests"
    );
    stop_tx.send(()).ok();

    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => {
            join_result(result)?;
            tracing::info!("Router shut down gracefully");
            Ok(ServeOutcome::Drained)
        }
        Err(_) => {
            tracing::warn!("Grace period elapsed, terminating remaining connections");
            force_tx.send_replace(true);
            if tokio::time::timeout(UNWIND, &mut server).await.is_err() {
                server.abort();
            }
            Ok(ServeOutcome::ForcedAfterGrace)
        }
    }
}

fn join_result(result: Result<io::Result<()>, JoinError>) -> io::Result<()> {
    result
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
        .and_then(|served| served)
}

/// Resolves once shutdown is forced. Never resolves if `serve` has returned.
async fn wait_forced(force: &mut watch::Receiver<bool>) {
    let closed = force.wait_for(|forced| *forced).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}

/// Connection tasks outlive an aborted server task, so every request
/// watches the force flag itself.
async fn cut_off_on_force(
    State(mut force): State<watch::Receiver<bool>>,
    req: Request,
    next: Next,
) -> Response {
    let response = tokio::select! {
        response = next.run(req) => response,
        _ = wait_forced(&mut force) => {
            return (StatusCode::SERVICE_UNAVAILABLE, SHUTTING_DOWN).into_response();
        }
    };

    let (parts, body) = response.into_parts();
    let relay = futures::stream::unfold(
        Some((body.into_data_stream(), force)),
        |state| async move {
            let Some((mut data, mut force)) = state else {
                return None;
            };
            tokio::select! {
                chunk = data.next() => chunk.map(|chunk| (chunk, Some((data, force)))),
                _ = wait_forced(&mut force) => {
                    Some((Err(axum::Error::new(SHUTTING_DOWN)), None))
                }
            }
        },
    );
    Response::from_parts(parts, Body::from_stream(relay))
}
