//! Logging setup and request-scoped context.
//!
//! The request ID is kept in task-local storage so that log lines emitted
//! anywhere in a handler can be correlated without threading it through
//! every call.

use chrono::Local;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

tokio::task_local! {
    /// Task-local storage for the current request ID.
    pub static REQUEST_ID: String;
}

/// Get the current request ID from context, if set.
///
/// Returns an empty string if no request ID is set.
pub fn get_request_id() -> String {
    REQUEST_ID.try_with(|id| id.clone()).unwrap_or_default()
}

/// Generate a new unique request ID using UUID v4.
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Timestamp formatter that uses the local timezone (respects TZ)
struct LocalTime;

impl tracing_subscriber::fmt::time::FormatTime for LocalTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Build the env filter, always muting the HTTP stack's trace noise.
///
/// A bare `RUST_LOG=trace` would otherwise let hyper's per-frame logs through.
pub fn build_env_filter(base: Option<&str>) -> EnvFilter {
    let base = base.unwrap_or("info,model_router=debug");
    EnvFilter::new(format!("{},hyper=warn,h2=warn,reqwest=warn", base))
}

/// Install the global tracing subscriber.
///
/// `LOG_FORMAT=json` emits JSON lines; `NO_COLOR` disables ANSI colors.
pub fn init_tracing() {
    let base = std::env::var("RUST_LOG").ok();
    let filter = build_env_filter(base.as_deref());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let no_color = std::env::var("NO_COLOR").is_ok();

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_timer(LocalTime))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_timer(LocalTime)
                    .with_ansi(!no_color),
            )
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_id_get() {
        REQUEST_ID
            .scope("test-request-123".to_string(), async {
                assert_eq!(get_request_id(), "test-request-123");
            })
            .await;
    }

    #[tokio::test]
    async fn test_request_id_isolation() {
        let task1 = tokio::spawn(REQUEST_ID.scope("request-1".to_string(), async {
            tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
            get_request_id()
        }));
        let task2 = tokio::spawn(REQUEST_ID.scope("request-2".to_string(), async {
            tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
            get_request_id()
        }));

        assert_eq!(task1.await.unwrap(), "request-1");
        assert_eq!(task2.await.unwrap(), "request-2");
    }

    #[tokio::test]
    async fn test_request_id_default() {
        assert_eq!(get_request_id(), "");
    }

    #[test]
    fn test_generate_request_id() {
        let id1 = generate_request_id();
        let id2 = generate_request_id();

        assert_eq!(id1.len(), 36);
        assert_ne!(id1, id2);
        assert_eq!(id1.split('-').count(), 5);
    }

    #[test]
    fn test_env_filter_always_mutes_http_stack() {
        let filter = build_env_filter(Some("trace")).to_string();
        assert!(filter.contains("hyper=warn"));
        assert!(filter.contains("reqwest=warn"));
    }
}
