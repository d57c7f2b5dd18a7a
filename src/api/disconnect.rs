use bytes::Bytes;
use futures::stream::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Wraps a backend body stream and notices when the client goes away.
///
/// Dropping this stream drops the backend response, which closes the
/// backend connection. A drop before the inner stream finished means the
/// client disconnected mid-response.
pub struct DisconnectStream<S> {
    stream: S,
    endpoint: String,
    bytes_relayed: u64,
    completed: bool,
}

impl<S> DisconnectStream<S> {
    pub fn new(stream: S, endpoint: impl Into<String>) -> Self {
        Self {
            stream,
            endpoint: endpoint.into(),
            bytes_relayed: 0,
            completed: false,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

impl<S, E> Stream for DisconnectStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<Bytes, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let poll = Pin::new(&mut self.stream).poll_next(cx);
        match &poll {
            Poll::Ready(Some(Ok(chunk))) => self.bytes_relayed += chunk.len() as u64,
            // A backend error ends the relay too; it is not a client disconnect
            Poll::Ready(Some(Err(_))) | Poll::Ready(None) => self.completed = true,
            Poll::Pending => {}
        }
        poll
    }
}

impl<S> Drop for DisconnectStream<S> {
    fn drop(&mut self) {
        if self.completed {
            tracing::debug!(
                endpoint = %self.endpoint,
                bytes = self.bytes_relayed,
                "Backend stream relayed"
            );
        } else {
            tracing::debug!(
                endpoint = %self.endpoint,
                bytes = self.bytes_relayed,
                "Client disconnect detected - backend stream cancelled"
            );
        }
    }
}
