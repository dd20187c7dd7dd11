// Chunked NDJSON streaming utilities
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use serde::Serialize;
use tokio::sync::watch;

/// Resolves once shutdown is requested. A sender dropped without a request never resolves.
async fn shutdown_requested(mut shutdown: watch::Receiver<bool>) {
    let requested = shutdown.wait_for(|stop| *stop).await.is_ok();
    if !requested {
        std::future::pending::<()>().await;
    }
}

/// Create a chunked response carrying one JSON document per line.
/// The body ends when `stream` does or when shutdown is requested.
pub fn ndjson_stream<S, T>(
    stream: S,
    shutdown: watch::Receiver<bool>,
) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize + Send + 'static,
{
    let byte_stream = stream
        .take_until(shutdown_requested(shutdown))
        .map(|item| serialize_chunk(&item));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(byte_stream))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Serialize a single item to a newline-terminated chunk
fn serialize_chunk<T: Serialize>(item: &T) -> Result<Bytes, std::io::Error> {
    let mut chunk = BytesMut::with_capacity(256);
    serde_json::to_writer((&mut chunk).writer(), item)?;
    chunk.put_u8(b'\n');
    Ok(chunk.freeze())
}

/// Helper to stream every value a watch channel takes, starting with the current one
pub fn stream_from_watch<T>(
    mut rx: watch::Receiver<T>,
    shutdown: watch::Receiver<bool>,
) -> impl IntoResponse
where
    T: Clone + Serialize + Send + Sync + 'static,
{
    let stream = async_stream::stream! {
        loop {
            let value = rx.borrow_and_update().clone();
            yield value;
            if rx.changed().await.is_err() {
                break;
            }
        }
    };

    match ndjson_stream(stream, shutdown) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
