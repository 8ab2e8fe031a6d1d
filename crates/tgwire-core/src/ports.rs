use std::time::Duration;

use async_trait::async_trait;

use crate::{
    config::DecodeOptions,
    model::{
        response::decode_response,
        update::{decode_update_batch, UpdateBatch},
    },
    Result,
};

/// Arguments of one `getUpdates` long-poll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PollRequest {
    /// First update id to return; everything below is acknowledged.
    pub offset: Option<i64>,
    /// Max updates per batch (server allows 1-100).
    pub limit: Option<u8>,
    /// Long-poll timeout; `None` is a short poll.
    pub timeout: Option<Duration>,
}

/// Where raw `getUpdates` replies come from.
///
/// Implementations own the HTTP side and hand back the response body untouched;
/// the envelope and every update are decoded here.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn fetch(&self, req: PollRequest) -> Result<Vec<u8>>;
}

/// Fetch one batch and decode it.
///
/// Returns the batch and the offset to pass next time. A transport failure or
/// an `ok: false` reply is an error; broken individual updates are not.
pub async fn poll_once(
    source: &dyn UpdateSource,
    req: PollRequest,
    opts: &DecodeOptions,
) -> Result<(UpdateBatch, Option<i64>)> {
    let body = source.fetch(req).await?;
    let raw = decode_response::<serde_json::Value>(&body, opts)?.into_value();
    let batch = decode_update_batch(&raw, opts)?;
    let next = batch.next_offset().or(req.offset);

    tracing::debug!(
        updates = batch.len(),
        next_offset = ?next,
        "polled updates"
    );
    Ok((batch, next))
}
