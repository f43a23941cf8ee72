//! Per-message processing state machine.

use arca_core::constants::{SIGNED_URL_EXPIRY, THUMBNAIL_MAX_DIM};
use arca_core::keys;
use arca_db::AssetStore;
use arca_processing::{generate_thumbnail, ThumbnailError};
use arca_queue::{ChannelResult, DeadLetterReason, Delivery};
use arca_storage::{Storage, StorageError};
use std::path::Path;
use std::sync::Arc;

/// Scratch filenames for one message, named locally instead of after the
/// storage key: keys are untrusted input here and must never influence
/// filesystem paths.
fn scratch_names(key: &str) -> (String, String) {
    match Path::new(key).extension().and_then(|e| e.to_str()) {
        Some(ext) => (format!("original.{ext}"), format!("thumbnail.{ext}")),
        None => ("original".to_string(), "thumbnail".to_string()),
    }
}

/// Derives a thumbnail for one processing request and settles the delivery.
///
/// Every path through `process` ends in exactly one settle call:
/// * `ack` when the thumbnail is stored and recorded;
/// * `dead_letter` when redelivery cannot possibly help;
/// * `abandon` for transient trouble, letting the channel redeliver.
///
/// The worker never retries locally. Redelivery with the channel's attempt
/// counter is the only retry mechanism, so a crash mid-message behaves the
/// same as an abandon.
#[derive(Clone)]
pub struct Processor {
    storage: Arc<dyn Storage>,
    store: Arc<dyn AssetStore>,
    max_metadata_attempts: u32,
}

impl Processor {
    pub fn new(
        storage: Arc<dyn Storage>,
        store: Arc<dyn AssetStore>,
        max_metadata_attempts: u32,
    ) -> Self {
        Self {
            storage,
            store,
            max_metadata_attempts,
        }
    }

    /// Process one delivery to completion. Returns an error only when a
    /// settle call itself fails; processing failures are settled, not
    /// propagated.
    #[tracing::instrument(skip(self, delivery), fields(key = %delivery.request().key, attempt = delivery.attempt()))]
    pub async fn process(&self, delivery: Box<dyn Delivery>) -> ChannelResult<()> {
        let request = delivery.request().clone();
        let attempt = delivery.attempt();
        let start = std::time::Instant::now();

        // Scratch space lives for the duration of this message; the
        // directory is removed when the guard drops, on every path.
        let scratch = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!(error = %e, "failed to create scratch directory, abandoning");
                return delivery.abandon().await;
            }
        };

        let source_bytes = match self.storage.download(&request.key).await {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound(_)) => {
                tracing::warn!(key = %request.key, "source object missing, dead-lettering");
                return delivery.dead_letter(DeadLetterReason::SourceMissing).await;
            }
            Err(e) if e.is_transient() => {
                tracing::warn!(key = %request.key, error = %e, "download failed, abandoning");
                return delivery.abandon().await;
            }
            Err(e) => {
                // The key itself is unusable; redelivery would fail the
                // same way.
                tracing::warn!(key = %request.key, error = %e, "source key rejected, dead-lettering");
                return delivery
                    .dead_letter(DeadLetterReason::MalformedMessage)
                    .await;
            }
        };

        let (source_name, thumbnail_name) = scratch_names(&request.key);
        let source_path = scratch.path().join(source_name);
        let thumbnail_path = scratch.path().join(thumbnail_name);
        let thumbnail_key = keys::thumbnail_key(&request.key);

        if let Err(e) = tokio::fs::write(&source_path, &source_bytes).await {
            tracing::warn!(error = %e, "failed to write scratch file, abandoning");
            return delivery.abandon().await;
        }

        // Image decoding is CPU work; keep it off the async executor.
        let derive_result = {
            let source_path = source_path.clone();
            let thumbnail_path = thumbnail_path.clone();
            tokio::task::spawn_blocking(move || {
                generate_thumbnail(&source_path, &thumbnail_path, THUMBNAIL_MAX_DIM)
            })
            .await
        };

        match derive_result {
            Ok(Ok((width, height))) => {
                tracing::debug!(width, height, "thumbnail derived");
            }
            Ok(Err(ThumbnailError::Io(e))) => {
                tracing::warn!(error = %e, "scratch IO failed during derivation, abandoning");
                return delivery.abandon().await;
            }
            Ok(Err(e)) => {
                // The bytes themselves are bad; every redelivery would see
                // the same bytes.
                tracing::warn!(key = %request.key, error = %e, "derivation failed, dead-lettering");
                return delivery
                    .dead_letter(DeadLetterReason::DerivationFailed)
                    .await;
            }
            Err(e) => {
                tracing::error!(error = %e, "derivation task panicked, abandoning");
                return delivery.abandon().await;
            }
        }

        let thumbnail_bytes = match tokio::fs::read(&thumbnail_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read derived thumbnail, abandoning");
                return delivery.abandon().await;
            }
        };

        if let Err(e) = self
            .storage
            .upload(&thumbnail_key, thumbnail_bytes, &request.content_type)
            .await
        {
            return if e.is_transient() {
                tracing::warn!(key = %thumbnail_key, error = %e, "thumbnail upload failed, abandoning");
                delivery.abandon().await
            } else {
                tracing::warn!(key = %thumbnail_key, error = %e, "thumbnail key rejected, dead-lettering");
                delivery
                    .dead_letter(DeadLetterReason::MalformedMessage)
                    .await
            };
        }

        let thumbnail_url = match self
            .storage
            .presigned_url(&thumbnail_key, SIGNED_URL_EXPIRY)
            .await
        {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(key = %thumbnail_key, error = %e, "failed to sign thumbnail URL");
                String::new()
            }
        };

        match self
            .store
            .set_thumbnail(&request.key, &thumbnail_key, &thumbnail_url)
            .await
        {
            Ok(Some(record)) => {
                tracing::info!(
                    key = %request.key,
                    asset_id = %record.id,
                    thumbnail_key = %thumbnail_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "thumbnail processed"
                );
                delivery.ack().await
            }
            Ok(None) => {
                // The record can lag the message when publish wins the race
                // with insert visibility. Storage writes above were
                // idempotent, so redelivery just overwrites the thumbnail.
                if attempt >= self.max_metadata_attempts {
                    tracing::error!(
                        key = %request.key,
                        attempt,
                        "record never became visible, dead-lettering"
                    );
                    delivery
                        .dead_letter(DeadLetterReason::RecordNeverVisible)
                        .await
                } else {
                    tracing::warn!(key = %request.key, attempt, "record not visible yet, abandoning");
                    delivery.abandon().await
                }
            }
            Err(e) => {
                tracing::warn!(key = %request.key, error = %e, "metadata update failed, abandoning");
                delivery.abandon().await
            }
        }
    }
}
