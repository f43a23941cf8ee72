//! End-to-end pipeline tests on in-process backends: upload through the
//! service, consume through the processor, verify storage, metadata, and
//! channel settlement.

use arca_core::keys;
use arca_core::models::ProcessingRequest;
use arca_core::StorageBackend;
use arca_db::{AssetStore, MemoryAssetStore};
use arca_queue::{DeadLetterReason, MemoryChannel, ProcessingChannel};
use arca_services::AssetService;
use arca_storage::{LocalStorage, MemoryStorage, Storage};
use arca_worker::Processor;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

const TOPIC: &str = "memory";
const MAX_METADATA_ATTEMPTS: u32 = 5;

struct Harness {
    storage: Arc<MemoryStorage>,
    store: Arc<MemoryAssetStore>,
    channel: Arc<MemoryChannel>,
    service: AssetService,
    processor: Processor,
}

fn harness() -> Harness {
    let storage = Arc::new(MemoryStorage::new());
    let store = Arc::new(MemoryAssetStore::new());
    let channel = Arc::new(MemoryChannel::new().with_receive_wait(Duration::from_millis(10)));
    let service = AssetService::new(storage.clone(), store.clone(), channel.clone());
    let processor = Processor::new(storage.clone(), store.clone(), MAX_METADATA_ATTEMPTS);
    Harness {
        storage,
        store,
        channel,
        service,
        processor,
    }
}

fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 64])
    });
    let mut buffer = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, image::ImageFormat::Jpeg)
        .unwrap();
    buffer.into_inner()
}

async fn process_next(h: &Harness) {
    let mut sub = h.channel.subscribe(TOPIC).await.unwrap();
    let delivery = sub.receive().await.unwrap().expect("expected a delivery");
    h.processor.process(delivery).await.unwrap();
}

#[tokio::test]
async fn upload_produces_thumbnail_and_updates_record() {
    let h = harness();

    let response = h
        .service
        .submit("cat.jpg", "image/jpeg", jpeg_bytes(640, 480))
        .await
        .unwrap();

    process_next(&h).await;

    let record = h.store.get(response.id).await.unwrap().unwrap();
    let expected_thumb = keys::thumbnail_key(&record.storage_key);
    assert_eq!(record.thumbnail_key.as_deref(), Some(expected_thumb.as_str()));
    assert!(expected_thumb.ends_with("_thumbnail.jpg"));

    // Original and thumbnail both present in storage.
    assert_eq!(h.storage.object_count().await, 2);
    let thumb_bytes = h.storage.download(&expected_thumb).await.unwrap();
    let thumb = image::load_from_memory(&thumb_bytes).unwrap();
    assert!(thumb.width() <= 300 && thumb.height() <= 300);

    // Message settled, nothing parked.
    assert_eq!(h.channel.pending_count(TOPIC).await, 0);
    assert!(h.channel.dead_letters(TOPIC).await.is_empty());
}

#[tokio::test]
async fn redelivered_message_is_idempotent() {
    let h = harness();

    let response = h
        .service
        .submit("cat.jpg", "image/jpeg", jpeg_bytes(640, 480))
        .await
        .unwrap();
    process_next(&h).await;

    // Simulate the channel redelivering the same message.
    let record = h.store.get(response.id).await.unwrap().unwrap();
    let request = ProcessingRequest {
        key: record.storage_key.clone(),
        content_type: "image/jpeg".to_string(),
        storage_type: StorageBackend::Memory,
        size: record.size,
    };
    h.channel.publish(TOPIC, &request).await.unwrap();
    process_next(&h).await;

    // Still one record, one original plus one thumbnail.
    assert_eq!(h.store.record_count().await, 1);
    assert_eq!(h.storage.object_count().await, 2);
    let record = h.store.get(response.id).await.unwrap().unwrap();
    assert_eq!(
        record.thumbnail_key.as_deref(),
        Some(keys::thumbnail_key(&record.storage_key).as_str())
    );
    assert!(h.channel.dead_letters(TOPIC).await.is_empty());
}

#[tokio::test]
async fn missing_source_is_dead_lettered() {
    let h = harness();

    let request = ProcessingRequest {
        key: "ghost-cat.jpg".to_string(),
        content_type: "image/jpeg".to_string(),
        storage_type: StorageBackend::Memory,
        size: 1,
    };
    h.channel.publish(TOPIC, &request).await.unwrap();
    process_next(&h).await;

    let parked = h.channel.dead_letters(TOPIC).await;
    assert_eq!(parked.len(), 1);
    assert_eq!(parked[0].1, DeadLetterReason::SourceMissing);
    assert_eq!(parked[0].0.key, "ghost-cat.jpg");

    // Nothing was created along the way.
    assert_eq!(h.storage.object_count().await, 0);
    assert_eq!(h.store.record_count().await, 0);
}

#[tokio::test]
async fn undecodable_source_is_dead_lettered() {
    let h = harness();

    let response = h
        .service
        .submit("broken.jpg", "image/jpeg", b"not actually a jpeg".to_vec())
        .await
        .unwrap();
    process_next(&h).await;

    let parked = h.channel.dead_letters(TOPIC).await;
    assert_eq!(parked.len(), 1);
    assert_eq!(parked[0].1, DeadLetterReason::DerivationFailed);

    // The record stays, without a thumbnail.
    let record = h.store.get(response.id).await.unwrap().unwrap();
    assert!(record.thumbnail_key.is_none());
    assert_eq!(h.storage.object_count().await, 1);
}

#[tokio::test]
async fn invisible_record_is_retried_then_dead_lettered() {
    let h = harness();

    // Object exists but no metadata record ever appears.
    h.storage
        .upload("orphan-cat.jpg", jpeg_bytes(400, 400), "image/jpeg")
        .await
        .unwrap();
    let request = ProcessingRequest {
        key: "orphan-cat.jpg".to_string(),
        content_type: "image/jpeg".to_string(),
        storage_type: StorageBackend::Memory,
        size: 100,
    };
    h.channel.publish(TOPIC, &request).await.unwrap();

    for _ in 0..MAX_METADATA_ATTEMPTS {
        process_next(&h).await;
    }

    assert_eq!(h.channel.pending_count(TOPIC).await, 0);
    let parked = h.channel.dead_letters(TOPIC).await;
    assert_eq!(parked.len(), 1);
    assert_eq!(parked[0].1, DeadLetterReason::RecordNeverVisible);
}

#[tokio::test]
async fn late_record_is_picked_up_on_redelivery() {
    let h = harness();

    h.storage
        .upload("late-cat.jpg", jpeg_bytes(400, 400), "image/jpeg")
        .await
        .unwrap();
    let request = ProcessingRequest {
        key: "late-cat.jpg".to_string(),
        content_type: "image/jpeg".to_string(),
        storage_type: StorageBackend::Memory,
        size: 100,
    };
    h.channel.publish(TOPIC, &request).await.unwrap();

    // First delivery: record not visible yet, message abandoned.
    process_next(&h).await;
    assert_eq!(h.channel.pending_count(TOPIC).await, 1);

    // Record becomes visible before the redelivery.
    let record = arca_core::models::AssetRecord::new(
        "cat.jpg".to_string(),
        "image/jpeg".to_string(),
        100,
        "late-cat.jpg".to_string(),
        "memory://late-cat.jpg".to_string(),
    );
    h.store.insert(&record).await.unwrap();

    process_next(&h).await;

    let updated = h.store.get(record.id).await.unwrap().unwrap();
    assert_eq!(
        updated.thumbnail_key.as_deref(),
        Some("late-cat_thumbnail.jpg")
    );
    assert!(h.channel.dead_letters(TOPIC).await.is_empty());
    assert_eq!(h.channel.pending_count(TOPIC).await, 0);
}

#[tokio::test]
async fn traversal_key_leaves_no_files_outside_scratch() {
    let h = harness();

    // A key nobody minted through submit; storage backends that accept
    // arbitrary keys can hold such objects.
    let name = format!("escape-{}.png", std::process::id());
    let key = format!("../{name}");
    h.storage
        .upload(&key, jpeg_bytes(400, 400), "image/png")
        .await
        .unwrap();
    let request = ProcessingRequest {
        key: key.clone(),
        content_type: "image/png".to_string(),
        storage_type: StorageBackend::Memory,
        size: 100,
    };
    h.channel.publish(TOPIC, &request).await.unwrap();
    process_next(&h).await;

    // Scratch directories live under the system temp dir; a key-influenced
    // scratch path would land the files one level up from the scratch dir,
    // surviving its cleanup.
    let temp = std::env::temp_dir();
    assert!(!temp.join(&name).exists());
    assert!(!temp
        .join(format!("escape-{}_thumbnail.png", std::process::id()))
        .exists());

    // Derivation itself went through; the thumbnail reached storage.
    assert_eq!(h.storage.object_count().await, 2);
}

#[tokio::test]
async fn invalid_source_key_is_dead_lettered() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(
        LocalStorage::new(dir.path(), "http://localhost:4000/media".to_string())
            .await
            .unwrap(),
    );
    let store = Arc::new(MemoryAssetStore::new());
    let channel = Arc::new(MemoryChannel::new().with_receive_wait(Duration::from_millis(10)));
    let processor = Processor::new(storage, store, MAX_METADATA_ATTEMPTS);

    // The backend rejects this key outright; no redelivery can change that.
    let request = ProcessingRequest {
        key: "../outside.png".to_string(),
        content_type: "image/png".to_string(),
        storage_type: StorageBackend::Local,
        size: 1,
    };
    channel.publish("local", &request).await.unwrap();

    let mut sub = channel.subscribe("local").await.unwrap();
    let delivery = sub.receive().await.unwrap().unwrap();
    processor.process(delivery).await.unwrap();

    assert_eq!(channel.pending_count("local").await, 0);
    let parked = channel.dead_letters("local").await;
    assert_eq!(parked.len(), 1);
    assert_eq!(parked[0].1, DeadLetterReason::MalformedMessage);
}

#[tokio::test]
async fn nested_key_is_processed_and_acked() {
    let h = harness();

    h.storage
        .upload("media/sub-cat.png", jpeg_bytes(400, 400), "image/png")
        .await
        .unwrap();
    let record = arca_core::models::AssetRecord::new(
        "sub-cat.png".to_string(),
        "image/png".to_string(),
        100,
        "media/sub-cat.png".to_string(),
        "memory://media/sub-cat.png".to_string(),
    );
    h.store.insert(&record).await.unwrap();

    let request = ProcessingRequest {
        key: "media/sub-cat.png".to_string(),
        content_type: "image/png".to_string(),
        storage_type: StorageBackend::Memory,
        size: 100,
    };
    h.channel.publish(TOPIC, &request).await.unwrap();
    process_next(&h).await;

    let updated = h.store.get(record.id).await.unwrap().unwrap();
    assert_eq!(
        updated.thumbnail_key.as_deref(),
        Some("media/sub-cat_thumbnail.png")
    );
    assert_eq!(h.channel.pending_count(TOPIC).await, 0);
    assert!(h.channel.dead_letters(TOPIC).await.is_empty());
}

#[tokio::test]
async fn deleted_asset_disappears_from_listing() {
    let h = harness();

    let response = h
        .service
        .submit("cat.jpg", "image/jpeg", jpeg_bytes(640, 480))
        .await
        .unwrap();
    process_next(&h).await;

    let listings = h.service.list().await.unwrap();
    assert_eq!(listings.len(), 1);
    assert!(listings[0].thumbnail_url.is_some());

    h.service.delete(response.id).await.unwrap();

    assert!(h.service.list().await.unwrap().is_empty());
    assert_eq!(h.storage.object_count().await, 0);
    assert_eq!(h.store.record_count().await, 0);
}
