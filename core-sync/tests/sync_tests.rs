//! Integration tests for bucket synchronization
//!
//! These tests verify:
//! - The end-to-end listing-to-catalog workflow
//! - Idempotence of repeated syncs
//! - Uniqueness under concurrent syncs and lost insert races
//! - Listing retry and upload failure behavior against a mocked store

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bridge_desktop::MemoryObjectStore;
use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    storage::{ObjectBody, ObjectStore, ObjectSummary},
    time::FixedClock,
};
use bytes::Bytes;
use core_library::models::UNKNOWN_ARTIST;
use core_library::repositories::{SqliteTrackRepository, TrackRepository};
use core_library::{create_test_pool, FilenameParser, Track};
use core_sync::{
    IngestOutcome, SyncConfig, SyncCoordinator, SyncError, SyncReport, TrackIngestor,
    TrackUploader, UploadFile,
};
use mockall::mock;

const BUCKET: &str = "music";

// ============================================================================
// Fixtures
// ============================================================================

mock! {
    Store {}

    #[async_trait]
    impl ObjectStore for Store {
        async fn list<'a, 'b, 'c>(&'a self, bucket: &'b str, prefix: Option<&'c str>) -> BridgeResult<Vec<ObjectSummary>>;
        async fn put_object(&self, bucket: &str, key: &str, data: Bytes, content_type: &str) -> BridgeResult<()>;
        async fn get_object(&self, bucket: &str, key: &str) -> BridgeResult<ObjectBody>;
        async fn delete_object(&self, bucket: &str, key: &str) -> BridgeResult<bool>;
    }
}

fn ingestor(tracks: Arc<dyn TrackRepository>) -> Arc<TrackIngestor> {
    Arc::new(TrackIngestor::new(
        FilenameParser::default(),
        tracks,
        Arc::new(FixedClock::from_timestamp(1_700_000_000)),
    ))
}

async fn sqlite_tracks() -> Arc<SqliteTrackRepository> {
    Arc::new(SqliteTrackRepository::new(create_test_pool().await.unwrap()))
}

async fn put(store: &MemoryObjectStore, key: &str) {
    store
        .put_object(BUCKET, key, Bytes::from_static(b"audio"), "audio/mpeg")
        .await
        .unwrap();
}

/// Track repository whose first lookup of a chosen key misses, as if a
/// concurrent writer inserted it right after the lookup
struct RacingTracks {
    inner: SqliteTrackRepository,
    key: String,
    missed: AtomicBool,
}

#[async_trait]
impl TrackRepository for RacingTracks {
    async fn find_by_id(&self, id: &str) -> core_library::Result<Option<Track>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_source_key(&self, source_key: &str) -> core_library::Result<Option<Track>> {
        if source_key == self.key && !self.missed.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_by_source_key(source_key).await
    }

    async fn insert(&self, track: &Track) -> core_library::Result<Track> {
        self.inner.insert(track).await
    }

    async fn list_all(&self) -> core_library::Result<Vec<Track>> {
        self.inner.list_all().await
    }

    async fn count(&self) -> core_library::Result<i64> {
        self.inner.count().await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_end_to_end_bucket_to_catalog() {
    let store = Arc::new(MemoryObjectStore::new());
    put(&store, "Alice - Song1.mp3").await;
    put(&store, "cover.jpg").await;
    put(&store, "SoloTrack (SPOTISAVER).mp3").await;

    let tracks = sqlite_tracks().await;
    let coordinator =
        SyncCoordinator::new(store.clone(), BUCKET, ingestor(tracks.clone()), SyncConfig::default());

    let report = coordinator.sync().await.unwrap();
    assert_eq!(report.added_count, 2);
    assert_eq!(report.ignored_count, 1);

    let catalog = tracks.list_all().await.unwrap();
    let entries: Vec<(&str, &str, &str)> = catalog
        .iter()
        .map(|t| (t.source_key.as_str(), t.title.as_str(), t.artist.as_str()))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("SoloTrack (SPOTISAVER).mp3", "SoloTrack", UNKNOWN_ARTIST),
            ("Alice - Song1.mp3", "Song1", "Alice"),
        ]
    );
}

#[tokio::test]
async fn test_second_sync_adds_nothing() {
    let store = Arc::new(MemoryObjectStore::new());
    for key in ["A - One.mp3", "B - Two.mp3", "C - Three.mp3"] {
        put(&store, key).await;
    }

    let tracks = sqlite_tracks().await;
    let coordinator =
        SyncCoordinator::new(store.clone(), BUCKET, ingestor(tracks.clone()), SyncConfig::default());

    let first = coordinator.sync().await.unwrap();
    let before = tracks.list_all().await.unwrap();

    let second = coordinator.sync().await.unwrap();
    let after = tracks.list_all().await.unwrap();

    assert_eq!(first.added_count, 3);
    assert_eq!(
        second,
        SyncReport {
            added_count: 0,
            existing_count: 3,
            ignored_count: 0,
            conflicts_recovered: 0,
        }
    );
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_new_objects_are_picked_up() {
    let store = Arc::new(MemoryObjectStore::new());
    put(&store, "A - One.mp3").await;

    let tracks = sqlite_tracks().await;
    let coordinator =
        SyncCoordinator::new(store.clone(), BUCKET, ingestor(tracks.clone()), SyncConfig::default());
    coordinator.sync().await.unwrap();

    put(&store, "B - Two.mp3").await;
    let report = coordinator.sync().await.unwrap();
    assert_eq!(report.added_count, 1);
    assert_eq!(report.existing_count, 1);
    assert_eq!(tracks.count().await.unwrap(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_syncs_create_each_key_once() {
    let store = Arc::new(MemoryObjectStore::new());
    for i in 0..20 {
        put(&store, &format!("Artist {} - Track {}.mp3", i, i)).await;
    }

    let tracks = sqlite_tracks().await;
    let shared = ingestor(tracks.clone());
    let a = Arc::new(SyncCoordinator::new(
        store.clone(),
        BUCKET,
        shared.clone(),
        SyncConfig::default(),
    ));
    let b = Arc::new(SyncCoordinator::new(store.clone(), BUCKET, shared, SyncConfig::default()));

    let (ra, rb) = tokio::join!(
        tokio::spawn(async move { a.sync().await }),
        tokio::spawn(async move { b.sync().await })
    );
    let ra = ra.unwrap().unwrap();
    let rb = rb.unwrap().unwrap();

    assert_eq!(ra.added_count + rb.added_count, 20);
    assert_eq!(ra.added_count + ra.existing_count, 20);
    assert_eq!(rb.added_count + rb.existing_count, 20);
    assert_eq!(tracks.count().await.unwrap(), 20);
}

#[tokio::test]
async fn test_lost_insert_race_is_recovered() {
    let pool = create_test_pool().await.unwrap();
    let winner = SqliteTrackRepository::new(pool.clone());
    let existing = winner
        .insert(&Track::new(
            "A - One.mp3".to_string(),
            "One".to_string(),
            "A".to_string(),
            0,
        ))
        .await
        .unwrap();

    let racing = Arc::new(RacingTracks {
        inner: SqliteTrackRepository::new(pool),
        key: "A - One.mp3".to_string(),
        missed: AtomicBool::new(false),
    });
    let coordinator = SyncCoordinator::new(
        Arc::new(MemoryObjectStore::new()),
        BUCKET,
        ingestor(racing.clone()),
        SyncConfig::default(),
    );

    let report = coordinator
        .sync_listing(&[ObjectSummary::new("A - One.mp3", 5)])
        .await
        .unwrap();

    assert_eq!(
        report,
        SyncReport {
            added_count: 0,
            existing_count: 1,
            ignored_count: 0,
            conflicts_recovered: 1,
        }
    );
    assert_eq!(racing.count().await.unwrap(), 1);
    assert_eq!(
        racing.find_by_source_key("A - One.mp3").await.unwrap(),
        Some(existing)
    );
}

#[tokio::test]
async fn test_listing_is_retried_once() {
    let mut store = MockStore::new();
    let mut seq = mockall::Sequence::new();
    store
        .expect_list()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Err(BridgeError::OperationFailed("connection reset".to_string())));
    store
        .expect_list()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(vec![ObjectSummary::new("A - One.mp3", 1)]));

    let tracks = sqlite_tracks().await;
    let coordinator =
        SyncCoordinator::new(Arc::new(store), BUCKET, ingestor(tracks), SyncConfig::default());

    let report = coordinator.sync().await.unwrap();
    assert_eq!(report.added_count, 1);
}

#[tokio::test]
async fn test_listing_fails_after_retry() {
    let mut store = MockStore::new();
    store
        .expect_list()
        .times(2)
        .returning(|_, _| Err(BridgeError::OperationFailed("unreachable".to_string())));

    let tracks = sqlite_tracks().await;
    let coordinator = SyncCoordinator::new(
        Arc::new(store),
        BUCKET,
        ingestor(tracks.clone()),
        SyncConfig::default(),
    );

    let result = coordinator.sync().await;
    assert!(matches!(result, Err(SyncError::ObjectStore(_))));
    assert_eq!(tracks.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_upload_put_failure_aborts() {
    let mut store = MockStore::new();
    store
        .expect_put_object()
        .withf(|_, key, _, _| key.to_string() == "first.mp3")
        .times(1)
        .returning(|_, _, _, _| Ok(()));
    store
        .expect_put_object()
        .withf(|_, key, _, _| key.to_string() == "second.mp3")
        .times(1)
        .returning(|_, _, _, _| Err(BridgeError::OperationFailed("quota exceeded".to_string())));

    let tracks = sqlite_tracks().await;
    let uploader = TrackUploader::new(
        Arc::new(store),
        BUCKET,
        ingestor(tracks.clone()),
        SyncConfig::default().media_extensions,
    );
    let files = vec![
        UploadFile::new("first.mp3", Bytes::from_static(b"1")),
        UploadFile::new("second.mp3", Bytes::from_static(b"2")),
        UploadFile::new("third.mp3", Bytes::from_static(b"3")),
    ];

    let result = uploader.upload(&files).await;
    match result {
        Err(SyncError::UploadFailed { key, message }) => {
            assert_eq!(key, "second.mp3");
            assert!(message.contains("quota exceeded"));
        }
        other => panic!("expected UploadFailed, got {:?}", other.map(|o| o.len())),
    }

    // The file stored before the failure is catalogued; nothing after it is
    let keys: Vec<String> = tracks
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.source_key)
        .collect();
    assert_eq!(keys, vec!["first.mp3"]);
}

#[tokio::test]
async fn test_upload_then_sync_share_metadata() {
    let store = Arc::new(MemoryObjectStore::new());
    let tracks = sqlite_tracks().await;
    let shared = ingestor(tracks.clone());

    let uploader = TrackUploader::new(
        store.clone(),
        BUCKET,
        shared.clone(),
        SyncConfig::default().media_extensions,
    );
    let uploaded = uploader
        .upload(&[UploadFile::new("Bob - Tune (SPOTISAVER).mp3", Bytes::from_static(b"x"))])
        .await
        .unwrap();
    assert!(matches!(uploaded[0], IngestOutcome::Created(_)));

    let coordinator = SyncCoordinator::new(store, BUCKET, shared, SyncConfig::default());
    let report = coordinator.sync().await.unwrap();
    assert_eq!(report.added_count, 0);
    assert_eq!(report.existing_count, 1);

    let track = tracks.list_all().await.unwrap().remove(0);
    assert_eq!(track.title, "Tune");
    assert_eq!(track.artist, "Bob");
}
