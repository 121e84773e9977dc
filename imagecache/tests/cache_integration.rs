//! Integration tests for the image cache facade.
//!
//! These tests drive the public API end to end against a temporary cache
//! root with in-process fetchers:
//! - Miss → background fill → hit
//! - Bulk insert with working-set reconciliation
//! - Failure isolation (fetch errors, panics)
//! - Coalescing and shutdown
//!
//! Run with: `cargo test --test cache_integration`

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tempfile::TempDir;

use imagecache::cache::{derive_key, CacheConfig, CacheKey, Namespace, STAGING_DIR_NAME};
use imagecache::fetch::{FetchError, HttpClient, HttpImageFetcher, ImageFetcher};
use imagecache::records::{AnyRecord, Image, Program, Supplement};
use imagecache::service::ImageCache;
use imagecache::tasks::{TaskSpawner, WorkingSet};

// ============================================================================
// Test Helpers
// ============================================================================

/// Serves bytes from an in-memory map, optionally after a delay.
#[derive(Default)]
struct MapFetcher {
    images: Mutex<HashMap<String, Vec<u8>>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MapFetcher {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    fn serve(self: &Arc<Self>, url: &str, bytes: &[u8]) -> Arc<Self> {
        self.images
            .lock()
            .unwrap()
            .insert(url.to_string(), bytes.to_vec());
        Arc::clone(self)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageFetcher for MapFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.images
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}

/// Panics for one URL and serves every other one.
struct PanickingFetcher {
    poison: String,
}

impl ImageFetcher for PanickingFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if url == self.poison {
            panic!("decoder exploded on {}", url);
        }
        Ok(url.as_bytes().to_vec())
    }
}

fn create_cache(fetcher: Arc<dyn ImageFetcher>) -> (TempDir, ImageCache) {
    let temp_dir = TempDir::new().unwrap();
    let cache = ImageCache::new(
        CacheConfig::new(temp_dir.path()),
        fetcher,
        TaskSpawner::current().unwrap(),
    );
    (temp_dir, cache)
}

fn keys(names: &[&str]) -> HashSet<CacheKey> {
    names.iter().map(|n| CacheKey::new(*n)).collect()
}

// ============================================================================
// Lookup scenarios
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_miss_then_hit_after_fill() {
    let fetcher = Arc::new(MapFetcher::default()).serve("https://x/y/z.png", b"zzz");
    let (temp_dir, cache) = create_cache(fetcher.clone());
    let ns = Namespace::new("ns").unwrap();

    let first = cache.get_or_populate("https://x/y/z.png", &ns);
    assert_eq!(first.to_string(), "https://x/y/z.png");

    cache.flush().await;

    assert!(cache.store().exists(&ns, &derive_key("https://x/y/z.png")));
    let second = cache.get_or_populate("https://x/y/z.png", &ns);
    let path = second.local_path().expect("expected a cache hit");
    assert!(path.ends_with("z.png"));
    assert!(path.starts_with(temp_dir.path().join("ns")));
    assert_eq!(std::fs::read(path).unwrap(), b"zzz");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_lookup_does_not_wait_for_slow_fetcher() {
    let fetcher = Arc::new(MapFetcher::with_delay(Duration::from_millis(500)))
        .serve("https://h/slow.png", b"slow");
    let (_temp_dir, cache) = create_cache(fetcher);
    let ns = Namespace::supplements();

    let started = Instant::now();
    let location = cache.get_or_populate("https://h/slow.png", &ns);
    let elapsed = started.elapsed();

    assert!(!location.is_local());
    assert!(
        elapsed < Duration::from_millis(250),
        "lookup took {:?}",
        elapsed
    );

    cache.flush().await;
    assert!(cache.get_or_populate("https://h/slow.png", &ns).is_local());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_fetch_failure_leaves_no_entry() {
    let fetcher = Arc::new(MapFetcher::default());
    let (temp_dir, cache) = create_cache(fetcher);
    let ns = Namespace::supplements();

    let location = cache.get_or_populate("https://h/missing.png", &ns);
    cache.flush().await;

    assert!(!location.is_local());
    assert!(!cache.list(&ns).contains(&CacheKey::new("missing.png")));
    assert!(!temp_dir.path().join("supplements").join("missing.png").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_panicking_fill_does_not_affect_siblings() {
    let fetcher = Arc::new(PanickingFetcher {
        poison: "https://h/bad.png".to_string(),
    });
    let (_temp_dir, cache) = create_cache(fetcher);
    let ns = Namespace::supplements();

    cache.get_or_populate("https://h/bad.png", &ns);
    cache.get_or_populate("https://h/good.png", &ns);
    cache.flush().await;

    assert_eq!(cache.list(&ns), keys(&["good.png"]));
    assert!(cache.spawner().is_accepting());

    let stats = cache.stats();
    assert_eq!(stats.fills_succeeded, 1);
    assert_eq!(stats.fills_failed, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rapid_misses_spawn_one_writer() {
    let fetcher = Arc::new(MapFetcher::with_delay(Duration::from_millis(200)))
        .serve("https://h/shared.png", b"shared");
    let (_temp_dir, cache) = create_cache(fetcher.clone());
    let cache = Arc::new(cache);
    let ns = Namespace::supplements();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = Arc::clone(&cache);
        let ns = ns.clone();
        handles.push(tokio::spawn(async move {
            cache.get_or_populate("https://h/shared.png", &ns)
        }));
    }
    for handle in handles {
        assert!(!handle.await.unwrap().is_local());
    }

    cache.flush().await;

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(cache.read("https://h/shared.png", &ns), Some(b"shared".to_vec()));
}

// ============================================================================
// Bulk insert and reconciliation
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bulk_insert_drops_unreferenced_entry() {
    let fetcher = Arc::new(MapFetcher::default());
    let (_temp_dir, cache) = create_cache(fetcher);
    let ns = Namespace::supplements();
    for name in ["a.png", "b.png", "c.png"] {
        cache
            .store()
            .publish(&ns, &CacheKey::new(name), name.as_bytes())
            .unwrap();
    }

    let mut records = vec![
        Supplement::new(1, "https://cdn/s/a.png"),
        Supplement::new(2, "https://cdn/s/b.png"),
    ];
    let summary = cache.bulk_insert(&mut records, &ns);
    cache.flush().await;

    assert_eq!(summary.hits, 2);
    assert_eq!(cache.list(&ns), keys(&["a.png", "b.png"]));
    for record in &records {
        assert!(std::path::Path::new(&record.image_uri).exists());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reconcile_keeps_intersection() {
    let fetcher = Arc::new(MapFetcher::default());
    let (_temp_dir, cache) = create_cache(fetcher);
    let ns = Namespace::member_portal();
    for name in ["one.jpg", "two.jpg", "three.jpg"] {
        cache
            .store()
            .publish(&ns, &CacheKey::new(name), b"x")
            .unwrap();
    }

    // four.jpg is referenced but not stored; it must not appear
    let set = WorkingSet::complete(
        ns.clone(),
        ["https://p/two.jpg", "https://p/three.jpg", "https://p/four.jpg"],
    )
    .unwrap();
    let report = cache.reconcile(set).await.unwrap();

    assert_eq!(report.removed, 1);
    assert_eq!(cache.list(&ns), keys(&["two.jpg", "three.jpg"]));
}

#[test]
fn test_empty_working_set_rejected() {
    let result = WorkingSet::complete(Namespace::supplements(), Vec::<String>::new());
    assert!(result.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reconcile_leaves_other_namespaces_alone() {
    let fetcher = Arc::new(MapFetcher::default());
    let (_temp_dir, cache) = create_cache(fetcher);
    let portal = Namespace::member_portal();
    cache
        .store()
        .publish(&portal, &CacheKey::new("hero.jpg"), b"x")
        .unwrap();

    let mut records = vec![Supplement::new(1, "https://cdn/s/a.png")];
    cache.bulk_insert(&mut records, &Namespace::supplements());
    cache.flush().await;

    assert_eq!(cache.list(&portal), keys(&["hero.jpg"]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_mixed_records_fill_home_namespaces() {
    let fetcher = Arc::new(MapFetcher::default())
        .serve("https://cdn/s/a.png", b"a")
        .serve("https://cdn/p/hero.jpg", b"hero");
    let (_temp_dir, cache) = create_cache(fetcher);

    let mut records = vec![
        AnyRecord::from(Supplement::new(1, "https://cdn/s/a.png")),
        AnyRecord::from(Program::new(7, Image::new(70, "https://cdn/p/hero.jpg"))),
    ];
    cache.bulk_insert_any(&mut records);
    cache.flush().await;

    assert_eq!(cache.list(&Namespace::supplements()), keys(&["a.png"]));
    assert_eq!(cache.list(&Namespace::member_portal()), keys(&["hero.jpg"]));

    // Second pass resolves both to local files
    cache.bulk_insert_any(&mut records);
    cache.flush().await;
    match &records[1] {
        AnyRecord::Program(p) => assert!(p.image.uri.ends_with("hero.jpg")),
        other => panic!("unexpected record {:?}", other),
    }
    assert!(!records.iter().any(|r| match r {
        AnyRecord::Supplement(s) => s.image_uri.starts_with("https://"),
        AnyRecord::Program(p) => p.image.uri.starts_with("https://"),
    }));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_drains_in_flight_fills() {
    let fetcher = Arc::new(MapFetcher::with_delay(Duration::from_millis(100)))
        .serve("https://h/late.png", b"late");
    let (_temp_dir, cache) = create_cache(fetcher);
    let ns = Namespace::supplements();

    cache.get_or_populate("https://h/late.png", &ns);
    cache.shutdown().await;

    assert!(cache.exists("https://h/late.png", &ns));
    assert!(!cache.spawner().is_accepting());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_staging_is_never_listed() {
    let fetcher = Arc::new(MapFetcher::default()).serve("https://h/a.png", b"a");
    let (temp_dir, cache) = create_cache(fetcher);
    let ns = Namespace::supplements();

    cache.get_or_populate("https://h/a.png", &ns);
    cache.flush().await;

    assert!(temp_dir.path().join(STAGING_DIR_NAME).is_dir());
    assert_eq!(cache.list(&ns), keys(&["a.png"]));
}

// ============================================================================
// HTTP fetcher with normalization
// ============================================================================

/// Returns a tiny JPEG for every request.
struct JpegClient;

impl HttpClient for JpegClient {
    fn get(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 10, 10]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Jpeg)
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        Ok(out.into_inner())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_http_fill_stores_normalized_png() {
    let fetcher = Arc::new(HttpImageFetcher::with_client(JpegClient, true));
    let (_temp_dir, cache) = create_cache(fetcher);
    let ns = Namespace::member_portal();

    cache.get_or_populate("https://cdn/p/hero.jpg", &ns);
    cache.flush().await;

    let stored = cache.read("https://cdn/p/hero.jpg", &ns).unwrap();
    assert_eq!(&stored[..8], b"\x89PNG\r\n\x1a\n");
}
