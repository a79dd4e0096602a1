use super::*;
use boe_core::cache::ArtifactType;
use std::fs;
use tempfile::TempDir;

fn write_src(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn store_then_get_then_retrieve_round_trips_bytes() {
    let cache_dir = TempDir::new().unwrap();
    let src_dir = TempDir::new().unwrap();
    let cache = ArtifactCache::new(cache_dir.path(), CacheConfig::default());

    let src = write_src(&src_dir, "out.o", b"object file contents");
    let key = CacheKey::from_digest("a".repeat(64));
    let entry = cache.store(key.clone(), &src, ArtifactType::Object, 1_000).unwrap();

    assert_eq!(cache.get(&key), Some(entry));

    let dst = src_dir.path().join("restored.o");
    assert!(cache.retrieve(&key, &dst).unwrap());
    assert_eq!(fs::read(&dst).unwrap(), b"object file contents");
}

#[test]
fn store_is_idempotent_and_touches_access_time() {
    let cache_dir = TempDir::new().unwrap();
    let src_dir = TempDir::new().unwrap();
    let cache = ArtifactCache::new(cache_dir.path(), CacheConfig::default());

    let src = write_src(&src_dir, "out.o", b"bytes");
    let key = CacheKey::from_digest("b".repeat(64));
    let first = cache.store(key.clone(), &src, ArtifactType::Object, 1_000).unwrap();
    let second = cache.store(key.clone(), &src, ArtifactType::Object, 2_000).unwrap();

    assert_eq!(first.key, second.key);
    assert_eq!(second.last_accessed_unix_ms, 2_000);
    assert_eq!(cache.entry_count(), 1);
}

#[test]
fn store_fails_when_source_missing() {
    let cache_dir = TempDir::new().unwrap();
    let cache = ArtifactCache::new(cache_dir.path(), CacheConfig::default());
    let key = CacheKey::from_digest("c".repeat(64));
    let missing = cache_dir.path().join("nope.o");
    assert!(matches!(
        cache.store(key, &missing, ArtifactType::Object, 0),
        Err(CacheError::SourceMissing(_))
    ));
}

#[test]
fn lookup_reports_hit_and_miss_and_updates_stats() {
    let cache_dir = TempDir::new().unwrap();
    let src_dir = TempDir::new().unwrap();
    let cache = ArtifactCache::new(cache_dir.path(), CacheConfig::default());

    let key = CacheKey::from_digest("d".repeat(64));
    assert_eq!(cache.lookup(&key, 0), CacheLookup::Miss);

    let src = write_src(&src_dir, "out.o", b"bytes");
    cache.store(key.clone(), &src, ArtifactType::Object, 0).unwrap();
    assert_eq!(cache.lookup(&key, 10), CacheLookup::HitLocal);

    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits_local, 1);
}

#[test]
fn evict_frees_at_least_the_requested_bytes_or_empties_the_cache() {
    let cache_dir = TempDir::new().unwrap();
    let src_dir = TempDir::new().unwrap();
    let cache = ArtifactCache::new(cache_dir.path(), CacheConfig::default());

    let mut total_before = 0u64;
    for i in 0..4 {
        let src = write_src(&src_dir, &format!("f{i}.o"), &vec![b'x'; 1024]);
        let key = CacheKey::from_digest(format!("{i}").repeat(64)[..64].to_string());
        let entry = cache.store(key, &src, ArtifactType::Object, i64::from(i)).unwrap();
        total_before += entry.size_bytes;
    }

    let freed = cache.evict(2048);
    assert!(freed >= 2048 || cache.entry_count() == 0);
    assert!(cache.total_size() <= total_before - 2048 || cache.entry_count() == 0);
}

#[test]
fn lru_eviction_picks_least_recently_accessed() {
    // S5: max_entries=3, store K1..K3, access K1, store K4 -> K2 evicted.
    let cache_dir = TempDir::new().unwrap();
    let src_dir = TempDir::new().unwrap();
    let config = CacheConfig {
        max_entries: Some(3),
        ..CacheConfig::default()
    };
    let cache = ArtifactCache::new(cache_dir.path(), config);

    let key_for = |n: u8| CacheKey::from_digest(n.to_string().repeat(64)[..64].to_string());
    let k1 = key_for(1);
    let k2 = key_for(2);
    let k3 = key_for(3);
    let k4 = key_for(4);

    for (i, key) in [&k1, &k2, &k3].into_iter().enumerate() {
        let src = write_src(&src_dir, &format!("f{i}.bin"), &vec![b'x'; 1024 * 1024]);
        cache
            .store(key.clone(), &src, ArtifactType::Object, 1_000 + i as i64)
            .unwrap();
    }

    // Access K1 so it's no longer the least-recently-used entry.
    assert_eq!(cache.lookup(&k1, 5_000), CacheLookup::HitLocal);

    let src4 = write_src(&src_dir, "f4.bin", &vec![b'x'; 1024 * 1024]);
    cache.store(k4.clone(), &src4, ArtifactType::Object, 6_000).unwrap();

    assert!(cache.contains(&k1));
    assert!(!cache.contains(&k2));
    assert!(cache.contains(&k3));
    assert!(cache.contains(&k4));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn cleanup_removes_entries_older_than_max_age() {
    let cache_dir = TempDir::new().unwrap();
    let src_dir = TempDir::new().unwrap();
    let config = CacheConfig {
        max_age_ms: 1_000,
        ..CacheConfig::default()
    };
    let cache = ArtifactCache::new(cache_dir.path(), config);

    let src = write_src(&src_dir, "out.o", b"bytes");
    let key = CacheKey::from_digest("e".repeat(64));
    cache.store(key.clone(), &src, ArtifactType::Object, 0).unwrap();

    let removed = cache.cleanup(5_000).unwrap();
    assert_eq!(removed, 1);
    assert!(!cache.contains(&key));
}

#[test]
fn verify_detects_and_optionally_repairs_missing_blobs() {
    let cache_dir = TempDir::new().unwrap();
    let src_dir = TempDir::new().unwrap();
    let cache = ArtifactCache::new(cache_dir.path(), CacheConfig::default());

    let src = write_src(&src_dir, "out.o", b"bytes");
    let key = CacheKey::from_digest("f".repeat(64));
    let entry = cache.store(key.clone(), &src, ArtifactType::Object, 0).unwrap();

    fs::remove_file(cache_dir.path().join(entry.relative_path)).unwrap();

    assert_eq!(cache.verify(false).unwrap(), 1);
    assert!(cache.contains(&key), "verify without repair leaves the index untouched");

    assert_eq!(cache.verify(true).unwrap(), 1);
    assert!(!cache.contains(&key), "verify with repair drops the dangling entry");
}

#[test]
fn null_remote_tier_is_always_a_miss() {
    let tier = NullRemoteTier;
    let key = CacheKey::from_digest("0".repeat(64));
    assert!(tier.fetch_remote(&key).is_none());
    assert!(!tier.push_remote(&key, b"data"));
}
