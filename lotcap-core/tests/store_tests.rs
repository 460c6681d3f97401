//! Parameter cache store: persistence round-trip, re-verification, pruning,
//! and cold-start reuse through the result cache.

use chrono::{Duration, Utc};
use lotcap_core::cache::CacheStore;
use lotcap_core::{
    CacheConfig, CalcConfig, Calculator, DistrictKey, ParcelGeometry, ResultCache,
    ZoningParameterSet,
};

fn params() -> ZoningParameterSet {
    ZoningParameterSet {
        jurisdiction: "fort_lauderdale".to_string(),
        district: "RM-15".to_string(),
        max_density_units_per_acre: Some(15.0),
        far: Some(0.75),
        min_unit_size_sqft: Some(650.0),
        ..Default::default()
    }
}

fn key() -> DistrictKey {
    DistrictKey::new("fort_lauderdale", "RM-15")
}

#[tokio::test]
async fn test_round_trip_preserves_the_parameter_set() {
    let store = CacheStore::connect("sqlite::memory:").await.unwrap();

    assert!(store.get(&key()).await.unwrap().is_none());

    store.upsert(&params()).await.unwrap();
    let (loaded, last_verified) = store.get(&key()).await.unwrap().unwrap();

    assert_eq!(loaded, params());
    assert!(Utc::now().signed_duration_since(last_verified) < Duration::seconds(10));
}

#[tokio::test]
async fn test_upsert_reverifies_in_place() {
    let store = CacheStore::connect("sqlite::memory:").await.unwrap();

    store.upsert(&params()).await.unwrap();
    let (_, first_verified) = store.get(&key()).await.unwrap().unwrap();

    let mut updated = params();
    updated.far = Some(1.25);
    store.upsert(&updated).await.unwrap();

    let (loaded, second_verified) = store.get(&key()).await.unwrap().unwrap();
    assert_eq!(loaded.far, Some(1.25));
    assert!(second_verified >= first_verified);
}

#[tokio::test]
async fn test_remove_and_prune() {
    let store = CacheStore::connect("sqlite::memory:").await.unwrap();

    store.upsert(&params()).await.unwrap();
    store.remove(&key()).await.unwrap();
    assert!(store.get(&key()).await.unwrap().is_none());

    store.upsert(&params()).await.unwrap();
    // Nothing is older than a cutoff in the past
    let pruned = store
        .prune_stale(Utc::now() - Duration::days(1))
        .await
        .unwrap();
    assert_eq!(pruned, 0);

    // Everything is older than a cutoff in the future
    let pruned = store.prune_stale(Utc::now() + Duration::days(1)).await.unwrap();
    assert_eq!(pruned, 1);
    assert!(store.get(&key()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_file_backed_store_survives_a_cold_start() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("zoning-cache.db");

    // First process: extraction happens once, writes through
    {
        let store = CacheStore::open(&db_path).await.unwrap();
        let calculator = Calculator::new(CalcConfig::default()).unwrap();
        let cache =
            ResultCache::with_store(calculator, CacheConfig::default(), store).unwrap();

        let geometry = ParcelGeometry {
            lot_area_sqft: 10_000.0,
            ..Default::default()
        };
        let analysis = cache
            .evaluate_cached(&key(), &geometry, || async { Ok(params()) })
            .await
            .unwrap();
        assert!(analysis.max_units > 0);
    }

    // Second process: the store satisfies the lookup, the provider must not run
    {
        let store = CacheStore::open(&db_path).await.unwrap();
        let calculator = Calculator::new(CalcConfig::default()).unwrap();
        let cache =
            ResultCache::with_store(calculator, CacheConfig::default(), store).unwrap();

        let geometry = ParcelGeometry {
            lot_area_sqft: 10_000.0,
            ..Default::default()
        };
        let analysis = cache
            .evaluate_cached(&key(), &geometry, || async {
                Err(lotcap_core::Error::Provider(
                    "parameters must come from the store, not the provider".to_string(),
                ))
            })
            .await
            .unwrap();
        assert!(analysis.max_units > 0);
    }
}
