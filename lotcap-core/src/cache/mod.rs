//! Keyed, write-through result cache with single-flight population
//!
//! Two in-memory tiers: parameter sets keyed by district, analysis results
//! keyed by district + geometry fingerprint. Parameter sets additionally
//! write through to an optional SQLite store (`CacheStore`); they are the
//! expensive extraction product; results are cheap to recompute and only
//! live in memory.
//!
//! Population is single-flight per key: the first caller for a missing or
//! stale key computes, concurrent callers for the same key await the shared
//! outcome over a watch channel, and independent keys never contend (the
//! maps are sharded, there is no global lock). Failures release waiters with
//! the failure and are never cached. A waiter that exhausts its wait budget
//! gets a transient timeout and does not start a duplicate computation.

pub mod store;

pub use store::CacheStore;

use std::future::Future;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::calc::Calculator;
use crate::config::CacheConfig;
use crate::model::{DensityAnalysis, DistrictKey, ParcelGeometry, ZoningParameterSet};
use crate::{Error, Result};

/// Cached value plus its verification timestamp. Entries are swapped whole:
/// a reader sees either the previous entry or the new one, never a partial
/// write.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub last_verified: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            last_verified: Utc::now(),
        }
    }

    fn is_fresh(&self, window: chrono::Duration) -> bool {
        Utc::now().signed_duration_since(self.last_verified) < window
    }
}

/// Result-cache key: district plus geometry class
type ResultKey = (DistrictKey, String);

/// Outcome shared with waiters; errors cross the channel as their message
type FlightOutcome<V> = std::result::Result<V, String>;

/// Request-coalescing map: at most one in-flight computation per key
struct FlightMap<K, V> {
    inflight: DashMap<K, watch::Receiver<Option<FlightOutcome<V>>>>,
}

impl<K, V> FlightMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn new() -> Self {
        Self {
            inflight: DashMap::new(),
        }
    }

    /// Run `compute` as the leader for `key`, or await the current leader.
    ///
    /// The leader publishes its outcome before clearing the in-flight slot,
    /// so a late arrival either observes the channel value or starts a fresh
    /// flight against an already-warm cache (callers re-check the cache
    /// after winning leadership).
    async fn run<F, Fut>(&self, key: K, wait: std::time::Duration, compute: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        enum Role<V> {
            Leader(watch::Sender<Option<FlightOutcome<V>>>),
            Waiter(watch::Receiver<Option<FlightOutcome<V>>>),
        }

        let role = match self.inflight.entry(key.clone()) {
            Entry::Occupied(slot) => Role::Waiter(slot.get().clone()),
            Entry::Vacant(slot) => {
                let (tx, rx) = watch::channel(None);
                slot.insert(rx);
                Role::Leader(tx)
            }
        };

        match role {
            Role::Leader(tx) => {
                let outcome = compute().await;
                let shared = match &outcome {
                    Ok(value) => Ok(value.clone()),
                    Err(e) => Err(e.to_string()),
                };
                let _ = tx.send(Some(shared));
                self.inflight.remove(&key);
                outcome
            }
            Role::Waiter(mut rx) => {
                let settled = async move {
                    loop {
                        if let Some(outcome) = rx.borrow_and_update().clone() {
                            return outcome;
                        }
                        if rx.changed().await.is_err() {
                            // Leader dropped without publishing (cancelled)
                            return Err("in-flight computation abandoned".to_string());
                        }
                    }
                };
                match tokio::time::timeout(wait, settled).await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(message)) => Err(Error::Provider(message)),
                    Err(_) => Err(Error::Timeout(format!(
                        "waited {:?} for in-flight computation",
                        wait
                    ))),
                }
            }
        }
    }
}

/// Write-through cache wrapping a [`Calculator`]
///
/// Reads proceed concurrently; computation for a given key is exclusive with
/// respect to other computers of that same key. Store unavailability is a
/// degradation, not a failure: reads fall through to the provider and writes
/// are skipped with a warning.
pub struct ResultCache {
    calculator: Calculator,
    config: CacheConfig,
    store: Option<CacheStore>,
    params: DashMap<DistrictKey, CacheEntry<ZoningParameterSet>>,
    results: DashMap<ResultKey, CacheEntry<DensityAnalysis>>,
    param_flights: FlightMap<DistrictKey, ZoningParameterSet>,
    result_flights: FlightMap<ResultKey, DensityAnalysis>,
}

impl ResultCache {
    /// Memory-only cache
    pub fn new(calculator: Calculator, config: CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            calculator,
            config,
            store: None,
            params: DashMap::new(),
            results: DashMap::new(),
            param_flights: FlightMap::new(),
            result_flights: FlightMap::new(),
        })
    }

    /// Cache with SQLite write-through for parameter sets
    pub fn with_store(
        calculator: Calculator,
        config: CacheConfig,
        store: CacheStore,
    ) -> Result<Self> {
        let mut cache = Self::new(calculator, config)?;
        cache.store = Some(store);
        Ok(cache)
    }

    pub fn calculator(&self) -> &Calculator {
        &self.calculator
    }

    /// Direct, uncached evaluation for callers that already hold a
    /// parameter set (also the fallback when storage is unreachable).
    pub fn evaluate(
        &self,
        params: &ZoningParameterSet,
        geometry: &ParcelGeometry,
    ) -> Result<DensityAnalysis> {
        self.calculator.evaluate(params, geometry)
    }

    /// Cache-aware evaluation.
    ///
    /// A fresh cached result short-circuits the whole pipeline. On a miss,
    /// the parameter set is obtained (memory, then store, then the
    /// caller-supplied `provider`, which is invoked at most once per miss),
    /// the calculator runs, and the result is written through.
    pub async fn evaluate_cached<F, Fut>(
        &self,
        key: &DistrictKey,
        geometry: &ParcelGeometry,
        provider: F,
    ) -> Result<DensityAnalysis>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ZoningParameterSet>>,
    {
        key.validate()?;
        geometry.validate()?;

        let result_key: ResultKey = (key.clone(), geometry.fingerprint());
        if let Some(hit) = self.fresh_result(&result_key) {
            debug!(district = %key, "Result cache hit");
            return Ok(hit);
        }

        let wait = self.config.inflight_wait();
        let flight_key = result_key.clone();
        self.result_flights
            .run(flight_key, wait, || async move {
                // Re-check after winning leadership: a previous leader may
                // have written the entry between our miss and now.
                if let Some(hit) = self.fresh_result(&result_key) {
                    return Ok(hit);
                }

                let params = self.parameter_set(key, provider).await?;
                let analysis = self.calculator.evaluate(&params, geometry)?;
                self.results
                    .insert(result_key.clone(), CacheEntry::new(analysis.clone()));
                debug!(district = %key, max_units = analysis.max_units, "Result cached");
                Ok(analysis)
            })
            .await
    }

    /// Fetch the parameter set for a district: memory, then store, then the
    /// provider, with single-flight population per district key.
    pub async fn parameter_set<F, Fut>(
        &self,
        key: &DistrictKey,
        provider: F,
    ) -> Result<ZoningParameterSet>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ZoningParameterSet>>,
    {
        if let Some(hit) = self.fresh_params(key) {
            return Ok(hit);
        }

        let wait = self.config.inflight_wait();
        self.param_flights
            .run(key.clone(), wait, || async move {
                if let Some(hit) = self.fresh_params(key) {
                    return Ok(hit);
                }

                // Store lookup happens before any expensive extraction.
                // An unreachable store degrades to a miss.
                if let Some(store) = &self.store {
                    match store.get(key).await {
                        Ok(Some((params, last_verified))) => {
                            let entry = CacheEntry {
                                value: params.clone(),
                                last_verified,
                            };
                            if entry.is_fresh(self.config.parameter_freshness()) {
                                debug!(district = %key, "Parameter store hit");
                                self.params.insert(key.clone(), entry);
                                return Ok(params);
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            warn!(
                                "Parameter store read failed for {}: {}, falling back to \
                                 provider",
                                key, e
                            );
                        }
                    }
                }

                let params = provider().await?;
                params.validate()?;
                if params.key() != *key {
                    return Err(Error::Validation(format!(
                        "provider returned parameters for {} when {} was requested",
                        params.key(),
                        key
                    )));
                }

                if let Some(store) = &self.store {
                    if let Err(e) = store.upsert(&params).await {
                        warn!("Parameter store write failed for {}: {}", key, e);
                    }
                }
                self.params.insert(key.clone(), CacheEntry::new(params.clone()));
                debug!(district = %key, "Parameter set cached");
                Ok(params)
            })
            .await
    }

    /// Drop every cached entry for a district (both tiers)
    pub fn invalidate(&self, key: &DistrictKey) {
        self.params.remove(key);
        self.results.retain(|(district, _), _| district != key);
    }

    fn fresh_result(&self, key: &ResultKey) -> Option<DensityAnalysis> {
        if let Some(entry) = self.results.get(key) {
            if entry.is_fresh(self.config.result_ttl()) {
                return Some(entry.value.clone());
            }
        } else {
            return None;
        }
        // Expired: read guard is released above, safe to remove
        self.results.remove(key);
        None
    }

    fn fresh_params(&self, key: &DistrictKey) -> Option<ZoningParameterSet> {
        if let Some(entry) = self.params.get(key) {
            if entry.is_fresh(self.config.parameter_freshness()) {
                return Some(entry.value.clone());
            }
        } else {
            return None;
        }
        self.params.remove(key);
        None
    }
}
