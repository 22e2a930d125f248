//! Content-addressed, single-flight cache.
//!
//! Wraps a generic result type `V`; `harmonize.rs` instantiates it over
//! `Output`. A short `Mutex<HashMap<..>>` critical section guards only the
//! bookkeeping (who's computing what, what's already done) -- the actual
//! computation runs outside the lock, with concurrent callers for the same
//! key waiting on a per-key condvar instead of duplicating the work.

use chrono::{DateTime, Duration, Utc};
use log::info;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};

use crate::error::HarmonizeError;

pub type CacheKey = [u8; 32];

/// `SHA-256(input_bytes || 0x00 || utf8(join(instruments, ",")))`.
pub fn compute_key(bytes: &[u8], instruments: &[String]) -> CacheKey {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.update([0u8]);
    hasher.update(instruments.join(",").as_bytes());
    hasher.finalize().into()
}

struct InFlightSlot<V> {
    result: Mutex<Option<Result<V, HarmonizeError>>>,
    ready: Condvar,
}

enum Slot<V> {
    InFlight(Arc<InFlightSlot<V>>),
    Done { value: Arc<V>, inserted_at: DateTime<Utc> },
}

/// Bounded, TTL'd, single-flight cache keyed by `CacheKey`.
pub struct Cache<V> {
    entries: Mutex<HashMap<CacheKey, Slot<V>>>,
    capacity: usize,
    ttl: Duration,
}

impl<V: Clone> Cache<V> {
    pub fn new(capacity: usize, ttl_minutes: i64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity,
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Number of live (non-expired) entries, for diagnostics/tests.
    pub fn len(&self) -> usize {
        let guard = self.entries.lock().unwrap();
        guard
            .values()
            .filter(|slot| matches!(slot, Slot::Done { inserted_at, .. } if Utc::now() - *inserted_at < self.ttl))
            .count()
    }

    /// Look up `key`; on miss, run `compute` with at most one concurrent
    /// caller per key actually executing it.
    pub fn get_or_compute<F>(&self, key: CacheKey, compute: F) -> Result<Arc<V>, HarmonizeError>
    where
        F: FnOnce() -> Result<V, HarmonizeError>,
    {
        loop {
            let mut guard = self.entries.lock().unwrap();
            match guard.get(&key) {
                Some(Slot::Done { value, inserted_at }) => {
                    if Utc::now() - *inserted_at < self.ttl {
                        info!("cache hit");
                        return Ok(value.clone());
                    }
                    guard.remove(&key);
                }
                Some(Slot::InFlight(slot)) => {
                    let slot = slot.clone();
                    drop(guard);
                    let mut result_guard = slot.result.lock().unwrap();
                    while result_guard.is_none() {
                        result_guard = slot.ready.wait(result_guard).unwrap();
                    }
                    return match result_guard.as_ref().unwrap() {
                        Ok(v) => Ok(Arc::new(v.clone())),
                        Err(e) => Err(e.clone()),
                    };
                }
                None => {
                    info!("cache miss");
                    let in_flight = Arc::new(InFlightSlot { result: Mutex::new(None), ready: Condvar::new() });
                    guard.insert(key, Slot::InFlight(in_flight.clone()));
                    drop(guard);

                    let computed = compute();

                    {
                        let mut result_guard = in_flight.result.lock().unwrap();
                        *result_guard = Some(computed.clone());
                        in_flight.ready.notify_all();
                    }

                    let mut guard = self.entries.lock().unwrap();
                    return match computed {
                        Ok(value) => {
                            self.evict_if_full(&mut guard);
                            guard.insert(
                                key,
                                Slot::Done { value: Arc::new(value.clone()), inserted_at: Utc::now() },
                            );
                            Ok(Arc::new(value))
                        }
                        Err(e) => {
                            guard.remove(&key);
                            Err(e)
                        }
                    };
                }
            }
        }
    }

    fn evict_if_full(&self, guard: &mut HashMap<CacheKey, Slot<V>>) {
        if guard.len() < self.capacity {
            return;
        }
        let oldest = guard
            .iter()
            .filter_map(|(k, slot)| match slot {
                Slot::Done { inserted_at, .. } => Some((*k, *inserted_at)),
                Slot::InFlight(_) => None,
            })
            .min_by_key(|&(_, inserted_at)| inserted_at);
        if let Some((key, _)) = oldest {
            guard.remove(&key);
        }
    }
}
