//! Session cache of pool metadata
//!
//! The registry is loaded once from the indexer and considered stale after a
//! configurable window. A refresh replaces the whole set.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::{Market, Pool};
use crate::error::{EngineError, Result};

/// Pools keyed by name
#[derive(Debug)]
pub struct PoolRegistry {
    pools: HashMap<String, Pool>,
    loaded_at: Instant,
    ttl: Duration,
}

impl PoolRegistry {
    pub fn new(pools: Vec<Pool>, ttl: Duration) -> Self {
        Self {
            pools: index(pools),
            loaded_at: Instant::now(),
            ttl,
        }
    }

    /// Replace every pool with a freshly fetched set
    pub fn replace(&mut self, pools: Vec<Pool>) {
        self.pools = index(pools);
        self.loaded_at = Instant::now();
    }

    pub fn get(&self, pool_name: &str) -> Result<&Pool> {
        self.pools
            .get(pool_name)
            .ok_or_else(|| EngineError::PoolNotFound(pool_name.to_string()))
    }

    pub fn get_by_id(&self, pool_id: &str) -> Result<&Pool> {
        self.pools
            .values()
            .find(|pool| pool.pool_id == pool_id)
            .ok_or_else(|| EngineError::PoolNotFound(pool_id.to_string()))
    }

    /// Bind a pool to the exchange's price scalar
    pub fn market(&self, pool_name: &str, price_scalar_exponent: u32) -> Result<Market> {
        Market::new(self.get(pool_name)?.clone(), price_scalar_exponent)
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Instant::now())
    }

    pub fn is_stale_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.loaded_at) >= self.ttl
    }

    /// Names of every registered pool, sorted
    pub fn pool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.pools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

fn index(pools: Vec<Pool>) -> HashMap<String, Pool> {
    pools
        .into_iter()
        .map(|pool| (pool.pool_name.clone(), pool))
        .collect()
}
