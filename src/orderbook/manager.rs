//! Order book manager
//!
//! Manages order books for several pools.

use std::collections::HashMap;

use super::{OrderBook, OrderBookState, SnapshotUpdate};
use crate::parser::OrderBookSnapshot;

/// Manages order books for multiple pools
#[derive(Debug)]
pub struct OrderBookManager {
    books: HashMap<String, OrderBook>,
    max_depth: usize,
}

impl Default for OrderBookManager {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderBookManager {
    /// Create a new order book manager
    pub fn new() -> Self {
        Self::with_depth(30)
    }

    /// Create with custom depth
    pub fn with_depth(max_depth: usize) -> Self {
        Self {
            books: HashMap::new(),
            max_depth,
        }
    }

    /// Replace the snapshot for a pool, creating its book on first use
    pub fn replace_snapshot(
        &mut self,
        pool_name: &str,
        snapshot: OrderBookSnapshot,
    ) -> SnapshotUpdate {
        let max_depth = self.max_depth;
        self.books
            .entry(pool_name.to_string())
            .or_insert_with(|| OrderBook::new(pool_name, max_depth))
            .replace_snapshot(snapshot)
    }

    pub fn book(&self, pool_name: &str) -> Option<&OrderBook> {
        self.books.get(pool_name)
    }

    /// Get the state of a specific book
    pub fn get_state(&self, pool_name: &str) -> Option<OrderBookState> {
        self.books.get(pool_name).map(|book| book.state())
    }

    /// Get states of all books
    pub fn get_all_states(&self) -> Vec<OrderBookState> {
        self.books.values().map(|book| book.state()).collect()
    }

    /// Check if a book is initialized
    pub fn is_initialized(&self, pool_name: &str) -> bool {
        self.books
            .get(pool_name)
            .map(|book| book.is_initialized())
            .unwrap_or(false)
    }

    /// Get the snapshot version for a pool
    pub fn version(&self, pool_name: &str) -> Option<u64> {
        self.books.get(pool_name).map(|book| book.version())
    }

    /// Get list of pools being tracked
    pub fn pool_names(&self) -> Vec<String> {
        self.books.keys().cloned().collect()
    }

    /// Check if a pool exists
    pub fn has_pool(&self, pool_name: &str) -> bool {
        self.books.contains_key(pool_name)
    }
}
