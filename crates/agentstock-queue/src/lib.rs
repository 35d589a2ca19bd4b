//! AgentStock Sell Queue
//!
//! Per-stock-token ordered list of pending redemption requests, merged
//! per seller. Pure queue state: the orchestrator burns stock tokens
//! before committing an entry here, and pays entries out when it drains
//! the queue.
//!
//! # Invariants
//!
//! 1. At most one entry per distinct seller per queue; re-submission
//!    merges additively in place (position unchanged)
//! 2. Entry order is first-commit insertion order of distinct sellers,
//!    deterministic for reproducible event logs
//! 3. Entries leave the queue only through a full drain

use std::collections::HashMap;
use std::sync::Arc;

use agentstock_types::{Address, Result, SellRequest, TokenAddress, TokenAmount};
use tokio::sync::RwLock;

/// The sell queue. Cheaply cloneable; clones share state.
#[derive(Clone, Default)]
pub struct SellQueue {
    queues: Arc<RwLock<HashMap<TokenAddress, Vec<SellRequest>>>>,
}

impl SellQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sell commitment for `seller`.
    ///
    /// If the seller already has a pending entry its amount is
    /// incremented in place; otherwise a new entry is appended.
    pub async fn commit(
        &self,
        stock_token: &TokenAddress,
        seller: &Address,
        amount: TokenAmount,
    ) -> Result<()> {
        let mut queues = self.queues.write().await;
        let queue = queues.entry(stock_token.clone()).or_default();

        match queue
            .iter_mut()
            .find(|request| &request.seller_address == seller)
        {
            Some(request) => {
                request.token_amount = request.token_amount.checked_add(amount)?;
            }
            None => queue.push(SellRequest {
                seller_address: seller.clone(),
                token_amount: amount,
            }),
        }
        Ok(())
    }

    /// Return the full queue contents and atomically empty it.
    pub async fn drain(&self, stock_token: &TokenAddress) -> Vec<SellRequest> {
        let mut queues = self.queues.write().await;
        queues.remove(stock_token).unwrap_or_default()
    }

    /// A copy of the queue without consuming it.
    pub async fn snapshot(&self, stock_token: &TokenAddress) -> Vec<SellRequest> {
        self.queues
            .read()
            .await
            .get(stock_token)
            .cloned()
            .unwrap_or_default()
    }

    /// Read a single entry by position (first-commit order).
    pub async fn get(&self, stock_token: &TokenAddress, index: usize) -> Option<SellRequest> {
        self.queues
            .read()
            .await
            .get(stock_token)
            .and_then(|queue| queue.get(index).cloned())
    }

    /// Number of pending entries for a stock token.
    pub async fn len(&self, stock_token: &TokenAddress) -> usize {
        self.queues
            .read()
            .await
            .get(stock_token)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub async fn is_empty(&self, stock_token: &TokenAddress) -> bool {
        self.len(stock_token).await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_commit_appends_distinct_sellers_in_order() {
        let queue = SellQueue::new();
        let token = TokenAddress::new();
        let first = Address::new();
        let second = Address::new();

        queue.commit(&token, &first, TokenAmount::new(40)).await.unwrap();
        queue.commit(&token, &second, TokenAmount::new(10)).await.unwrap();

        assert_eq!(queue.len(&token).await, 2);
        assert_eq!(queue.get(&token, 0).await.unwrap().seller_address, first);
        assert_eq!(queue.get(&token, 1).await.unwrap().seller_address, second);
    }

    #[tokio::test]
    async fn test_resubmission_merges_in_place() {
        let queue = SellQueue::new();
        let token = TokenAddress::new();
        let seller = Address::new();
        let other = Address::new();

        queue.commit(&token, &seller, TokenAmount::new(30)).await.unwrap();
        queue.commit(&token, &other, TokenAmount::new(5)).await.unwrap();
        queue.commit(&token, &seller, TokenAmount::new(20)).await.unwrap();

        // Still two entries, seller merged at its original position
        assert_eq!(queue.len(&token).await, 2);
        let merged = queue.get(&token, 0).await.unwrap();
        assert_eq!(merged.seller_address, seller);
        assert_eq!(merged.token_amount, TokenAmount::new(50));
    }

    #[tokio::test]
    async fn test_drain_empties_queue() {
        let queue = SellQueue::new();
        let token = TokenAddress::new();
        let seller = Address::new();

        queue.commit(&token, &seller, TokenAmount::new(60)).await.unwrap();

        let drained = queue.drain(&token).await;
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].token_amount, TokenAmount::new(60));
        assert!(queue.is_empty(&token).await);

        // Draining again yields nothing
        assert!(queue.drain(&token).await.is_empty());
    }

    #[tokio::test]
    async fn test_queues_are_isolated_per_token() {
        let queue = SellQueue::new();
        let token_a = TokenAddress::new();
        let token_b = TokenAddress::new();
        let seller = Address::new();

        queue.commit(&token_a, &seller, TokenAmount::new(1)).await.unwrap();

        assert_eq!(queue.len(&token_a).await, 1);
        assert_eq!(queue.len(&token_b).await, 0);

        queue.drain(&token_a).await;
        assert!(queue.is_empty(&token_a).await);
    }

    #[tokio::test]
    async fn test_snapshot_does_not_consume() {
        let queue = SellQueue::new();
        let token = TokenAddress::new();

        queue
            .commit(&token, &Address::new(), TokenAmount::new(7))
            .await
            .unwrap();

        let snapshot = queue.snapshot(&token).await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(queue.len(&token).await, 1);
    }
}
