//! Emitted facts
//!
//! Every consequential ledger operation appends a `MerchantEvent` to
//! the merchant's append-only log for external indexers. Field sets
//! mirror the operations that produce them.

use crate::{Address, TokenAddress, TokenAmount, UsdcAmount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fact emitted by the merchant ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantEvent {
    pub kind: MerchantEventKind,
    pub emitted_at: DateTime<Utc>,
}

impl MerchantEvent {
    pub fn now(kind: MerchantEventKind) -> Self {
        Self {
            kind,
            emitted_at: Utc::now(),
        }
    }
}

/// The emitted fact itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MerchantEventKind {
    /// A new agent was registered and its stock token deployed
    AgentCreated {
        wallet_address: Address,
        creator_address: Address,
        stock_token_address: TokenAddress,
        name: String,
        symbol: String,
        initial_price: UsdcAmount,
    },
    /// A buyer purchased freshly minted stock tokens
    StockPurchased {
        buyer: Address,
        agent_wallet_address: Address,
        stock_token_address: TokenAddress,
        token_amount: TokenAmount,
        usdc_amount: UsdcAmount,
    },
    /// A seller burned stock and joined (or topped up) the sell queue;
    /// `token_amount` is this commit's amount, not the running total
    SellStockRequested {
        seller: Address,
        stock_token_address: TokenAddress,
        token_amount: TokenAmount,
    },
    /// The agent paid out its entire sell queue in one batch
    SellRequestFulfilled {
        agent_wallet_address: Address,
        stock_token_address: TokenAddress,
        total_token_amount: TokenAmount,
        total_usdc_paid: UsdcAmount,
        new_price_per_token: UsdcAmount,
    },
    /// The quoted price moved at batch fulfillment
    PricePerTokenUpdated {
        agent_wallet_address: Address,
        old_price_per_token: UsdcAmount,
        new_price_per_token: UsdcAmount,
    },
    /// The ledger owner swapped the stable-currency reference
    UsdcTokenAddressUpdated {
        old_address: TokenAddress,
        new_address: TokenAddress,
    },
}
