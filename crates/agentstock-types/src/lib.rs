//! Canonical types for AgentStock
//!
//! These types form the foundation of the marketplace ledger:
//! - [`Address`] and [`TokenAddress`] identify wallets and token instances
//! - [`TokenAmount`] and [`UsdcAmount`] carry whole-token counts and
//!   stable-currency minor units with checked arithmetic
//! - [`MerchantError`] is the full error taxonomy for ledger operations
//! - [`MerchantEvent`] enumerates every fact the ledger emits

mod address;
mod amount;
mod error;
mod event;

pub use address::{Address, TokenAddress};
pub use amount::{TokenAmount, UsdcAmount};
pub use error::{MerchantError, Result};
pub use event::{MerchantEvent, MerchantEventKind};

/// A pending redemption: one seller's accumulated commitment to sell
/// stock tokens back to the agent.
///
/// At most one `SellRequest` per distinct seller exists in a given
/// queue; re-submission merges additively into the existing entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SellRequest {
    pub seller_address: Address,
    pub token_amount: TokenAmount,
}
