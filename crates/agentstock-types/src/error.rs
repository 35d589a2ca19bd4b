//! Error taxonomy for the marketplace ledger
//!
//! Every failure aborts the whole enclosing operation with no partial
//! state change; there is no local recovery inside the core.

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, MerchantError>;

/// Ledger error taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerchantError {
    /// Agent wallet address already registered
    #[error("Agent wallet address already exists: {wallet}")]
    DuplicateAgent { wallet: String },

    /// Stock token address not bound to any agent
    #[error("Unknown stock token: {token}")]
    UnknownStockToken { token: String },

    /// Caller is not a registered agent wallet
    #[error("Not an agent wallet: {wallet}")]
    NotAnAgent { wallet: String },

    /// Buyer cannot cover the purchase cost
    #[error("Insufficient funds: have {available}, need {required}")]
    InsufficientFunds { available: u128, required: u128 },

    /// Agent wallet cannot cover the batch payout
    #[error("Insufficient agent funds: have {available}, need {required}")]
    InsufficientAgentFunds { available: u128, required: u128 },

    /// Seller holds fewer stock tokens than the commit amount
    #[error("Insufficient token balance: have {available}, need {required}")]
    InsufficientTokenBalance { available: u64, required: u64 },

    /// Caller is not the ledger owner
    #[error("Only owner can call this function: caller {caller}")]
    Unauthorized { caller: String },

    /// The zero address is never a valid token address
    #[error("Invalid token address")]
    InvalidAddress,

    /// Amounts must be positive whole-token counts
    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    /// Arithmetic overflow during amount computation
    #[error("Amount overflow during arithmetic operation")]
    AmountOverflow,

    /// Arithmetic underflow during amount computation
    #[error("Amount underflow during arithmetic operation")]
    AmountUnderflow,
}
