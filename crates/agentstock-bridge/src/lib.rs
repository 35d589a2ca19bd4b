//! AgentStock Bridge - cross-chain stable-currency boundary
//!
//! Moving stable-currency liquidity between chains happens outside the
//! core ledger: burn on the source chain through a token messenger,
//! poll the attestation service until the message is complete, then
//! submit the attestation to the destination chain's message
//! transmitter to mint. The ledger only ever consumes the resulting
//! minted balance, so this crate defines the boundary and nothing else.

use agentstock_types::{Address, UsdcAmount};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by a bridge workflow implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Burn failed on source domain {domain}: {message}")]
    BurnFailed { domain: u32, message: String },

    #[error("Attestation not found for message {message_hash}")]
    AttestationNotFound { message_hash: String },

    #[error("Mint failed on destination domain {domain}: {message}")]
    MintFailed { domain: u32, message: String },
}

pub type Result<T> = std::result::Result<T, BridgeError>;

/// A chain domain in the bridge network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainId(pub u32);

/// Status reported by the attestation service for a burn message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttestationStatus {
    /// Message seen but not yet attested
    PendingConfirmations,
    /// Attestation ready; carries the signature bytes to submit
    Complete { attestation: String },
}

/// One in-flight transfer of stable currency between chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeTransfer {
    /// Hash of the burn message, used to poll the attestation service
    pub message_hash: String,
    pub source_domain: DomainId,
    pub destination_domain: DomainId,
    /// Recipient on the destination chain
    pub recipient: Address,
    pub amount: UsdcAmount,
}

/// The bridge workflow the deployment tooling drives.
///
/// The core ledger has no dependency on this trait; implementations
/// live with the tooling that operates the bridge.
#[async_trait::async_trait]
pub trait CurrencyBridge: Send + Sync {
    /// Burn stable currency on the source chain for the given
    /// destination recipient. Returns the in-flight transfer.
    async fn deposit_for_burn(
        &self,
        from: &Address,
        amount: UsdcAmount,
        destination: DomainId,
        recipient: &Address,
    ) -> Result<BridgeTransfer>;

    /// Poll the attestation service for a burn message.
    async fn attestation_status(&self, message_hash: &str) -> Result<AttestationStatus>;

    /// Submit a complete attestation to the destination message
    /// transmitter, minting to the transfer's recipient.
    async fn receive_message(&self, transfer: &BridgeTransfer, attestation: &str) -> Result<()>;
}
