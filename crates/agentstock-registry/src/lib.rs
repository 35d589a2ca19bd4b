//! AgentStock Registry
//!
//! Maps each agent wallet to its immutable identity (creator, dedicated
//! stock token) and its mutable quoted price.
//!
//! # Invariants
//!
//! 1. Wallet addresses are globally unique; registration of a known
//!    wallet fails with `DuplicateAgent`
//! 2. Creator, wallet, and stock-token bindings never change after
//!    registration; only the price mutates
//! 3. Records are never deleted (registration is one-way:
//!    Unregistered -> Active)

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use agentstock_types::{Address, MerchantError, Result, TokenAddress, UsdcAmount};
use agentstock_token::{StockToken, StockTokenFactory};
use tokio::sync::RwLock;
use tracing::info;

/// One registered agent.
///
/// The stock token is carried as a capability handle: the registry (and
/// through it the merchant) is the only holder of mint/burn authority
/// over the instance.
#[derive(Clone)]
pub struct AgentInfo {
    pub wallet_address: Address,
    pub creator_address: Address,
    pub stock_token_address: TokenAddress,
    pub stock_token: Arc<dyn StockToken>,
    pub price_per_token: UsdcAmount,
}

impl fmt::Debug for AgentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentInfo")
            .field("wallet_address", &self.wallet_address)
            .field("creator_address", &self.creator_address)
            .field("stock_token_address", &self.stock_token_address)
            .field("price_per_token", &self.price_per_token)
            .finish()
    }
}

#[derive(Default)]
struct RegistryState {
    /// Wallet-keyed agent records
    agents: HashMap<Address, AgentInfo>,
    /// Creator -> agent wallets in registration order (append-only)
    creator_index: HashMap<Address, Vec<Address>>,
    /// Stock token -> owning agent wallet (set once, never mutated)
    token_index: HashMap<TokenAddress, Address>,
}

/// The agent registry.
///
/// Cheaply cloneable; clones share state.
#[derive(Clone)]
pub struct AgentRegistry {
    factory: Arc<dyn StockTokenFactory>,
    state: Arc<RwLock<RegistryState>>,
}

impl AgentRegistry {
    /// Create an empty registry deploying stock tokens through `factory`.
    pub fn new(factory: Arc<dyn StockTokenFactory>) -> Self {
        Self {
            factory,
            state: Arc::new(RwLock::new(RegistryState::default())),
        }
    }

    /// Register a new agent and deploy its dedicated stock token.
    ///
    /// `initial_price` is fixed by the caller at one whole unit of the
    /// configured stable currency. Returns the new record.
    pub async fn register(
        &self,
        creator: &Address,
        wallet: &Address,
        name: &str,
        symbol: &str,
        initial_price: UsdcAmount,
    ) -> Result<AgentInfo> {
        let mut state = self.state.write().await;

        if state.agents.contains_key(wallet) {
            return Err(MerchantError::DuplicateAgent {
                wallet: wallet.to_string(),
            });
        }

        let stock_token = self.factory.deploy(name, symbol).await;
        let stock_token_address = stock_token.address();

        let info = AgentInfo {
            wallet_address: wallet.clone(),
            creator_address: creator.clone(),
            stock_token_address: stock_token_address.clone(),
            stock_token,
            price_per_token: initial_price,
        };

        state.agents.insert(wallet.clone(), info.clone());
        state
            .creator_index
            .entry(creator.clone())
            .or_default()
            .push(wallet.clone());
        state.token_index.insert(stock_token_address.clone(), wallet.clone());

        info!(
            wallet = %wallet,
            creator = %creator,
            stock_token = %stock_token_address,
            "agent registered"
        );

        Ok(info)
    }

    /// Look up an agent record by its operating wallet.
    pub async fn lookup_by_wallet(&self, wallet: &Address) -> Option<AgentInfo> {
        self.state.read().await.agents.get(wallet).cloned()
    }

    /// Reverse lookup from a stock token address to its owning wallet.
    pub async fn lookup_by_stock_token(&self, token: &TokenAddress) -> Option<Address> {
        self.state.read().await.token_index.get(token).cloned()
    }

    /// Agent wallets registered by a creator, in registration order.
    pub async fn agents_by_creator(&self, creator: &Address) -> Vec<Address> {
        self.state
            .read()
            .await
            .creator_index
            .get(creator)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace an agent's quoted price. Used only by batch fulfillment;
    /// returns the prior price.
    pub async fn set_price(&self, wallet: &Address, new_price: UsdcAmount) -> Result<UsdcAmount> {
        let mut state = self.state.write().await;
        let info = state
            .agents
            .get_mut(wallet)
            .ok_or_else(|| MerchantError::NotAnAgent {
                wallet: wallet.to_string(),
            })?;
        let old_price = info.price_per_token;
        info.price_per_token = new_price;
        Ok(old_price)
    }

    /// Number of registered agents.
    pub async fn len(&self) -> usize {
        self.state.read().await.agents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.agents.is_empty()
    }
}
