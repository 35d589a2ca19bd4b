//! AgentStock Merchant - marketplace ledger orchestrator
//!
//! The merchant ledger owns the agent registry, the per-token sell
//! queues, and the single authorized stable-currency reference. Every
//! public operation validates its request, mutates registry/queue
//! state, and issues calls into the token collaborators as one atomic
//! unit: a failed operation leaves no partial state behind.
//!
//! State machine per agent wallet: `Unregistered -> Active`, one-way.
//!
//! # Invariants
//!
//! 1. Operations are totally ordered by submission order (a single
//!    operation mutex serializes all mutating entry points)
//! 2. A failed fulfillment leaves the sell queue exactly as before
//! 3. Every consequential operation appends its facts to the
//!    append-only event log

mod pricing;

pub use pricing::{InverseLinearDecay, RepricingStrategy, PRICE_FLOOR};

pub use agentstock_registry::AgentInfo;

use std::collections::HashMap;
use std::sync::Arc;

use agentstock_queue::SellQueue;
use agentstock_registry::AgentRegistry;
use agentstock_token::{StableCurrency, StockTokenFactory, TokenError};
use agentstock_types::{
    Address, MerchantError, MerchantEvent, MerchantEventKind, Result, SellRequest, TokenAddress,
    TokenAmount, UsdcAmount,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// Outcome of a batch fulfillment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentSummary {
    pub total_token_amount: TokenAmount,
    pub total_usdc_paid: UsdcAmount,
    pub new_price_per_token: UsdcAmount,
}

struct CurrencyState {
    currency: Arc<dyn StableCurrency>,
    /// Bumped on every currency swap; used to flag sell requests that
    /// were committed against a previous currency.
    epoch: u64,
}

/// The merchant ledger.
///
/// Cheaply cloneable; clones share state.
#[derive(Clone)]
pub struct MerchantLedger {
    owner: Address,
    registry: AgentRegistry,
    queue: SellQueue,
    pricing: Arc<dyn RepricingStrategy>,
    currency: Arc<RwLock<CurrencyState>>,
    /// Currency epoch at the oldest outstanding commit, per stock token
    commit_epochs: Arc<RwLock<HashMap<TokenAddress, u64>>>,
    events: Arc<RwLock<Vec<MerchantEvent>>>,
    /// Serializes mutating operations (submission-order total order)
    op_lock: Arc<Mutex<()>>,
}

impl MerchantLedger {
    /// Create a ledger with the default repricing strategy.
    ///
    /// `owner` is the only identity allowed to swap the stable-currency
    /// reference; it is fixed at construction.
    pub fn new(
        owner: Address,
        usdc: Arc<dyn StableCurrency>,
        factory: Arc<dyn StockTokenFactory>,
    ) -> Self {
        Self::with_pricing(owner, usdc, factory, Arc::new(InverseLinearDecay::default()))
    }

    /// Create a ledger with a custom repricing strategy.
    pub fn with_pricing(
        owner: Address,
        usdc: Arc<dyn StableCurrency>,
        factory: Arc<dyn StockTokenFactory>,
        pricing: Arc<dyn RepricingStrategy>,
    ) -> Self {
        Self {
            owner,
            registry: AgentRegistry::new(factory),
            queue: SellQueue::new(),
            pricing,
            currency: Arc::new(RwLock::new(CurrencyState {
                currency: usdc,
                epoch: 0,
            })),
            commit_epochs: Arc::new(RwLock::new(HashMap::new())),
            events: Arc::new(RwLock::new(Vec::new())),
            op_lock: Arc::new(Mutex::new(())),
        }
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Register a new agent wallet and deploy its dedicated stock token.
    ///
    /// The caller becomes the recorded creator; no access restriction
    /// beyond wallet uniqueness. Initial price is one whole unit of the
    /// configured stable currency.
    pub async fn create_agent(
        &self,
        creator: &Address,
        wallet: &Address,
        name: &str,
        symbol: &str,
    ) -> Result<AgentInfo> {
        let _guard = self.op_lock.lock().await;

        let initial_price = {
            let state = self.currency.read().await;
            UsdcAmount::one_unit(state.currency.decimals())
        };

        let info = self
            .registry
            .register(creator, wallet, name, symbol, initial_price)
            .await?;

        self.emit(MerchantEventKind::AgentCreated {
            wallet_address: info.wallet_address.clone(),
            creator_address: info.creator_address.clone(),
            stock_token_address: info.stock_token_address.clone(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            initial_price,
        })
        .await;

        Ok(info)
    }

    /// Buy `amount` freshly minted stock tokens at the quoted price.
    ///
    /// Cost is paid in stable currency directly to the agent's own
    /// wallet, not to the ledger.
    pub async fn purchase_stock(
        &self,
        buyer: &Address,
        stock_token: &TokenAddress,
        amount: TokenAmount,
    ) -> Result<UsdcAmount> {
        let _guard = self.op_lock.lock().await;

        if amount.is_zero() {
            return Err(MerchantError::InvalidAmount {
                message: "Purchase amount must be greater than zero".to_string(),
            });
        }

        let info = self.resolve_by_stock_token(stock_token).await?;
        let cost = info.price_per_token.checked_mul_tokens(amount)?;

        let currency = self.currency.read().await.currency.clone();
        let available = currency.balance_of(buyer).await;
        if available < cost {
            return Err(MerchantError::InsufficientFunds {
                available: available.0,
                required: cost.0,
            });
        }

        currency
            .transfer_from(buyer, &info.wallet_address, cost)
            .await
            .map_err(map_token_error)?;
        info.stock_token
            .mint(buyer, amount)
            .await
            .map_err(map_token_error)?;

        info!(
            buyer = %buyer,
            agent = %info.wallet_address,
            amount = %amount,
            cost = %cost,
            "stock purchased"
        );

        self.emit(MerchantEventKind::StockPurchased {
            buyer: buyer.clone(),
            agent_wallet_address: info.wallet_address.clone(),
            stock_token_address: stock_token.clone(),
            token_amount: amount,
            usdc_amount: cost,
        })
        .await;

        Ok(cost)
    }

    /// Burn `amount` of the caller's stock tokens and join (or top up)
    /// the sell queue for later batch payout.
    pub async fn commit_sell_stock(
        &self,
        seller: &Address,
        stock_token: &TokenAddress,
        amount: TokenAmount,
    ) -> Result<()> {
        let _guard = self.op_lock.lock().await;

        if amount.is_zero() {
            return Err(MerchantError::InvalidAmount {
                message: "Sell amount must be greater than zero".to_string(),
            });
        }

        let info = self.resolve_by_stock_token(stock_token).await?;

        let held = info.stock_token.balance_of(seller).await;
        if held < amount {
            return Err(MerchantError::InsufficientTokenBalance {
                available: held.0,
                required: amount.0,
            });
        }

        info.stock_token
            .burn(seller, amount)
            .await
            .map_err(map_token_error)?;

        // Remember which currency generation this queue was opened
        // under, so fulfillment can flag cross-currency settlement.
        {
            let epoch = self.currency.read().await.epoch;
            let mut epochs = self.commit_epochs.write().await;
            if self.queue.is_empty(stock_token).await {
                epochs.insert(stock_token.clone(), epoch);
            }
        }

        self.queue.commit(stock_token, seller, amount).await?;

        info!(seller = %seller, stock_token = %stock_token, amount = %amount, "sell committed");

        self.emit(MerchantEventKind::SellStockRequested {
            seller: seller.clone(),
            stock_token_address: stock_token.clone(),
            token_amount: amount,
        })
        .await;

        Ok(())
    }

    /// Pay out the caller's entire sell queue in one batch and reprice.
    ///
    /// The caller must be the registered agent wallet itself; there is
    /// no token-address argument. Each drained request is paid at the
    /// price in effect when fulfillment begins; the price update is the
    /// last step of the atomic unit. An empty queue is a no-op success
    /// that emits nothing.
    pub async fn fulfill_sell_stock(&self, caller: &Address) -> Result<FulfillmentSummary> {
        let _guard = self.op_lock.lock().await;

        let info = self
            .registry
            .lookup_by_wallet(caller)
            .await
            .ok_or_else(|| MerchantError::NotAnAgent {
                wallet: caller.to_string(),
            })?;
        let stock_token = info.stock_token_address.clone();

        let requests = self.queue.snapshot(&stock_token).await;
        if requests.is_empty() {
            return Ok(FulfillmentSummary {
                total_token_amount: TokenAmount::zero(),
                total_usdc_paid: UsdcAmount::zero(),
                new_price_per_token: info.price_per_token,
            });
        }

        let price = info.price_per_token;
        let mut payouts = Vec::with_capacity(requests.len());
        let mut total_tokens = TokenAmount::zero();
        let mut total_paid = UsdcAmount::zero();
        for request in &requests {
            let payout = price.checked_mul_tokens(request.token_amount)?;
            total_tokens = total_tokens.checked_add(request.token_amount)?;
            total_paid = total_paid.checked_add(payout)?;
            payouts.push((request.seller_address.clone(), payout));
        }

        let (currency, current_epoch) = {
            let state = self.currency.read().await;
            (state.currency.clone(), state.epoch)
        };

        if let Some(committed_epoch) = self.commit_epochs.read().await.get(&stock_token) {
            if *committed_epoch != current_epoch {
                warn!(
                    stock_token = %stock_token,
                    committed_epoch,
                    current_epoch,
                    "fulfilling sell requests committed against a previous stable currency"
                );
            }
        }

        // Whole batch succeeds or fails: check cover before any transfer.
        let available = currency.balance_of(&info.wallet_address).await;
        if available < total_paid {
            return Err(MerchantError::InsufficientAgentFunds {
                available: available.0,
                required: total_paid.0,
            });
        }

        // The balance pre-check does not cover per-entry failures behind
        // the currency boundary (e.g. allowance shortfalls), so a
        // mid-batch failure unwinds the already-settled payouts before
        // surfacing the error.
        for (index, (seller, payout)) in payouts.iter().enumerate() {
            if let Err(err) = currency
                .transfer_from(&info.wallet_address, seller, *payout)
                .await
            {
                for (paid_seller, paid) in &payouts[..index] {
                    if let Err(unwind_err) = currency
                        .transfer_from(paid_seller, &info.wallet_address, *paid)
                        .await
                    {
                        warn!(
                            seller = %paid_seller,
                            amount = %paid,
                            error = %unwind_err,
                            "failed to unwind payout after mid-batch settlement failure"
                        );
                    }
                }
                return Err(map_agent_funds(err));
            }
        }

        // All payouts settled: consume the queue and reprice.
        self.queue.drain(&stock_token).await;
        self.commit_epochs.write().await.remove(&stock_token);

        let new_price = self.pricing.reprice(price, total_tokens);
        let old_price = self.registry.set_price(caller, new_price).await?;

        info!(
            agent = %caller,
            total_tokens = %total_tokens,
            total_paid = %total_paid,
            old_price = %old_price,
            new_price = %new_price,
            "sell queue fulfilled"
        );

        self.emit(MerchantEventKind::SellRequestFulfilled {
            agent_wallet_address: caller.clone(),
            stock_token_address: stock_token,
            total_token_amount: total_tokens,
            total_usdc_paid: total_paid,
            new_price_per_token: new_price,
        })
        .await;
        self.emit(MerchantEventKind::PricePerTokenUpdated {
            agent_wallet_address: caller.clone(),
            old_price_per_token: old_price,
            new_price_per_token: new_price,
        })
        .await;

        Ok(FulfillmentSummary {
            total_token_amount: total_tokens,
            total_usdc_paid: total_paid,
            new_price_per_token: new_price,
        })
    }

    /// Swap the stable-currency reference. Owner only; the zero address
    /// is rejected. All subsequent purchases and fulfillments settle in
    /// the new currency.
    pub async fn update_usdc_token_address(
        &self,
        caller: &Address,
        new_currency: Arc<dyn StableCurrency>,
    ) -> Result<()> {
        let _guard = self.op_lock.lock().await;

        if caller != &self.owner {
            return Err(MerchantError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        if new_currency.address().is_zero() {
            return Err(MerchantError::InvalidAddress);
        }

        let (old_address, new_address) = {
            let mut state = self.currency.write().await;
            let old_address = state.currency.address();
            let new_address = new_currency.address();
            state.currency = new_currency;
            state.epoch += 1;
            (old_address, new_address)
        };

        info!(old = %old_address, new = %new_address, "stable currency updated");

        self.emit(MerchantEventKind::UsdcTokenAddressUpdated {
            old_address,
            new_address,
        })
        .await;

        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// The ledger owner fixed at construction.
    pub fn owner(&self) -> &Address {
        &self.owner
    }

    /// Address of the currently configured stable currency.
    pub async fn usdc_token_address(&self) -> TokenAddress {
        self.currency.read().await.currency.address()
    }

    /// Agent record by operating wallet.
    pub async fn agent_info(&self, wallet: &Address) -> Option<AgentInfo> {
        self.registry.lookup_by_wallet(wallet).await
    }

    /// Owning wallet of a stock token.
    pub async fn wallet_by_stock_token(&self, token: &TokenAddress) -> Option<Address> {
        self.registry.lookup_by_stock_token(token).await
    }

    /// Agent wallets registered by a creator, in registration order.
    pub async fn agents_by_creator(&self, creator: &Address) -> Vec<Address> {
        self.registry.agents_by_creator(creator).await
    }

    /// Number of pending sell requests for a stock token.
    pub async fn sell_requests_len(&self, stock_token: &TokenAddress) -> usize {
        self.queue.len(stock_token).await
    }

    /// Pending sell request by position (first-commit order).
    pub async fn sell_request(
        &self,
        stock_token: &TokenAddress,
        index: usize,
    ) -> Option<SellRequest> {
        self.queue.get(stock_token, index).await
    }

    /// The full emitted event log, oldest first.
    pub async fn events(&self) -> Vec<MerchantEvent> {
        self.events.read().await.clone()
    }

    /// Events involving a specific agent wallet, oldest first.
    pub async fn events_for_agent(&self, wallet: &Address) -> Vec<MerchantEvent> {
        // Sell commits carry the stock token rather than the wallet, so
        // resolve the wallet's token once and match against it.
        let stock_token = self
            .registry
            .lookup_by_wallet(wallet)
            .await
            .map(|info| info.stock_token_address);
        self.events
            .read()
            .await
            .iter()
            .filter(|event| match &event.kind {
                MerchantEventKind::AgentCreated { wallet_address, .. } => wallet_address == wallet,
                MerchantEventKind::StockPurchased {
                    agent_wallet_address,
                    ..
                }
                | MerchantEventKind::SellRequestFulfilled {
                    agent_wallet_address,
                    ..
                }
                | MerchantEventKind::PricePerTokenUpdated {
                    agent_wallet_address,
                    ..
                } => agent_wallet_address == wallet,
                MerchantEventKind::SellStockRequested {
                    stock_token_address,
                    ..
                } => Some(stock_token_address) == stock_token.as_ref(),
                MerchantEventKind::UsdcTokenAddressUpdated { .. } => false,
            })
            .cloned()
            .collect()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn resolve_by_stock_token(&self, stock_token: &TokenAddress) -> Result<AgentInfo> {
        let wallet = self
            .registry
            .lookup_by_stock_token(stock_token)
            .await
            .ok_or_else(|| MerchantError::UnknownStockToken {
                token: stock_token.to_string(),
            })?;
        // The reverse index is written together with the record, so the
        // record must exist.
        self.registry
            .lookup_by_wallet(&wallet)
            .await
            .ok_or(MerchantError::NotAnAgent {
                wallet: wallet.to_string(),
            })
    }

    async fn emit(&self, kind: MerchantEventKind) {
        self.events.write().await.push(MerchantEvent::now(kind));
    }
}

fn map_token_error(err: TokenError) -> MerchantError {
    match err {
        TokenError::InsufficientBalance {
            available,
            required,
        } => MerchantError::InsufficientTokenBalance {
            available,
            required,
        },
        TokenError::InsufficientCurrency {
            available,
            required,
        } => MerchantError::InsufficientFunds {
            available,
            required,
        },
        TokenError::InvalidAmount { message } => MerchantError::InvalidAmount { message },
        TokenError::BalanceOverflow => MerchantError::AmountOverflow,
    }
}

/// Currency shortfalls during fulfillment belong to the agent wallet.
fn map_agent_funds(err: TokenError) -> MerchantError {
    match err {
        TokenError::InsufficientCurrency {
            available,
            required,
        } => MerchantError::InsufficientAgentFunds {
            available,
            required,
        },
        other => map_token_error(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_error_mapping() {
        assert_eq!(
            map_token_error(TokenError::InsufficientBalance {
                available: 10,
                required: 20
            }),
            MerchantError::InsufficientTokenBalance {
                available: 10,
                required: 20
            }
        );
        assert_eq!(
            map_token_error(TokenError::InsufficientCurrency {
                available: 1,
                required: 2
            }),
            MerchantError::InsufficientFunds {
                available: 1,
                required: 2
            }
        );
    }

    #[test]
    fn test_agent_funds_mapping() {
        // Same shortfall, attributed to the agent wallet at fulfillment
        assert_eq!(
            map_agent_funds(TokenError::InsufficientCurrency {
                available: 1,
                required: 2
            }),
            MerchantError::InsufficientAgentFunds {
                available: 1,
                required: 2
            }
        );
        assert_eq!(
            map_agent_funds(TokenError::BalanceOverflow),
            MerchantError::AmountOverflow
        );
    }
}
