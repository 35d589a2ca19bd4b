//! AgentStock Token - collaborator boundary
//!
//! The core ledger never implements fungible-token mechanics itself. It
//! talks to two kinds of external token contracts through the traits in
//! this crate:
//!
//! - [`StockToken`]: one dedicated instance per agent. The ledger is
//!   the sole authorized minter/burner; end users only hold balances.
//! - [`StableCurrency`]: the payment asset, a transferable balance
//!   ledger with `transfer_from`/`balance_of` semantics.
//!
//! New stock tokens are deployed through a [`StockTokenFactory`], so
//! the ledger holds capability handles rather than constructing token
//! types directly.
//!
//! The in-memory implementations here follow the real rules (explicit
//! balance checks, no negative balances) and back the test suites and
//! demo wiring.

use std::collections::HashMap;
use std::sync::Arc;

use agentstock_types::{Address, TokenAddress, TokenAmount, UsdcAmount};
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors surfaced by token collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Insufficient token balance: have {available}, need {required}")]
    InsufficientBalance { available: u64, required: u64 },

    #[error("Insufficient currency balance: have {available}, need {required}")]
    InsufficientCurrency { available: u128, required: u128 },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Balance overflow")]
    BalanceOverflow,
}

pub type Result<T> = std::result::Result<T, TokenError>;

/// A dedicated per-agent stock token.
///
/// The merchant ledger is the only caller of `mint`/`burn`; holders
/// interact with the token only through balances and transfers outside
/// this boundary.
#[async_trait::async_trait]
pub trait StockToken: Send + Sync {
    /// The deployed instance's address.
    fn address(&self) -> TokenAddress;

    /// Token name given at deployment.
    fn name(&self) -> &str;

    /// Token symbol given at deployment.
    fn symbol(&self) -> &str;

    /// Mint new tokens to a holder.
    async fn mint(&self, to: &Address, amount: TokenAmount) -> Result<()>;

    /// Burn tokens from a holder. Fails if the holder lacks them.
    async fn burn(&self, from: &Address, amount: TokenAmount) -> Result<()>;

    /// Current balance of a holder.
    async fn balance_of(&self, holder: &Address) -> TokenAmount;

    /// Total minted supply net of burns.
    async fn total_supply(&self) -> TokenAmount;
}

/// The stable payment currency.
///
/// Callers are expected to have authorized the ledger as a spender (or
/// to pay the counterparty directly) before any operation that moves
/// their funds; the allowance mechanics live behind this boundary.
#[async_trait::async_trait]
pub trait StableCurrency: Send + Sync {
    /// The deployed instance's address.
    fn address(&self) -> TokenAddress;

    /// Number of decimal places in minor units.
    fn decimals(&self) -> u8;

    /// Move funds between two accounts.
    async fn transfer_from(
        &self,
        owner: &Address,
        recipient: &Address,
        amount: UsdcAmount,
    ) -> Result<()>;

    /// Current balance of an account.
    async fn balance_of(&self, account: &Address) -> UsdcAmount;
}

/// Deploys fresh stock token instances for newly registered agents.
#[async_trait::async_trait]
pub trait StockTokenFactory: Send + Sync {
    async fn deploy(&self, name: &str, symbol: &str) -> Arc<dyn StockToken>;
}

/// In-memory stock token, one instance per agent.
pub struct InMemoryStockToken {
    address: TokenAddress,
    name: String,
    symbol: String,
    balances: RwLock<HashMap<Address, u64>>,
    total_supply: RwLock<u64>,
}

impl InMemoryStockToken {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            address: TokenAddress::new(),
            name: name.into(),
            symbol: symbol.into(),
            balances: RwLock::new(HashMap::new()),
            total_supply: RwLock::new(0),
        }
    }
}

#[async_trait::async_trait]
impl StockToken for InMemoryStockToken {
    fn address(&self) -> TokenAddress {
        self.address.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    async fn mint(&self, to: &Address, amount: TokenAmount) -> Result<()> {
        if amount.is_zero() {
            return Err(TokenError::InvalidAmount {
                message: "Amount must be greater than zero".to_string(),
            });
        }

        let mut balances = self.balances.write().await;
        let mut supply = self.total_supply.write().await;

        let balance = balances.entry(to.clone()).or_insert(0);
        let new_balance = balance
            .checked_add(amount.0)
            .ok_or(TokenError::BalanceOverflow)?;
        let new_supply = supply
            .checked_add(amount.0)
            .ok_or(TokenError::BalanceOverflow)?;

        *balance = new_balance;
        *supply = new_supply;
        Ok(())
    }

    async fn burn(&self, from: &Address, amount: TokenAmount) -> Result<()> {
        if amount.is_zero() {
            return Err(TokenError::InvalidAmount {
                message: "Amount must be greater than zero".to_string(),
            });
        }

        let mut balances = self.balances.write().await;
        let mut supply = self.total_supply.write().await;

        let balance = balances.get_mut(from).ok_or(TokenError::InsufficientBalance {
            available: 0,
            required: amount.0,
        })?;
        let new_balance =
            balance
                .checked_sub(amount.0)
                .ok_or(TokenError::InsufficientBalance {
                    available: *balance,
                    required: amount.0,
                })?;

        *balance = new_balance;
        *supply -= amount.0;
        Ok(())
    }

    async fn balance_of(&self, holder: &Address) -> TokenAmount {
        TokenAmount(self.balances.read().await.get(holder).copied().unwrap_or(0))
    }

    async fn total_supply(&self) -> TokenAmount {
        TokenAmount(*self.total_supply.read().await)
    }
}

/// Factory producing [`InMemoryStockToken`] instances.
#[derive(Default)]
pub struct InMemoryTokenFactory;

impl InMemoryTokenFactory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl StockTokenFactory for InMemoryTokenFactory {
    async fn deploy(&self, name: &str, symbol: &str) -> Arc<dyn StockToken> {
        Arc::new(InMemoryStockToken::new(name, symbol))
    }
}

/// In-memory stable currency.
///
/// Carries a free `mint` used to seed balances in tests and demos; a
/// production deployment binds a real currency contract behind
/// [`StableCurrency`] instead.
pub struct InMemoryStableCurrency {
    address: TokenAddress,
    name: String,
    symbol: String,
    decimals: u8,
    balances: RwLock<HashMap<Address, u128>>,
}

impl InMemoryStableCurrency {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            address: TokenAddress::new(),
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            balances: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Seed an account balance.
    pub async fn mint(&self, to: &Address, amount: UsdcAmount) -> Result<()> {
        let mut balances = self.balances.write().await;
        let balance = balances.entry(to.clone()).or_insert(0);
        *balance = balance
            .checked_add(amount.0)
            .ok_or(TokenError::BalanceOverflow)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl StableCurrency for InMemoryStableCurrency {
    fn address(&self) -> TokenAddress {
        self.address.clone()
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    async fn transfer_from(
        &self,
        owner: &Address,
        recipient: &Address,
        amount: UsdcAmount,
    ) -> Result<()> {
        let mut balances = self.balances.write().await;

        let available = balances.get(owner).copied().unwrap_or(0);
        let remaining = available
            .checked_sub(amount.0)
            .ok_or(TokenError::InsufficientCurrency {
                available,
                required: amount.0,
            })?;

        balances.insert(owner.clone(), remaining);
        let recipient_balance = balances.entry(recipient.clone()).or_insert(0);
        *recipient_balance = recipient_balance
            .checked_add(amount.0)
            .ok_or(TokenError::BalanceOverflow)?;
        Ok(())
    }

    async fn balance_of(&self, account: &Address) -> UsdcAmount {
        UsdcAmount(self.balances.read().await.get(account).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mint_and_burn() {
        let token = InMemoryStockToken::new("Test Agent", "TAGENT");
        let holder = Address::new();

        token.mint(&holder, TokenAmount::new(100)).await.unwrap();
        assert_eq!(token.balance_of(&holder).await, TokenAmount::new(100));
        assert_eq!(token.total_supply().await, TokenAmount::new(100));

        token.burn(&holder, TokenAmount::new(40)).await.unwrap();
        assert_eq!(token.balance_of(&holder).await, TokenAmount::new(60));
        assert_eq!(token.total_supply().await, TokenAmount::new(60));
    }

    #[tokio::test]
    async fn test_burn_exceeds_balance() {
        let token = InMemoryStockToken::new("Test Agent", "TAGENT");
        let holder = Address::new();

        token.mint(&holder, TokenAmount::new(10)).await.unwrap();
        let result = token.burn(&holder, TokenAmount::new(20)).await;

        assert!(matches!(
            result,
            Err(TokenError::InsufficientBalance {
                available: 10,
                required: 20
            })
        ));
        // Balance untouched on failure
        assert_eq!(token.balance_of(&holder).await, TokenAmount::new(10));
    }

    #[tokio::test]
    async fn test_zero_amount_rejected() {
        let token = InMemoryStockToken::new("Test Agent", "TAGENT");
        let holder = Address::new();

        assert!(token.mint(&holder, TokenAmount::zero()).await.is_err());
        assert!(token.burn(&holder, TokenAmount::zero()).await.is_err());
    }

    #[tokio::test]
    async fn test_currency_transfer_from() {
        let usdc = InMemoryStableCurrency::new("USD Coin", "USDC", 6);
        let payer = Address::new();
        let payee = Address::new();

        usdc.mint(&payer, UsdcAmount::new(1_000_000)).await.unwrap();
        usdc.transfer_from(&payer, &payee, UsdcAmount::new(400_000))
            .await
            .unwrap();

        assert_eq!(usdc.balance_of(&payer).await, UsdcAmount::new(600_000));
        assert_eq!(usdc.balance_of(&payee).await, UsdcAmount::new(400_000));
    }

    #[tokio::test]
    async fn test_currency_transfer_insufficient() {
        let usdc = InMemoryStableCurrency::new("USD Coin", "USDC", 6);
        let payer = Address::new();
        let payee = Address::new();

        let result = usdc
            .transfer_from(&payer, &payee, UsdcAmount::new(1))
            .await;
        assert!(matches!(
            result,
            Err(TokenError::InsufficientCurrency { .. })
        ));
    }

    #[tokio::test]
    async fn test_factory_deploys_distinct_instances() {
        let factory = InMemoryTokenFactory::new();
        let a = factory.deploy("Agent A", "AGA").await;
        let b = factory.deploy("Agent B", "AGB").await;

        assert_ne!(a.address(), b.address());
        assert_eq!(a.name(), "Agent A");
        assert_eq!(b.symbol(), "AGB");
    }
}
