// Economy system core - business logic for galleons
//
// This module contains all the domain logic for the galleon ledger.
// It is platform-agnostic: no Discord types, only user and guild IDs.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::fmt;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// Represents a member's Gringotts vault in a specific guild.
#[derive(Debug, Clone)]
pub struct Wallet {
    pub user_id: u64,
    #[allow(dead_code)]
    pub guild_id: u64,
    pub balance: i64,
    pub last_daily: Option<DateTime<Utc>>,
    pub total_earned: i64,
}

impl Wallet {
    /// An empty vault for a member we have never seen.
    pub fn empty(user_id: u64, guild_id: u64) -> Self {
        Self {
            user_id,
            guild_id,
            balance: 0,
            last_daily: None,
            total_earned: 0,
        }
    }
}

/// Result of a successful daily claim.
#[derive(Debug, Clone)]
pub struct DailyClaimResult {
    pub galleons_awarded: i64,
    pub new_balance: i64,
    pub next_claim_time: DateTime<Utc>,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum EconomyError {
    InsufficientFunds { required: i64, available: i64 },
    OnCooldown { available_at: DateTime<Utc> },
    NonPositiveAmount(i64),
    SelfTransfer,
}

impl fmt::Display for EconomyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EconomyError::InsufficientFunds {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient funds: need {} galleons, but only have {}",
                    required, available
                )
            }
            EconomyError::OnCooldown { available_at } => {
                write!(f, "On cooldown until {}", available_at)
            }
            EconomyError::NonPositiveAmount(amount) => {
                write!(f, "Amount must be positive, got {}", amount)
            }
            EconomyError::SelfTransfer => write!(f, "Cannot transfer galleons to yourself"),
        }
    }
}

impl std::error::Error for EconomyError {}

// ============================================================================
// STORAGE TRAIT
// ============================================================================

/// Trait for storing galleon balances.
///
/// The bot only ships an in-memory implementation, but keeping the ledger
/// behind a trait lets the services be tested against any backing store.
#[async_trait]
pub trait GalleonStore: Send + Sync {
    /// Get a member's wallet, or an empty one if they have none yet.
    async fn get_wallet(&self, user_id: u64, guild_id: u64) -> Result<Wallet, EconomyError>;

    /// Subtract galleons if the balance covers them, returning the new balance.
    ///
    /// The check and the subtraction happen as one step, so a concurrent
    /// credit can never be overwritten.
    async fn try_debit(&self, user_id: u64, guild_id: u64, amount: i64)
        -> Result<i64, EconomyError>;

    /// Stamp `now` as the last daily claim unless the previous claim is
    /// younger than `cooldown`.
    async fn try_mark_daily(
        &self,
        user_id: u64,
        guild_id: u64,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> Result<(), EconomyError>;

    /// Add galleons and bump the total_earned counter, returning the new balance.
    async fn add_galleons(
        &self,
        user_id: u64,
        guild_id: u64,
        amount: i64,
    ) -> Result<i64, EconomyError>;

    /// Every wallet in a guild, in no particular order.
    async fn get_wallets(&self, guild_id: u64) -> Result<Vec<Wallet>, EconomyError>;

    /// Drop every wallet in a guild.
    async fn clear_guild(&self, guild_id: u64) -> Result<(), EconomyError>;
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the galleon economy.
#[derive(Debug, Clone)]
pub struct EconomyConfig {
    /// Smallest daily allowance.
    pub daily_min: i64,

    /// Largest daily allowance (inclusive).
    pub daily_max: i64,

    /// Cooldown period for daily claims (in hours).
    pub daily_cooldown_hours: i64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            daily_min: 10,
            daily_max: 30,
            daily_cooldown_hours: 24,
        }
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// The main service for galleon operations.
///
/// Generic over S: GalleonStore so we can swap implementations.
pub struct EconomyService<S: GalleonStore> {
    store: S,
    config: EconomyConfig,
}

impl<S: GalleonStore> EconomyService<S> {
    /// Create a new economy service with the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: EconomyConfig::default(),
        }
    }

    /// Get a member's current balance.
    pub async fn get_balance(&self, user_id: u64, guild_id: u64) -> Result<i64, EconomyError> {
        let wallet = self.store.get_wallet(user_id, guild_id).await?;
        Ok(wallet.balance)
    }

    /// Get a member's full wallet.
    pub async fn get_wallet(&self, user_id: u64, guild_id: u64) -> Result<Wallet, EconomyError> {
        self.store.get_wallet(user_id, guild_id).await
    }

    /// Credit galleons to a member. Returns the new balance.
    pub async fn award_galleons(
        &self,
        user_id: u64,
        guild_id: u64,
        amount: i64,
        reason: &str,
    ) -> Result<i64, EconomyError> {
        if amount <= 0 {
            return Err(EconomyError::NonPositiveAmount(amount));
        }

        let new_balance = self.store.add_galleons(user_id, guild_id, amount).await?;

        tracing::debug!(user_id, guild_id, amount, new_balance, reason, "Galleons awarded");
        Ok(new_balance)
    }

    /// Debit galleons for a purchase. Returns the new balance.
    ///
    /// Fails without touching the balance when the member can't afford it.
    pub async fn spend_galleons(
        &self,
        user_id: u64,
        guild_id: u64,
        amount: i64,
        reason: &str,
    ) -> Result<i64, EconomyError> {
        if amount <= 0 {
            return Err(EconomyError::NonPositiveAmount(amount));
        }

        let new_balance = self.store.try_debit(user_id, guild_id, amount).await?;

        tracing::debug!(user_id, guild_id, amount, new_balance, reason, "Galleons spent");
        Ok(new_balance)
    }

    /// Move galleons from one member to another.
    ///
    /// Returns the sender's and recipient's new balances.
    pub async fn transfer(
        &self,
        from_user: u64,
        to_user: u64,
        guild_id: u64,
        amount: i64,
    ) -> Result<(i64, i64), EconomyError> {
        if from_user == to_user {
            return Err(EconomyError::SelfTransfer);
        }

        let sender_balance = self
            .spend_galleons(from_user, guild_id, amount, "Payment sent")
            .await?;
        let recipient_balance = self
            .award_galleons(to_user, guild_id, amount, "Payment received")
            .await?;

        Ok((sender_balance, recipient_balance))
    }

    /// Attempt to claim the daily allowance.
    pub async fn claim_daily(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<DailyClaimResult, EconomyError> {
        self.claim_daily_at(user_id, guild_id, Utc::now()).await
    }

    /// Claim the daily allowance as of `now`.
    pub async fn claim_daily_at(
        &self,
        user_id: u64,
        guild_id: u64,
        now: DateTime<Utc>,
    ) -> Result<DailyClaimResult, EconomyError> {
        let cooldown = Duration::hours(self.config.daily_cooldown_hours);
        self.store
            .try_mark_daily(user_id, guild_id, now, cooldown)
            .await?;

        // ThreadRng is !Send, so it must not live across an await.
        let reward = {
            let mut rng = rand::thread_rng();
            rng.gen_range(self.config.daily_min..=self.config.daily_max)
        };

        let new_balance = self
            .award_galleons(user_id, guild_id, reward, "Daily allowance")
            .await?;

        Ok(DailyClaimResult {
            galleons_awarded: reward,
            new_balance,
            next_claim_time: now + cooldown,
        })
    }

    /// Richest members first.
    pub async fn leaderboard(
        &self,
        guild_id: u64,
        limit: usize,
    ) -> Result<Vec<Wallet>, EconomyError> {
        let mut wallets = self.store.get_wallets(guild_id).await?;
        wallets.sort_by(|a, b| b.balance.cmp(&a.balance).then(a.user_id.cmp(&b.user_id)));
        wallets.truncate(limit);
        Ok(wallets)
    }

    /// Wipe every balance in the guild.
    pub async fn reset(&self, guild_id: u64) -> Result<(), EconomyError> {
        self.store.clear_guild(guild_id).await?;
        tracing::info!(guild_id, "All galleon balances reset");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::economy::InMemoryGalleonStore;

    fn service() -> EconomyService<InMemoryGalleonStore> {
        EconomyService::new(InMemoryGalleonStore::new())
    }

    #[tokio::test]
    async fn test_award_galleons() {
        let service = service();

        let balance = service.award_galleons(1, 1, 50, "Test").await.unwrap();
        assert_eq!(balance, 50);

        let wallet = service.get_wallet(1, 1).await.unwrap();
        assert_eq!(wallet.total_earned, 50);
    }

    #[tokio::test]
    async fn test_award_rejects_non_positive() {
        let service = service();

        let err = service.award_galleons(1, 1, 0, "Test").await.unwrap_err();
        assert_eq!(err, EconomyError::NonPositiveAmount(0));
    }

    #[tokio::test]
    async fn test_spend_insufficient_funds_leaves_balance() {
        let service = service();
        service.award_galleons(1, 1, 10, "Test").await.unwrap();

        let err = service.spend_galleons(1, 1, 25, "Spell").await.unwrap_err();
        assert_eq!(
            err,
            EconomyError::InsufficientFunds {
                required: 25,
                available: 10
            }
        );
        assert_eq!(service.get_balance(1, 1).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_spend_exact_balance() {
        let service = service();
        service.award_galleons(1, 1, 20, "Test").await.unwrap();

        let balance = service.spend_galleons(1, 1, 20, "Spell").await.unwrap();
        assert_eq!(balance, 0);
    }

    #[tokio::test]
    async fn test_daily_claim() {
        let service = service();

        let claim = service.claim_daily(1, 1).await.unwrap();
        assert!((10..=30).contains(&claim.galleons_awarded));
        assert_eq!(claim.new_balance, claim.galleons_awarded);

        // Second claim immediately should be on cooldown
        match service.claim_daily(1, 1).await {
            Err(EconomyError::OnCooldown { available_at }) => {
                assert_eq!(available_at, claim.next_claim_time);
            }
            other => panic!("expected cooldown, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_daily_claim_available_again_after_cooldown() {
        let service = service();
        let start = Utc::now();

        let first = service.claim_daily_at(1, 1, start).await.unwrap();
        assert_eq!(first.next_claim_time, start + Duration::hours(24));

        let early = service
            .claim_daily_at(1, 1, start + Duration::hours(23))
            .await
            .unwrap_err();
        assert_eq!(
            early,
            EconomyError::OnCooldown {
                available_at: start + Duration::hours(24)
            }
        );

        let second = service
            .claim_daily_at(1, 1, start + Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(
            second.new_balance,
            first.galleons_awarded + second.galleons_awarded
        );
        assert_eq!(
            service.get_wallet(1, 1).await.unwrap().last_daily,
            Some(start + Duration::hours(24))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_spending_and_awards_lose_nothing() {
        for _ in 0..20 {
            let service = std::sync::Arc::new(service());
            service.award_galleons(1, 1, 2000, "Test").await.unwrap();

            let spender = {
                let service = std::sync::Arc::clone(&service);
                tokio::spawn(async move {
                    for _ in 0..1000 {
                        service.spend_galleons(1, 1, 1, "Spell").await.unwrap();
                    }
                })
            };
            let earner = {
                let service = std::sync::Arc::clone(&service);
                tokio::spawn(async move {
                    for _ in 0..1000 {
                        service.award_galleons(1, 1, 1, "Prize").await.unwrap();
                    }
                })
            };
            spender.await.unwrap();
            earner.await.unwrap();

            assert_eq!(service.get_balance(1, 1).await.unwrap(), 2000);
        }
    }

    #[tokio::test]
    async fn test_transfer() {
        let service = service();
        service.award_galleons(1, 1, 40, "Test").await.unwrap();

        let (sender, recipient) = service.transfer(1, 2, 1, 15).await.unwrap();
        assert_eq!(sender, 25);
        assert_eq!(recipient, 15);
    }

    #[tokio::test]
    async fn test_transfer_to_self_rejected() {
        let service = service();
        service.award_galleons(1, 1, 40, "Test").await.unwrap();

        let err = service.transfer(1, 1, 1, 15).await.unwrap_err();
        assert_eq!(err, EconomyError::SelfTransfer);
        assert_eq!(service.get_balance(1, 1).await.unwrap(), 40);
    }

    #[tokio::test]
    async fn test_transfer_without_funds_moves_nothing() {
        let service = service();

        assert!(service.transfer(1, 2, 1, 5).await.is_err());
        assert_eq!(service.get_balance(2, 1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_leaderboard_sorted_and_limited() {
        let service = service();
        service.award_galleons(1, 1, 10, "Test").await.unwrap();
        service.award_galleons(2, 1, 30, "Test").await.unwrap();
        service.award_galleons(3, 1, 20, "Test").await.unwrap();
        service.award_galleons(4, 9, 99, "Other guild").await.unwrap();

        let top = service.leaderboard(1, 2).await.unwrap();
        let ids: Vec<u64> = top.iter().map(|w| w.user_id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_reset_clears_guild_only() {
        let service = service();
        service.award_galleons(1, 1, 10, "Test").await.unwrap();
        service.award_galleons(1, 2, 10, "Test").await.unwrap();

        service.reset(1).await.unwrap();
        assert_eq!(service.get_balance(1, 1).await.unwrap(), 0);
        assert_eq!(service.get_balance(1, 2).await.unwrap(), 10);
    }
}
