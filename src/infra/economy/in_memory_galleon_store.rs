// In-memory implementation of GalleonStore.
//
// Balances live only as long as the process does. A restart empties every
// vault, which is how the bot has always behaved.

use crate::core::economy::{EconomyError, GalleonStore, Wallet};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// A composite key for looking up a vault.
/// We need both user_id AND guild_id since members can be in multiple guilds.
#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
struct VaultKey {
    user_id: u64,
    guild_id: u64,
}

/// Galleon vaults backed by a DashMap, so concurrent commands can update
/// balances without an outer Mutex.
pub struct InMemoryGalleonStore {
    vaults: DashMap<VaultKey, Wallet>,
}

impl InMemoryGalleonStore {
    pub fn new() -> Self {
        Self {
            vaults: DashMap::new(),
        }
    }
}

impl Default for InMemoryGalleonStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GalleonStore for InMemoryGalleonStore {
    async fn get_wallet(&self, user_id: u64, guild_id: u64) -> Result<Wallet, EconomyError> {
        let key = VaultKey { user_id, guild_id };
        Ok(self
            .vaults
            .get(&key)
            .map(|entry| entry.clone())
            .unwrap_or_else(|| Wallet::empty(user_id, guild_id)))
    }

    async fn try_debit(
        &self,
        user_id: u64,
        guild_id: u64,
        amount: i64,
    ) -> Result<i64, EconomyError> {
        let key = VaultKey { user_id, guild_id };
        // The entry guard holds the shard lock until we return.
        let mut wallet = self
            .vaults
            .entry(key)
            .or_insert_with(|| Wallet::empty(user_id, guild_id));
        if wallet.balance < amount {
            return Err(EconomyError::InsufficientFunds {
                required: amount,
                available: wallet.balance,
            });
        }
        wallet.balance -= amount;
        Ok(wallet.balance)
    }

    async fn try_mark_daily(
        &self,
        user_id: u64,
        guild_id: u64,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> Result<(), EconomyError> {
        let key = VaultKey { user_id, guild_id };
        let mut wallet = self
            .vaults
            .entry(key)
            .or_insert_with(|| Wallet::empty(user_id, guild_id));
        if let Some(last_daily) = wallet.last_daily {
            let next_claim = last_daily + cooldown;
            if now < next_claim {
                return Err(EconomyError::OnCooldown {
                    available_at: next_claim,
                });
            }
        }
        wallet.last_daily = Some(now);
        Ok(())
    }

    async fn add_galleons(
        &self,
        user_id: u64,
        guild_id: u64,
        amount: i64,
    ) -> Result<i64, EconomyError> {
        let key = VaultKey { user_id, guild_id };
        let mut wallet = self
            .vaults
            .entry(key)
            .or_insert_with(|| Wallet::empty(user_id, guild_id));
        wallet.balance = wallet.balance.saturating_add(amount);
        wallet.total_earned = wallet.total_earned.saturating_add(amount);
        Ok(wallet.balance)
    }

    async fn get_wallets(&self, guild_id: u64) -> Result<Vec<Wallet>, EconomyError> {
        Ok(self
            .vaults
            .iter()
            .filter(|entry| entry.key().guild_id == guild_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn clear_guild(&self, guild_id: u64) -> Result<(), EconomyError> {
        self.vaults.retain(|key, _| key.guild_id != guild_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_member_has_empty_vault() {
        let store = InMemoryGalleonStore::new();

        let wallet = store.get_wallet(123, 456).await.unwrap();
        assert_eq!(wallet.balance, 0);
        assert!(wallet.last_daily.is_none());

        // Reading must not create an entry
        assert!(store.get_wallets(456).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_and_debit() {
        let store = InMemoryGalleonStore::new();

        store.add_galleons(123, 456, 100).await.unwrap();
        assert_eq!(store.add_galleons(123, 456, 50).await.unwrap(), 150);
        assert_eq!(store.try_debit(123, 456, 120).await.unwrap(), 30);

        let wallet = store.get_wallet(123, 456).await.unwrap();
        assert_eq!(wallet.balance, 30);
        assert_eq!(wallet.total_earned, 150);
    }

    #[tokio::test]
    async fn test_debit_never_goes_negative() {
        let store = InMemoryGalleonStore::new();
        store.add_galleons(1, 1, 4).await.unwrap();

        let err = store.try_debit(1, 1, 5).await.unwrap_err();
        assert_eq!(
            err,
            EconomyError::InsufficientFunds {
                required: 5,
                available: 4
            }
        );
        assert_eq!(store.get_wallet(1, 1).await.unwrap().balance, 4);
    }

    #[tokio::test]
    async fn test_daily_mark_respects_cooldown() {
        let store = InMemoryGalleonStore::new();
        let now = Utc::now();
        let day = Duration::hours(24);

        store.try_mark_daily(1, 1, now, day).await.unwrap();
        assert!(store
            .try_mark_daily(1, 1, now + Duration::hours(1), day)
            .await
            .is_err());
        store.try_mark_daily(1, 1, now + day, day).await.unwrap();
        assert_eq!(
            store.get_wallet(1, 1).await.unwrap().last_daily,
            Some(now + day)
        );
    }

    #[tokio::test]
    async fn test_wallets_scoped_by_guild() {
        let store = InMemoryGalleonStore::new();

        store.add_galleons(1, 100, 5).await.unwrap();
        store.add_galleons(2, 100, 7).await.unwrap();
        store.add_galleons(3, 200, 9).await.unwrap();

        assert_eq!(store.get_wallets(100).await.unwrap().len(), 2);

        store.clear_guild(100).await.unwrap();
        assert!(store.get_wallets(100).await.unwrap().is_empty());
        assert_eq!(store.get_wallets(200).await.unwrap().len(), 1);
    }
}
