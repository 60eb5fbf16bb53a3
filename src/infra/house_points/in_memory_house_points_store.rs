use crate::core::house_points::{House, HousePointsStore, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;

/// House scores keyed by (guild_id, house).
pub struct InMemoryHousePointsStore {
    scores: DashMap<(u64, House), i64>,
}

impl InMemoryHousePointsStore {
    pub fn new() -> Self {
        Self {
            scores: DashMap::new(),
        }
    }
}

impl Default for InMemoryHousePointsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HousePointsStore for InMemoryHousePointsStore {
    async fn get_points(&self, guild_id: u64, house: House) -> Result<i64, StoreError> {
        Ok(self
            .scores
            .get(&(guild_id, house))
            .map(|entry| *entry)
            .unwrap_or(0))
    }

    async fn add_points(
        &self,
        guild_id: u64,
        house: House,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let mut score = self.scores.entry((guild_id, house)).or_insert(0);
        *score = score
            .checked_add(delta)
            .ok_or(StoreError::Overflow(house))?;
        Ok(*score)
    }

    async fn reset(&self, guild_id: u64) -> Result<(), StoreError> {
        self.scores.retain(|(gid, _), _| *gid != guild_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scores_are_per_guild() {
        let store = InMemoryHousePointsStore::new();

        store.add_points(1, House::Ravenclaw, 7).await.unwrap();
        assert_eq!(store.get_points(1, House::Ravenclaw).await.unwrap(), 7);
        assert_eq!(store.get_points(2, House::Ravenclaw).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_overflow_leaves_score_alone() {
        let store = InMemoryHousePointsStore::new();
        store.add_points(1, House::Hufflepuff, i64::MAX).await.unwrap();

        let err = store.add_points(1, House::Hufflepuff, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::Overflow(House::Hufflepuff)));
        assert_eq!(store.get_points(1, House::Hufflepuff).await.unwrap(), i64::MAX);
    }
}
