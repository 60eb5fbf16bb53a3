use super::house::House;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} score would overflow")]
    Overflow(House),
}

#[async_trait]
pub trait HousePointsStore: Send + Sync {
    /// Current score of a house. Houses never awarded points score 0.
    async fn get_points(&self, guild_id: u64, house: House) -> Result<i64, StoreError>;
    /// Adjust a house's score by `delta`, returning the new total.
    /// The score is left unchanged if the total would not fit in an i64.
    async fn add_points(&self, guild_id: u64, house: House, delta: i64)
        -> Result<i64, StoreError>;
    async fn reset(&self, guild_id: u64) -> Result<(), StoreError>;
}
