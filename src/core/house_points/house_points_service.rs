use super::house::House;
use super::house_points_store::{HousePointsStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum HousePointsError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Unknown house: {0}")]
    UnknownHouse(String),
}

pub struct HousePointsService<S: HousePointsStore> {
    store: S,
}

impl<S: HousePointsStore> HousePointsService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Award (or, with a negative value, deduct) points. Returns the new total.
    pub async fn add_points(
        &self,
        guild_id: u64,
        house_name: &str,
        delta: i64,
    ) -> Result<(House, i64), HousePointsError> {
        let house = House::parse(house_name)
            .ok_or_else(|| HousePointsError::UnknownHouse(house_name.to_string()))?;
        let total = self.store.add_points(guild_id, house, delta).await?;

        tracing::info!(guild_id, house = house.as_str(), delta, total, "House points changed");
        Ok((house, total))
    }

    /// All four houses, leader first. Ties keep canonical house order.
    pub async fn standings(&self, guild_id: u64) -> Result<Vec<(House, i64)>, HousePointsError> {
        let mut standings = Vec::with_capacity(House::ALL.len());
        for house in House::ALL {
            standings.push((house, self.store.get_points(guild_id, house).await?));
        }
        standings.sort_by(|(ha, a), (hb, b)| b.cmp(a).then(ha.ordinal().cmp(&hb.ordinal())));
        Ok(standings)
    }

    pub async fn reset(&self, guild_id: u64) -> Result<(), HousePointsError> {
        self.store.reset(guild_id).await?;
        tracing::info!(guild_id, "House points reset");
        Ok(())
    }
}
