pub mod house;
pub mod house_points_service;
pub mod house_points_store;

pub use house::House;
pub use house_points_service::{HousePointsError, HousePointsService};
pub use house_points_store::{HousePointsStore, StoreError};
