mod in_memory_house_points_store;

pub use in_memory_house_points_store::InMemoryHousePointsStore;
