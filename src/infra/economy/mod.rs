// Economy infrastructure - in-memory galleon vaults

mod in_memory_galleon_store;

pub use in_memory_galleon_store::InMemoryGalleonStore;
