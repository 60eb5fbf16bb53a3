// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "economy/mod.rs"]
pub mod economy;

#[path = "house_points/mod.rs"]
pub mod house_points;
