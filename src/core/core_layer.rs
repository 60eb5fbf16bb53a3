// The core module contains all business logic.
// Each feature gets its own submodule, and none of them know about Discord.

#[path = "economy/mod.rs"]
pub mod economy;

#[path = "house_points/mod.rs"]
pub mod house_points;

#[path = "magic/mod.rs"]
pub mod magic;

#[path = "room/mod.rs"]
pub mod room;

#[path = "duel/mod.rs"]
pub mod duel;
