// Economy module - domain logic for the galleon currency

mod economy_service;

pub use economy_service::{
    DailyClaimResult, EconomyError, EconomyService, GalleonStore, Wallet,
};
