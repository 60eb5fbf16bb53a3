// Duelling club - wagered best-of-three duels

mod duel_service;

pub use duel_service::{DuelError, DuelResult, DuelRound, DuelService, PendingDuel};
