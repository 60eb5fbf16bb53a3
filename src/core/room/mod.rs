// Room of Requirement - the potion-guessing minigame

mod room_service;

pub use room_service::{
    resolve_pick, ChallengeOutcome, Fate, PotionChallenge, RoomError, RoomService, POTION_COUNT,
    WIN_REWARD,
};
