// The Room of Requirement game.
//
// A member who gets Alohomora'd (or is sent in by staff) is shown five
// potions and picks one. One potion is the winner, chosen when the room
// opens. Felix Felicis and the Draught of Living Death tilt the outcome.

use crate::core::economy::{EconomyError, EconomyService, GalleonStore};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::Rng;
use std::sync::Arc;

/// Number of potions on the table.
pub const POTION_COUNT: u8 = 5;

/// Galleons paid out for picking the winning potion.
pub const WIN_REWARD: i64 = 100;

/// An unanswered room closes after this long, the same time the Alohomora role lasts.
const CHALLENGE_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct PotionChallenge {
    pub winning: u8,
    pub started_by: u64,
    pub started_at: DateTime<Utc>,
}

impl PotionChallenge {
    fn is_open(&self, now: DateTime<Utc>) -> bool {
        now < self.started_at + Duration::hours(CHALLENGE_TTL_HOURS)
    }
}

/// Whether luck overrode the member's own pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    Fortune,
    Misfortune,
}

#[derive(Debug, Clone)]
pub struct ChallengeOutcome {
    pub picked: u8,
    /// The potion that actually counted after luck was applied.
    pub resolved: u8,
    pub winning: u8,
    pub fate: Option<Fate>,
    pub won: bool,
    pub reward: i64,
    pub new_balance: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("Pick must be between 1 and 5, got {0}")]
    InvalidPick(i64),
    #[error("No active potion challenge")]
    NoChallenge,
    #[error(transparent)]
    Economy(#[from] EconomyError),
}

/// Apply luck to a pick. Returns the potion that counts and whether fate stepped in.
///
/// Positive luck `p` forces the winning potion with probability `p`;
/// negative luck forces a losing potion with probability `|p|`.
pub fn resolve_pick<R: Rng + ?Sized>(
    pick: u8,
    winning: u8,
    luck: f64,
    rng: &mut R,
) -> (u8, Option<Fate>) {
    if luck > 0.0 && rng.gen::<f64>() < luck {
        return (winning, Some(Fate::Fortune));
    }

    if luck < 0.0 && rng.gen::<f64>() < luck.abs() {
        let losers: Vec<u8> = (1..=POTION_COUNT).filter(|p| *p != winning).collect();
        let forced = losers[rng.gen_range(0..losers.len())];
        return (forced, Some(Fate::Misfortune));
    }

    (pick, None)
}

pub struct RoomService<S: GalleonStore> {
    economy: Arc<EconomyService<S>>,
    /// (user_id, guild_id) -> open challenge
    challenges: DashMap<(u64, u64), PotionChallenge>,
}

impl<S: GalleonStore> RoomService<S> {
    pub fn new(economy: Arc<EconomyService<S>>) -> Self {
        Self {
            economy,
            challenges: DashMap::new(),
        }
    }

    /// Open (or reopen) the room for a member.
    ///
    /// Rooms nobody answered in time are swept out first.
    pub fn start_challenge(&self, user_id: u64, guild_id: u64, started_by: u64) -> PotionChallenge {
        let now = Utc::now();
        self.challenges.retain(|_, challenge| challenge.is_open(now));

        let winning = rand::thread_rng().gen_range(1..=POTION_COUNT);
        let challenge = PotionChallenge {
            winning,
            started_by,
            started_at: now,
        };

        self.challenges
            .insert((user_id, guild_id), challenge.clone());
        tracing::info!(user_id, guild_id, started_by, "Room of Requirement opened");
        challenge
    }

    pub fn has_challenge(&self, user_id: u64, guild_id: u64) -> bool {
        self.challenges
            .get(&(user_id, guild_id))
            .is_some_and(|challenge| challenge.is_open(Utc::now()))
    }

    /// Pick a potion. The challenge is consumed whatever the result.
    pub async fn choose(
        &self,
        user_id: u64,
        guild_id: u64,
        pick: i64,
        luck: f64,
    ) -> Result<ChallengeOutcome, RoomError> {
        let pick = u8::try_from(pick)
            .ok()
            .filter(|p| (1..=POTION_COUNT).contains(p))
            .ok_or(RoomError::InvalidPick(pick))?;

        let (_, challenge) = self
            .challenges
            .remove(&(user_id, guild_id))
            .filter(|(_, challenge)| challenge.is_open(Utc::now()))
            .ok_or(RoomError::NoChallenge)?;

        let (resolved, fate) = resolve_pick(pick, challenge.winning, luck, &mut rand::thread_rng());
        let won = resolved == challenge.winning;

        let new_balance = if won {
            Some(
                self.economy
                    .award_galleons(user_id, guild_id, WIN_REWARD, "Room of Requirement")
                    .await?,
            )
        } else {
            None
        };

        tracing::info!(user_id, guild_id, pick, resolved, won, "Room of Requirement potion chosen");

        Ok(ChallengeOutcome {
            picked: pick,
            resolved,
            winning: challenge.winning,
            fate,
            won,
            reward: if won { WIN_REWARD } else { 0 },
            new_balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::economy::InMemoryGalleonStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn service() -> RoomService<InMemoryGalleonStore> {
        RoomService::new(Arc::new(EconomyService::new(InMemoryGalleonStore::new())))
    }

    #[test]
    fn test_resolve_without_luck_keeps_pick() {
        let mut rng = StdRng::seed_from_u64(42);
        for pick in 1..=POTION_COUNT {
            assert_eq!(resolve_pick(pick, 3, 0.0, &mut rng), (pick, None));
        }
    }

    #[test]
    fn test_full_luck_forces_outcome() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(resolve_pick(1, 4, 1.0, &mut rng), (4, Some(Fate::Fortune)));

            let (resolved, fate) = resolve_pick(4, 4, -1.0, &mut rng);
            assert_ne!(resolved, 4);
            assert!((1..=POTION_COUNT).contains(&resolved));
            assert_eq!(fate, Some(Fate::Misfortune));
        }
    }

    #[tokio::test]
    async fn test_choose_validates_range_before_consuming() {
        let service = service();
        service.start_challenge(1, 1, 2);

        assert!(matches!(
            service.choose(1, 1, 0, 0.0).await,
            Err(RoomError::InvalidPick(0))
        ));
        assert!(matches!(
            service.choose(1, 1, 6, 0.0).await,
            Err(RoomError::InvalidPick(6))
        ));
        assert!(service.has_challenge(1, 1));
    }

    #[tokio::test]
    async fn test_choose_without_challenge() {
        let service = service();

        assert!(matches!(
            service.choose(1, 1, 3, 0.0).await,
            Err(RoomError::NoChallenge)
        ));
    }

    #[tokio::test]
    async fn test_lucky_member_always_wins_and_is_paid() {
        let service = service();
        service.start_challenge(1, 1, 2);

        let outcome = service.choose(1, 1, 2, 1.0).await.unwrap();
        assert!(outcome.won);
        assert_eq!(outcome.reward, WIN_REWARD);
        assert_eq!(outcome.new_balance, Some(WIN_REWARD));

        // Consumed
        assert!(!service.has_challenge(1, 1));
        assert!(matches!(
            service.choose(1, 1, 2, 1.0).await,
            Err(RoomError::NoChallenge)
        ));
    }

    #[tokio::test]
    async fn test_cursed_member_never_wins() {
        let service = service();
        let challenge = service.start_challenge(1, 1, 1);

        let outcome = service
            .choose(1, 1, i64::from(challenge.winning), -1.0)
            .await
            .unwrap();
        assert!(!outcome.won);
        assert_eq!(outcome.new_balance, None);
    }

    fn stale_challenge() -> PotionChallenge {
        PotionChallenge {
            winning: 1,
            started_by: 9,
            started_at: Utc::now() - Duration::hours(CHALLENGE_TTL_HOURS + 1),
        }
    }

    #[tokio::test]
    async fn test_stale_room_cannot_be_answered() {
        let service = service();
        service.challenges.insert((1, 1), stale_challenge());

        assert!(!service.has_challenge(1, 1));
        assert!(matches!(
            service.choose(1, 1, 1, 1.0).await,
            Err(RoomError::NoChallenge)
        ));
        assert!(service.challenges.is_empty());
    }

    #[tokio::test]
    async fn test_opening_a_room_sweeps_stale_ones() {
        let service = service();
        service.challenges.insert((1, 1), stale_challenge());
        service.challenges.insert((2, 7), stale_challenge());
        service.start_challenge(3, 3, 9);

        // A fresh room elsewhere survives the sweep.
        service.start_challenge(4, 1, 9);
        assert_eq!(service.challenges.len(), 2);
        assert!(service.has_challenge(3, 3));
        assert!(service.has_challenge(4, 1));
    }

    #[tokio::test]
    async fn test_restart_replaces_challenge() {
        let service = service();
        service.start_challenge(1, 1, 5);
        let second = service.start_challenge(1, 1, 6);

        assert_eq!(second.started_by, 6);
        assert!(service.has_challenge(1, 1));
    }
}
