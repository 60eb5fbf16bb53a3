// Wizard duels.
//
// A member challenges another for a galleon wager. The opponent has a few
// minutes to accept or decline. An accepted duel is fought over three
// rounds; whoever takes two rounds wins and collects the wager from the
// loser. Luck potions shift the odds of every round.

use crate::core::economy::{EconomyError, EconomyService, GalleonStore};
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::Rng;
use std::sync::Arc;

/// Spells shouted during a duel, purely for the play-by-play.
const DUELING_SPELLS: &[&str] = &[
    "Expelliarmus",
    "Stupefy",
    "Rictusempra",
    "Petrificus Totalus",
    "Impedimenta",
    "Flipendo",
    "Locomotor Mortis",
    "Furnunculus",
];

const ROUNDS_TO_WIN: u8 = 2;

#[derive(Debug, Clone)]
pub struct PendingDuel {
    pub challenger_id: u64,
    pub opponent_id: u64,
    pub wager: i64,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DuelRound {
    pub number: u8,
    pub challenger_spell: &'static str,
    pub opponent_spell: &'static str,
    pub challenger_won: bool,
}

#[derive(Debug, Clone)]
pub struct DuelResult {
    pub challenger_id: u64,
    pub opponent_id: u64,
    pub winner_id: u64,
    pub loser_id: u64,
    pub wager: i64,
    pub rounds: Vec<DuelRound>,
    pub winner_balance: i64,
    pub loser_balance: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum DuelError {
    #[error("You can't duel yourself")]
    SelfDuel,
    #[error("Wager must be positive, got {0}")]
    InvalidWager(i64),
    #[error("That member already has a duel challenge waiting")]
    AlreadyChallenged,
    #[error("No pending duel")]
    NoPendingDuel,
    #[error("Member {user_id} can't cover the wager of {wager}")]
    CannotCoverWager { user_id: u64, wager: i64 },
    #[error(transparent)]
    Economy(#[from] EconomyError),
}

/// Chance the challenger takes a single round, given both sides' luck.
pub fn round_odds(challenger_luck: f64, opponent_luck: f64) -> f64 {
    (0.5 + (challenger_luck - opponent_luck) / 4.0).clamp(0.1, 0.9)
}

/// Fight rounds until someone has two. Returns the rounds in order.
pub fn fight<R: Rng + ?Sized>(odds: f64, rng: &mut R) -> Vec<DuelRound> {
    let mut rounds = Vec::new();
    let (mut challenger_wins, mut opponent_wins) = (0u8, 0u8);

    while challenger_wins < ROUNDS_TO_WIN && opponent_wins < ROUNDS_TO_WIN {
        let challenger_won = rng.gen_bool(odds);
        if challenger_won {
            challenger_wins += 1;
        } else {
            opponent_wins += 1;
        }

        rounds.push(DuelRound {
            number: challenger_wins + opponent_wins,
            challenger_spell: DUELING_SPELLS[rng.gen_range(0..DUELING_SPELLS.len())],
            opponent_spell: DUELING_SPELLS[rng.gen_range(0..DUELING_SPELLS.len())],
            challenger_won,
        });
    }

    rounds
}

pub struct DuelService<S: GalleonStore> {
    economy: Arc<EconomyService<S>>,
    /// (opponent_id, guild_id) -> challenge waiting for an answer
    pending: DashMap<(u64, u64), PendingDuel>,
    challenge_timeout: Duration,
}

impl<S: GalleonStore> DuelService<S> {
    pub fn new(economy: Arc<EconomyService<S>>) -> Self {
        Self {
            economy,
            pending: DashMap::new(),
            challenge_timeout: Duration::minutes(5),
        }
    }

    pub async fn challenge(
        &self,
        challenger_id: u64,
        opponent_id: u64,
        guild_id: u64,
        wager: i64,
    ) -> Result<PendingDuel, DuelError> {
        self.challenge_at(challenger_id, opponent_id, guild_id, wager, Utc::now())
            .await
    }

    /// Issue a challenge as of `now`. Lapsed challenges are swept out first.
    pub async fn challenge_at(
        &self,
        challenger_id: u64,
        opponent_id: u64,
        guild_id: u64,
        wager: i64,
        now: DateTime<Utc>,
    ) -> Result<PendingDuel, DuelError> {
        if challenger_id == opponent_id {
            return Err(DuelError::SelfDuel);
        }
        if wager <= 0 {
            return Err(DuelError::InvalidWager(wager));
        }
        self.ensure_can_cover(challenger_id, guild_id, wager).await?;

        self.pending.retain(|_, duel| self.is_live(duel, now));
        let duel = PendingDuel {
            challenger_id,
            opponent_id,
            wager,
            issued_at: now,
        };

        match self.pending.entry((opponent_id, guild_id)) {
            Entry::Occupied(mut existing) => {
                if self.is_live(existing.get(), now) {
                    return Err(DuelError::AlreadyChallenged);
                }
                existing.insert(duel.clone());
            }
            Entry::Vacant(slot) => {
                slot.insert(duel.clone());
            }
        }

        tracing::info!(challenger_id, opponent_id, guild_id, wager, "Duel challenge issued");
        Ok(duel)
    }

    /// Who is waiting on this member, if the challenge is still live.
    pub fn pending_challenger(&self, opponent_id: u64, guild_id: u64) -> Option<u64> {
        self.pending
            .get(&(opponent_id, guild_id))
            .filter(|duel| self.is_live(duel, Utc::now()))
            .map(|duel| duel.challenger_id)
    }

    pub fn decline(&self, opponent_id: u64, guild_id: u64) -> Result<PendingDuel, DuelError> {
        self.take_pending(opponent_id, guild_id, Utc::now())
    }

    /// Accept the waiting challenge and fight it out.
    pub async fn accept(
        &self,
        opponent_id: u64,
        guild_id: u64,
        challenger_luck: f64,
        opponent_luck: f64,
    ) -> Result<DuelResult, DuelError> {
        self.accept_at(opponent_id, guild_id, challenger_luck, opponent_luck, Utc::now())
            .await
    }

    pub async fn accept_at(
        &self,
        opponent_id: u64,
        guild_id: u64,
        challenger_luck: f64,
        opponent_luck: f64,
        now: DateTime<Utc>,
    ) -> Result<DuelResult, DuelError> {
        let duel = self.take_pending(opponent_id, guild_id, now)?;

        self.ensure_can_cover(duel.challenger_id, guild_id, duel.wager)
            .await?;
        self.ensure_can_cover(opponent_id, guild_id, duel.wager)
            .await?;

        let rounds = fight(
            round_odds(challenger_luck, opponent_luck),
            &mut rand::thread_rng(),
        );
        let challenger_won = rounds.iter().filter(|r| r.challenger_won).count()
            >= usize::from(ROUNDS_TO_WIN);
        let (winner_id, loser_id) = if challenger_won {
            (duel.challenger_id, opponent_id)
        } else {
            (opponent_id, duel.challenger_id)
        };

        let (loser_balance, winner_balance) = self
            .economy
            .transfer(loser_id, winner_id, guild_id, duel.wager)
            .await?;

        tracing::info!(
            winner_id,
            loser_id,
            guild_id,
            wager = duel.wager,
            rounds = rounds.len(),
            "Duel fought"
        );

        Ok(DuelResult {
            challenger_id: duel.challenger_id,
            opponent_id,
            winner_id,
            loser_id,
            wager: duel.wager,
            rounds,
            winner_balance,
            loser_balance,
        })
    }

    fn is_live(&self, duel: &PendingDuel, now: DateTime<Utc>) -> bool {
        now < duel.issued_at + self.challenge_timeout
    }

    fn take_pending(
        &self,
        opponent_id: u64,
        guild_id: u64,
        now: DateTime<Utc>,
    ) -> Result<PendingDuel, DuelError> {
        let (_, duel) = self
            .pending
            .remove(&(opponent_id, guild_id))
            .ok_or(DuelError::NoPendingDuel)?;

        if !self.is_live(&duel, now) {
            return Err(DuelError::NoPendingDuel);
        }
        Ok(duel)
    }

    async fn ensure_can_cover(
        &self,
        user_id: u64,
        guild_id: u64,
        wager: i64,
    ) -> Result<(), DuelError> {
        if self.economy.get_balance(user_id, guild_id).await? < wager {
            return Err(DuelError::CannotCoverWager { user_id, wager });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::economy::InMemoryGalleonStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const GUILD: u64 = 1;

    async fn service() -> DuelService<InMemoryGalleonStore> {
        let economy = Arc::new(EconomyService::new(InMemoryGalleonStore::new()));
        economy.award_galleons(1, GUILD, 100, "Test").await.unwrap();
        economy.award_galleons(2, GUILD, 100, "Test").await.unwrap();
        DuelService::new(economy)
    }

    #[test]
    fn test_round_odds_clamped() {
        assert_eq!(round_odds(0.0, 0.0), 0.5);
        assert_eq!(round_odds(0.5, 0.0), 0.625);
        assert_eq!(round_odds(1.0, -1.0), 0.9);
        assert_eq!(round_odds(-1.0, 1.0), 0.1);
    }

    #[test]
    fn test_fight_ends_at_two_wins() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..100 {
            let rounds = fight(0.5, &mut rng);
            assert!(rounds.len() == 2 || rounds.len() == 3);

            let challenger = rounds.iter().filter(|r| r.challenger_won).count();
            let opponent = rounds.len() - challenger;
            assert!(challenger == 2 || opponent == 2);
            assert_eq!(rounds.last().map(|r| r.number), Some(rounds.len() as u8));
        }
    }

    #[tokio::test]
    async fn test_challenge_validation() {
        let service = service().await;

        assert!(matches!(
            service.challenge(1, 1, GUILD, 10).await,
            Err(DuelError::SelfDuel)
        ));
        assert!(matches!(
            service.challenge(1, 2, GUILD, 0).await,
            Err(DuelError::InvalidWager(0))
        ));
        assert!(matches!(
            service.challenge(1, 2, GUILD, 500).await,
            Err(DuelError::CannotCoverWager { user_id: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_one_pending_duel_per_opponent() {
        let service = service().await;

        service.challenge(1, 2, GUILD, 10).await.unwrap();
        assert!(matches!(
            service.challenge(3, 2, GUILD, 10).await,
            Err(DuelError::CannotCoverWager { .. })
        ));
        service.economy.award_galleons(3, GUILD, 50, "Test").await.unwrap();
        assert!(matches!(
            service.challenge(3, 2, GUILD, 10).await,
            Err(DuelError::AlreadyChallenged)
        ));
    }

    #[tokio::test]
    async fn test_accept_moves_exactly_the_wager() {
        let service = service().await;
        service.challenge(1, 2, GUILD, 25).await.unwrap();

        let result = service.accept(2, GUILD, 0.0, 0.0).await.unwrap();
        assert_eq!(result.winner_balance, 125);
        assert_eq!(result.loser_balance, 75);
        assert_ne!(result.winner_id, result.loser_id);

        let total = service.economy.get_balance(1, GUILD).await.unwrap()
            + service.economy.get_balance(2, GUILD).await.unwrap();
        assert_eq!(total, 200);
    }

    #[tokio::test]
    async fn test_accept_requires_opponent_funds() {
        let service = service().await;
        service.challenge(1, 2, GUILD, 100).await.unwrap();
        service.economy.spend_galleons(2, GUILD, 50, "Test").await.unwrap();

        assert!(matches!(
            service.accept(2, GUILD, 0.0, 0.0).await,
            Err(DuelError::CannotCoverWager { user_id: 2, .. })
        ));
        // The challenge is gone either way
        assert!(matches!(
            service.decline(2, GUILD),
            Err(DuelError::NoPendingDuel)
        ));
    }

    #[tokio::test]
    async fn test_challenge_lapses_after_five_minutes() {
        let service = service().await;
        let issued = Utc::now();
        service.challenge_at(1, 2, GUILD, 10, issued).await.unwrap();

        let late = issued + Duration::minutes(5);
        assert!(matches!(
            service.accept_at(2, GUILD, 0.0, 0.0, late).await,
            Err(DuelError::NoPendingDuel)
        ));
        assert_eq!(service.economy.get_balance(1, GUILD).await.unwrap(), 100);
        assert_eq!(service.economy.get_balance(2, GUILD).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_lapsed_challenge_frees_the_opponent() {
        let service = service().await;
        service.economy.award_galleons(3, GUILD, 50, "Test").await.unwrap();
        let issued = Utc::now();
        service.challenge_at(1, 2, GUILD, 10, issued).await.unwrap();

        assert!(matches!(
            service
                .challenge_at(3, 2, GUILD, 10, issued + Duration::minutes(4))
                .await,
            Err(DuelError::AlreadyChallenged)
        ));
        let duel = service
            .challenge_at(3, 2, GUILD, 10, issued + Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(duel.challenger_id, 3);
    }

    #[tokio::test]
    async fn test_new_challenge_sweeps_lapsed_ones() {
        let service = service().await;
        service.economy.award_galleons(3, GUILD, 50, "Test").await.unwrap();
        let issued = Utc::now();
        service.challenge_at(1, 2, GUILD, 10, issued).await.unwrap();
        service.challenge_at(2, 3, GUILD, 10, issued).await.unwrap();

        service
            .challenge_at(3, 1, GUILD, 10, issued + Duration::minutes(10))
            .await
            .unwrap();
        assert_eq!(service.pending.len(), 1);
        assert!(service.pending.contains_key(&(1, GUILD)));
    }

    #[tokio::test]
    async fn test_decline() {
        let service = service().await;
        service.challenge(1, 2, GUILD, 10).await.unwrap();
        assert_eq!(service.pending_challenger(2, GUILD), Some(1));
        assert_eq!(service.pending_challenger(1, GUILD), None);

        let declined = service.decline(2, GUILD).unwrap();
        assert_eq!(service.pending_challenger(2, GUILD), None);
        assert_eq!(declined.challenger_id, 1);
        assert!(matches!(
            service.accept(2, GUILD, 0.0, 0.0).await,
            Err(DuelError::NoPendingDuel)
        ));
    }
}
