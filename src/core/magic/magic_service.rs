// Spellcasting and potion rules.
//
// Pricing, silence, per-target cooldowns and the effect ledger meet here.
// Discord commands call into this service and then apply the returned
// role/nickname changes to the guild.

use super::effect_ledger::{ActiveEffect, EffectApplied, EffectLedger, EffectsRemoved, MemberSnapshot};
use super::enchantments::{Enchantment, EnchantmentId, RoleKey, School, SideEffect};
use crate::core::economy::{EconomyError, EconomyService, GalleonStore};
use crate::core::house_points::House;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::seq::SliceRandom;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum MagicError {
    #[error("Caster is silenced")]
    Silenced { until: Option<DateTime<Utc>> },
    #[error("Unknown spell: {0}")]
    UnknownSpell(String),
    #[error("Unknown potion: {0}")]
    UnknownPotion(String),
    #[error("{enchantment:?} is on cooldown for this member until {available_at}")]
    OnCooldown {
        enchantment: EnchantmentId,
        available_at: DateTime<Utc>,
    },
    #[error(transparent)]
    Economy(#[from] EconomyError),
    #[error("No active effects")]
    NoActiveEffects,
    #[error("Effect not active: {0}")]
    EffectNotFound(String),
}

/// What a cast or drink did to the target.
#[derive(Debug, Clone)]
pub enum EffectOutcome {
    Applied(EffectApplied),
    /// Bezoar. None when there was nothing to cure.
    Cleansed(Option<EffectsRemoved>),
}

#[derive(Debug, Clone)]
pub struct CastOutcome {
    pub enchantment: Enchantment,
    pub buyer_balance: i64,
    pub outcome: EffectOutcome,
}

pub struct MagicService<S: GalleonStore> {
    economy: Arc<EconomyService<S>>,
    ledger: EffectLedger,
    /// (target_id, guild_id, enchantment) -> last successful cast
    cooldowns: DashMap<(u64, u64, EnchantmentId), DateTime<Utc>>,
}

impl<S: GalleonStore> MagicService<S> {
    pub fn new(economy: Arc<EconomyService<S>>) -> Self {
        Self {
            economy,
            ledger: EffectLedger::new(),
            cooldowns: DashMap::new(),
        }
    }

    /// Cast a spell on `target`, paid for by the caster.
    pub async fn cast(
        &self,
        caster_id: u64,
        guild_id: u64,
        target: &MemberSnapshot,
        spell_name: &str,
    ) -> Result<CastOutcome, MagicError> {
        self.cast_at(caster_id, guild_id, target, spell_name, Utc::now())
            .await
    }

    /// Cast a spell as of `now`.
    pub async fn cast_at(
        &self,
        caster_id: u64,
        guild_id: u64,
        target: &MemberSnapshot,
        spell_name: &str,
        now: DateTime<Utc>,
    ) -> Result<CastOutcome, MagicError> {
        if let Some(until) = self.ledger.silenced_until(caster_id, guild_id, now) {
            return Err(MagicError::Silenced { until });
        }

        let enchantment = EnchantmentId::parse(spell_name)
            .map(Enchantment::get)
            .filter(|e| e.school == School::Spell)
            .ok_or_else(|| MagicError::UnknownSpell(spell_name.to_string()))?;

        let previous_cast = self.reserve_cooldown(target.user_id, guild_id, &enchantment, now)?;

        let buyer_balance = match self
            .economy
            .spend_galleons(
                caster_id,
                guild_id,
                enchantment.cost,
                &format!("Cast {}", enchantment.name),
            )
            .await
        {
            Ok(balance) => balance,
            Err(e) => {
                self.release_cooldown(target.user_id, guild_id, &enchantment, now, previous_cast);
                return Err(e.into());
            }
        };

        let applied = self.apply(guild_id, target, &enchantment, now);
        tracing::info!(
            caster_id,
            target_id = target.user_id,
            guild_id,
            spell = enchantment.id.as_str(),
            effect_id = applied.effect.id,
            "Spell cast"
        );

        Ok(CastOutcome {
            enchantment,
            buyer_balance,
            outcome: EffectOutcome::Applied(applied),
        })
    }

    /// Buy a potion and have `target` drink it. The target may be the buyer.
    pub async fn drink(
        &self,
        buyer_id: u64,
        guild_id: u64,
        target: &MemberSnapshot,
        potion_name: &str,
    ) -> Result<CastOutcome, MagicError> {
        let enchantment = EnchantmentId::parse(potion_name)
            .map(Enchantment::get)
            .filter(|e| e.school == School::Potion)
            .ok_or_else(|| MagicError::UnknownPotion(potion_name.to_string()))?;

        let buyer_balance = self
            .economy
            .spend_galleons(
                buyer_id,
                guild_id,
                enchantment.cost,
                &format!("Bought {}", enchantment.name),
            )
            .await?;

        let outcome = if enchantment.side_effect == SideEffect::CleansePotions {
            EffectOutcome::Cleansed(self.ledger.cleanse_potions(target.user_id, guild_id))
        } else {
            EffectOutcome::Applied(self.apply(guild_id, target, &enchantment, Utc::now()))
        };

        tracing::info!(
            buyer_id,
            target_id = target.user_id,
            guild_id,
            potion = enchantment.id.as_str(),
            "Potion drunk"
        );

        Ok(CastOutcome {
            enchantment,
            buyer_balance,
            outcome,
        })
    }

    /// Finite Incantatem: lift the latest effect, or the latest one with a given name.
    pub fn finite(
        &self,
        user_id: u64,
        guild_id: u64,
        effect_name: Option<&str>,
    ) -> Result<EffectsRemoved, MagicError> {
        if self.ledger.active(user_id, guild_id).is_empty() {
            return Err(MagicError::NoActiveEffects);
        }

        let filter = match effect_name {
            Some(name) => Some(
                EnchantmentId::parse(name)
                    .ok_or_else(|| MagicError::EffectNotFound(name.to_string()))?,
            ),
            None => None,
        };

        self.ledger
            .remove_latest(user_id, guild_id, filter)
            .ok_or_else(|| MagicError::EffectNotFound(effect_name.unwrap_or_default().to_string()))
    }

    /// Remove the latest effect of one kind, if any. Used when the Room of
    /// Requirement closes behind a member.
    pub fn dispel(
        &self,
        user_id: u64,
        guild_id: u64,
        enchantment: EnchantmentId,
    ) -> Option<EffectsRemoved> {
        self.ledger.remove_latest(user_id, guild_id, Some(enchantment))
    }

    /// Called by expiry timers. Returns None if the effect was already lifted.
    pub fn expire(&self, user_id: u64, guild_id: u64, effect_id: u64) -> Option<EffectsRemoved> {
        let removed = self.ledger.expire(user_id, guild_id, effect_id);
        if removed.is_some() {
            tracing::info!(user_id, guild_id, effect_id, "Effect expired");
        }
        removed
    }

    pub fn active_effects(&self, user_id: u64, guild_id: u64) -> Vec<ActiveEffect> {
        self.ledger.active(user_id, guild_id)
    }

    pub fn is_silenced(&self, user_id: u64, guild_id: u64) -> bool {
        self.ledger
            .silenced_until(user_id, guild_id, Utc::now())
            .is_some()
    }

    pub fn luck(&self, user_id: u64, guild_id: u64) -> f64 {
        self.ledger.luck(user_id, guild_id, Utc::now())
    }

    /// Claim the per-target cooldown slot for a restricted spell.
    ///
    /// Returns the previous cast time so a failed payment can hand the slot back.
    fn reserve_cooldown(
        &self,
        target_id: u64,
        guild_id: u64,
        enchantment: &Enchantment,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, MagicError> {
        let Some(cooldown) = enchantment.target_cooldown else {
            return Ok(None);
        };

        match self.cooldowns.entry((target_id, guild_id, enchantment.id)) {
            Entry::Occupied(mut last) => {
                let available_at = *last.get() + cooldown;
                if now < available_at {
                    return Err(MagicError::OnCooldown {
                        enchantment: enchantment.id,
                        available_at,
                    });
                }
                Ok(Some(last.insert(now)))
            }
            Entry::Vacant(slot) => {
                slot.insert(now);
                Ok(None)
            }
        }
    }

    fn release_cooldown(
        &self,
        target_id: u64,
        guild_id: u64,
        enchantment: &Enchantment,
        reserved_at: DateTime<Utc>,
        previous: Option<DateTime<Utc>>,
    ) {
        if enchantment.target_cooldown.is_none() {
            return;
        }

        let key = (target_id, guild_id, enchantment.id);
        match previous {
            Some(previous) => {
                if let Some(mut last) = self.cooldowns.get_mut(&key) {
                    if *last == reserved_at {
                        *last = previous;
                    }
                }
            }
            None => {
                self.cooldowns.remove_if(&key, |_, last| *last == reserved_at);
            }
        }
    }

    fn apply(
        &self,
        guild_id: u64,
        target: &MemberSnapshot,
        enchantment: &Enchantment,
        now: DateTime<Utc>,
    ) -> EffectApplied {
        let granted_role = match enchantment.side_effect {
            SideEffect::GrantRole(role) => Some(role),
            SideEffect::RandomHouseRole => House::ALL
                .choose(&mut rand::thread_rng())
                .map(|house| RoleKey::House(*house)),
            SideEffect::None | SideEffect::Silence | SideEffect::CleansePotions => None,
        };

        self.ledger
            .apply(guild_id, target, enchantment, granted_role, now)
    }
}
