// Active spell and potion effects per member.
//
// The ledger remembers what a member was called before the first effect
// landed, keeps every active effect in the order it was applied, and works
// out the nickname and role changes that follow from each apply/remove.
// It never talks to Discord itself.

use super::enchantments::{Enchantment, EnchantmentId, NicknameStyle, RoleKey, School, SideEffect};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Discord rejects nicknames longer than this.
pub const MAX_NICKNAME_CHARS: usize = 32;

/// What we need to know about a member's current name and roles.
#[derive(Debug, Clone)]
pub struct MemberSnapshot {
    pub user_id: u64,
    pub display_name: String,
    /// Guild nickname, if the member has one.
    pub nickname: Option<String>,
    /// Effect-related roles the member currently has.
    pub held_roles: Vec<RoleKey>,
}

/// One spell or potion currently affecting a member.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEffect {
    pub id: u64,
    pub enchantment: EnchantmentId,
    pub applied_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Role handed out by this effect. Recorded so Polyjuice's random house
    /// can be taken back later.
    pub granted_role: Option<RoleKey>,
}

impl ActiveEffect {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NicknameChange {
    Set(String),
    /// Last effect gone: put back whatever the member had before.
    Restore(Option<String>),
}

#[derive(Debug, Clone)]
pub struct EffectApplied {
    pub effect: ActiveEffect,
    pub grant_role: Option<RoleKey>,
    pub nickname: NicknameChange,
}

#[derive(Debug, Clone)]
pub struct EffectsRemoved {
    pub removed: Vec<ActiveEffect>,
    /// Roles no remaining effect still grants.
    pub revoke_roles: Vec<RoleKey>,
    pub nickname: NicknameChange,
}

#[derive(Debug, Clone)]
struct AfflictedMember {
    base_name: String,
    original_nick: Option<String>,
    effects: Vec<ActiveEffect>,
}

/// Build the decorated nickname from the base name and effects, oldest first.
pub fn compose_nickname(base: &str, effects: &[ActiveEffect]) -> String {
    let mut name = base.to_string();

    for effect in effects {
        match Enchantment::get(effect.enchantment).nickname {
            NicknameStyle::Unchanged => {}
            NicknameStyle::Prefix(prefix) => name = format!("{prefix}{name}"),
            NicknameStyle::Wrap { prefix, suffix } => name = format!("{prefix}{name}{suffix}"),
            NicknameStyle::TrimEnd(length) => {
                let count = name.chars().count();
                if length > 0 && count > length {
                    name = name.chars().take(count - length).collect();
                }
            }
        }
    }

    name.chars().take(MAX_NICKNAME_CHARS).collect()
}

/// In-memory record of who is under which effect, keyed by (user_id, guild_id).
pub struct EffectLedger {
    members: DashMap<(u64, u64), AfflictedMember>,
    next_id: AtomicU64,
}

impl EffectLedger {
    pub fn new() -> Self {
        Self {
            members: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Record a new effect and return the resulting Discord changes.
    ///
    /// A role the member already held, and that no active effect handed out,
    /// is theirs: it is neither granted nor recorded, so expiry never takes it.
    pub fn apply(
        &self,
        guild_id: u64,
        target: &MemberSnapshot,
        enchantment: &Enchantment,
        granted_role: Option<RoleKey>,
        now: DateTime<Utc>,
    ) -> EffectApplied {
        let mut member = self
            .members
            .entry((target.user_id, guild_id))
            .or_insert_with(|| AfflictedMember {
                base_name: target.display_name.clone(),
                original_nick: target.nickname.clone(),
                effects: Vec::new(),
            });

        let granted_role = granted_role.filter(|role| {
            !target.held_roles.contains(role)
                || member.effects.iter().any(|e| e.granted_role == Some(*role))
        });
        let effect = ActiveEffect {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            enchantment: enchantment.id,
            applied_at: now,
            expires_at: enchantment.duration.map(|d| now + d),
            granted_role,
        };
        member.effects.push(effect.clone());
        let nickname = NicknameChange::Set(compose_nickname(&member.base_name, &member.effects));

        EffectApplied {
            effect,
            grant_role: granted_role,
            nickname,
        }
    }

    /// Remove every effect matching `predicate`. None if nothing matched.
    pub fn remove_where<F>(&self, user_id: u64, guild_id: u64, predicate: F) -> Option<EffectsRemoved>
    where
        F: Fn(&ActiveEffect) -> bool,
    {
        let key = (user_id, guild_id);
        let mut member = self.members.get_mut(&key)?;

        let (removed, kept): (Vec<ActiveEffect>, Vec<ActiveEffect>) =
            member.effects.drain(..).partition(|e| predicate(e));
        member.effects = kept;

        if removed.is_empty() {
            return None;
        }

        let mut revoke_roles: Vec<RoleKey> = Vec::new();
        for role in removed.iter().filter_map(|e| e.granted_role) {
            let still_granted = member.effects.iter().any(|e| e.granted_role == Some(role));
            if !still_granted && !revoke_roles.contains(&role) {
                revoke_roles.push(role);
            }
        }

        let nickname = if member.effects.is_empty() {
            let original = member.original_nick.clone();
            drop(member);
            self.members.remove_if(&key, |_, m| m.effects.is_empty());
            NicknameChange::Restore(original)
        } else {
            NicknameChange::Set(compose_nickname(&member.base_name, &member.effects))
        };

        Some(EffectsRemoved {
            removed,
            revoke_roles,
            nickname,
        })
    }

    /// Remove a single effect by id. Safe to call after it is already gone.
    pub fn expire(&self, user_id: u64, guild_id: u64, effect_id: u64) -> Option<EffectsRemoved> {
        self.remove_where(user_id, guild_id, |e| e.id == effect_id)
    }

    /// Remove the most recent effect, optionally only among one enchantment.
    pub fn remove_latest(
        &self,
        user_id: u64,
        guild_id: u64,
        filter: Option<EnchantmentId>,
    ) -> Option<EffectsRemoved> {
        let target_id = self
            .members
            .get(&(user_id, guild_id))?
            .effects
            .iter()
            .rev()
            .find(|e| filter.map_or(true, |id| e.enchantment == id))
            .map(|e| e.id)?;

        self.expire(user_id, guild_id, target_id)
    }

    /// Strip every potion effect (Bezoar).
    pub fn cleanse_potions(&self, user_id: u64, guild_id: u64) -> Option<EffectsRemoved> {
        self.remove_where(user_id, guild_id, |e| {
            Enchantment::get(e.enchantment).school == School::Potion
        })
    }

    pub fn active(&self, user_id: u64, guild_id: u64) -> Vec<ActiveEffect> {
        self.members
            .get(&(user_id, guild_id))
            .map(|m| m.effects.clone())
            .unwrap_or_default()
    }

    /// When the member's silence lifts, if they are silenced at `now`.
    pub fn silenced_until(
        &self,
        user_id: u64,
        guild_id: u64,
        now: DateTime<Utc>,
    ) -> Option<Option<DateTime<Utc>>> {
        let member = self.members.get(&(user_id, guild_id))?;
        member
            .effects
            .iter()
            .filter(|e| e.is_live(now))
            .filter(|e| Enchantment::get(e.enchantment).side_effect == SideEffect::Silence)
            .map(|e| e.expires_at)
            .max_by(|a, b| match (a, b) {
                (None, None) => std::cmp::Ordering::Equal,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (Some(_), None) => std::cmp::Ordering::Less,
                (Some(x), Some(y)) => x.cmp(y),
            })
    }

    /// Sum of luck modifiers from live effects, clamped to [-1, 1].
    pub fn luck(&self, user_id: u64, guild_id: u64, now: DateTime<Utc>) -> f64 {
        self.members
            .get(&(user_id, guild_id))
            .map(|m| {
                m.effects
                    .iter()
                    .filter(|e| e.is_live(now))
                    .map(|e| Enchantment::get(e.enchantment).luck)
                    .sum::<f64>()
            })
            .unwrap_or(0.0)
            .clamp(-1.0, 1.0)
    }
}

impl Default for EffectLedger {
    fn default() -> Self {
        Self::new()
    }
}
