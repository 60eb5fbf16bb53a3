// Spell and potion definitions
//
// This module defines everything sold in the shop. Spells are cast on
// someone else, potions are drunk (or handed to someone).

use crate::core::house_points::House;
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Unique identifier for every spell and potion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnchantmentId {
    Aguamenti,
    Confundo,
    Diffindo,
    Ebublio,
    Herbifors,
    LocomotorWibbly,
    Serpensortia,
    Tarantallegra,
    Incendio,
    Silencio,
    Alohomora,
    Lumos,
    FelixFelicis,
    DraughtOfLivingDeath,
    Amortentia,
    Polyjuice,
    Bezoar,
}

impl EnchantmentId {
    /// Command-facing name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EnchantmentId::Aguamenti => "aguamenti",
            EnchantmentId::Confundo => "confundo",
            EnchantmentId::Diffindo => "diffindo",
            EnchantmentId::Ebublio => "ebublio",
            EnchantmentId::Herbifors => "herbifors",
            EnchantmentId::LocomotorWibbly => "locomotorwibbly",
            EnchantmentId::Serpensortia => "serpensortia",
            EnchantmentId::Tarantallegra => "tarantallegra",
            EnchantmentId::Incendio => "incendio",
            EnchantmentId::Silencio => "silencio",
            EnchantmentId::Alohomora => "alohomora",
            EnchantmentId::Lumos => "lumos",
            EnchantmentId::FelixFelicis => "felixfelicis",
            EnchantmentId::DraughtOfLivingDeath => "draughtlivingdeath",
            EnchantmentId::Amortentia => "amortentia",
            EnchantmentId::Polyjuice => "polyjuice",
            EnchantmentId::Bezoar => "bezoar",
        }
    }

    /// Parse a name as typed by a member. Case and spaces are ignored, and
    /// the short names older shop listings used are still understood.
    pub fn parse(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "felixf" | "felix" => Some(EnchantmentId::FelixFelicis),
            "livingdeath" | "draughtoflivingdeath" => Some(EnchantmentId::DraughtOfLivingDeath),
            other => EnchantmentId::all()
                .into_iter()
                .find(|id| id.as_str() == other),
        }
    }

    /// Every enchantment, spells first, in shop order.
    pub fn all() -> Vec<EnchantmentId> {
        vec![
            EnchantmentId::Aguamenti,
            EnchantmentId::Confundo,
            EnchantmentId::Diffindo,
            EnchantmentId::Ebublio,
            EnchantmentId::Herbifors,
            EnchantmentId::LocomotorWibbly,
            EnchantmentId::Serpensortia,
            EnchantmentId::Tarantallegra,
            EnchantmentId::Incendio,
            EnchantmentId::Silencio,
            EnchantmentId::Alohomora,
            EnchantmentId::Lumos,
            EnchantmentId::FelixFelicis,
            EnchantmentId::DraughtOfLivingDeath,
            EnchantmentId::Amortentia,
            EnchantmentId::Polyjuice,
            EnchantmentId::Bezoar,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum School {
    Spell,
    Potion,
}

/// How an active enchantment decorates the target's nickname.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NicknameStyle {
    Unchanged,
    Prefix(&'static str),
    Wrap {
        prefix: &'static str,
        suffix: &'static str,
    },
    /// Cut this many characters off the end, if the name is longer than that.
    TrimEnd(usize),
}

/// Roles the bot hands out. The Discord layer maps these to real role IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleKey {
    Alohomora,
    Lumos,
    Amortentia,
    House(House),
}

/// What an enchantment does besides changing the nickname.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    None,
    /// The target cannot cast spells while this is active.
    Silence,
    GrantRole(RoleKey),
    /// Polyjuice: a house role picked at random when drunk.
    RandomHouseRole,
    /// Bezoar: strips every potion effect from the target.
    CleansePotions,
}

/// A spell or potion with its shop metadata and behaviour.
#[derive(Debug, Clone)]
pub struct Enchantment {
    pub id: EnchantmentId,
    pub name: &'static str,
    pub school: School,
    pub cost: i64,
    pub emoji: &'static str,
    pub description: &'static str,
    pub nickname: NicknameStyle,
    pub side_effect: SideEffect,
    /// Shifts the odds in the Room of Requirement and in duels.
    pub luck: f64,
    /// None for instantaneous enchantments.
    pub duration: Option<Duration>,
    /// Minimum time between two casts on the same target.
    pub target_cooldown: Option<Duration>,
}

fn decorating_spell(
    id: EnchantmentId,
    name: &'static str,
    cost: i64,
    emoji: &'static str,
    description: &'static str,
    nickname: NicknameStyle,
) -> Enchantment {
    Enchantment {
        id,
        name,
        school: School::Spell,
        cost,
        emoji,
        description,
        nickname,
        side_effect: SideEffect::None,
        luck: 0.0,
        duration: Some(Duration::hours(24)),
        target_cooldown: None,
    }
}

fn wrap(symbol: &'static str) -> NicknameStyle {
    NicknameStyle::Wrap {
        prefix: symbol,
        suffix: symbol,
    }
}

impl Enchantment {
    /// Look up the definition for an id.
    pub fn get(id: EnchantmentId) -> Self {
        use EnchantmentId::*;

        match id {
            Aguamenti => decorating_spell(
                id,
                "Aguamenti",
                20,
                "🌊",
                "Soaks the target's name in water for a day.",
                wrap("🌊"),
            ),
            Confundo => decorating_spell(
                id,
                "Confundo",
                25,
                "❓",
                "Leaves the target visibly confunded.",
                NicknameStyle::Prefix("❓CONFUNDED - "),
            ),
            Diffindo => decorating_spell(
                id,
                "Diffindo",
                30,
                "✂️",
                "Slices the last five letters off the target's name.",
                NicknameStyle::TrimEnd(5),
            ),
            Ebublio => decorating_spell(
                id,
                "Ebublio",
                20,
                "🫧",
                "Traps the target's name in bubbles.",
                wrap("🫧"),
            ),
            Herbifors => decorating_spell(
                id,
                "Herbifors",
                20,
                "🌸",
                "Makes flowers sprout around the target's name.",
                wrap("🌸"),
            ),
            LocomotorWibbly => decorating_spell(
                id,
                "Locomotor Wibbly",
                20,
                "🍮",
                "Turns the target's legs (and name) to jelly.",
                wrap("🍮"),
            ),
            Serpensortia => decorating_spell(
                id,
                "Serpensortia",
                20,
                "🐍",
                "Conjures snakes either side of the target's name.",
                wrap("🐍"),
            ),
            Tarantallegra => decorating_spell(
                id,
                "Tarantallegra",
                20,
                "💃",
                "Sets the target's name dancing.",
                wrap("💃"),
            ),
            Incendio => decorating_spell(
                id,
                "Incendio",
                25,
                "🔥",
                "Sets the target's name ablaze.",
                wrap("🔥"),
            ),
            Silencio => Enchantment {
                side_effect: SideEffect::Silence,
                target_cooldown: Some(Duration::days(7)),
                ..decorating_spell(
                    id,
                    "Silencio",
                    40,
                    "🤫",
                    "Silences the target: no spellcasting for a day. Once a week per target.",
                    NicknameStyle::Prefix("🤫"),
                )
            },
            Alohomora => Enchantment {
                side_effect: SideEffect::GrantRole(RoleKey::Alohomora),
                target_cooldown: Some(Duration::hours(24)),
                ..decorating_spell(
                    id,
                    "Alohomora",
                    50,
                    "🗝️",
                    "Unlocks the Room of Requirement for the target. Once a day per target.",
                    NicknameStyle::Unchanged,
                )
            },
            Lumos => Enchantment {
                side_effect: SideEffect::GrantRole(RoleKey::Lumos),
                ..decorating_spell(
                    id,
                    "Lumos",
                    15,
                    "⭐",
                    "Lights the target up with the Lumos role.",
                    NicknameStyle::Prefix("⭐"),
                )
            },
            FelixFelicis => Enchantment {
                id,
                name: "Felix Felicis",
                school: School::Potion,
                cost: 60,
                emoji: "🍀",
                description: "Liquid luck: much better odds in the Room of Requirement.",
                nickname: NicknameStyle::Prefix("🍀"),
                side_effect: SideEffect::None,
                luck: 0.5,
                duration: Some(Duration::hours(24)),
                target_cooldown: None,
            },
            DraughtOfLivingDeath => Enchantment {
                id,
                name: "Draught of Living Death",
                school: School::Potion,
                cost: 50,
                emoji: "💀",
                description: "A curse in a bottle: the drinker's luck runs out.",
                nickname: NicknameStyle::Prefix("💀"),
                side_effect: SideEffect::None,
                luck: -0.5,
                duration: Some(Duration::hours(24)),
                target_cooldown: None,
            },
            Amortentia => Enchantment {
                id,
                name: "Amortentia",
                school: School::Potion,
                cost: 70,
                emoji: "💖",
                description: "The most powerful love potion. Grants the Amortentia role.",
                nickname: NicknameStyle::Prefix("💖"),
                side_effect: SideEffect::GrantRole(RoleKey::Amortentia),
                luck: 0.0,
                duration: Some(Duration::hours(24)),
                target_cooldown: None,
            },
            Polyjuice => Enchantment {
                id,
                name: "Polyjuice Potion",
                school: School::Potion,
                cost: 80,
                emoji: "🧪",
                description: "Disguises the drinker as a member of a random house.",
                nickname: NicknameStyle::Unchanged,
                side_effect: SideEffect::RandomHouseRole,
                luck: 0.0,
                duration: Some(Duration::hours(24)),
                target_cooldown: None,
            },
            Bezoar => Enchantment {
                id,
                name: "Bezoar",
                school: School::Potion,
                cost: 30,
                emoji: "🪨",
                description: "Cures all potion effects at once.",
                nickname: NicknameStyle::Unchanged,
                side_effect: SideEffect::CleansePotions,
                luck: 0.0,
                duration: None,
                target_cooldown: None,
            },
        }
    }

    /// Get all enchantments of one school, in shop order.
    pub fn by_school(school: School) -> Vec<Enchantment> {
        EnchantmentId::all()
            .into_iter()
            .map(Enchantment::get)
            .filter(|e| e.school == school)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_every_id() {
        for id in EnchantmentId::all() {
            assert_eq!(EnchantmentId::parse(id.as_str()), Some(id));
        }
    }

    #[test]
    fn test_parse_is_forgiving() {
        assert_eq!(
            EnchantmentId::parse("Locomotor Wibbly"),
            Some(EnchantmentId::LocomotorWibbly)
        );
        assert_eq!(
            EnchantmentId::parse("FELIXF"),
            Some(EnchantmentId::FelixFelicis)
        );
        assert_eq!(
            EnchantmentId::parse("livingdeath"),
            Some(EnchantmentId::DraughtOfLivingDeath)
        );
        assert_eq!(EnchantmentId::parse("avadakedavra"), None);
    }

    #[test]
    fn test_shop_split() {
        let spells = Enchantment::by_school(School::Spell);
        let potions = Enchantment::by_school(School::Potion);
        assert_eq!(spells.len(), 12);
        assert_eq!(potions.len(), 5);
        assert_eq!(spells[0].id, EnchantmentId::Aguamenti);
        assert_eq!(potions[4].id, EnchantmentId::Bezoar);
    }

    #[test]
    fn test_costs() {
        assert_eq!(Enchantment::get(EnchantmentId::Silencio).cost, 40);
        assert_eq!(Enchantment::get(EnchantmentId::Alohomora).cost, 50);
        assert_eq!(Enchantment::get(EnchantmentId::Lumos).cost, 15);
        assert_eq!(Enchantment::get(EnchantmentId::Polyjuice).cost, 80);
    }

    #[test]
    fn test_cooldowns_only_on_restricted_spells() {
        let restricted: Vec<EnchantmentId> = EnchantmentId::all()
            .into_iter()
            .filter(|id| Enchantment::get(*id).target_cooldown.is_some())
            .collect();
        assert_eq!(
            restricted,
            vec![EnchantmentId::Silencio, EnchantmentId::Alohomora]
        );
    }

    #[test]
    fn test_bezoar_is_instant() {
        let bezoar = Enchantment::get(EnchantmentId::Bezoar);
        assert!(bezoar.duration.is_none());
        assert_eq!(bezoar.side_effect, SideEffect::CleansePotions);
    }
}
