// Magic module - spells, potions and the effects they leave behind

pub mod effect_ledger;
pub mod enchantments;
mod magic_service;

pub use effect_ledger::{
    compose_nickname, ActiveEffect, EffectApplied, EffectLedger, EffectsRemoved, MemberSnapshot,
    NicknameChange,
};
pub use enchantments::{Enchantment, EnchantmentId, NicknameStyle, RoleKey, School, SideEffect};
pub use magic_service::{CastOutcome, EffectOutcome, MagicError, MagicService};
