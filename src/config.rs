// Bot configuration: which channels and roles on the server Hedwig manages.
//
// Values start from the defaults for the home server, can be replaced by a
// JSON file named in HEDWIG_CONFIG, and the channel IDs can be overridden
// individually from the environment.

use crate::core::house_points::House;
use crate::core::magic::RoleKey;
use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU64;
use std::path::Path;

const fn channel_id(id: u64) -> NonZeroU64 {
    match NonZeroU64::new(id) {
        Some(id) => id,
        None => panic!("channel ID must not be zero"),
    }
}

const OWLRY: NonZeroU64 = channel_id(1410875871249829898);
const ROOM_OF_REQUIREMENT: NonZeroU64 = channel_id(1413134135169646624);
const GRINGOTTS: NonZeroU64 = channel_id(1413047433016901743);

/// Channel IDs are never zero; a 0 in the file or environment is a config error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Where Hedwig announces herself on startup.
    pub owlry: Option<NonZeroU64>,
    pub room_of_requirement: NonZeroU64,
    /// Daily allowance announcements. Falls back to the invoking channel.
    pub gringotts: Option<NonZeroU64>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            owlry: Some(OWLRY),
            room_of_requirement: ROOM_OF_REQUIREMENT,
            gringotts: Some(GRINGOTTS),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleConfig {
    pub lumos: u64,
    pub amortentia: u64,
    pub head_of_house: u64,
    pub prefects: u64,
    pub gryffindor: u64,
    pub slytherin: u64,
    pub ravenclaw: u64,
    pub hufflepuff: u64,
    /// If unset, the Alohomora role is looked up by `alohomora_name`.
    pub alohomora: Option<u64>,
    pub alohomora_name: String,
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            lumos: 1413122717682761788,
            amortentia: 1414255673973280909,
            head_of_house: 1398804285114028042,
            prefects: 1398803828677021838,
            gryffindor: 1409203925416149105,
            slytherin: 1398803575253237891,
            ravenclaw: 1398803644236955729,
            hufflepuff: 1409203862757310534,
            alohomora: None,
            alohomora_name: "Alohomora".to_string(),
        }
    }
}

/// A role as the config knows it: by ID, or only by name.
#[derive(Debug, Clone, PartialEq)]
pub enum RoleRef {
    Id(u64),
    Named(String),
}

impl RoleConfig {
    /// Members holding any of these count as staff.
    pub fn staff_roles(&self) -> [u64; 2] {
        [self.prefects, self.head_of_house]
    }

    pub fn house_role(&self, house: House) -> u64 {
        match house {
            House::Gryffindor => self.gryffindor,
            House::Slytherin => self.slytherin,
            House::Ravenclaw => self.ravenclaw,
            House::Hufflepuff => self.hufflepuff,
        }
    }

    pub fn resolve(&self, key: RoleKey) -> RoleRef {
        match key {
            RoleKey::Lumos => RoleRef::Id(self.lumos),
            RoleKey::Amortentia => RoleRef::Id(self.amortentia),
            RoleKey::House(house) => RoleRef::Id(self.house_role(house)),
            RoleKey::Alohomora => match self.alohomora {
                Some(id) => RoleRef::Id(id),
                None => RoleRef::Named(self.alohomora_name.clone()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmojiConfig {
    pub gryffindor: String,
    pub slytherin: String,
    pub ravenclaw: String,
    pub hufflepuff: String,
    /// Shown in the Room of Requirement, one per potion.
    pub potions: Vec<String>,
}

impl Default for EmojiConfig {
    fn default() -> Self {
        Self {
            gryffindor: "<:gryffindor:1398846272114524300>".to_string(),
            slytherin: "<:slytherin:1398846083463122984>".to_string(),
            ravenclaw: "<:ravenclaw:1398846388430835752>".to_string(),
            hufflepuff: "<:hufflepuff:1398846494844387379>".to_string(),
            potions: vec![
                "<:potion1:1413860131073953856>".to_string(),
                "<:potion2:1413860185801490463>".to_string(),
                "<:potion3:1413860235382231202>".to_string(),
                "<:potion4:1413860291124531220>".to_string(),
                "<:potion5:1413860345055019201>".to_string(),
            ],
        }
    }
}

impl EmojiConfig {
    pub fn house(&self, house: House) -> &str {
        match house {
            House::Gryffindor => &self.gryffindor,
            House::Slytherin => &self.slytherin,
            House::Ravenclaw => &self.ravenclaw,
            House::Hufflepuff => &self.hufflepuff,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub channels: ChannelConfig,
    pub roles: RoleConfig,
    pub emojis: EmojiConfig,
    /// How long the Room of Requirement stays messy after a pick.
    pub room_purge_delay_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            channels: ChannelConfig::default(),
            roles: RoleConfig::default(),
            emojis: EmojiConfig::default(),
            room_purge_delay_secs: 30 * 60,
        }
    }
}

impl BotConfig {
    /// Defaults, then HEDWIG_CONFIG (if set), then environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::env::var("HEDWIG_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open config file {}", path.display()))?;
        serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply per-channel overrides. `lookup` is usually `std::env::var`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse = |key: &str| -> anyhow::Result<Option<NonZeroU64>> {
            lookup(key)
                .map(|v| {
                    v.trim()
                        .parse::<NonZeroU64>()
                        .with_context(|| format!("{key} must be a channel ID, got {v:?}"))
                })
                .transpose()
        };

        if let Some(id) = parse("HEDWIG_ROOM_CHANNEL_ID")? {
            self.channels.room_of_requirement = id;
        }
        if let Some(id) = parse("HEDWIG_GRINGOTTS_CHANNEL_ID")? {
            self.channels.gringotts = Some(id);
        }
        if let Some(id) = parse("HEDWIG_OWLRY_CHANNEL_ID")? {
            self.channels.owlry = Some(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_cover_every_potion() {
        let config = BotConfig::default();
        assert_eq!(
            config.emojis.potions.len(),
            usize::from(crate::core::room::POTION_COUNT)
        );
        assert_eq!(config.room_purge_delay_secs, 1800);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "channels": {{ "room_of_requirement": 42 }}, "roles": {{ "alohomora": 7 }} }}"#
        )
        .unwrap();

        let config = BotConfig::from_file(file.path()).unwrap();
        assert_eq!(config.channels.room_of_requirement.get(), 42);
        assert_eq!(config.channels.gringotts, ChannelConfig::default().gringotts);
        assert_eq!(config.roles.resolve(RoleKey::Alohomora), RoleRef::Id(7));
        assert_eq!(config.roles.lumos, RoleConfig::default().lumos);
    }

    #[test]
    fn test_unreadable_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(BotConfig::from_file(file.path()).is_err());
        assert!(BotConfig::from_file("/definitely/not/here.json").is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("HEDWIG_ROOM_CHANNEL_ID", "11"),
            ("HEDWIG_GRINGOTTS_CHANNEL_ID", " 22 "),
        ]);

        let mut config = BotConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.channels.room_of_requirement.get(), 11);
        assert_eq!(config.channels.gringotts, NonZeroU64::new(22));
        assert_eq!(config.channels.owlry, ChannelConfig::default().owlry);

        let bad: HashMap<&str, &str> = HashMap::from([("HEDWIG_OWLRY_CHANNEL_ID", "owls")]);
        assert!(config
            .apply_overrides(|key| bad.get(key).map(|v| v.to_string()))
            .is_err());
    }

    #[test]
    fn test_zero_channel_override_rejected() {
        let env: HashMap<&str, &str> = HashMap::from([("HEDWIG_ROOM_CHANNEL_ID", "0")]);

        let mut config = BotConfig::default();
        assert!(config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .is_err());
        assert_eq!(
            config.channels.room_of_requirement,
            ChannelConfig::default().room_of_requirement
        );
    }

    #[test]
    fn test_zero_channel_in_file_rejected() {
        for body in [
            r#"{ "channels": { "room_of_requirement": 0 } }"#,
            r#"{ "channels": { "gringotts": 0 } }"#,
        ] {
            let mut file = NamedTempFile::new().unwrap();
            write!(file, "{}", body).unwrap();
            assert!(BotConfig::from_file(file.path()).is_err(), "{}", body);
        }

        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "channels": {{ "owlry": null }} }}"#).unwrap();
        assert_eq!(BotConfig::from_file(file.path()).unwrap().channels.owlry, None);
    }

    #[test]
    fn test_alohomora_falls_back_to_name() {
        let roles = RoleConfig::default();
        assert_eq!(
            roles.resolve(RoleKey::Alohomora),
            RoleRef::Named("Alohomora".to_string())
        );
        assert_eq!(
            roles.resolve(RoleKey::House(House::Ravenclaw)),
            RoleRef::Id(roles.ravenclaw)
        );
    }
}
