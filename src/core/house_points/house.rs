use serde::{Deserialize, Serialize};
use std::fmt;

/// The four Hogwarts houses, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum House {
    Gryffindor,
    Slytherin,
    Ravenclaw,
    Hufflepuff,
}

impl House {
    pub const ALL: [House; 4] = [
        House::Gryffindor,
        House::Slytherin,
        House::Ravenclaw,
        House::Hufflepuff,
    ];

    /// Lowercase key, as typed in commands.
    pub fn as_str(&self) -> &'static str {
        match self {
            House::Gryffindor => "gryffindor",
            House::Slytherin => "slytherin",
            House::Ravenclaw => "ravenclaw",
            House::Hufflepuff => "hufflepuff",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            House::Gryffindor => "Gryffindor",
            House::Slytherin => "Slytherin",
            House::Ravenclaw => "Ravenclaw",
            House::Hufflepuff => "Hufflepuff",
        }
    }

    /// Case-insensitive parse.
    pub fn parse(s: &str) -> Option<Self> {
        let needle = s.trim().to_lowercase();
        House::ALL.into_iter().find(|h| h.as_str() == needle)
    }

    /// Position in canonical order, used as a tiebreaker.
    pub fn ordinal(&self) -> usize {
        House::ALL.iter().position(|h| h == self).unwrap_or(0)
    }
}

impl fmt::Display for House {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(House::parse("Gryffindor"), Some(House::Gryffindor));
        assert_eq!(House::parse("  RAVENCLAW "), Some(House::Ravenclaw));
        assert_eq!(House::parse("durmstrang"), None);
    }

    #[test]
    fn test_ordinal_follows_canonical_order() {
        let ordinals: Vec<usize> = House::ALL.iter().map(House::ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3]);
    }
}
