use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Naver team code -> team identifier used in `schedule.json`.
const KBO_ALIASES: [(&str, &str); 10] = [
    ("LG", "LG"),
    ("KT", "KT"),
    ("SS", "삼성"),
    ("NC", "NC"),
    ("OB", "두산"),
    ("HT", "KIA"),
    ("LT", "롯데"),
    ("HH", "한화"),
    ("WO", "키움"),
    ("SK", "SSG"),
];

/// Maps remote team codes onto the store's team vocabulary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamAliasTable {
    aliases: HashMap<String, String>,
}

/// Outcome of translating one remote team reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TeamResolution {
    Canonical(String),
    /// Code missing from the table; the source's own display name is used instead.
    Fallback(String),
    Unresolved,
}

impl TeamResolution {
    pub fn name(&self) -> Option<&str> {
        match self {
            TeamResolution::Canonical(n) | TeamResolution::Fallback(n) => Some(n),
            TeamResolution::Unresolved => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, TeamResolution::Fallback(_))
    }
}

impl Default for TeamAliasTable {
    fn default() -> Self {
        Self::kbo()
    }
}

impl TeamAliasTable {
    /// The ten KBO clubs as coded by Naver.
    pub fn kbo() -> Self {
        let aliases = KBO_ALIASES
            .iter()
            .map(|(code, name)| (code.to_string(), name.to_string()))
            .collect();
        Self { aliases }
    }

    /// Layer `overrides` on top of this table, replacing existing codes.
    pub fn with_overrides(mut self, overrides: &HashMap<String, String>) -> Self {
        for (code, name) in overrides {
            self.aliases.insert(code.clone(), name.clone());
        }
        self
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.aliases.get(code.trim()).map(|s| s.as_str())
    }

    pub fn resolve(&self, code: &str, display_name: Option<&str>) -> TeamResolution {
        if let Some(name) = self.get(code) {
            return TeamResolution::Canonical(name.to_string());
        }
        match display_name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => TeamResolution::Fallback(name.to_string()),
            None => TeamResolution::Unresolved,
        }
    }
}
