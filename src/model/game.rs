use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One scheduled match as persisted in `schedule.json`.
///
/// Optional fields are `Option<Option<_>>`: the outer level records whether
/// the key was present at all, so an absent key and an explicit `null` are
/// both written back the way they were read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Display identifier such as `20260401_LG_KT`. Never rewritten here.
    pub id: String,
    pub start: StartTime,
    pub home_team: String,
    pub away_team: String,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "present_or_null")]
    pub home_score: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "present_or_null")]
    pub away_score: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "present_or_null")]
    pub note: Option<Option<String>>,
    // Fields owned by the calendar page (title, stadium, ...) pass through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl GameRecord {
    pub fn key(&self) -> GameKey {
        GameKey::new(self.start.date(), &self.home_team, &self.away_team)
    }

    pub fn home_score(&self) -> Option<i64> {
        self.home_score.flatten()
    }

    pub fn away_score(&self) -> Option<i64> {
        self.away_score.flatten()
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_ref().and_then(|n| n.as_deref())
    }

    /// Copy remote scores onto this record. A side is only written when the
    /// remote value is present and differs. Returns whether anything changed.
    pub fn apply_scores(&mut self, home: Option<i64>, away: Option<i64>) -> bool {
        let mut changed = false;
        if let Some(h) = home {
            if self.home_score() != Some(h) {
                self.home_score = Some(Some(h));
                changed = true;
            }
        }
        if let Some(a) = away {
            if self.away_score() != Some(a) {
                self.away_score = Some(Some(a));
                changed = true;
            }
        }
        changed
    }
}

/// League-local start time. The persisted text is kept and written back
/// verbatim; the parsed value only feeds the natural key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartTime {
    raw: String,
    value: NaiveDateTime,
}

impl StartTime {
    pub fn parse(raw: &str) -> Option<Self> {
        parse_local_datetime(raw).map(|value| Self {
            raw: raw.to_string(),
            value,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> NaiveDateTime {
        self.value
    }

    pub fn date(&self) -> NaiveDate {
        self.value.date()
    }
}

impl Serialize for StartTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for StartTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        StartTime::parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid start date-time: {raw}")))
    }
}

/// Natural key of a game: calendar date plus normalized home and away teams.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameKey {
    date: NaiveDate,
    home: String,
    away: String,
}

impl GameKey {
    pub fn new(date: NaiveDate, home: &str, away: &str) -> Self {
        Self {
            date,
            home: normalize_team(home),
            away: normalize_team(away),
        }
    }

    pub fn home(&self) -> &str {
        &self.home
    }

    pub fn away(&self) -> &str {
        &self.away
    }
}

impl fmt::Display for GameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.date, self.home, self.away)
    }
}

/// Applied to store and remote team identifiers alike: trims, collapses inner
/// whitespace and upper-cases ASCII letters.
pub fn normalize_team(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase()
}

/// Parse a league-local date-time. Accepts full seconds, minutes only, or a
/// bare date (midnight).
pub fn parse_local_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for pat in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, pat) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// Absent key -> None, `null` -> Some(None), value -> Some(Some(v)).
mod present_or_null {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(home_score: Option<i64>, away_score: Option<i64>) -> GameRecord {
        GameRecord {
            id: "20260401_LG_KT".to_string(),
            start: StartTime::parse("2026-04-01T18:30:00").unwrap(),
            home_team: "LG".to_string(),
            away_team: "KT".to_string(),
            home_score: Some(home_score),
            away_score: Some(away_score),
            note: None,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn normalization_is_shared_by_both_sides() {
        let d = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        assert_eq!(GameKey::new(d, " lg ", "kt"), GameKey::new(d, "LG", "KT"));
        assert_eq!(GameKey::new(d, "삼성", "SSG"), GameKey::new(d, "삼성 ", " ssg"));
        assert_ne!(GameKey::new(d, "LG", "KT"), GameKey::new(d, "KT", "LG"));
    }

    #[test]
    fn parses_accepted_start_forms() {
        let full = parse_local_datetime("2026-04-01T18:30:00").unwrap();
        assert_eq!(parse_local_datetime("2026-04-01T18:30"), Some(full));
        let midnight = parse_local_datetime("2026-04-01").unwrap();
        assert_eq!(midnight.date(), full.date());
        assert_eq!(parse_local_datetime("April 1st"), None);
        assert_eq!(parse_local_datetime(""), None);
    }

    #[test]
    fn start_is_written_back_verbatim() {
        for raw in ["2026-04-02T18:30:00.750", "2026-04-02T18:30", "2026-04-02"] {
            let start: StartTime = serde_json::from_value(serde_json::json!(raw)).unwrap();
            assert_eq!(start.date(), NaiveDate::from_ymd_opt(2026, 4, 2).unwrap());
            assert_eq!(serde_json::to_value(&start).unwrap(), serde_json::json!(raw));
        }
        let fractional = StartTime::parse("2026-04-02T18:30:00.750").unwrap();
        assert_eq!(fractional.value().format("%H:%M:%S%.3f").to_string(), "18:30:00.750");
    }

    #[test]
    fn absent_and_null_fields_survive_a_round_trip() {
        let input = serde_json::json!({
            "id": "20260401_LG_KT",
            "start": "2026-04-01T18:30:00",
            "home_team": "LG",
            "away_team": "KT",
            "away_score": null,
            "note": null
        });
        let record: GameRecord = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(record.home_score, None);
        assert_eq!(record.away_score, Some(None));
        assert_eq!(record.note(), None);
        assert_eq!(serde_json::to_value(&record).unwrap(), input);
    }

    #[test]
    fn apply_scores_ignores_absent_and_equal_values() {
        let mut r = record(Some(5), None);
        assert!(!r.apply_scores(None, None));
        assert!(!r.apply_scores(Some(5), None));
        assert!(r.apply_scores(Some(5), Some(3)));
        assert_eq!((r.home_score(), r.away_score()), (Some(5), Some(3)));
        assert!(!r.apply_scores(Some(5), Some(3)));
    }
}
