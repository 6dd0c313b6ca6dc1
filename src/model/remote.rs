use serde::{Deserialize, Serialize};

/// Top-level body returned by the Naver schedule endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleDocument {
    pub result: ScheduleResult,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleResult {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub games: Vec<RemoteGameRecord>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteGameRecord {
    pub game_date_time: String,
    pub home_team_code: String,
    pub away_team_code: String,
    #[serde(default)]
    pub home_team_name: Option<String>,
    #[serde(default)]
    pub away_team_name: Option<String>,
    #[serde(default)]
    pub home_team_score: Option<i64>,
    #[serde(default)]
    pub away_team_score: Option<i64>,
    #[serde(default, deserialize_with = "null_as_unknown")]
    pub game_status: GameStatus,
    #[serde(default)]
    pub cancel: Option<bool>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    #[serde(rename = "BEFORE")]
    Scheduled,
    #[serde(rename = "STARTED")]
    InProgress,
    #[serde(rename = "RESULT", alias = "END")]
    Finished,
    #[serde(rename = "CANCEL")]
    Cancelled,
    #[default]
    #[serde(other)]
    Unknown,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<RemoteGameRecord>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<RemoteGameRecord>>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_unknown<'de, D>(deserializer: D) -> Result<GameStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<GameStatus>::deserialize(deserializer)?.unwrap_or_default())
}
