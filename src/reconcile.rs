use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::Mode;
use crate::error::{RemoteFetchError, SyncError};
use crate::model::game::{GameKey, parse_local_datetime};
use crate::model::remote::RemoteGameRecord;
use crate::model::team::TeamAliasTable;
use crate::model::window::DateRange;
use crate::store::{Schedule, ScheduleStore};

/// Where authoritative game results come from.
pub trait RemoteSource {
    /// One request covering `window`. An empty vector is a valid answer.
    fn fetch(&self, window: &DateRange, sport_id: &str) -> Result<Vec<RemoteGameRecord>, RemoteFetchError>;
}

/// Counters describing one reconcile pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub fetched_total: usize,
    pub matched: usize,
    /// Records with at least one score changed.
    pub updated: usize,
    pub skipped_unmatched: usize,
    /// Remote entries with no usable team identifier or date.
    pub skipped_unresolved: usize,
    /// Remote entries whose key appears more than once in the batch.
    pub skipped_ambiguous: usize,
    /// Team references resolved through the source's display name.
    pub unresolved_aliases: usize,
    pub persisted: bool,
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fetched {} games: {} matched, {} updated, {} unmatched, {} unresolved, {} ambiguous ({} alias fallbacks); {}",
            self.fetched_total,
            self.matched,
            self.updated,
            self.skipped_unmatched,
            self.skipped_unresolved,
            self.skipped_ambiguous,
            self.unresolved_aliases,
            if self.persisted { "schedule saved" } else { "no write" },
        )
    }
}

/// Bring `schedule` in line with `batch` without any I/O.
///
/// Only `home_score`/`away_score` are touched, and only where the remote side
/// reports a value that differs from the stored one.
pub fn reconcile_batch(
    mut schedule: Schedule,
    batch: &[RemoteGameRecord],
    aliases: &TeamAliasTable,
) -> (Schedule, ReconcileReport) {
    let mut report = ReconcileReport {
        fetched_total: batch.len(),
        ..ReconcileReport::default()
    };

    let mut translated: Vec<(GameKey, &RemoteGameRecord)> = Vec::with_capacity(batch.len());
    for remote in batch {
        match translate(remote, aliases, &mut report) {
            Some(key) => translated.push((key, remote)),
            None => report.skipped_unresolved += 1,
        }
    }

    // A key reported more than once (doubleheaders) cannot be tied to a single
    // record, so none of its entries are applied.
    let mut occurrences: HashMap<&GameKey, usize> = HashMap::with_capacity(translated.len());
    for (key, _) in &translated {
        *occurrences.entry(key).or_insert(0) += 1;
    }

    for (key, remote) in &translated {
        let count = occurrences.get(key).copied().unwrap_or(0);
        if count > 1 {
            report.skipped_ambiguous += 1;
            warn!(key = %key, entries = count, status = ?remote.game_status, "Several remote entries share one game key, skipping");
            continue;
        }

        match schedule.apply_scores(key, remote.home_team_score, remote.away_team_score) {
            None => {
                debug!(key = %key, status = ?remote.game_status, "No local game for remote entry");
                report.skipped_unmatched += 1;
            }
            Some(changed) => {
                report.matched += 1;
                if changed {
                    report.updated += 1;
                    let id = schedule.find_by_key(key).map(|g| g.id.as_str()).unwrap_or_default();
                    info!(
                        id,
                        status = ?remote.game_status,
                        cancelled = remote.cancel.unwrap_or(false),
                        home = key.home(),
                        away = key.away(),
                        home_score = ?remote.home_team_score,
                        away_score = ?remote.away_team_score,
                        "Updated game"
                    );
                }
            }
        }
    }

    (schedule, report)
}

/// Turn a remote entry into the natural key used by the store.
fn translate(remote: &RemoteGameRecord, aliases: &TeamAliasTable, report: &mut ReconcileReport) -> Option<GameKey> {
    let Some(date) = remote_date(&remote.game_date_time) else {
        warn!(game_date_time = %remote.game_date_time, "Unparsable remote game date");
        return None;
    };

    let home = aliases.resolve(&remote.home_team_code, remote.home_team_name.as_deref());
    let away = aliases.resolve(&remote.away_team_code, remote.away_team_name.as_deref());

    for (code, resolution) in [(&remote.home_team_code, &home), (&remote.away_team_code, &away)] {
        if resolution.is_fallback() {
            report.unresolved_aliases += 1;
            info!(code = %code, fallback = resolution.name().unwrap_or_default(), "Unmapped team code, using source display name");
        }
    }

    match (home.name(), away.name()) {
        (Some(h), Some(a)) => Some(GameKey::new(date, h, a)),
        _ => {
            warn!(
                home_code = %remote.home_team_code,
                away_code = %remote.away_team_code,
                "Unmapped team code without display name, skipping"
            );
            None
        }
    }
}

/// Calendar date of a remote date-time, with or without an offset.
fn remote_date(raw: &str) -> Option<NaiveDate> {
    if let Some(dt) = parse_local_datetime(raw) {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.naive_local().date())
}

/// Per-run settings, passed in rather than read from globals so several
/// leagues or windows can be reconciled side by side.
#[derive(Clone, Debug)]
pub struct ReconcileSettings {
    pub sport_id: String,
    pub aliases: TeamAliasTable,
    pub mode: Mode,
}

/// Drives one load, fetch, diff, persist pass.
#[derive(Debug)]
pub struct Reconciler<S, R> {
    store: S,
    source: R,
    settings: ReconcileSettings,
}

impl<S: ScheduleStore, R: RemoteSource> Reconciler<S, R> {
    pub fn new(store: S, source: R, settings: ReconcileSettings) -> Self {
        Self { store, source, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn source(&self) -> &R {
        &self.source
    }

    /// Run one pass over `window`.
    ///
    /// The store is loaded before any network call and written at most once,
    /// only when a score changed. Any error leaves the stored schedule as it was.
    #[instrument(level = "info", skip(self, window), fields(window = %window, sport_id = %self.settings.sport_id, mode = ?self.settings.mode))]
    pub fn reconcile(&mut self, window: DateRange) -> Result<ReconcileReport, SyncError> {
        let schedule = self.store.load()?;
        let batch = self.source.fetch(&window, &self.settings.sport_id)?;

        if batch.is_empty() {
            info!("No games found from remote source for this window");
            return Ok(ReconcileReport::default());
        }

        let (schedule, mut report) = reconcile_batch(schedule, &batch, &self.settings.aliases);

        if report.updated == 0 {
            info!("No updates necessary");
        } else {
            match self.settings.mode {
                Mode::Production => {
                    self.store.persist(&schedule)?;
                    report.persisted = true;
                }
                Mode::Test => {
                    info!(updated = report.updated, "Test mode, leaving schedule untouched");
                }
            }
        }

        info!(
            fetched_total = report.fetched_total,
            matched = report.matched,
            updated = report.updated,
            skipped_unmatched = report.skipped_unmatched,
            skipped_unresolved = report.skipped_unresolved,
            skipped_ambiguous = report.skipped_ambiguous,
            unresolved_aliases = report.unresolved_aliases,
            persisted = report.persisted,
            "Reconcile finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_date_truncates_with_or_without_offset() {
        let d = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        assert_eq!(remote_date("2026-04-01T18:30:00"), Some(d));
        assert_eq!(remote_date("2026-04-01T18:30:00+09:00"), Some(d));
        assert_eq!(remote_date("2026-04-01"), Some(d));
        assert_eq!(remote_date("soon"), None);
    }

    #[test]
    fn report_summary_mentions_write() {
        let report = ReconcileReport {
            fetched_total: 3,
            matched: 1,
            updated: 1,
            skipped_unmatched: 2,
            persisted: true,
            ..ReconcileReport::default()
        };
        let line = report.to_string();
        assert!(line.starts_with("fetched 3 games: 1 matched, 1 updated, 2 unmatched"), "line was: {}", line);
        assert!(line.ends_with("schedule saved"));
    }
}
