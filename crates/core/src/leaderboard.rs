//! Per-user standings derived from flat score rows.

use std::collections::HashMap;

use crate::model::{ScoreRecord, UserId};

/// A derived, per-user summed score used for ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingsEntry {
    pub user_id: UserId,
    pub user_email: Option<String>,
    pub total_score: u64,
}

/// Group score rows by user, sum their scores and rank by total, highest first.
///
/// Rows without a user are skipped. A user's email is the first non-empty one
/// seen for that user. Equal totals keep the order in which their users first
/// appear in `rows`.
pub fn aggregate_standings<'a, I>(rows: I) -> Vec<StandingsEntry>
where
    I: IntoIterator<Item = &'a ScoreRecord>,
{
    let mut index: HashMap<UserId, usize> = HashMap::new();
    let mut standings: Vec<StandingsEntry> = Vec::new();

    for row in rows {
        let Some(user_id) = row.user_id else {
            continue;
        };
        let email = row
            .user_email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty());

        let slot = *index.entry(user_id).or_insert_with(|| {
            standings.push(StandingsEntry {
                user_id,
                user_email: None,
                total_score: 0,
            });
            standings.len() - 1
        });

        let entry = &mut standings[slot];
        entry.total_score = entry.total_score.saturating_add(u64::from(row.score));
        if entry.user_email.is_none() {
            entry.user_email = email.map(str::to_owned);
        }
    }

    standings.sort_by(|a, b| b.total_score.cmp(&a.total_score));
    standings
}
