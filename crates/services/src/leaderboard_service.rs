use std::sync::Arc;

use storage::repository::{ScoreFilter, ScoreRepository};
use trivia_core::leaderboard::{StandingsEntry, aggregate_standings};

use crate::error::LeaderboardError;
use crate::policy::CallPolicy;

/// One leaderboard row with its 1-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub rank: usize,
    pub entry: StandingsEntry,
}

/// Recomputes standings from every score row on each request.
#[derive(Clone)]
pub struct LeaderboardService {
    scores: Arc<dyn ScoreRepository>,
    policy: CallPolicy,
}

impl LeaderboardService {
    #[must_use]
    pub fn new(scores: Arc<dyn ScoreRepository>) -> Self {
        Self {
            scores,
            policy: CallPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current standings, highest total first.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Storage` if the score rows cannot be read.
    pub async fn standings(&self) -> Result<Vec<RankedEntry>, LeaderboardError> {
        let rows = self
            .policy
            .run("list_scores", self.scores.list_scores(ScoreFilter::all()))
            .await?;
        tracing::debug!(rows = rows.len(), "recomputing standings");

        Ok(aggregate_standings(&rows)
            .into_iter()
            .enumerate()
            .map(|(i, entry)| RankedEntry { rank: i + 1, entry })
            .collect())
    }
}
