//! Cached data access for the front end.
//!
//! [`LeagueSource`] is whatever can produce authoritative views (the local
//! session, or a worker reached over messages). [`LeagueViews`] puts the
//! generation cache in front of it using the canonical key families.
use async_trait::async_trait;

use crate::cache::{Clock, GenerationCache, SystemClock};
use crate::keys::{leaderboard_key, player_key, roster_key, standings_key};
use crate::league::{LeagueError, PlayerId, TeamId};
use crate::session::LeagueSession;
use crate::views::{self, Leaderboard, PlayerProfile, RosterView, Standings, Stat};

/// Producer of authoritative league views.
#[async_trait(?Send)]
pub trait LeagueSource {
    type Error: std::error::Error + 'static;

    async fn standings(&self, season: i32) -> Result<Standings, Self::Error>;

    async fn roster(&self, team_id: TeamId) -> Result<RosterView, Self::Error>;

    async fn leaderboard(&self, stat: Stat, season: i32) -> Result<Leaderboard, Self::Error>;

    async fn player_profile(&self, player_id: PlayerId) -> Result<PlayerProfile, Self::Error>;
}

#[async_trait(?Send)]
impl LeagueSource for LeagueSession {
    type Error = LeagueError;

    async fn standings(&self, season: i32) -> Result<Standings, Self::Error> {
        views::standings(self.league(), season)
    }

    async fn roster(&self, team_id: TeamId) -> Result<RosterView, Self::Error> {
        views::roster(self.league(), team_id)
    }

    async fn leaderboard(&self, stat: Stat, season: i32) -> Result<Leaderboard, Self::Error> {
        views::leaderboard(self.league(), stat, season)
    }

    async fn player_profile(&self, player_id: PlayerId) -> Result<PlayerProfile, Self::Error> {
        views::player_profile(self.league(), player_id)
    }
}

/// Read-through view access bound to one cache and one source.
pub struct LeagueViews<'a, S, C: Clock = SystemClock> {
    cache: &'a GenerationCache<C>,
    source: &'a S,
}

impl<'a, S, C> LeagueViews<'a, S, C>
where
    S: LeagueSource,
    C: Clock,
{
    #[must_use]
    pub const fn new(cache: &'a GenerationCache<C>, source: &'a S) -> Self {
        Self { cache, source }
    }

    #[must_use]
    pub const fn cache(&self) -> &'a GenerationCache<C> {
        self.cache
    }

    /// # Errors
    ///
    /// Propagates the source error on a miss.
    pub async fn standings(&self, season: i32) -> Result<Standings, S::Error> {
        self.cache
            .with_cache(&standings_key(season), || self.source.standings(season))
            .await
    }

    /// # Errors
    ///
    /// Propagates the source error on a miss.
    pub async fn roster(&self, team_id: TeamId) -> Result<RosterView, S::Error> {
        self.cache
            .with_cache(&roster_key(i64::from(team_id)), || {
                self.source.roster(team_id)
            })
            .await
    }

    /// The cached ranking is the full list; `limit` only trims the answer.
    ///
    /// # Errors
    ///
    /// Propagates the source error on a miss.
    pub async fn leaderboard(
        &self,
        stat: Stat,
        season: i32,
        limit: usize,
    ) -> Result<Leaderboard, S::Error> {
        let mut board = self
            .cache
            .with_cache(&leaderboard_key(stat.as_str(), season), || {
                self.source.leaderboard(stat, season)
            })
            .await?;
        board.entries.truncate(limit);
        Ok(board)
    }

    /// # Errors
    ///
    /// Propagates the source error on a miss.
    pub async fn player_profile(&self, player_id: PlayerId) -> Result<PlayerProfile, S::Error> {
        self.cache
            .with_cache(&player_key(i64::from(player_id)), || {
                self.source.player_profile(player_id)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LeagueConfig;
    use futures::executor::block_on;
    use std::cell::Cell;

    /// Counts how often the wrapped session is actually asked for data.
    struct CountingSource {
        session: LeagueSession,
        calls: Cell<u32>,
    }

    #[async_trait(?Send)]
    impl LeagueSource for CountingSource {
        type Error = LeagueError;

        async fn standings(&self, season: i32) -> Result<Standings, Self::Error> {
            self.calls.set(self.calls.get() + 1);
            self.session.standings(season).await
        }

        async fn roster(&self, team_id: TeamId) -> Result<RosterView, Self::Error> {
            self.calls.set(self.calls.get() + 1);
            self.session.roster(team_id).await
        }

        async fn leaderboard(&self, stat: Stat, season: i32) -> Result<Leaderboard, Self::Error> {
            self.calls.set(self.calls.get() + 1);
            self.session.leaderboard(stat, season).await
        }

        async fn player_profile(&self, player_id: PlayerId) -> Result<PlayerProfile, Self::Error> {
            self.calls.set(self.calls.get() + 1);
            self.session.player_profile(player_id).await
        }
    }

    fn source() -> CountingSource {
        CountingSource {
            session: LeagueSession::new(LeagueConfig::default_config()).unwrap(),
            calls: Cell::new(0),
        }
    }

    #[test]
    fn repeated_reads_hit_the_cache() {
        let cache = GenerationCache::new();
        let source = source();
        let views = LeagueViews::new(&cache, &source);

        block_on(async {
            let first = views.standings(2025).await.unwrap();
            let second = views.standings(2025).await.unwrap();
            assert_eq!(first, second);
            views.roster(3).await.unwrap();
            views.roster(3).await.unwrap();
            views.player_profile(40).await.unwrap();
            views.player_profile(40).await.unwrap();
        });
        assert_eq!(source.calls.get(), 3);
        assert_eq!(cache.len(), 3);
        assert!(cache.get::<Standings>("standings:2025").is_some());
    }

    #[test]
    fn bump_forces_recompute() {
        let cache = GenerationCache::new();
        let source = source();
        let views = LeagueViews::new(&cache, &source);
        block_on(views.roster(1)).unwrap();
        cache.bump_generation();
        block_on(views.roster(1)).unwrap();
        assert_eq!(source.calls.get(), 2);
    }

    #[test]
    fn leaderboard_limit_does_not_shrink_cached_ranking() {
        let cache = GenerationCache::new();
        let mut session = LeagueSession::new(LeagueConfig::default_config()).unwrap();
        for _ in 0..5 {
            session.advance_day(&cache);
        }
        let views = LeagueViews::new(&cache, &session);
        let top3 = block_on(views.leaderboard(Stat::Hr, 2025, 3)).unwrap();
        assert_eq!(top3.entries.len(), 3);
        let top10 = block_on(views.leaderboard(Stat::Hr, 2025, 10)).unwrap();
        assert_eq!(top10.entries.len(), 10);
        assert_eq!(top3.entries[..], top10.entries[..3]);
    }

    #[test]
    fn source_errors_are_not_cached() {
        let cache = GenerationCache::new();
        let source = source();
        let views = LeagueViews::new(&cache, &source);
        let err = block_on(views.player_profile(99_999)).unwrap_err();
        assert_eq!(err, LeagueError::UnknownPlayer(99_999));
        assert!(cache.is_empty());
        let _ = block_on(views.player_profile(99_999));
        assert_eq!(source.calls.get(), 2);
    }
}
