use anyhow::{Context, Result};
use async_trait::async_trait;
use dugout_league::views::format_rate;
use dugout_league::{
    CacheStats, GenerationCache, Leaderboard, LeagueConfig, LeagueError, LeagueSession,
    LeagueSource, LeagueViews, PlayerId, PlayerProfile, RosterView, Standings, Stat, TeamId,
    standings_key,
};
use serde::Serialize;
use std::time::Instant;

/// What a season run reads back through the cache each day.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub days: u32,
    pub stats: Vec<Stat>,
    pub leaders: usize,
    pub profile_sample: usize,
    pub interleave: bool,
}

impl Default for RunPlan {
    fn default() -> Self {
        Self {
            days: 30,
            stats: vec![Stat::Avg, Stat::Hr, Stat::Ops],
            leaders: 5,
            profile_sample: 25,
            interleave: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamLine {
    pub abbreviation: String,
    pub division: String,
    pub wins: u32,
    pub losses: u32,
    pub pct: String,
    pub games_behind: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderLine {
    pub stat: Stat,
    pub rank: usize,
    pub name: String,
    pub team: String,
    pub value: String,
}

/// Outcome of reading while a generation bump lands mid-fetch.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RaceReport {
    pub attempts: u32,
    /// Fetches whose result was stored under the generation bumped during the fetch.
    pub stamped_after_bump: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    pub season: i32,
    pub days_played: u32,
    pub games_played: usize,
    pub season_complete: bool,
    pub final_generation: u64,
    pub view_reads: u64,
    pub swept: usize,
    pub cache: CacheStats,
    pub hit_rate: f64,
    pub race: Option<RaceReport>,
    pub top_teams: Vec<TeamLine>,
    pub leaders: Vec<LeaderLine>,
    pub generated_at: String,
    pub elapsed_ms: u128,
}

/// Simulate up to `plan.days` days, reading every view family through the cache after each.
///
/// # Errors
///
/// Returns an error if the configuration is rejected or a view cannot be produced.
pub async fn run_season(config: LeagueConfig, plan: &RunPlan) -> Result<RunSummary> {
    let start = Instant::now();
    let seed = config.seed;
    let cache = GenerationCache::new();
    let mut session = LeagueSession::new(config).context("league configuration rejected")?;
    let season = session.season();

    let mut days_played = 0;
    let mut games_played = 0;
    let mut swept = 0;
    let mut view_reads = 0;
    let mut race = plan.interleave.then(RaceReport::default);

    for _ in 0..plan.days {
        let outcome = session.advance_day(&cache);
        if outcome.games.is_empty() {
            log::info!("season {season} already complete after day {}", outcome.day);
            break;
        }
        days_played += 1;
        games_played += outcome.games.len();
        swept += outcome.swept;

        view_reads += read_all_views(&cache, &session, plan, season).await?;
        if let Some(report) = race.as_mut() {
            interleaved_read(&cache, &session, season, report).await?;
        }
    }

    let views = LeagueViews::new(&cache, &session);
    let standings = views.standings(season).await?;
    let mut leaders = Vec::new();
    for stat in &plan.stats {
        let board = views.leaderboard(*stat, season, plan.leaders).await?;
        leaders.extend(leader_lines(&board));
    }

    let stats = cache.stats();
    Ok(RunSummary {
        seed,
        season,
        days_played,
        games_played,
        season_complete: session.season_complete(),
        final_generation: cache.generation(),
        view_reads,
        swept,
        cache: stats,
        hit_rate: stats.hit_rate(),
        race,
        top_teams: standings.rows.iter().take(5).map(team_line).collect(),
        leaders,
        generated_at: chrono::Utc::now().to_rfc3339(),
        elapsed_ms: start.elapsed().as_millis(),
    })
}

/// Two passes over every view family; the second pass should be all hits.
async fn read_all_views(
    cache: &GenerationCache,
    session: &LeagueSession,
    plan: &RunPlan,
    season: i32,
) -> Result<u64> {
    let views = LeagueViews::new(cache, session);
    let team_ids: Vec<TeamId> = session.league().teams.iter().map(|t| t.id).collect();
    let player_ids: Vec<PlayerId> = session
        .league()
        .players
        .iter()
        .take(plan.profile_sample)
        .map(|p| p.id)
        .collect();

    let mut reads = 0;
    for _ in 0..2 {
        views.standings(season).await?;
        reads += 1;
        for team_id in &team_ids {
            views.roster(*team_id).await?;
            reads += 1;
        }
        for stat in &plan.stats {
            views.leaderboard(*stat, season, plan.leaders).await?;
            reads += 1;
        }
        for player_id in &player_ids {
            views.player_profile(*player_id).await?;
            reads += 1;
        }
    }
    Ok(reads)
}

/// Re-read standings while a second task bumps the generation mid-fetch.
async fn interleaved_read(
    cache: &GenerationCache,
    session: &LeagueSession,
    season: i32,
    report: &mut RaceReport,
) -> Result<()> {
    let key = standings_key(season);
    let source = YieldingSource { inner: session };
    let views = LeagueViews::new(cache, &source);

    cache.evict(&key);
    let started_at = cache.generation();
    let (standings, ()) = futures::join!(views.standings(season), async {
        cache.bump_generation();
    });
    standings?;

    report.attempts += 1;
    if cache.entry_generation(&key).is_some_and(|g| g > started_at) {
        report.stamped_after_bump += 1;
        log::debug!("standings computed at generation {started_at} stored under a newer one");
    }
    Ok(())
}

/// Source that yields to the executor before answering, like a worker round trip.
struct YieldingSource<'a> {
    inner: &'a LeagueSession,
}

#[async_trait(?Send)]
impl LeagueSource for YieldingSource<'_> {
    type Error = LeagueError;

    async fn standings(&self, season: i32) -> Result<Standings, Self::Error> {
        tokio::task::yield_now().await;
        self.inner.standings(season).await
    }

    async fn roster(&self, team_id: TeamId) -> Result<RosterView, Self::Error> {
        tokio::task::yield_now().await;
        self.inner.roster(team_id).await
    }

    async fn leaderboard(&self, stat: Stat, season: i32) -> Result<Leaderboard, Self::Error> {
        tokio::task::yield_now().await;
        self.inner.leaderboard(stat, season).await
    }

    async fn player_profile(&self, player_id: PlayerId) -> Result<PlayerProfile, Self::Error> {
        tokio::task::yield_now().await;
        self.inner.player_profile(player_id).await
    }
}

fn team_line(row: &dugout_league::StandingsRow) -> TeamLine {
    TeamLine {
        abbreviation: row.abbreviation.clone(),
        division: format!("{} {}", row.league, row.division),
        wins: row.wins,
        losses: row.losses,
        pct: format_rate(row.pct),
        games_behind: row.games_behind,
    }
}

fn leader_lines(board: &Leaderboard) -> Vec<LeaderLine> {
    board
        .entries
        .iter()
        .map(|entry| LeaderLine {
            stat: board.stat,
            rank: entry.rank,
            name: entry.name.clone(),
            team: entry.team.clone(),
            value: if board.stat.is_rate() {
                format_rate(entry.value)
            } else {
                format!("{:.0}", entry.value)
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_season(games: u32) -> LeagueConfig {
        let mut config = LeagueConfig::default_config();
        config.games_per_season = games;
        config
    }

    #[tokio::test]
    async fn second_pass_is_served_from_cache() {
        let plan = RunPlan {
            days: 3,
            profile_sample: 10,
            ..RunPlan::default()
        };
        let summary = run_season(short_season(50), &plan).await.unwrap();
        assert_eq!(summary.days_played, 3);
        assert_eq!(summary.games_played, 45);
        assert_eq!(summary.final_generation, 3);

        // Per day: 1 standings + 30 rosters + 3 leaderboards + 10 profiles, twice.
        let per_pass = 1 + 30 + 3 + 10;
        assert_eq!(summary.view_reads, 3 * 2 * per_pass);
        assert!(summary.cache.hits >= 3 * per_pass);
        assert_eq!(summary.top_teams.len(), 5);
        assert_eq!(summary.leaders.len(), 15);
    }

    #[tokio::test]
    async fn run_stops_at_season_end() {
        let plan = RunPlan {
            days: 10,
            profile_sample: 0,
            ..RunPlan::default()
        };
        let summary = run_season(short_season(4), &plan).await.unwrap();
        assert_eq!(summary.days_played, 4);
        assert!(summary.season_complete);
        assert_eq!(summary.final_generation, 4);
    }

    #[tokio::test]
    async fn interleaving_adds_one_bump_per_day() {
        let plan = RunPlan {
            days: 2,
            profile_sample: 0,
            interleave: true,
            ..RunPlan::default()
        };
        let summary = run_season(short_season(10), &plan).await.unwrap();
        let race = summary.race.unwrap();
        assert_eq!(race.attempts, 2);
        assert_eq!(race.stamped_after_bump, race.attempts);
        assert_eq!(summary.final_generation, 4);
    }
}
