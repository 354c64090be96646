use dugout_league::{
    GenerationCache, LeagueConfig, LeagueError, LeagueSession, LeagueSource, LeagueViews,
    ManualClock, Standings, Stat, leaderboard_key, player_key, roster_key, standings_key,
};
use futures::executor::block_on;

fn config(games: u32) -> LeagueConfig {
    let mut config = LeagueConfig::default_config();
    config.games_per_season = games;
    config
}

#[derive(Debug, Clone, PartialEq)]
struct Summary {
    teams: u32,
}

#[test]
fn three_bumps_then_invalidate_standings() {
    let cache = GenerationCache::new();
    cache.bump_generation();
    cache.bump_generation();
    cache.bump_generation();
    assert_eq!(cache.generation(), 3);

    cache.set(&standings_key(2025), Summary { teams: 30 });
    assert_eq!(
        cache.get::<Summary>("standings:2025"),
        Some(Summary { teams: 30 })
    );

    cache.bump_generation();
    assert_eq!(cache.generation(), 4);
    assert_eq!(cache.get::<Summary>("standings:2025"), None);
    assert_eq!(cache.len(), 0);
}

#[test]
fn views_refresh_after_every_simulated_day() {
    let cache = GenerationCache::new();
    let mut session = LeagueSession::new(config(30)).unwrap();

    let mut previous_games = 0;
    for _ in 0..4 {
        session.advance_day(&cache);
        let views = LeagueViews::new(&cache, &session);
        let standings = block_on(views.standings(2025)).unwrap();
        let games: u32 = standings.rows.iter().map(|r| r.wins + r.losses).sum();
        assert_eq!(games, previous_games + 30, "standings must reflect the new day");
        previous_games = games;

        // Second read in the same generation is served from the cache.
        let before = cache.stats().hits;
        block_on(views.standings(2025)).unwrap();
        assert_eq!(cache.stats().hits, before + 1);
    }
}

#[test]
fn stale_entries_linger_until_read_or_swept() {
    let clock = ManualClock::new(0);
    let cache = GenerationCache::with_clock(&clock);
    let mut session = LeagueSession::new(config(30)).unwrap();
    let views = LeagueViews::new(&cache, &session);
    block_on(async {
        views.standings(2025).await.unwrap();
        views.roster(1).await.unwrap();
        views.leaderboard(Stat::Ops, 2025, 5).await.unwrap();
        views.player_profile(1).await.unwrap();
    });
    assert_eq!(cache.len(), 4);
    for key in [
        standings_key(2025),
        roster_key(1),
        leaderboard_key("ops", 2025),
        player_key(1),
    ] {
        assert_eq!(cache.entry_generation(&key), Some(0), "{key}");
    }

    session.advance_day(&cache);
    assert_eq!(cache.len(), 4, "bumping does not scan");
    assert!(cache.get::<Standings>(&standings_key(2025)).is_none());
    assert_eq!(cache.len(), 3);

    clock.advance(session.config().cache.max_age_ms + 1);
    assert_eq!(cache.evict_older_than(session.config().cache.max_age_ms), 3);
    assert!(cache.is_empty());
}

#[test]
fn unknown_ids_surface_league_errors() {
    let cache = GenerationCache::new();
    let session = LeagueSession::new(config(10)).unwrap();
    let views = LeagueViews::new(&cache, &session);
    assert_eq!(
        block_on(views.roster(0)).unwrap_err(),
        LeagueError::UnknownTeam(0)
    );
    assert!(matches!(
        block_on(views.standings(1901)),
        Err(LeagueError::UnknownSeason { requested: 1901, .. })
    ));
    assert!(cache.is_empty());
}

#[test]
fn full_season_produces_plausible_leaders() {
    let cache = GenerationCache::new();
    let mut session = LeagueSession::new(config(162)).unwrap();
    while !session.advance_day(&cache).season_complete {}
    assert_eq!(cache.generation(), 162);

    let board = block_on(session.leaderboard(Stat::Avg, 2025)).unwrap();
    assert!(!board.entries.is_empty());
    let leader = &board.entries[0];
    assert!(leader.value > 0.2 && leader.value < 0.5, "{}", leader.value);

    let standings = block_on(session.standings(2025)).unwrap();
    assert!(standings.rows.iter().all(|r| r.wins + r.losses == 162));
}
