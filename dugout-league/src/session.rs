//! Season simulation driver.
//!
//! `LeagueSession` owns the authoritative league state. Each simulated day
//! plays one game per team and then bumps the cache generation exactly once,
//! which is what invalidates every derived view the front end holds.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::cache::{Clock, GenerationCache};
use crate::config::{ConfigError, LeagueConfig};
use crate::league::{League, LINEUP_SIZE, PlayerId, Ratings, TeamId};

/// Innings after which a tied game is awarded to the home side.
const MAX_INNINGS: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub home: TeamId,
    pub away: TeamId,
    pub home_runs: u32,
    pub away_runs: u32,
    pub innings: u32,
}

impl GameResult {
    #[must_use]
    pub const fn winner(&self) -> TeamId {
        if self.home_runs > self.away_runs {
            self.home
        } else {
            self.away
        }
    }

    #[must_use]
    pub const fn loser(&self) -> TeamId {
        if self.home_runs > self.away_runs {
            self.away
        } else {
            self.home
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOutcome {
    pub day: u32,
    pub games: Vec<GameResult>,
    /// Cache generation after the day was applied.
    pub generation: u64,
    /// Entries removed by the age sweep, if one ran.
    pub swept: usize,
    pub season_complete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlateOutcome {
    Walk,
    Strikeout,
    Out,
    Single,
    Double,
    HomeRun,
}

impl PlateOutcome {
    fn roll<R: Rng + ?Sized>(ratings: Ratings, rng: &mut R) -> Self {
        let scale = |grade: u8| f64::from(grade) / f64::from(Ratings::MAX);
        let walk = 0.05 + 0.06 * scale(ratings.eye);
        let strikeout = 0.28 - 0.12 * scale(ratings.contact);
        let hit = 0.17 + 0.10 * scale(ratings.contact);

        let roll: f64 = rng.r#gen();
        if roll < walk {
            return Self::Walk;
        }
        if roll < walk + strikeout {
            return Self::Strikeout;
        }
        if roll >= walk + strikeout + hit {
            return Self::Out;
        }

        let home_run = 0.05 + 0.12 * scale(ratings.power);
        let kind: f64 = rng.r#gen();
        if kind < home_run {
            Self::HomeRun
        } else if kind < home_run + 0.2 {
            Self::Double
        } else {
            Self::Single
        }
    }
}

/// One team's side of a game in progress.
struct Offense {
    lineup: Vec<(PlayerId, Ratings)>,
    next: usize,
    runs: u32,
}

#[derive(Debug, Clone)]
pub struct LeagueSession {
    config: LeagueConfig,
    league: League,
    day: u32,
    rng: ChaCha20Rng,
}

impl LeagueSession {
    /// Generate a league from `config` and start its season at day 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is not playable.
    pub fn new(config: LeagueConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = ChaCha20Rng::seed_from_u64(config.seed);
        let league = League::generate(&config, &mut rng);
        Ok(Self {
            config,
            league,
            day: 0,
            rng,
        })
    }

    #[must_use]
    pub const fn league(&self) -> &League {
        &self.league
    }

    #[must_use]
    pub const fn config(&self) -> &LeagueConfig {
        &self.config
    }

    /// Days simulated so far.
    #[must_use]
    pub const fn day(&self) -> u32 {
        self.day
    }

    #[must_use]
    pub const fn season(&self) -> i32 {
        self.league.season
    }

    #[must_use]
    pub const fn season_complete(&self) -> bool {
        self.day >= self.config.games_per_season
    }

    /// Play one day of games and invalidate derived views.
    ///
    /// The generation is bumped once per played day. A finished season plays
    /// nothing and leaves the cache alone.
    pub fn advance_day<C: Clock>(&mut self, cache: &GenerationCache<C>) -> DayOutcome {
        if self.season_complete() {
            return DayOutcome {
                day: self.day,
                games: Vec::new(),
                generation: cache.generation(),
                swept: 0,
                season_complete: true,
            };
        }

        let games: Vec<GameResult> = self
            .pairings()
            .into_iter()
            .map(|(home, away)| self.play_game(home, away))
            .collect();
        self.day += 1;
        let generation = cache.bump_generation();

        let sweep_every = self.config.cache.sweep_every_days;
        let swept = if sweep_every > 0 && self.day % sweep_every == 0 {
            cache.evict_older_than(self.config.cache.max_age_ms)
        } else {
            0
        };

        log::debug!(
            "day {} played {} games (generation {generation}, swept {swept})",
            self.day,
            games.len()
        );

        DayOutcome {
            day: self.day,
            games,
            generation,
            swept,
            season_complete: self.season_complete(),
        }
    }

    /// Today's matchups as `(home, away)`, by the circle method so every
    /// team plays once per day and opponents rotate.
    fn pairings(&self) -> Vec<(TeamId, TeamId)> {
        let ids: Vec<TeamId> = self.league.teams.iter().map(|team| team.id).collect();
        let n = ids.len();
        if n < 2 {
            return Vec::new();
        }
        let rounds = n - 1;
        let round = self.day as usize % rounds;

        // Index 0 stays fixed, the rest rotate by `round`.
        let rotated: Vec<TeamId> = std::iter::once(ids[0])
            .chain((0..rounds).map(|i| ids[1 + (i + round) % rounds]))
            .collect();

        (0..n / 2)
            .map(|i| {
                let a = rotated[i];
                let b = rotated[n - 1 - i];
                if (self.day + u32::try_from(i).unwrap_or(0)) % 2 == 0 {
                    (a, b)
                } else {
                    (b, a)
                }
            })
            .collect()
    }

    fn offense(&self, team: TeamId) -> Offense {
        let lineup = self
            .league
            .team(team)
            .map(|t| t.lineup.clone())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|id| self.league.player(id).ok().map(|p| (id, p.ratings)))
            .take(LINEUP_SIZE)
            .collect();
        Offense {
            lineup,
            next: 0,
            runs: 0,
        }
    }

    fn play_game(&mut self, home: TeamId, away: TeamId) -> GameResult {
        let mut home_side = self.offense(home);
        let mut away_side = self.offense(away);
        let mut inning = 0;

        loop {
            inning += 1;
            self.play_half_inning(&mut away_side, None);
            if inning >= 9 && home_side.runs > away_side.runs {
                break;
            }
            let walk_off = (inning >= 9).then_some(away_side.runs);
            self.play_half_inning(&mut home_side, walk_off);
            if inning >= 9 && home_side.runs != away_side.runs {
                break;
            }
            if inning >= MAX_INNINGS {
                home_side.runs += 1;
                break;
            }
        }

        let result = GameResult {
            home,
            away,
            home_runs: home_side.runs,
            away_runs: away_side.runs,
            innings: inning,
        };
        self.record_result(&result);
        result
    }

    /// Plays until three outs, or until `side` passes `walk_off` runs.
    fn play_half_inning(&mut self, side: &mut Offense, walk_off: Option<u32>) {
        if side.lineup.is_empty() {
            return;
        }
        let mut outs = 0;
        let mut bases: [Option<PlayerId>; 3] = [None; 3];

        while outs < 3 {
            let (batter, ratings) = side.lineup[side.next % side.lineup.len()];
            side.next += 1;
            let outcome = PlateOutcome::roll(ratings, &mut self.rng);

            let scored = match outcome {
                PlateOutcome::Strikeout | PlateOutcome::Out => {
                    outs += 1;
                    Vec::new()
                }
                PlateOutcome::Walk => force_walk(&mut bases, batter),
                PlateOutcome::Single => advance(&mut bases, batter, 1),
                PlateOutcome::Double => advance(&mut bases, batter, 2),
                PlateOutcome::HomeRun => advance(&mut bases, batter, 4),
            };

            side.runs += u32::try_from(scored.len()).unwrap_or(0);
            self.credit_plate_appearance(batter, outcome, &scored);
            if walk_off.is_some_and(|target| side.runs > target) {
                break;
            }
        }
    }

    fn credit_plate_appearance(
        &mut self,
        batter: PlayerId,
        outcome: PlateOutcome,
        scored: &[PlayerId],
    ) {
        for runner in scored {
            if let Ok(player) = self.league.player_mut(*runner) {
                player.batting.runs += 1;
            }
        }
        let Ok(player) = self.league.player_mut(batter) else {
            return;
        };
        let line = &mut player.batting;
        line.pa += 1;
        line.rbi += u32::try_from(scored.len()).unwrap_or(0);
        match outcome {
            PlateOutcome::Walk => line.bb += 1,
            PlateOutcome::Strikeout => {
                line.ab += 1;
                line.so += 1;
            }
            PlateOutcome::Out => line.ab += 1,
            PlateOutcome::Single => {
                line.ab += 1;
                line.h += 1;
            }
            PlateOutcome::Double => {
                line.ab += 1;
                line.h += 1;
                line.doubles += 1;
            }
            PlateOutcome::HomeRun => {
                line.ab += 1;
                line.h += 1;
                line.hr += 1;
            }
        }
    }

    fn record_result(&mut self, result: &GameResult) {
        if let Ok(home) = self.league.team_mut(result.home) {
            home.runs_scored += result.home_runs;
            home.runs_allowed += result.away_runs;
        }
        if let Ok(away) = self.league.team_mut(result.away) {
            away.runs_scored += result.away_runs;
            away.runs_allowed += result.home_runs;
        }
        if let Ok(winner) = self.league.team_mut(result.winner()) {
            winner.wins += 1;
        }
        if let Ok(loser) = self.league.team_mut(result.loser()) {
            loser.losses += 1;
        }
    }
}

/// Move every runner and the batter `bases` bases; returns who crossed the plate.
fn advance(bases: &mut [Option<PlayerId>; 3], batter: PlayerId, count: usize) -> Vec<PlayerId> {
    let mut scored = Vec::new();
    let mut next: [Option<PlayerId>; 3] = [None; 3];
    for (idx, runner) in bases.iter().enumerate().rev() {
        if let Some(id) = runner {
            let target = idx + count;
            if target >= 3 {
                scored.push(*id);
            } else {
                next[target] = Some(*id);
            }
        }
    }
    if count >= 4 {
        scored.push(batter);
    } else {
        next[count - 1] = Some(batter);
    }
    *bases = next;
    scored
}

/// Walk: only forced runners move.
fn force_walk(bases: &mut [Option<PlayerId>; 3], batter: PlayerId) -> Vec<PlayerId> {
    let mut scored = Vec::new();
    if bases[0].is_some() {
        if bases[1].is_some() {
            if let Some(runner) = bases[2].take() {
                scored.push(runner);
            }
            bases[2] = bases[1];
        }
        bases[1] = bases[0];
    }
    bases[0] = Some(batter);
    scored
}
