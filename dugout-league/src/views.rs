//! Derived league views served to the front end.
//!
//! Every function here is a pure read of a [`League`]; the simulation driver
//! owns the mutation and the cache decides when these get recomputed.
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::league::{League, LeagueError, Player, PlayerId, TeamId};

/// Plate appearances per team game needed to qualify for rate-stat leaderboards.
pub const QUALIFYING_PA_PER_GAME: f64 = 3.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Avg,
    Obp,
    Slg,
    Ops,
    Hr,
    Rbi,
    H,
    Bb,
}

impl Stat {
    pub const ALL: [Self; 8] = [
        Self::Avg,
        Self::Obp,
        Self::Slg,
        Self::Ops,
        Self::Hr,
        Self::Rbi,
        Self::H,
        Self::Bb,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Avg => "avg",
            Self::Obp => "obp",
            Self::Slg => "slg",
            Self::Ops => "ops",
            Self::Hr => "hr",
            Self::Rbi => "rbi",
            Self::H => "h",
            Self::Bb => "bb",
        }
    }

    /// Rate stats require a qualifying number of plate appearances.
    #[must_use]
    pub const fn is_rate(self) -> bool {
        matches!(self, Self::Avg | Self::Obp | Self::Slg | Self::Ops)
    }

    #[must_use]
    pub fn value(self, player: &Player) -> f64 {
        let line = &player.batting;
        match self {
            Self::Avg => line.avg(),
            Self::Obp => line.obp(),
            Self::Slg => line.slg(),
            Self::Ops => line.ops(),
            Self::Hr => f64::from(line.hr),
            Self::Rbi => f64::from(line.rbi),
            Self::H => f64::from(line.h),
            Self::Bb => f64::from(line.bb),
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stat {
    type Err = LeagueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|stat| stat.as_str() == wanted)
            .ok_or_else(|| LeagueError::UnknownStat(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsRow {
    pub team_id: TeamId,
    pub abbreviation: String,
    pub name: String,
    pub league: String,
    pub division: String,
    pub wins: u32,
    pub losses: u32,
    pub pct: f64,
    pub run_differential: i64,
    /// Games behind the division leader.
    pub games_behind: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standings {
    pub season: i32,
    pub rows: Vec<StandingsRow>,
}

impl Standings {
    pub fn division<'a>(
        &'a self,
        league: &'a str,
        division: &'a str,
    ) -> impl Iterator<Item = &'a StandingsRow> {
        self.rows
            .iter()
            .filter(move |row| row.league == league && row.division == division)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterView {
    pub team_id: TeamId,
    pub name: String,
    pub abbreviation: String,
    pub wins: u32,
    pub losses: u32,
    pub players: Vec<Player>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub player_id: PlayerId,
    pub name: String,
    pub team: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub stat: Stat,
    pub season: i32,
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    #[must_use]
    pub fn top(&self, limit: usize) -> &[LeaderboardEntry] {
        &self.entries[..limit.min(self.entries.len())]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub player: Player,
    pub team_name: String,
    pub team_abbreviation: String,
    pub avg: f64,
    pub obp: f64,
    pub slg: f64,
    pub ops: f64,
}

impl PlayerProfile {
    /// Slash line formatted the way box scores print it, e.g. `.281/.352/.470`.
    #[must_use]
    pub fn slash_line(&self) -> String {
        format!(
            "{}/{}/{}",
            format_rate(self.avg),
            format_rate(self.obp),
            format_rate(self.slg)
        )
    }
}

/// Format a rate stat without the leading zero.
#[must_use]
pub fn format_rate(value: f64) -> String {
    let text = format!("{value:.3}");
    text.strip_prefix('0').map_or_else(|| text.clone(), str::to_string)
}

/// # Errors
///
/// Returns [`LeagueError::UnknownSeason`] if `season` is not the league's season.
pub fn standings(league: &League, season: i32) -> Result<Standings, LeagueError> {
    league.check_season(season)?;

    let mut rows: Vec<StandingsRow> = league
        .teams
        .iter()
        .map(|team| StandingsRow {
            team_id: team.id,
            abbreviation: team.abbreviation.clone(),
            name: team.name.clone(),
            league: team.league.clone(),
            division: team.division.clone(),
            wins: team.wins,
            losses: team.losses,
            pct: team.win_pct(),
            run_differential: team.run_differential(),
            games_behind: 0.0,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.pct
            .partial_cmp(&a.pct)
            .unwrap_or(Ordering::Equal)
            .then(b.run_differential.cmp(&a.run_differential))
            .then(a.team_id.cmp(&b.team_id))
    });

    // Rows are sorted, so the first row seen per division is its leader.
    let leaders: Vec<(String, String, u32, u32)> = rows.iter().fold(Vec::new(), |mut acc, row| {
        if !acc
            .iter()
            .any(|(l, d, _, _)| *l == row.league && *d == row.division)
        {
            acc.push((row.league.clone(), row.division.clone(), row.wins, row.losses));
        }
        acc
    });
    for row in &mut rows {
        if let Some((_, _, wins, losses)) = leaders
            .iter()
            .find(|(l, d, _, _)| *l == row.league && *d == row.division)
        {
            let gap = (i64::from(*wins) - i64::from(row.wins)) + (i64::from(row.losses) - i64::from(*losses));
            #[allow(clippy::cast_precision_loss)]
            let games_behind = gap as f64 / 2.0;
            row.games_behind = games_behind;
        }
    }

    Ok(Standings { season, rows })
}

/// # Errors
///
/// Returns [`LeagueError::UnknownTeam`] if no team has this id.
pub fn roster(league: &League, team_id: TeamId) -> Result<RosterView, LeagueError> {
    let team = league.team(team_id)?;
    let mut players: Vec<Player> = league.players_on(team_id).cloned().collect();
    players.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.name.cmp(&b.name)));
    Ok(RosterView {
        team_id,
        name: team.name.clone(),
        abbreviation: team.abbreviation.clone(),
        wins: team.wins,
        losses: team.losses,
        players,
    })
}

/// Minimum plate appearances for a rate-stat leaderboard after `games` team games.
#[must_use]
pub fn qualifying_pa(games: u32) -> u32 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let needed = (f64::from(games) * QUALIFYING_PA_PER_GAME).floor() as u32;
    needed
}

/// Full ranking for `stat`; callers slice it with [`Leaderboard::top`].
///
/// # Errors
///
/// Returns [`LeagueError::UnknownSeason`] if `season` is not the league's season.
pub fn leaderboard(league: &League, stat: Stat, season: i32) -> Result<Leaderboard, LeagueError> {
    league.check_season(season)?;

    let mut qualified: Vec<(&Player, &str, f64)> = Vec::new();
    for player in &league.players {
        let team = league.team(player.team_id)?;
        let needed = if stat.is_rate() {
            qualifying_pa(team.games_played()).max(1)
        } else {
            1
        };
        if player.batting.pa >= needed {
            qualified.push((player, team.abbreviation.as_str(), stat.value(player)));
        }
    }

    qualified.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(Ordering::Equal)
            .then(a.0.id.cmp(&b.0.id))
    });

    let entries = qualified
        .into_iter()
        .enumerate()
        .map(|(idx, (player, team, value))| LeaderboardEntry {
            rank: idx + 1,
            player_id: player.id,
            name: player.name.clone(),
            team: team.to_string(),
            value,
        })
        .collect();

    Ok(Leaderboard {
        stat,
        season,
        entries,
    })
}

/// # Errors
///
/// Returns [`LeagueError::UnknownPlayer`] if no player has this id.
pub fn player_profile(league: &League, player_id: PlayerId) -> Result<PlayerProfile, LeagueError> {
    let player = league.player(player_id)?;
    let team = league.team(player.team_id)?;
    let line = &player.batting;
    Ok(PlayerProfile {
        player: player.clone(),
        team_name: team.name.clone(),
        team_abbreviation: team.abbreviation.clone(),
        avg: line.avg(),
        obp: line.obp(),
        slg: line.slg(),
        ops: line.ops(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LeagueConfig;
    use crate::league::BattingLine;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn league() -> League {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        League::generate(&LeagueConfig::default_config(), &mut rng)
    }

    fn set_record(league: &mut League, id: TeamId, wins: u32, losses: u32) {
        let team = league.team_mut(id).unwrap();
        team.wins = wins;
        team.losses = losses;
    }

    #[test]
    fn standings_sort_by_pct_and_compute_games_behind() {
        let mut league = league();
        // Boston and New York share the North East division.
        set_record(&mut league, 1, 10, 5);
        set_record(&mut league, 2, 12, 3);
        set_record(&mut league, 3, 7, 8);

        let standings = standings(&league, 2025).unwrap();
        assert_eq!(standings.rows.len(), 30);
        assert_eq!(standings.rows[0].abbreviation, "NYK");

        let east: Vec<&StandingsRow> = standings.division("North", "East").collect();
        assert_eq!(east.len(), 5);
        assert_eq!(east[0].abbreviation, "NYK");
        assert!(east[0].games_behind.abs() < f64::EPSILON);
        assert_eq!(east[1].abbreviation, "BOS");
        assert!((east[1].games_behind - 2.0).abs() < f64::EPSILON);
        assert!((east[2].games_behind - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn standings_reject_other_seasons() {
        assert!(matches!(
            standings(&league(), 2024),
            Err(LeagueError::UnknownSeason { .. })
        ));
    }

    #[test]
    fn roster_groups_by_position() {
        let league = league();
        let view = roster(&league, 5).unwrap();
        assert_eq!(view.players.len(), 13);
        assert_eq!(view.players[0].position, crate::league::Position::Catcher);
        assert!(view.players.windows(2).all(|w| w[0].position <= w[1].position));
        assert_eq!(roster(&league, 77), Err(LeagueError::UnknownTeam(77)));
    }

    #[test]
    fn leaderboard_applies_rate_qualification() {
        let mut league = league();
        set_record(&mut league, 1, 5, 5);
        let regular = league.team(1).unwrap().lineup[0];
        let part_timer = league.team(1).unwrap().lineup[1];
        league.player_mut(regular).unwrap().batting = BattingLine {
            pa: 40,
            ab: 36,
            h: 12,
            hr: 3,
            bb: 4,
            ..BattingLine::default()
        };
        league.player_mut(part_timer).unwrap().batting = BattingLine {
            pa: 4,
            ab: 4,
            h: 4,
            hr: 4,
            ..BattingLine::default()
        };

        let avg = leaderboard(&league, Stat::Avg, 2025).unwrap();
        assert_eq!(avg.entries.len(), 1, "only 31+ PA qualifies after 10 games");
        assert_eq!(avg.entries[0].player_id, regular);

        let hr = leaderboard(&league, Stat::Hr, 2025).unwrap();
        assert_eq!(hr.top(1)[0].player_id, part_timer);
        assert_eq!(hr.top(5).len(), 2);
        assert_eq!(hr.entries[1].rank, 2);
    }

    #[test]
    fn stat_parses_case_insensitively() {
        assert_eq!("OPS".parse::<Stat>(), Ok(Stat::Ops));
        assert_eq!(" hr ".parse::<Stat>(), Ok(Stat::Hr));
        assert_eq!(
            "war".parse::<Stat>(),
            Err(LeagueError::UnknownStat("war".to_string()))
        );
    }

    #[test]
    fn profile_formats_slash_line() {
        let mut league = league();
        league.player_mut(1).unwrap().batting = BattingLine {
            pa: 5,
            ab: 4,
            h: 1,
            bb: 1,
            ..BattingLine::default()
        };
        let profile = player_profile(&league, 1).unwrap();
        assert_eq!(profile.team_abbreviation, "BOS");
        assert_eq!(profile.slash_line(), ".250/.400/.250");
        assert_eq!(format_rate(1.234), "1.234");
        assert!(player_profile(&league, 10_000).is_err());
    }
}
