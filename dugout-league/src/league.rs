//! Teams, players and batting lines
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LeagueConfig;

pub type TeamId = u32;
pub type PlayerId = u32;

/// Number of hitters that take plate appearances each game.
pub const LINEUP_SIZE: usize = 9;

const FIRST_NAMES: [&str; 32] = [
    "Abe", "Bo", "Cal", "Dusty", "Eddie", "Felix", "Gus", "Hank", "Ike", "Jules", "Kenny", "Lefty",
    "Moises", "Nate", "Ollie", "Pedro", "Quinn", "Rusty", "Sal", "Tito", "Ugo", "Vic", "Walt",
    "Xavier", "Yogi", "Zeke", "Andres", "Buck", "Chico", "Dom", "Enos", "Fergie",
];

const LAST_NAMES: [&str; 32] = [
    "Alvarez", "Banks", "Carew", "Dawson", "Evers", "Fisk", "Gehrig", "Hodges", "Irvin", "Jeter",
    "Kaline", "Lajoie", "Mays", "Nettles", "Oliva", "Puckett", "Quisenberry", "Rizzuto", "Santo",
    "Tiant", "Utley", "Vaughn", "Wagner", "Yount", "Zimmer", "Aparicio", "Boggs", "Cepeda",
    "Doby", "Estrada", "Foxx", "Garvey",
];

/// Errors raised when a view is requested for something the league does not have.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LeagueError {
    #[error("unknown team {0}")]
    UnknownTeam(TeamId),
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error("season {requested} is not tracked (current season is {current})")]
    UnknownSeason { requested: i32, current: i32 },
    #[error("unknown stat {0:?}")]
    UnknownStat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "C")]
    Catcher,
    #[serde(rename = "1B")]
    FirstBase,
    #[serde(rename = "2B")]
    SecondBase,
    #[serde(rename = "3B")]
    ThirdBase,
    #[serde(rename = "SS")]
    Shortstop,
    #[serde(rename = "LF")]
    LeftField,
    #[serde(rename = "CF")]
    CenterField,
    #[serde(rename = "RF")]
    RightField,
    #[serde(rename = "DH")]
    DesignatedHitter,
    #[serde(rename = "UT")]
    Utility,
}

impl Position {
    /// Starting positions in lineup order.
    pub const STARTERS: [Self; LINEUP_SIZE] = [
        Self::CenterField,
        Self::Shortstop,
        Self::RightField,
        Self::FirstBase,
        Self::DesignatedHitter,
        Self::ThirdBase,
        Self::LeftField,
        Self::Catcher,
        Self::SecondBase,
    ];

    #[must_use]
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Self::Catcher => "C",
            Self::FirstBase => "1B",
            Self::SecondBase => "2B",
            Self::ThirdBase => "3B",
            Self::Shortstop => "SS",
            Self::LeftField => "LF",
            Self::CenterField => "CF",
            Self::RightField => "RF",
            Self::DesignatedHitter => "DH",
            Self::Utility => "UT",
        }
    }
}

/// Scouting grades on the 20-80 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratings {
    pub contact: u8,
    pub power: u8,
    pub eye: u8,
}

impl Ratings {
    pub const MIN: u8 = 20;
    pub const MAX: u8 = 80;

    fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        // Sum of two rolls keeps most players near average.
        let mut grade = || {
            let a: u8 = rng.gen_range(10..=40);
            let b: u8 = rng.gen_range(10..=40);
            (a + b).clamp(Self::MIN, Self::MAX)
        };
        Self {
            contact: grade(),
            power: grade(),
            eye: grade(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattingLine {
    pub pa: u32,
    pub ab: u32,
    pub h: u32,
    pub doubles: u32,
    pub hr: u32,
    pub bb: u32,
    pub so: u32,
    pub rbi: u32,
    pub runs: u32,
}

impl BattingLine {
    #[must_use]
    pub const fn total_bases(&self) -> u32 {
        // Loaded lines may be inconsistent; clamp rather than underflow.
        let singles = self.h.saturating_sub(self.doubles).saturating_sub(self.hr);
        singles + 2 * self.doubles + 4 * self.hr
    }

    #[must_use]
    pub fn avg(&self) -> f64 {
        ratio(self.h, self.ab)
    }

    #[must_use]
    pub fn obp(&self) -> f64 {
        ratio(self.h + self.bb, self.pa)
    }

    #[must_use]
    pub fn slg(&self) -> f64 {
        ratio(self.total_bases(), self.ab)
    }

    #[must_use]
    pub fn ops(&self) -> f64 {
        self.obp() + self.slg()
    }
}

fn ratio(num: u32, den: u32) -> f64 {
    if den == 0 {
        0.0
    } else {
        f64::from(num) / f64::from(den)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub team_id: TeamId,
    pub name: String,
    pub position: Position,
    pub ratings: Ratings,
    #[serde(default)]
    pub batting: BattingLine,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub abbreviation: String,
    pub league: String,
    pub division: String,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub runs_scored: u32,
    #[serde(default)]
    pub runs_allowed: u32,
    /// Starting nine in batting order.
    pub lineup: Vec<PlayerId>,
}

impl Team {
    #[must_use]
    pub const fn games_played(&self) -> u32 {
        self.wins + self.losses
    }

    #[must_use]
    pub fn win_pct(&self) -> f64 {
        ratio(self.wins, self.games_played())
    }

    #[must_use]
    pub fn run_differential(&self) -> i64 {
        i64::from(self.runs_scored) - i64::from(self.runs_allowed)
    }
}

/// Complete league state for one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub season: i32,
    pub teams: Vec<Team>,
    pub players: Vec<Player>,
}

impl League {
    /// Build teams from config and roll rosters from `rng`.
    pub fn generate<R: Rng + ?Sized>(config: &LeagueConfig, rng: &mut R) -> Self {
        let mut teams = Vec::with_capacity(config.teams.len());
        let mut players = Vec::with_capacity(config.teams.len() * usize::from(config.roster_size));
        let mut next_id: PlayerId = 1;

        for team_cfg in &config.teams {
            let mut lineup = Vec::with_capacity(LINEUP_SIZE);
            for slot in 0..usize::from(config.roster_size) {
                let position = Position::STARTERS
                    .get(slot)
                    .copied()
                    .unwrap_or(Position::Utility);
                let player = Player {
                    id: next_id,
                    team_id: team_cfg.id,
                    name: roll_name(rng),
                    position,
                    ratings: Ratings::roll(rng),
                    batting: BattingLine::default(),
                };
                if slot < LINEUP_SIZE {
                    lineup.push(player.id);
                }
                players.push(player);
                next_id += 1;
            }
            teams.push(Team {
                id: team_cfg.id,
                name: team_cfg.name.clone(),
                abbreviation: team_cfg.abbreviation.clone(),
                league: team_cfg.league.clone(),
                division: team_cfg.division.clone(),
                wins: 0,
                losses: 0,
                runs_scored: 0,
                runs_allowed: 0,
                lineup,
            });
        }

        log::debug!(
            "generated {} teams and {} players for season {}",
            teams.len(),
            players.len(),
            config.season
        );
        Self {
            season: config.season,
            teams,
            players,
        }
    }

    /// # Errors
    ///
    /// Returns [`LeagueError::UnknownTeam`] if no team has this id.
    pub fn team(&self, id: TeamId) -> Result<&Team, LeagueError> {
        self.teams
            .iter()
            .find(|team| team.id == id)
            .ok_or(LeagueError::UnknownTeam(id))
    }

    /// # Errors
    ///
    /// Returns [`LeagueError::UnknownTeam`] if no team has this id.
    pub fn team_mut(&mut self, id: TeamId) -> Result<&mut Team, LeagueError> {
        self.teams
            .iter_mut()
            .find(|team| team.id == id)
            .ok_or(LeagueError::UnknownTeam(id))
    }

    /// # Errors
    ///
    /// Returns [`LeagueError::UnknownPlayer`] if no player has this id.
    pub fn player(&self, id: PlayerId) -> Result<&Player, LeagueError> {
        self.players
            .iter()
            .find(|player| player.id == id)
            .ok_or(LeagueError::UnknownPlayer(id))
    }

    /// # Errors
    ///
    /// Returns [`LeagueError::UnknownPlayer`] if no player has this id.
    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, LeagueError> {
        self.players
            .iter_mut()
            .find(|player| player.id == id)
            .ok_or(LeagueError::UnknownPlayer(id))
    }

    pub fn players_on(&self, team_id: TeamId) -> impl Iterator<Item = &Player> {
        self.players
            .iter()
            .filter(move |player| player.team_id == team_id)
    }

    /// # Errors
    ///
    /// Returns [`LeagueError::UnknownSeason`] for any season but the current one.
    pub const fn check_season(&self, season: i32) -> Result<(), LeagueError> {
        if season == self.season {
            Ok(())
        } else {
            Err(LeagueError::UnknownSeason {
                requested: season,
                current: self.season,
            })
        }
    }
}

fn roll_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
    let last = LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())];
    format!("{first} {last}")
}
