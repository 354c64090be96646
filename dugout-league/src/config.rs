//! League and cache configuration
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;
use thiserror::Error;

use crate::league::LINEUP_SIZE;

const DEFAULT_LEAGUE_DATA: &str = include_str!("../assets/data/league.json");

/// Errors raised when a league configuration cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("league needs an even, non-zero number of teams (got {count})")]
    TeamCount { count: usize },
    #[error("roster size must be at least {min} (got {value})")]
    RosterSize { min: u8, value: u8 },
    #[error("games_per_season must be at least 1")]
    EmptySeason,
    #[error("duplicate team id {0}")]
    DuplicateTeamId(u32),
    #[error("duplicate team abbreviation {0}")]
    DuplicateAbbreviation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamConfig {
    pub id: u32,
    pub name: String,
    pub abbreviation: String,
    #[serde(default)]
    pub league: String,
    #[serde(default)]
    pub division: String,
}

/// Age-based sweep settings applied by the simulation driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "CacheConfig::default_max_age_ms")]
    pub max_age_ms: i64,
    /// Sweep cadence in simulated days; 0 disables the sweep.
    #[serde(default = "CacheConfig::default_sweep_every_days")]
    pub sweep_every_days: u32,
}

impl CacheConfig {
    const fn default_max_age_ms() -> i64 {
        300_000
    }

    const fn default_sweep_every_days() -> u32 {
        7
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_ms: Self::default_max_age_ms(),
            sweep_every_days: Self::default_sweep_every_days(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueConfig {
    #[serde(default = "LeagueConfig::default_season")]
    pub season: i32,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "LeagueConfig::default_roster_size")]
    pub roster_size: u8,
    #[serde(default = "LeagueConfig::default_games_per_season")]
    pub games_per_season: u32,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub teams: Vec<TeamConfig>,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            season: Self::default_season(),
            seed: 0,
            roster_size: Self::default_roster_size(),
            games_per_season: Self::default_games_per_season(),
            cache: CacheConfig::default(),
            teams: Vec::new(),
        }
    }
}

impl LeagueConfig {
    const fn default_season() -> i32 {
        2025
    }

    const fn default_roster_size() -> u8 {
        13
    }

    const fn default_games_per_season() -> u32 {
        162
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        serde_json::from_str(DEFAULT_LEAGUE_DATA).unwrap_or_default()
    }

    /// Embedded league, parsed once.
    #[must_use]
    pub fn default_config() -> Self {
        static CONFIG: OnceLock<LeagueConfig> = OnceLock::new();
        CONFIG.get_or_init(Self::load_from_static).clone()
    }

    /// Parse and validate a configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the league it describes is unplayable.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check the invariants the schedule and lineups rely on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let count = self.teams.len();
        if count == 0 || count % 2 != 0 {
            return Err(ConfigError::TeamCount { count });
        }
        let min = u8::try_from(LINEUP_SIZE).unwrap_or(u8::MAX);
        if self.roster_size < min {
            return Err(ConfigError::RosterSize {
                min,
                value: self.roster_size,
            });
        }
        if self.games_per_season == 0 {
            return Err(ConfigError::EmptySeason);
        }

        let mut ids = HashSet::new();
        let mut abbreviations = HashSet::new();
        for team in &self.teams {
            if !ids.insert(team.id) {
                return Err(ConfigError::DuplicateTeamId(team.id));
            }
            if !abbreviations.insert(team.abbreviation.to_ascii_uppercase()) {
                return Err(ConfigError::DuplicateAbbreviation(team.abbreviation.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: u32, abbreviation: &str) -> TeamConfig {
        TeamConfig {
            id,
            name: format!("Team {id}"),
            abbreviation: abbreviation.to_string(),
            league: "North".to_string(),
            division: "East".to_string(),
        }
    }

    #[test]
    fn embedded_config_is_valid() {
        let config = LeagueConfig::default_config();
        config.validate().unwrap();
        assert_eq!(config.teams.len(), 30);
        assert_eq!(config.season, 2025);
        assert_eq!(config.cache.sweep_every_days, 7);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config = LeagueConfig::from_json(
            r#"{"teams":[{"id":1,"name":"A","abbreviation":"AAA"},{"id":2,"name":"B","abbreviation":"BBB"}]}"#,
        )
        .unwrap();
        assert_eq!(config.roster_size, 13);
        assert_eq!(config.games_per_season, 162);
        assert_eq!(config.cache, CacheConfig::default());
    }

    #[test]
    fn odd_team_count_rejected() {
        let config = LeagueConfig {
            teams: vec![team(1, "AAA"), team(2, "BBB"), team(3, "CCC")],
            ..LeagueConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TeamCount { count: 3 })
        ));
    }

    #[test]
    fn duplicates_rejected() {
        let config = LeagueConfig {
            teams: vec![team(1, "AAA"), team(1, "BBB")],
            ..LeagueConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateTeamId(1))
        ));

        let config = LeagueConfig {
            teams: vec![team(1, "AAA"), team(2, "aaa")],
            ..LeagueConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateAbbreviation(_))
        ));
    }

    #[test]
    fn short_rosters_rejected() {
        let config = LeagueConfig {
            roster_size: 8,
            teams: vec![team(1, "AAA"), team(2, "BBB")],
            ..LeagueConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RosterSize { min: 9, value: 8 })
        ));
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        assert!(matches!(
            LeagueConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
