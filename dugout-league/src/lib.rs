//! Dugout League Engine
//!
//! Platform-agnostic league simulation for the Dugout general-manager game,
//! plus the generation-invalidated cache the front end reads derived views
//! through. The simulation driver bumps the cache generation after every
//! simulated day; views computed before that point are recomputed on their
//! next read.

pub mod access;
pub mod cache;
pub mod config;
pub mod keys;
pub mod league;
pub mod session;
pub mod views;

// Re-export commonly used types
pub use access::{LeagueSource, LeagueViews};
pub use cache::{CacheEntry, CacheStats, Clock, GenerationCache, ManualClock, SystemClock};
pub use config::{CacheConfig, ConfigError, LeagueConfig, TeamConfig};
pub use keys::{leaderboard_key, player_key, roster_key, standings_key};
pub use league::{
    BattingLine, League, LeagueError, Player, PlayerId, Position, Ratings, Team, TeamId,
};
pub use session::{DayOutcome, GameResult, LeagueSession};
pub use views::{
    Leaderboard, LeaderboardEntry, PlayerProfile, RosterView, Standings, StandingsRow, Stat,
};
