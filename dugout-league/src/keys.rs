//! Canonical cache keys for the derived league views.
//!
//! Each family starts with its own literal prefix followed by a colon, so keys
//! from different families never collide. Inputs are not validated; an id
//! that does not exist simply produces a key nothing ever writes.

pub const STANDINGS_PREFIX: &str = "standings";
pub const ROSTER_PREFIX: &str = "roster";
pub const LEADERBOARD_PREFIX: &str = "leaderboard";
pub const PLAYER_PREFIX: &str = "player";

#[must_use]
pub fn standings_key(season: i32) -> String {
    format!("{STANDINGS_PREFIX}:{season}")
}

#[must_use]
pub fn roster_key(team_id: i64) -> String {
    format!("{ROSTER_PREFIX}:{team_id}")
}

#[must_use]
pub fn leaderboard_key(stat: &str, season: i32) -> String {
    format!("{LEADERBOARD_PREFIX}:{stat}:{season}")
}

#[must_use]
pub fn player_key(player_id: i64) -> String {
    format!("{PLAYER_PREFIX}:{player_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn keys_use_family_prefixes() {
        assert_eq!(standings_key(2025), "standings:2025");
        assert_eq!(roster_key(14), "roster:14");
        assert_eq!(leaderboard_key("hr", 2025), "leaderboard:hr:2025");
        assert_eq!(player_key(301), "player:301");
    }

    #[test]
    fn same_id_in_different_families_does_not_collide() {
        let keys: HashSet<String> = [
            standings_key(7),
            roster_key(7),
            player_key(7),
            leaderboard_key("7", 7),
        ]
        .into_iter()
        .collect();
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn nonsense_ids_still_produce_keys() {
        assert_eq!(roster_key(-1), "roster:-1");
        assert_eq!(player_key(i64::MIN), format!("player:{}", i64::MIN));
    }
}
