//! Turning a 0/1 assignment back into two named teams.

use crate::roster::Player;
use serde::Serialize;
use std::fmt;

/// One side of the split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub players: Vec<Player>,
    pub total_rating: i64,
}

impl Team {
    fn from_players(players: Vec<Player>) -> Team {
        let total_rating = players.iter().map(|p| p.rating).sum();
        Team { players, total_rating }
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.players.iter().map(|p| p.name.as_str()).collect()
    }
}

/// Two teams built from a solver assignment. Team A holds the players assigned 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSplit {
    pub team_a: Team,
    pub team_b: Team,
    pub rating_difference: i64,
}

impl TeamSplit {
    /// Pair `assignment[i]` with `players[i]`. `None` when the lengths differ.
    #[must_use]
    pub fn from_assignment(players: &[Player], assignment: &[u8]) -> Option<TeamSplit> {
        if players.len() != assignment.len() {
            return None;
        }
        let (a, b): (Vec<_>, Vec<_>) = players.iter().zip(assignment).partition(|&(_, &side)| side == 0);
        let team_a = Team::from_players(a.into_iter().map(|(p, _)| p.clone()).collect());
        let team_b = Team::from_players(b.into_iter().map(|(p, _)| p.clone()).collect());
        let rating_difference = (team_a.total_rating - team_b.total_rating).abs();
        Some(TeamSplit { team_a, team_b, rating_difference })
    }
}

impl fmt::Display for TeamSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, team) in [("A", &self.team_a), ("B", &self.team_b)] {
            writeln!(f, "Team {label} (rating {}): {}", team.total_rating, team.names().join(", "))?;
        }
        write!(f, "Rating difference: {}", self.rating_difference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::parse_csv;

    fn roster() -> Vec<Player> {
        parse_csv("name,rating,position\nAlice,8,forward\nBob,6,defense\nCharlie,7,midfield\nDiana,9,forward").unwrap()
    }

    #[test]
    fn test_split_from_assignment() {
        let split = TeamSplit::from_assignment(&roster(), &[0, 1, 1, 0]).unwrap();
        assert_eq!(split.team_a.names(), vec!["Alice", "Diana"]);
        assert_eq!(split.team_b.names(), vec!["Bob", "Charlie"]);
        assert_eq!(split.team_a.total_rating, 17);
        assert_eq!(split.team_b.total_rating, 13);
        assert_eq!(split.rating_difference, 4);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(TeamSplit::from_assignment(&roster(), &[0, 1, 1]).is_none());
    }

    #[test]
    fn test_display() {
        let split = TeamSplit::from_assignment(&roster(), &[0, 1, 1, 0]).unwrap();
        assert_eq!(
            split.to_string(),
            "Team A (rating 17): Alice, Diana\nTeam B (rating 13): Bob, Charlie\nRating difference: 4"
        );
    }
}
