//! Role-to-team resolution.
//!
//! A GM's team is derived from their current Discord roles at the moment of
//! each action, never cached from an earlier step. A user may hold at most
//! one team role; holding several is a server misconfiguration reported as
//! an explicit error rather than silently picking the first match.

use crate::core::ledger::Team;
use crate::errors::{Error, Result};

/// Whether the role list contains the given role id.
#[must_use]
pub fn has_role(roles: &[u64], role_id: u64) -> bool {
    roles.contains(&role_id)
}

/// Resolves which team's role the user holds.
///
/// Returns `Ok(None)` when no team role is held, and
/// [`Error::AmbiguousTeam`] when more than one is.
pub fn team_for_roles<'a>(teams: &'a [Team], roles: &[u64]) -> Result<Option<&'a Team>> {
    let mut matches = teams.iter().filter(|t| roles.contains(&t.role_id));
    let first = matches.next();
    if let Some(first_team) = first {
        let extra: Vec<&Team> = matches.collect();
        if !extra.is_empty() {
            let mut names = vec![first_team.name.clone()];
            names.extend(extra.iter().map(|t| t.name.clone()));
            return Err(Error::AmbiguousTeam { teams: names });
        }
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rust_decimal_macros::dec;

    fn teams() -> Vec<Team> {
        vec![
            Team {
                id: "lakers".to_string(),
                name: "Lakers".to_string(),
                role_id: 1001,
                balance: dec!(100),
            },
            Team {
                id: "celtics".to_string(),
                name: "Celtics".to_string(),
                role_id: 1002,
                balance: dec!(100),
            },
        ]
    }

    #[test]
    fn test_single_team_role_resolves() {
        let teams = teams();
        let team = team_for_roles(&teams, &[55, 1002, 77]).unwrap().unwrap();
        assert_eq!(team.id, "celtics");
    }

    #[test]
    fn test_no_team_role_is_none() {
        let teams = teams();
        assert!(team_for_roles(&teams, &[55, 77]).unwrap().is_none());
        assert!(team_for_roles(&teams, &[]).unwrap().is_none());
    }

    #[test]
    fn test_multiple_team_roles_is_ambiguous() {
        let teams = teams();
        let result = team_for_roles(&teams, &[1001, 1002]);
        let Err(Error::AmbiguousTeam { teams: names }) = result else {
            panic!("expected AmbiguousTeam");
        };
        assert_eq!(names, vec!["Lakers".to_string(), "Celtics".to_string()]);
    }
}
