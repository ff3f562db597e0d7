//! Team strength lookup.
//!
//! Strengths live in an immutable table (league → team → strength in
//! [0, 1]) injected at construction. Lookup never fails: names that match
//! nothing resolve to the configured default.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One team's rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamEntry {
    pub name: String,
    pub strength: f64,
}

/// All rated teams of one league, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueStrengths {
    pub league: String,
    pub teams: Vec<TeamEntry>,
}

fn league(name: &str, teams: &[(&str, f64)]) -> LeagueStrengths {
    LeagueStrengths {
        league: name.to_string(),
        teams: teams
            .iter()
            .map(|(team, strength)| TeamEntry {
                name: team.to_string(),
                strength: *strength,
            })
            .collect(),
    }
}

/// Immutable league → team → strength table.
///
/// Declaration order is significant: substring matches return the first
/// hit, leagues in order and teams in order within a league.
#[derive(Debug, Clone, Default)]
pub struct StrengthTable {
    leagues: Vec<LeagueStrengths>,
}

impl StrengthTable {
    /// Build a table, clamping every strength into [0, 1].
    pub fn new(mut leagues: Vec<LeagueStrengths>) -> Self {
        for entry in leagues.iter_mut().flat_map(|l| l.teams.iter_mut()) {
            if !(0.0..=1.0).contains(&entry.strength) {
                let clamped = if entry.strength.is_finite() {
                    entry.strength.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                warn!(
                    team = %entry.name,
                    strength = entry.strength,
                    clamped,
                    "Strength outside [0, 1], clamping"
                );
                entry.strength = clamped;
            }
        }
        Self { leagues }
    }

    /// Curated ratings for the major European leagues.
    pub fn builtin() -> Self {
        Self::new(vec![
            league(
                "La Liga",
                &[
                    ("Real Madrid", 0.92),
                    ("Barcelona", 0.90),
                    ("Atletico Madrid", 0.85),
                    ("Sevilla", 0.78),
                    ("Real Sociedad", 0.75),
                    ("Valencia", 0.72),
                    ("Villarreal", 0.70),
                    ("Real Betis", 0.68),
                    ("Athletic Bilbao", 0.66),
                ],
            ),
            league(
                "Premier League",
                &[
                    ("Manchester City", 0.93),
                    ("Liverpool", 0.90),
                    ("Chelsea", 0.85),
                    ("Arsenal", 0.82),
                    ("Manchester United", 0.80),
                    ("Tottenham", 0.78),
                    ("Newcastle", 0.72),
                    ("Brighton", 0.68),
                    ("West Ham", 0.65),
                ],
            ),
            league(
                "Serie A",
                &[
                    ("Inter Milan", 0.85),
                    ("AC Milan", 0.83),
                    ("Juventus", 0.82),
                    ("Napoli", 0.80),
                    ("AS Roma", 0.75),
                    ("Lazio", 0.72),
                ],
            ),
            league(
                "Bundesliga",
                &[
                    ("Bayern Munich", 0.91),
                    ("Borussia Dortmund", 0.82),
                    ("RB Leipzig", 0.78),
                    ("Bayer Leverkusen", 0.75),
                    ("Eintracht Frankfurt", 0.70),
                ],
            ),
            league(
                "Ligue 1",
                &[
                    ("Paris Saint-Germain", 0.88),
                    ("Monaco", 0.75),
                    ("Marseille", 0.72),
                    ("Lyon", 0.70),
                    ("Lille", 0.68),
                ],
            ),
        ])
    }

    /// Merge overrides: matching teams are re-rated, unknown teams and
    /// leagues are appended.
    pub fn with_overrides(self, overrides: &[LeagueStrengths]) -> Self {
        let mut leagues = self.leagues;
        for over in overrides {
            let idx = match leagues
                .iter()
                .position(|l| l.league.eq_ignore_ascii_case(&over.league))
            {
                Some(idx) => idx,
                None => {
                    leagues.push(LeagueStrengths {
                        league: over.league.clone(),
                        teams: Vec::new(),
                    });
                    leagues.len() - 1
                }
            };
            let teams = &mut leagues[idx].teams;
            for entry in &over.teams {
                match teams.iter_mut().find(|t| t.name == entry.name) {
                    Some(existing) => existing.strength = entry.strength,
                    None => teams.push(entry.clone()),
                }
            }
        }
        Self::new(leagues)
    }

    pub fn leagues(&self) -> &[LeagueStrengths] {
        &self.leagues
    }

    /// Teams of one league (case-insensitive).
    pub fn teams(&self, league: &str) -> Option<&[TeamEntry]> {
        self.leagues
            .iter()
            .find(|l| l.league.eq_ignore_ascii_case(league.trim()))
            .map(|l| l.teams.as_slice())
    }

    /// Leagues in search order: the hinted league first when it exists.
    fn search_order<'a>(&'a self, hint: Option<&str>) -> Vec<&'a LeagueStrengths> {
        let hinted = hint.and_then(|h| {
            self.leagues
                .iter()
                .position(|l| l.league.eq_ignore_ascii_case(h.trim()))
        });
        let mut order: Vec<&LeagueStrengths> = Vec::with_capacity(self.leagues.len());
        if let Some(idx) = hinted {
            order.push(&self.leagues[idx]);
        }
        order.extend(
            self.leagues
                .iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != hinted)
                .map(|(_, l)| l),
        );
        order
    }

    /// Exact match first, then case-insensitive substring in either
    /// direction. `None` when nothing matches.
    pub fn lookup(&self, name: &str, league_hint: Option<&str>) -> Option<&TeamEntry> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let order = self.search_order(league_hint);

        if let Some(entry) = order
            .iter()
            .flat_map(|l| l.teams.iter())
            .find(|t| t.name == name)
        {
            return Some(entry);
        }

        let needle = name.to_lowercase();
        order.iter().flat_map(|l| l.teams.iter()).find(|t| {
            let candidate = t.name.to_lowercase();
            candidate.contains(&needle) || needle.contains(&candidate)
        })
    }
}

/// Result of resolving a team name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedStrength {
    pub strength: f64,
    /// False when the default was used.
    pub matched: bool,
}

/// Maps team names to strengths with a fixed fallback.
#[derive(Debug, Clone)]
pub struct TeamStrengthModel {
    table: StrengthTable,
    default_strength: f64,
}

impl TeamStrengthModel {
    pub const DEFAULT_STRENGTH: f64 = 0.65;

    pub fn new(table: StrengthTable, default_strength: f64) -> Self {
        Self {
            table,
            default_strength: default_strength.clamp(0.0, 1.0),
        }
    }

    pub fn table(&self) -> &StrengthTable {
        &self.table
    }

    /// Strength for a name, searching every league in declaration order.
    pub fn strength(&self, name: &str) -> f64 {
        self.resolve(name, None).strength
    }

    /// Strength for a name with an optional league hint searched first.
    pub fn resolve(&self, name: &str, league: Option<&str>) -> ResolvedStrength {
        match self.table.lookup(name, league) {
            Some(entry) => {
                debug!(team = name, matched = %entry.name, strength = entry.strength, "Team resolved");
                ResolvedStrength {
                    strength: entry.strength,
                    matched: true,
                }
            }
            None => {
                warn!(
                    team = name,
                    default = self.default_strength,
                    "Unknown team, using default strength"
                );
                ResolvedStrength {
                    strength: self.default_strength,
                    matched: false,
                }
            }
        }
    }
}

impl Default for TeamStrengthModel {
    fn default() -> Self {
        Self::new(StrengthTable::builtin(), Self::DEFAULT_STRENGTH)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let model = TeamStrengthModel::default();
        assert_eq!(model.strength("Real Madrid"), 0.92);
        assert_eq!(model.strength("Manchester City"), 0.93);
        assert_eq!(model.strength("Lille"), 0.68);
    }

    #[test]
    fn test_case_insensitive_substring() {
        let model = TeamStrengthModel::default();
        assert_eq!(model.strength("real madrid fc"), 0.92);
        assert_eq!(model.strength("BAYERN"), 0.91);
        assert_eq!(model.strength("  Juventus  "), 0.82);
    }

    #[test]
    fn test_first_declared_match_wins() {
        let model = TeamStrengthModel::default();
        // "Madrid" is contained in both Real Madrid and Atletico Madrid.
        assert_eq!(model.strength("Madrid"), 0.92);
        // "Manchester" hits Manchester City before Manchester United.
        assert_eq!(model.strength("Manchester"), 0.93);
    }

    #[test]
    fn test_exact_beats_earlier_substring() {
        let table = StrengthTable::new(vec![
            league("A", &[("Milan Reserves", 0.4)]),
            league("B", &[("Milan", 0.8)]),
        ]);
        let model = TeamStrengthModel::new(table, 0.65);
        assert_eq!(model.strength("Milan"), 0.8);
    }

    #[test]
    fn test_league_hint_searched_first() {
        let model = TeamStrengthModel::default();
        assert_eq!(model.resolve("Manchester", Some("Premier League")).strength, 0.93);
        assert_eq!(model.resolve("Madrid", Some("la liga")).strength, 0.92);
        // Unknown hints fall through to declaration order.
        assert_eq!(model.resolve("Real Madrid", Some("MLS")).strength, 0.92);
    }

    #[test]
    fn test_unknown_team_default() {
        let model = TeamStrengthModel::default();
        let r = model.resolve("Unknown FC", None);
        assert_eq!(r.strength, 0.65);
        assert!(!r.matched);
    }

    #[test]
    fn test_empty_name_default() {
        let model = TeamStrengthModel::default();
        assert_eq!(model.strength(""), 0.65);
        assert!(!model.resolve("   ", None).matched);
    }

    #[test]
    fn test_overrides_merge() {
        let table = StrengthTable::builtin().with_overrides(&[
            league("La Liga", &[("Real Madrid", 0.95), ("Girona", 0.71)]),
            league("Eredivisie", &[("Ajax", 0.78)]),
        ]);
        let model = TeamStrengthModel::new(table, 0.65);
        assert_eq!(model.strength("Real Madrid"), 0.95);
        assert_eq!(model.strength("Girona"), 0.71);
        assert_eq!(model.strength("Ajax"), 0.78);
        assert_eq!(model.table().teams("la liga").map(|t| t.len()), Some(10));
    }

    #[test]
    fn test_out_of_range_strength_clamped() {
        let table = StrengthTable::new(vec![league("X", &[("Over", 1.4), ("Under", -0.2)])]);
        let model = TeamStrengthModel::new(table, 0.65);
        assert_eq!(model.strength("Over"), 1.0);
        assert_eq!(model.strength("Under"), 0.0);
    }
}
