//! Encounter statistics: write-only accumulator, immutable report
//!
//! The accumulator takes facts as they happen and never exposes partial
//! aggregates; `finalize` produces the report in one pass. Team totals are
//! computed by summing the unit rows, so the two views cannot drift.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{Round, Team, UnitId};

/// Per-unit accumulated figures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTally {
    pub damage_dealt: i32,
    pub damage_taken: i32,
    pub kills: u32,
    pub shots: u32,
    pub hits: u32,
    pub crits: u32,
    pub overkill: i32,
}

/// One entry in the ordered kill log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillRecord {
    pub round: Round,
    pub killer: UnitId,
    pub victim: UnitId,
    pub weapon: String,
    pub damage: i32,
    pub overkill: i32,
}

/// Write-only accumulator, owned by the encounter
#[derive(Debug, Clone, Default)]
pub struct CombatStats {
    units: AHashMap<UnitId, (Team, String, UnitTally)>,
    kill_log: Vec<KillRecord>,
}

impl CombatStats {
    pub fn register_unit(&mut self, id: UnitId, team: Team, name: &str) {
        self.units
            .entry(id)
            .or_insert_with(|| (team, name.to_string(), UnitTally::default()));
    }

    fn tally_mut(&mut self, id: UnitId) -> Option<&mut UnitTally> {
        self.units.get_mut(&id).map(|(_, _, t)| t)
    }

    pub fn record_shot(&mut self, attacker: UnitId) {
        if let Some(t) = self.tally_mut(attacker) {
            t.shots += 1;
        }
    }

    pub fn record_hit(&mut self, attacker: UnitId, crit: bool) {
        if let Some(t) = self.tally_mut(attacker) {
            t.hits += 1;
            if crit {
                t.crits += 1;
            }
        }
    }

    pub fn record_damage(&mut self, attacker: UnitId, victim: UnitId, damage: i32) {
        if let Some(t) = self.tally_mut(attacker) {
            t.damage_dealt += damage;
        }
        if let Some(t) = self.tally_mut(victim) {
            t.damage_taken += damage;
        }
    }

    pub fn record_kill(
        &mut self,
        round: Round,
        killer: UnitId,
        victim: UnitId,
        weapon: &str,
        damage: i32,
        overkill: i32,
    ) {
        if let Some(t) = self.tally_mut(killer) {
            t.kills += 1;
            t.overkill += overkill;
        }
        self.kill_log.push(KillRecord {
            round,
            killer,
            victim,
            weapon: weapon.to_string(),
            damage,
            overkill,
        });
    }

    /// Produce the immutable report. Consumes nothing; the encounter can
    /// keep accumulating (it won't, combat is over).
    ///
    /// `survivors` is every unit still breathing at the end, unconscious
    /// included. The scheduler knows; the accumulator doesn't track hp.
    pub fn finalize(
        &self,
        rounds: Round,
        winner: Option<Team>,
        survivors: Vec<UnitId>,
    ) -> CombatReport {
        let mut units: Vec<UnitReport> = self
            .units
            .iter()
            .map(|(id, (team, name, tally))| UnitReport {
                id: *id,
                name: name.clone(),
                team: *team,
                tally: *tally,
            })
            .collect();
        let team_rank = |team: Team| match team {
            Team::Player => 0,
            Team::Enemy => 1,
        };
        units.sort_by(|a, b| {
            team_rank(a.team)
                .cmp(&team_rank(b.team))
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut teams: Vec<TeamReport> = Vec::new();
        for team in [Team::Player, Team::Enemy] {
            let mut report = TeamReport {
                team,
                damage_dealt: 0,
                kills: 0,
                shots: 0,
                hits: 0,
                crits: 0,
            };
            for unit in units.iter().filter(|u| u.team == team) {
                report.damage_dealt += unit.tally.damage_dealt;
                report.kills += unit.tally.kills;
                report.shots += unit.tally.shots;
                report.hits += unit.tally.hits;
                report.crits += unit.tally.crits;
            }
            teams.push(report);
        }

        let longest_streak = longest_streak(&self.kill_log);
        let most_damage_taken = units
            .iter()
            .filter(|u| u.tally.damage_taken > 0)
            .max_by_key(|u| u.tally.damage_taken)
            .map(|u| u.id);

        CombatReport {
            rounds,
            winner,
            teams,
            survivors,
            first_kill: self.kill_log.first().cloned(),
            last_kill: self.kill_log.last().cloned(),
            longest_streak,
            most_damage_taken,
            kill_log: self.kill_log.clone(),
            units,
        }
    }
}

/// Longest run of consecutive kill-log entries by the same killer
fn longest_streak(kill_log: &[KillRecord]) -> Option<StreakReport> {
    let mut best: Option<StreakReport> = None;
    let mut current: Option<(UnitId, u32)> = None;
    for record in kill_log {
        current = match current {
            Some((unit, count)) if unit == record.killer => Some((unit, count + 1)),
            _ => Some((record.killer, 1)),
        };
        if let Some((unit, count)) = current {
            if best.as_ref().map_or(true, |b| count > b.count) {
                best = Some(StreakReport { unit, count });
            }
        }
    }
    best
}

/// Per-team totals, summed from unit rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamReport {
    pub team: Team,
    pub damage_dealt: i32,
    pub kills: u32,
    pub shots: u32,
    pub hits: u32,
    pub crits: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitReport {
    pub id: UnitId,
    pub name: String,
    pub team: Team,
    pub tally: UnitTally,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakReport {
    pub unit: UnitId,
    pub count: u32,
}

/// Immutable end-of-encounter report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatReport {
    pub rounds: Round,
    pub winner: Option<Team>,
    pub teams: Vec<TeamReport>,
    /// Units still alive at the end, unconscious included
    pub survivors: Vec<UnitId>,
    pub units: Vec<UnitReport>,
    pub kill_log: Vec<KillRecord>,
    pub first_kill: Option<KillRecord>,
    pub last_kill: Option<KillRecord>,
    pub longest_streak: Option<StreakReport>,
    pub most_damage_taken: Option<UnitId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_units() -> (CombatStats, UnitId, UnitId, UnitId) {
        let mut stats = CombatStats::default();
        let a = UnitId::new();
        let b = UnitId::new();
        let e = UnitId::new();
        stats.register_unit(a, Team::Player, "Alpha");
        stats.register_unit(b, Team::Player, "Bravo");
        stats.register_unit(e, Team::Enemy, "Raider");
        (stats, a, b, e)
    }

    #[test]
    fn test_team_totals_equal_unit_sums() {
        let (mut stats, a, b, e) = three_units();
        stats.record_shot(a);
        stats.record_hit(a, false);
        stats.record_damage(a, e, 20);
        stats.record_shot(b);
        stats.record_hit(b, true);
        stats.record_damage(b, e, 35);
        stats.record_shot(e);

        let report = stats.finalize(3, Some(Team::Player), vec![a, b]);
        let player = report.teams.iter().find(|t| t.team == Team::Player).unwrap();
        let unit_sum: i32 = report
            .units
            .iter()
            .filter(|u| u.team == Team::Player)
            .map(|u| u.tally.damage_dealt)
            .sum();
        assert_eq!(player.damage_dealt, unit_sum);
        assert_eq!(player.damage_dealt, 55);
        assert_eq!(player.shots, 2);
        assert_eq!(player.hits, 2);
        assert_eq!(player.crits, 1);
    }

    #[test]
    fn test_kill_log_order_and_endpoints() {
        let (mut stats, a, b, e) = three_units();
        stats.record_kill(1, a, e, "service_pistol", 18, 3);
        stats.record_kill(2, b, a, "combat_knife", 10, 0);
        let report = stats.finalize(2, None, vec![b]);
        assert_eq!(report.kill_log.len(), 2);
        assert_eq!(report.first_kill.as_ref().unwrap().killer, a);
        assert_eq!(report.last_kill.as_ref().unwrap().killer, b);
    }

    #[test]
    fn test_longest_streak_requires_consecutive() {
        let (mut stats, a, b, e) = three_units();
        stats.record_kill(1, a, e, "smg", 14, 0);
        stats.record_kill(1, a, e, "smg", 14, 0);
        stats.record_kill(2, b, e, "smg", 14, 0);
        stats.record_kill(3, a, e, "smg", 14, 0);
        let report = stats.finalize(3, None, Vec::new());
        let streak = report.longest_streak.unwrap();
        assert_eq!(streak.unit, a);
        assert_eq!(streak.count, 2);
    }

    #[test]
    fn test_most_damage_taken() {
        let (mut stats, a, b, e) = three_units();
        stats.record_damage(e, a, 10);
        stats.record_damage(e, b, 25);
        let report = stats.finalize(1, None, vec![a, b, e]);
        assert_eq!(report.most_damage_taken, Some(b));
    }

    #[test]
    fn test_no_kills_no_streak() {
        let (stats, _, _, _) = three_units();
        let report = stats.finalize(1, None, Vec::new());
        assert!(report.first_kill.is_none());
        assert!(report.longest_streak.is_none());
        assert!(report.most_damage_taken.is_none());
    }

    #[test]
    fn test_report_serde_round_trip() {
        let (mut stats, a, _, e) = three_units();
        stats.record_shot(a);
        stats.record_hit(a, true);
        stats.record_damage(a, e, 40);
        stats.record_kill(2, a, e, "sniper_rifle", 40, 12);
        let report = stats.finalize(2, Some(Team::Player), vec![a]);
        let json = serde_json::to_string(&report).unwrap();
        let back: CombatReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report, back);
    }
}
