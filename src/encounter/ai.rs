//! AI personality configuration and behavior controller
//!
//! Personalities are plain serde structs with defaults, optionally loaded
//! from TOML. The controller only ever proposes actions the scheduler
//! will accept; when nothing is affordable it passes.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::core::{EngineError, Result, Team, UnitId};

use super::scheduler::{Action, EncounterState};
use super::unit::CombatUnit;

/// How the AI picks its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPreference {
    /// Finish the most wounded enemy first
    LowestHp,
    Nearest,
    /// Whoever carries the biggest gun
    HighestThreat,
}

impl Default for TargetPreference {
    fn default() -> Self {
        TargetPreference::LowestHp
    }
}

/// Overall engagement style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatStyle {
    Rush,
    Defensive,
    Balanced,
    Ranged,
}

impl Default for CombatStyle {
    fn default() -> Self {
        CombatStyle::Balanced
    }
}

/// Complete AI personality configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiPersonality {
    /// Name of this personality (set from filename)
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub target_pref: TargetPreference,
    #[serde(default)]
    pub style: CombatStyle,
    /// 0.0 holds back, 1.0 always presses
    #[serde(default = "default_aggression")]
    pub aggression: f32,
}

fn default_aggression() -> f32 {
    0.5
}

impl Default for AiPersonality {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            target_pref: TargetPreference::default(),
            style: CombatStyle::default(),
            aggression: 0.5,
        }
    }
}

/// Load personality from `data/ai_personalities/{name}.toml`
pub fn load_personality(name: &str) -> Result<AiPersonality> {
    let path = personality_path(name);
    let contents = fs::read_to_string(&path)?;
    let mut personality: AiPersonality = toml::from_str(&contents)
        .map_err(|e| EngineError::ConfigError(format!("bad personality TOML {:?}: {}", path, e)))?;
    personality.name = name.to_string();
    Ok(personality)
}

fn personality_path(name: &str) -> PathBuf {
    PathBuf::from("data/ai_personalities").join(format!("{}.toml", name))
}

/// Decides one action at a time for a unit
pub struct AiController {
    pub personality: AiPersonality,
}

impl AiController {
    pub fn new(personality: AiPersonality) -> Self {
        Self { personality }
    }

    /// Pick the next action for `actor`. Always returns something the
    /// scheduler will accept; `Pass` is the floor.
    pub fn choose_action(&self, encounter: &EncounterState, actor: UnitId) -> Action {
        let Ok(unit) = encounter.unit(actor) else {
            return Action::Pass;
        };
        let enemies: Vec<&CombatUnit> = encounter
            .units()
            .iter()
            .filter(|u| u.team == unit.team.opponent() && u.can_fight())
            .collect();
        let Some(target) = self.pick_target(unit, &enemies, encounter) else {
            return Action::Pass;
        };

        // A cornered defensive fighter holds instead of trading
        let hp_ratio = unit.hp as f32 / unit.max_hp.max(1) as f32;
        if self.personality.style == CombatStyle::Defensive
            && hp_ratio < 0.3
            && self.personality.aggression < 0.7
        {
            return Action::Pass;
        }

        let weapon = unit.weapon_def(encounter.catalog());
        let distance = unit.pos.distance(&target.pos);
        let in_range = distance <= weapon.range;
        let affordable = unit.can_afford(weapon.ap_cost());

        if in_range && affordable && weapon.base_damage > 0 {
            return Action::Attack {
                target: target.id,
                situational_bias: 0,
            };
        }

        // Close the gap if the style allows and the legs are paid for
        if matches!(
            self.personality.style,
            CombatStyle::Rush | CombatStyle::Balanced
        ) {
            let step = step_toward(unit, target);
            let cost = 1 + unit.resolved_armor(encounter.catalog()).movement_penalty;
            if step != unit.pos && unit.can_afford(cost) && encounter.grapples().iter().all(|g| !g.involves(actor)) {
                return Action::Move { to: step };
            }
        }

        Action::Pass
    }

    fn pick_target<'a>(
        &self,
        unit: &CombatUnit,
        enemies: &[&'a CombatUnit],
        encounter: &EncounterState,
    ) -> Option<&'a CombatUnit> {
        if enemies.is_empty() {
            return None;
        }
        match self.personality.target_pref {
            TargetPreference::LowestHp => enemies
                .iter()
                .min_by(|a, b| {
                    let ra = a.hp as f32 / a.max_hp.max(1) as f32;
                    let rb = b.hp as f32 / b.max_hp.max(1) as f32;
                    ra.partial_cmp(&rb)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| a.id.cmp(&b.id))
                })
                .copied(),
            TargetPreference::Nearest => enemies
                .iter()
                .min_by_key(|e| (unit.pos.distance(&e.pos), e.id))
                .copied(),
            TargetPreference::HighestThreat => enemies
                .iter()
                .max_by_key(|e| (e.weapon_def(encounter.catalog()).base_damage, e.id))
                .copied(),
        }
    }
}

/// One tile toward the target, diagonal allowed
fn step_toward(unit: &CombatUnit, target: &CombatUnit) -> crate::core::GridPos {
    let dx = (target.pos.x - unit.pos.x).signum();
    let dy = (target.pos.y - unit.pos.y).signum();
    crate::core::GridPos::new(unit.pos.x + dx, unit.pos.y + dy)
}

/// Convenience: default personalities per team
pub fn default_personality_for(team: Team) -> AiPersonality {
    match team {
        Team::Player => AiPersonality::default(),
        Team::Enemy => AiPersonality {
            name: "aggressive".to_string(),
            target_pref: TargetPreference::LowestHp,
            style: CombatStyle::Rush,
            aggression: 0.8,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::core::GridPos;

    fn encounter_with(units: Vec<CombatUnit>) -> EncounterState {
        let mut enc = EncounterState::new(Catalog::builtin());
        for unit in units {
            enc.add_unit(unit).unwrap();
        }
        enc.start().unwrap();
        enc
    }

    #[test]
    fn test_personality_toml_parses_with_defaults() {
        let personality: AiPersonality = toml::from_str("").unwrap();
        assert_eq!(personality.target_pref, TargetPreference::LowestHp);
        assert_eq!(personality.style, CombatStyle::Balanced);
        assert!((personality.aggression - 0.5).abs() < f32::EPSILON);

        let personality: AiPersonality =
            toml::from_str("target_pref = \"nearest\"\nstyle = \"rush\"\naggression = 0.9").unwrap();
        assert_eq!(personality.target_pref, TargetPreference::Nearest);
        assert_eq!(personality.style, CombatStyle::Rush);
    }

    #[test]
    fn test_shipped_personalities_load() {
        // Relative to the crate root, where cargo runs tests from
        for name in ["default", "aggressive", "defensive"] {
            let personality = load_personality(name).unwrap();
            assert_eq!(personality.name, name);
        }
        let aggressive = load_personality("aggressive").unwrap();
        assert_eq!(aggressive.target_pref, TargetPreference::Nearest);
        assert_eq!(aggressive.style, CombatStyle::Rush);
        assert!((aggressive.aggression - 0.9).abs() < f32::EPSILON);

        assert!(load_personality("no_such_personality").is_err());
    }

    #[test]
    fn test_default_personalities_per_team() {
        let player = default_personality_for(Team::Player);
        let enemy = default_personality_for(Team::Enemy);
        assert_eq!(player.style, CombatStyle::Balanced);
        assert_eq!(enemy.style, CombatStyle::Rush);
        assert!(enemy.aggression > player.aggression);
    }

    #[test]
    fn test_ai_attacks_in_range_enemy() {
        let shooter = CombatUnit::new("Shooter", Team::Player, GridPos::new(0, 0))
            .with_weapon("service_pistol");
        let shooter_id = shooter.id;
        let raider = CombatUnit::new("Raider", Team::Enemy, GridPos::new(3, 0));
        let raider_id = raider.id;
        let enc = encounter_with(vec![shooter, raider]);

        let ai = AiController::new(AiPersonality::default());
        let action = ai.choose_action(&enc, shooter_id);
        assert_eq!(
            action,
            Action::Attack {
                target: raider_id,
                situational_bias: 0
            }
        );
    }

    #[test]
    fn test_ai_closes_distance_when_out_of_range() {
        let brawler =
            CombatUnit::new("Brawler", Team::Player, GridPos::new(0, 0)).with_weapon("fists");
        let brawler_id = brawler.id;
        let raider = CombatUnit::new("Raider", Team::Enemy, GridPos::new(5, 0));
        let enc = encounter_with(vec![brawler, raider]);

        let ai = AiController::new(AiPersonality::default());
        let action = ai.choose_action(&enc, brawler_id);
        assert_eq!(
            action,
            Action::Move {
                to: GridPos::new(1, 0)
            }
        );
    }

    #[test]
    fn test_ai_targets_lowest_hp_ratio() {
        let shooter = CombatUnit::new("Shooter", Team::Player, GridPos::new(0, 0))
            .with_weapon("assault_rifle");
        let shooter_id = shooter.id;
        let healthy = CombatUnit::new("Healthy", Team::Enemy, GridPos::new(2, 0));
        let mut hurt = CombatUnit::new("Hurt", Team::Enemy, GridPos::new(3, 0));
        hurt.hp = 10;
        let hurt_id = hurt.id;
        let enc = encounter_with(vec![shooter, healthy, hurt]);

        let ai = AiController::new(AiPersonality::default());
        match ai.choose_action(&enc, shooter_id) {
            Action::Attack { target, .. } => assert_eq!(target, hurt_id),
            other => panic!("expected attack, got {:?}", other),
        }
    }

    #[test]
    fn test_cornered_defensive_ai_holds() {
        let mut turtle = CombatUnit::new("Turtle", Team::Player, GridPos::new(0, 0))
            .with_weapon("service_pistol");
        turtle.hp = 10;
        let turtle_id = turtle.id;
        let raider = CombatUnit::new("Raider", Team::Enemy, GridPos::new(2, 0));
        let enc = encounter_with(vec![turtle, raider]);

        let ai = AiController::new(AiPersonality {
            style: CombatStyle::Defensive,
            aggression: 0.2,
            ..AiPersonality::default()
        });
        assert_eq!(ai.choose_action(&enc, turtle_id), Action::Pass);
    }

    #[test]
    fn test_ai_never_proposes_unaffordable_attack() {
        let mut sniper = CombatUnit::new("Sniper", Team::Player, GridPos::new(0, 0))
            .with_weapon("sniper_rifle");
        sniper.max_ap = 2;
        sniper.ap = 2;
        let sniper_id = sniper.id;
        let raider = CombatUnit::new("Raider", Team::Enemy, GridPos::new(3, 0));
        let enc = encounter_with(vec![sniper, raider]);

        let ai = AiController::new(AiPersonality {
            style: CombatStyle::Ranged,
            ..AiPersonality::default()
        });
        // Sniper costs 4 AP; with 2 available and a ranged style the
        // only legal proposal is Pass
        assert_eq!(ai.choose_action(&enc, sniper_id), Action::Pass);
    }
}
