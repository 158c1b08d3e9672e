//! Turn and round scheduling, AP economy, action resolution
//!
//! One `EncounterState` per encounter. Turn order is frozen at the start
//! of each round. Actions are validated completely before any state
//! changes; a rejected action leaves the encounter exactly as it was.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{Catalog, DamageSubtype, WeaponCategory, WeaponDef};
use crate::combat::{
    accuracy_penalty, apply_weapon_status, attack_verb, biased_roll, effective_accuracy,
    is_stunned, resolve_impact, tick_statuses, HitTier,
};
use crate::core::{EngineError, GridPos, Result, RollSource, Round, Team, UnitId};
use crate::grapple::{
    attempt_escape, technique_table, usable_techniques, GrappleInteraction, GrapplePosition,
    GrappleRole, GrappleState, Technique, TechniqueKind,
};

use super::events::{EngineEvent, EventKind};
use super::stats::{CombatReport, CombatStats};
use super::unit::{CombatUnit, DamageMode, Facing};

/// Encounter lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Setup,
    InProgress,
    Complete,
}

/// A player or AI order for the acting unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Move {
        to: GridPos,
    },
    Attack {
        target: UnitId,
        /// Host-supplied modifier for range bands, cover, and the like
        situational_bias: i32,
    },
    Throw {
        target: UnitId,
        weapon: String,
        situational_bias: i32,
    },
    Technique {
        target: UnitId,
        technique: String,
    },
    UseItem {
        item: String,
    },
    Pass,
}

/// Full state of one running encounter
pub struct EncounterState {
    catalog: Catalog,
    units: Vec<CombatUnit>,
    techniques: Vec<Technique>,
    grapples: Vec<GrappleInteraction>,
    stats: CombatStats,
    events: Vec<EngineEvent>,
    turn_order: Vec<UnitId>,
    turn_idx: usize,
    round: Round,
    phase: Phase,
    winner: Option<Team>,
    report: Option<CombatReport>,
}

impl EncounterState {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            units: Vec::new(),
            techniques: technique_table(),
            grapples: Vec::new(),
            stats: CombatStats::default(),
            events: Vec::new(),
            turn_order: Vec::new(),
            turn_idx: 0,
            round: 0,
            phase: Phase::Setup,
            winner: None,
            report: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> Round {
        self.round
    }

    pub fn winner(&self) -> Option<Team> {
        self.winner
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    /// Final report, available once combat has ended
    pub fn report(&self) -> Option<&CombatReport> {
        self.report.as_ref()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn units(&self) -> &[CombatUnit] {
        &self.units
    }

    pub fn grapples(&self) -> &[GrappleInteraction] {
        &self.grapples
    }

    pub fn unit(&self, id: UnitId) -> Result<&CombatUnit> {
        self.units
            .iter()
            .find(|u| u.id == id)
            .ok_or_else(|| EngineError::IllegalAction(format!("unknown unit {:?}", id)))
    }

    fn unit_idx(&self, id: UnitId) -> Result<usize> {
        self.units
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| EngineError::IllegalAction(format!("unknown unit {:?}", id)))
    }

    fn unit_mut(&mut self, id: UnitId) -> Result<&mut CombatUnit> {
        self.units
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| EngineError::IllegalAction(format!("unknown unit {:?}", id)))
    }

    /// Only valid during setup
    pub fn add_unit(&mut self, unit: CombatUnit) -> Result<UnitId> {
        if self.phase != Phase::Setup {
            return Err(EngineError::IllegalAction(
                "units can only be added before combat starts".to_string(),
            ));
        }
        if self.units.iter().any(|u| u.id == unit.id) {
            return Err(EngineError::InvariantViolation(format!(
                "duplicate unit id {:?}",
                unit.id
            )));
        }
        let id = unit.id;
        self.stats.register_unit(id, unit.team, &unit.name);
        self.units.push(unit);
        Ok(id)
    }

    /// Lock the roster and begin round one.
    pub fn start(&mut self) -> Result<()> {
        if self.phase != Phase::Setup {
            return Err(EngineError::IllegalAction(
                "encounter already started".to_string(),
            ));
        }
        let players = self.units.iter().filter(|u| u.team == Team::Player).count();
        let enemies = self.units.iter().filter(|u| u.team == Team::Enemy).count();
        if players == 0 || enemies == 0 {
            return Err(EngineError::IllegalAction(
                "both teams need at least one unit".to_string(),
            ));
        }
        self.phase = Phase::InProgress;
        self.push_event(
            EventKind::EncounterStarted {
                unit_count: self.units.len(),
            },
            format!("Encounter begins with {} units", self.units.len()),
        );
        self.begin_round();
        self.begin_turn();
        Ok(())
    }

    /// Unit whose turn it is, if combat is running
    pub fn current_unit(&self) -> Option<&CombatUnit> {
        if self.phase != Phase::InProgress {
            return None;
        }
        self.turn_order
            .get(self.turn_idx)
            .and_then(|id| self.units.iter().find(|u| u.id == *id))
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    fn push_event(&mut self, kind: EventKind, description: String) {
        self.events.push(EngineEvent {
            round: self.round,
            kind,
            description,
        });
    }

    /// Turn order is frozen per round: agility descending, id as tiebreak.
    fn begin_round(&mut self) {
        self.round += 1;
        let mut order: Vec<&CombatUnit> = self.units.iter().filter(|u| u.can_fight()).collect();
        order.sort_by(|a, b| {
            b.stats
                .agility
                .cmp(&a.stats.agility)
                .then_with(|| a.id.cmp(&b.id))
        });
        self.turn_order = order.iter().map(|u| u.id).collect();
        self.turn_idx = 0;
        let round = self.round;
        self.push_event(
            EventKind::RoundStarted { round },
            format!("Round {} begins", round),
        );
    }

    /// Start-of-turn upkeep. Skips units that cannot act and advances past
    /// them until an actor is found or combat ends.
    fn begin_turn(&mut self) {
        while self.phase == Phase::InProgress {
            if self.turn_idx >= self.turn_order.len() {
                self.begin_round();
                continue;
            }
            let id = self.turn_order[self.turn_idx];
            let Ok(idx) = self.unit_idx(id) else {
                self.turn_idx += 1;
                continue;
            };
            if !self.units[idx].can_fight() {
                self.turn_idx += 1;
                continue;
            }

            self.units[idx].begin_turn();
            // Stun is read before the tick so a one-round stun actually
            // costs the turn it was inflicted for
            let stunned = is_stunned(&self.units[idx].statuses);
            self.tick_unit_statuses(id);
            if self.phase != Phase::InProgress {
                return;
            }
            if !self.unit(id).map(|u| u.can_fight()).unwrap_or(false) {
                self.turn_idx += 1;
                continue;
            }

            self.advance_chokes_held_by(id);
            if self.phase != Phase::InProgress {
                return;
            }

            if stunned {
                let name = self.unit(id).map(|u| u.name.clone()).unwrap_or_default();
                self.push_event(
                    EventKind::TurnSkipped { unit: id },
                    format!("{} is stunned and loses the turn", name),
                );
                self.turn_idx += 1;
                continue;
            }

            let name = self.unit(id).map(|u| u.name.clone()).unwrap_or_default();
            debug!(unit = %name, round = self.round, "turn begins");
            self.push_event(
                EventKind::TurnChanged { unit: id },
                format!("{}'s turn", name),
            );
            return;
        }
    }

    fn tick_unit_statuses(&mut self, id: UnitId) {
        let Ok(idx) = self.unit_idx(id) else { return };
        let tick = tick_statuses(&mut self.units[idx].statuses);
        if tick.damage > 0 {
            let lost = self.units[idx].apply_direct_damage(tick.damage);
            let name = self.units[idx].name.clone();
            self.push_event(
                EventKind::StatusDamage { unit: id, damage: lost },
                format!("{} takes {} from lingering wounds", name, lost),
            );
            if !self.units[idx].alive() {
                self.handle_death(id, None, 0);
            }
        }
    }

    /// Chokes held by this unit tighten at the start of its turn.
    fn advance_chokes_held_by(&mut self, id: UnitId) {
        let mut finished: Vec<UnitId> = Vec::new();
        let mut tightened: Vec<(UnitId, u32, u32)> = Vec::new();
        for grapple in self
            .grapples
            .iter_mut()
            .filter(|g| g.attacker == id && g.state == GrappleState::Submission)
        {
            if grapple.advance_submission() {
                finished.push(grapple.defender);
            } else if let Some(choke) = grapple.choke {
                tightened.push((
                    grapple.defender,
                    grapple.submission_progress,
                    choke.turns_to_finish(),
                ));
            }
        }
        for (victim, progress, needed) in tightened {
            let holder = self.unit(id).map(|u| u.name.clone()).unwrap_or_default();
            let held = self.unit(victim).map(|u| u.name.clone()).unwrap_or_default();
            self.push_event(
                EventKind::LogEntry { unit: id },
                format!("{} tightens the choke on {} ({}/{})", holder, held, progress, needed),
            );
        }
        for victim in finished {
            if let Ok(unit) = self.unit_mut(victim) {
                unit.unconscious = true;
                let name = unit.name.clone();
                self.push_event(
                    EventKind::UnitUnconscious { unit: victim },
                    format!("{} is choked unconscious", name),
                );
            }
            self.destroy_grapples_involving(victim);
            self.check_terminal();
        }
    }

    fn destroy_grapples_involving(&mut self, id: UnitId) {
        self.grapples.retain(|g| !g.involves(id));
    }

    fn grapple_involving(&self, id: UnitId) -> Option<&GrappleInteraction> {
        self.grapples.iter().find(|g| g.involves(id))
    }

    /// Submit the acting unit's next action. Validation happens before any
    /// mutation; an Err leaves the encounter untouched.
    pub fn submit_action(
        &mut self,
        actor: UnitId,
        action: Action,
        rolls: &mut dyn RollSource,
    ) -> Result<()> {
        if self.phase != Phase::InProgress {
            return Err(EngineError::IllegalAction("combat is not running".to_string()));
        }
        let current = self
            .current_unit()
            .map(|u| u.id)
            .ok_or_else(|| EngineError::IllegalAction("no active unit".to_string()))?;
        if current != actor {
            return Err(EngineError::IllegalAction(format!(
                "not {:?}'s turn",
                actor
            )));
        }

        match action {
            Action::Move { to } => self.do_move(actor, to),
            Action::Attack {
                target,
                situational_bias,
            } => {
                let weapon = self.unit(actor)?.weapon.clone();
                self.do_ranged(actor, target, &weapon, situational_bias, false, rolls)
            }
            Action::Throw {
                target,
                weapon,
                situational_bias,
            } => self.do_ranged(actor, target, &weapon, situational_bias, true, rolls),
            Action::Technique { target, technique } => {
                self.do_technique(actor, target, &technique, rolls)
            }
            Action::UseItem { item } => self.do_use_item(actor, &item),
            Action::Pass => {
                self.end_turn_for(actor);
                Ok(())
            }
        }
    }

    /// End the acting unit's turn and advance the scheduler.
    pub fn end_turn(&mut self, actor: UnitId) -> Result<()> {
        if self.phase != Phase::InProgress {
            return Err(EngineError::IllegalAction("combat is not running".to_string()));
        }
        let current = self
            .current_unit()
            .map(|u| u.id)
            .ok_or_else(|| EngineError::IllegalAction("no active unit".to_string()))?;
        if current != actor {
            return Err(EngineError::IllegalAction(format!("not {:?}'s turn", actor)));
        }
        self.end_turn_for(actor);
        Ok(())
    }

    fn end_turn_for(&mut self, actor: UnitId) {
        if let Ok(unit) = self.unit_mut(actor) {
            unit.ap = 0;
        }
        self.turn_idx += 1;
        self.begin_turn();
    }

    fn after_action(&mut self, actor: UnitId) {
        if self.phase != Phase::InProgress {
            return;
        }
        let spent = self.unit(actor).map(|u| u.ap <= 0).unwrap_or(true);
        if spent {
            self.turn_idx += 1;
            self.begin_turn();
        }
    }

    fn do_move(&mut self, actor: UnitId, to: GridPos) -> Result<()> {
        if self.grapple_involving(actor).is_some() {
            return Err(EngineError::IllegalAction(
                "cannot move while grappling".to_string(),
            ));
        }
        let idx = self.unit_idx(actor)?;
        let unit = &self.units[idx];
        let distance = unit.pos.distance(&to);
        if distance == 0 {
            return Err(EngineError::IllegalAction("already there".to_string()));
        }
        let penalty = unit.resolved_armor(&self.catalog).movement_penalty;
        let cost = distance + penalty;
        if !unit.can_afford(cost) {
            return Err(EngineError::IllegalAction(format!(
                "move costs {} AP, {} available",
                cost, unit.ap
            )));
        }

        let unit = &mut self.units[idx];
        unit.spend_ap(cost);
        unit.facing = Facing::toward(unit.pos, to);
        unit.pos = to;
        let name = self.units[idx].name.clone();
        self.push_event(
            EventKind::UnitMoved { unit: actor, to },
            format!("{} moves to ({}, {})", name, to.x, to.y),
        );
        self.after_action(actor);
        Ok(())
    }

    fn do_ranged(
        &mut self,
        actor: UnitId,
        target: UnitId,
        weapon_query: &str,
        situational_bias: i32,
        is_throw: bool,
        rolls: &mut dyn RollSource,
    ) -> Result<()> {
        if actor == target {
            return Err(EngineError::IllegalAction("cannot target self".to_string()));
        }
        let actor_idx = self.unit_idx(actor)?;
        let target_idx = self.unit_idx(target)?;
        if !self.units[target_idx].alive() {
            return Err(EngineError::IllegalAction("target is down".to_string()));
        }
        let weapon = self.catalog.weapon_or_default(weapon_query);
        if is_throw && weapon.category != WeaponCategory::Thrown {
            return Err(EngineError::IllegalAction(format!(
                "{} is not throwable",
                weapon.name
            )));
        }
        let distance = self.units[actor_idx]
            .pos
            .distance(&self.units[target_idx].pos);
        if distance > weapon.range {
            return Err(EngineError::IllegalAction(format!(
                "target at {} tiles, {} reaches {}",
                distance, weapon.name, weapon.range
            )));
        }
        let cost = weapon.ap_cost();
        if !self.units[actor_idx].can_afford(cost) {
            return Err(EngineError::IllegalAction(format!(
                "attack costs {} AP, {} available",
                cost, self.units[actor_idx].ap
            )));
        }

        // Validation done; from here the action is committed.
        self.units[actor_idx].spend_ap(cost);
        let target_pos = self.units[target_idx].pos;
        self.units[actor_idx].facing = Facing::toward(self.units[actor_idx].pos, target_pos);
        self.stats.record_shot(actor);

        let status_bias = accuracy_penalty(&self.units[actor_idx].statuses);
        let eff = effective_accuracy(weapon.accuracy_shift);
        let roll = biased_roll(rolls.d100(), eff, situational_bias + status_bias);
        let tier = HitTier::from_roll(roll);

        self.resolve_hit(actor, target, &weapon, tier, rolls);
        self.after_action(actor);
        Ok(())
    }

    /// Apply one classified impact from `weapon` to `target`.
    fn resolve_hit(
        &mut self,
        actor: UnitId,
        target: UnitId,
        weapon: &WeaponDef,
        tier: HitTier,
        rolls: &mut dyn RollSource,
    ) {
        let Ok(target_idx) = self.unit_idx(target) else { return };
        let stun_mode = self
            .unit(actor)
            .map(|u| u.damage_mode == DamageMode::Stun)
            .unwrap_or(false);
        let hp_before = self.units[target_idx].hp;
        let armor = self.units[target_idx].resolved_armor(&self.catalog);
        let mut impact = resolve_impact(
            weapon,
            tier,
            &armor,
            self.units[target_idx].shield,
            hp_before,
            self.units[target_idx].stats.strength,
        );
        // In stun mode a stun-capable weapon stops short of the killing
        // blow: the target goes down breathing instead
        let knocked_out =
            stun_mode && weapon.stun_capable && tier.connects() && impact.hp_damage >= hp_before;
        if knocked_out {
            impact.hp_damage = (hp_before - 1).max(0);
            impact.overkill = 0;
        }

        let attacker_name = self
            .unit(actor)
            .map(|u| u.name.clone())
            .unwrap_or_default();
        let target_name = self.units[target_idx].name.clone();
        let verb = attack_verb(weapon.family(), tier);

        if !tier.connects() {
            self.push_event(
                EventKind::AttackResolved {
                    attacker: actor,
                    target,
                    weapon: weapon.id.clone(),
                    tier,
                    damage: 0,
                    status_applied: Vec::new(),
                },
                format!(
                    "{} {} {} with {}",
                    attacker_name, verb, target_name, weapon.name
                ),
            );
            return;
        }
        if tier != HitTier::Graze {
            self.stats.record_hit(actor, tier == HitTier::Crit);
        }

        let lost = self.units[target_idx].apply_impact(impact.shield_absorbed, impact.hp_damage);

        // Status rolls happen against a target still up; the resolved
        // attack event carries whatever took
        let mut status_applied = Vec::new();
        if !knocked_out && self.units[target_idx].alive() {
            if let Some(status) = apply_weapon_status(
                weapon,
                tier,
                &mut self.units[target_idx].statuses,
                rolls,
            ) {
                status_applied.push(status);
            }
        }

        self.push_event(
            EventKind::AttackResolved {
                attacker: actor,
                target,
                weapon: weapon.id.clone(),
                tier,
                damage: impact.hp_damage,
                status_applied: status_applied.clone(),
            },
            format!(
                "{} {} {} with {} for {}",
                attacker_name, verb, target_name, weapon.name, impact.hp_damage
            ),
        );

        if impact.shield_absorbed > 0 || lost > 0 {
            self.stats.record_damage(actor, target, lost);
            self.push_event(
                EventKind::UnitDamaged {
                    unit: target,
                    shield_absorbed: impact.shield_absorbed,
                    hp_damage: lost,
                },
                format!("{} loses {} hp", target_name, lost),
            );
        }

        if impact.knockback_tiles > 0 && self.units[target_idx].alive() {
            self.push_event(
                EventKind::Knockback {
                    unit: target,
                    tiles: impact.knockback_tiles,
                },
                format!("{} is knocked back {} tiles", target_name, impact.knockback_tiles),
            );
        }

        for status in status_applied {
            self.push_event(
                EventKind::StatusApplied {
                    unit: target,
                    status,
                },
                format!("{} suffers {:?}", target_name, status),
            );
        }

        if knocked_out {
            self.units[target_idx].unconscious = true;
            self.push_event(
                EventKind::UnitUnconscious { unit: target },
                format!("{} is knocked out cold", target_name),
            );
            self.destroy_grapples_involving(target);
            self.check_terminal();
        } else if !self.units[target_idx].alive() {
            self.handle_death_by(actor, target, &weapon.id, impact.hp_damage, impact.overkill);
        }
    }

    fn do_technique(
        &mut self,
        actor: UnitId,
        target: UnitId,
        technique_id: &str,
        rolls: &mut dyn RollSource,
    ) -> Result<()> {
        if actor == target {
            return Err(EngineError::IllegalAction("cannot target self".to_string()));
        }
        let actor_idx = self.unit_idx(actor)?;
        let target_idx = self.unit_idx(target)?;
        if !self.units[target_idx].alive() {
            return Err(EngineError::IllegalAction("target is down".to_string()));
        }

        let technique = self
            .techniques
            .iter()
            .find(|t| t.id == technique_id)
            .cloned()
            .ok_or_else(|| {
                EngineError::CatalogLookupFailed(format!("technique '{}'", technique_id))
            })?;

        let (role, state, position) = match self.grapple_involving(actor) {
            Some(g) => {
                if !g.involves(target) {
                    return Err(EngineError::IllegalAction(
                        "must target your grapple partner".to_string(),
                    ));
                }
                let role = if g.attacker == actor {
                    GrappleRole::Attacker
                } else {
                    GrappleRole::Defender
                };
                (role, g.state, g.attacker_position)
            }
            None => {
                let distance = self.units[actor_idx]
                    .pos
                    .distance(&self.units[target_idx].pos);
                if distance > 1 {
                    return Err(EngineError::IllegalAction(
                        "technique targets must be adjacent".to_string(),
                    ));
                }
                (GrappleRole::Neutral, GrappleState::None, GrapplePosition::Side)
            }
        };

        let belt = self.units[actor_idx].belt_level;
        let legal = usable_techniques(&self.techniques, belt, role, state, position)
            .iter()
            .any(|t| t.id == technique.id);
        if !legal {
            return Err(EngineError::IllegalAction(format!(
                "{} is not usable here",
                technique.name
            )));
        }
        if !self.units[actor_idx].can_afford(technique.ap_cost) {
            return Err(EngineError::IllegalAction(format!(
                "{} costs {} AP, {} available",
                technique.name, technique.ap_cost, self.units[actor_idx].ap
            )));
        }

        // Committed.
        self.units[actor_idx].spend_ap(technique.ap_cost);

        if technique.kind == TechniqueKind::Escape {
            return self.do_escape(actor, target, &technique, rolls);
        }

        let mut dealt = 0;
        if technique.damage > 0 {
            let status_bias = accuracy_penalty(&self.units[actor_idx].statuses);
            let roll = biased_roll(rolls.d100(), effective_accuracy(0), status_bias);
            let tier = HitTier::from_roll(roll);
            let fist = WeaponDef {
                id: technique.id.clone(),
                name: technique.name.clone(),
                base_damage: technique.damage,
                subtype: DamageSubtype::Crush,
                ..WeaponDef::fists()
            };
            let armor = self.units[target_idx].resolved_armor(&self.catalog);
            let impact = resolve_impact(
                &fist,
                tier,
                &armor,
                self.units[target_idx].shield,
                self.units[target_idx].hp,
                self.units[target_idx].stats.strength,
            );
            dealt = self.units[target_idx].apply_impact(impact.shield_absorbed, impact.hp_damage);
            if tier.connects() && tier != HitTier::Graze {
                self.stats.record_hit(actor, tier == HitTier::Crit);
            }
            self.stats.record_damage(actor, target, dealt);
            if !self.units[target_idx].alive() {
                let overkill = impact.overkill;
                let id = technique.id.clone();
                let names = (
                    self.unit(actor).map(|u| u.name.clone()).unwrap_or_default(),
                    self.units[target_idx].name.clone(),
                );
                self.push_event(
                    EventKind::TechniqueResolved {
                        attacker: actor,
                        target,
                        technique: id.clone(),
                        damage: dealt,
                    },
                    format!("{} lands {} on {} for {}", names.0, technique.name, names.1, dealt),
                );
                self.handle_death_by(actor, target, &id, dealt, overkill);
                self.after_action(actor);
                return Ok(());
            }
        }

        let attacker_name = self.unit(actor).map(|u| u.name.clone()).unwrap_or_default();
        let target_name = self.units[target_idx].name.clone();
        self.push_event(
            EventKind::TechniqueResolved {
                attacker: actor,
                target,
                technique: technique.id.clone(),
                damage: dealt,
            },
            format!(
                "{} uses {} on {}",
                attacker_name, technique.name, target_name
            ),
        );

        if let Some(new_state) = technique.sets_state {
            self.apply_technique_state(actor, target, &technique, new_state);
        }

        self.after_action(actor);
        Ok(())
    }

    fn apply_technique_state(
        &mut self,
        actor: UnitId,
        target: UnitId,
        technique: &Technique,
        new_state: GrappleState,
    ) {
        let changed = match self.grapples.iter_mut().find(|g| g.involves(actor)) {
            Some(grapple) => {
                if grapple.transition(new_state).is_err() {
                    return;
                }
                grapple.last_technique = Some(technique.id.clone());
                if new_state == GrappleState::Submission {
                    // The hold starts locked in, so progress opens at one
                    grapple.choke = technique.choke;
                    grapple.submission_progress = 1;
                }
                // Driving the hold deeper puts the driver on top
                if grapple.attacker == actor && new_state.is_grounded() {
                    grapple.attacker_position = GrapplePosition::Top;
                }
                (grapple.attacker, grapple.defender, grapple.state)
            }
            None => {
                // Entries start from no contact; the transition table
                // vouches for the opening state
                let mut grapple = GrappleInteraction::new(actor, target);
                if new_state != GrappleState::Standing {
                    grapple.state = GrappleState::None;
                    if grapple.transition(new_state).is_err() {
                        return;
                    }
                    grapple.attacker_position = GrapplePosition::Top;
                }
                grapple.last_technique = Some(technique.id.clone());
                let key = (grapple.attacker, grapple.defender, grapple.state);
                self.grapples.push(grapple);
                key
            }
        };
        let (attacker, defender, state) = changed;
        if state == GrappleState::None {
            self.destroy_grapples_involving(actor);
        }
        self.emit_grapple_changed(attacker, defender, state);
    }

    fn emit_grapple_changed(&mut self, attacker: UnitId, defender: UnitId, state: GrappleState) {
        let a = self.unit(attacker).map(|u| u.name.clone()).unwrap_or_default();
        let d = self.unit(defender).map(|u| u.name.clone()).unwrap_or_default();
        self.push_event(
            EventKind::GrappleChanged {
                attacker,
                defender,
                state,
            },
            format!("{} and {} grapple: {:?}", a, d, state),
        );
    }

    fn do_escape(
        &mut self,
        actor: UnitId,
        _target: UnitId,
        technique: &Technique,
        rolls: &mut dyn RollSource,
    ) -> Result<()> {
        let (agility, strength) = {
            let unit = self.unit(actor)?;
            (unit.stats.agility, unit.stats.strength)
        };
        let Some(grapple) = self.grapples.iter_mut().find(|g| g.involves(actor)) else {
            return Err(EngineError::IllegalAction("not in a grapple".to_string()));
        };
        let attempt = attempt_escape(grapple, agility, strength, rolls);
        let (attacker, defender) = (grapple.attacker, grapple.defender);

        if attempt.escaped {
            // A partial escape climbs to the technique's state instead of
            // full release when the technique says so
            if let Some(to) = technique.sets_state {
                if to != GrappleState::None {
                    if let Some(g) = self.grapples.iter_mut().find(|g| g.involves(actor)) {
                        // attempt_escape released to None; rebuild the hold
                        // at the shallower depth
                        let _ = g.transition(to);
                        g.attacker_position = GrapplePosition::Side;
                    }
                }
            }
        }

        let escaped_to = self
            .grapple_involving(actor)
            .map(|g| g.state)
            .unwrap_or(GrappleState::None);
        let fully_released = attempt.escaped && escaped_to == GrappleState::None;

        let name = self.unit(actor).map(|u| u.name.clone()).unwrap_or_default();
        self.push_event(
            EventKind::EscapeAttempted {
                unit: actor,
                escaped: attempt.escaped,
            },
            if attempt.escaped {
                format!("{} fights free ({} vs {})", name, attempt.roll, attempt.chance)
            } else {
                format!("{} fails to escape ({} vs {})", name, attempt.roll, attempt.chance)
            },
        );
        if attempt.escaped {
            self.emit_grapple_changed(attacker, defender, escaped_to);
        }
        if fully_released {
            self.destroy_grapples_involving(actor);
        }
        self.after_action(actor);
        Ok(())
    }

    fn do_use_item(&mut self, actor: UnitId, item: &str) -> Result<()> {
        let idx = self.unit_idx(actor)?;
        if !matches!(item, "stimpack" | "adrenaline") {
            return Err(EngineError::CatalogLookupFailed(format!("item '{}'", item)));
        }
        if !self.units[idx].can_afford(1) {
            return Err(EngineError::IllegalAction(
                "using an item costs 1 AP".to_string(),
            ));
        }
        let Some(slot) = self.units[idx].items.iter().position(|i| i == item) else {
            return Err(EngineError::IllegalAction(format!(
                "no {} left to use",
                item
            )));
        };

        self.units[idx].items.remove(slot);
        self.units[idx].spend_ap(1);
        match item {
            "stimpack" => {
                let unit = &mut self.units[idx];
                unit.hp = (unit.hp + 15).min(unit.max_hp);
            }
            "adrenaline" => {
                self.units[idx].ap += 2;
            }
            _ => unreachable!(),
        }
        let name = self.units[idx].name.clone();
        self.push_event(
            EventKind::ItemUsed {
                unit: actor,
                item: item.to_string(),
            },
            format!("{} uses {}", name, item),
        );
        self.after_action(actor);
        Ok(())
    }

    fn handle_death_by(
        &mut self,
        killer: UnitId,
        victim: UnitId,
        weapon: &str,
        damage: i32,
        overkill: i32,
    ) {
        self.stats
            .record_kill(self.round, killer, victim, weapon, damage, overkill);
        self.handle_death(victim, Some(killer), overkill);
    }

    fn handle_death(&mut self, victim: UnitId, killer: Option<UnitId>, _overkill: i32) {
        let name = self.unit(victim).map(|u| u.name.clone()).unwrap_or_default();
        self.push_event(
            EventKind::UnitDied {
                unit: victim,
                killed_by: killer,
            },
            format!("{} dies", name),
        );
        self.destroy_grapples_involving(victim);
        self.check_terminal();
    }

    /// A team with nobody left standing loses. Stats finalize exactly once.
    fn check_terminal(&mut self) {
        if self.phase != Phase::InProgress {
            return;
        }
        let players = self
            .units
            .iter()
            .filter(|u| u.team == Team::Player && u.can_fight())
            .count();
        let enemies = self
            .units
            .iter()
            .filter(|u| u.team == Team::Enemy && u.can_fight())
            .count();
        if players > 0 && enemies > 0 {
            return;
        }

        self.phase = Phase::Complete;
        self.winner = match (players, enemies) {
            (0, 0) => None,
            (_, 0) => Some(Team::Player),
            (0, _) => Some(Team::Enemy),
            _ => unreachable!(),
        };
        let survivors: Vec<UnitId> = self
            .units
            .iter()
            .filter(|u| u.alive())
            .map(|u| u.id)
            .collect();
        let report = self.stats.finalize(self.round, self.winner, survivors);
        info!(winner = ?self.winner, rounds = self.round, "combat ended");
        self.report = Some(report.clone());
        self.push_event(
            EventKind::CombatEnded {
                winner: self.winner,
                report: Box::new(report),
            },
            match self.winner {
                Some(team) => format!("Combat ends: {:?} wins", team),
                None => "Combat ends: mutual destruction".to_string(),
            },
        );
    }
}
