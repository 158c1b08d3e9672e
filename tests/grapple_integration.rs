//! Grapple integration tests
//!
//! Run full grapple chains through the scheduler: entries, deepening
//! holds, chokes to unconsciousness, and escapes from underneath.

use vanguard_tactics::catalog::Catalog;
use vanguard_tactics::core::{EngineError, GridPos, ScriptedRolls, Team};
use vanguard_tactics::encounter::{Action, CombatUnit, EncounterState, EventKind};
use vanguard_tactics::grapple::{GrapplePosition, GrappleState};

fn grappler_pair(belt: u8) -> (EncounterState, vanguard_tactics::core::UnitId, vanguard_tactics::core::UnitId) {
    let mut grappler = CombatUnit::new("Grappler", Team::Player, GridPos::new(0, 0)).with_belt(belt);
    grappler.stats.agility = 9;
    let grappler_id = grappler.id;
    let mut raider = CombatUnit::new("Raider", Team::Enemy, GridPos::new(1, 0));
    raider.stats.agility = 1;
    let raider_id = raider.id;

    let mut enc = EncounterState::new(Catalog::builtin());
    enc.add_unit(grappler).unwrap();
    enc.add_unit(raider).unwrap();
    enc.start().unwrap();
    (enc, grappler_id, raider_id)
}

fn technique(target: vanguard_tactics::core::UnitId, id: &str) -> Action {
    Action::Technique {
        target,
        technique: id.to_string(),
    }
}

/// Clinch, takedown, side control, rear naked choke: two more turns of
/// pressure and the defender is out cold, combat ends without a single
/// kill on the log.
#[test]
fn test_choke_chain_ends_combat_without_a_kill() {
    let (mut enc, grappler, raider) = grappler_pair(3);
    // Only the double leg rolls damage; 10 is a clean miss, the takedown
    // itself still lands
    let mut rolls = ScriptedRolls::new(&[10]);

    // Round 1: clinch (1 AP), double leg (2 AP)
    enc.submit_action(grappler, technique(raider, "clinch_entry"), &mut rolls)
        .unwrap();
    assert_eq!(enc.grapples()[0].state, GrappleState::Standing);
    enc.submit_action(grappler, technique(raider, "double_leg"), &mut rolls)
        .unwrap();
    assert_eq!(enc.grapples()[0].state, GrappleState::Ground);
    assert_eq!(enc.grapples()[0].attacker_position, GrapplePosition::Top);
    enc.end_turn(grappler).unwrap();
    enc.end_turn(raider).unwrap();

    // Round 2: side control, then the choke; 4 AP spent, turn auto-advances
    enc.submit_action(grappler, technique(raider, "side_control"), &mut rolls)
        .unwrap();
    assert_eq!(enc.grapples()[0].state, GrappleState::Pinned);
    enc.submit_action(grappler, technique(raider, "rear_naked_choke"), &mut rolls)
        .unwrap();
    assert_eq!(enc.grapples()[0].state, GrappleState::Submission);
    // The hold locks in at progress 1
    assert_eq!(enc.grapples()[0].submission_progress, 1);
    assert_eq!(enc.current_unit().map(|u| u.id), Some(raider));
    enc.end_turn(raider).unwrap();

    // Round 3: the blood choke tightens at the grappler's turn start
    assert_eq!(enc.grapples()[0].submission_progress, 2);
    enc.end_turn(grappler).unwrap();
    assert!(!enc.is_complete());
    // Round 4's tick reaches the threshold of 3 and finishes it
    enc.end_turn(raider).unwrap();

    assert!(enc.is_complete());
    assert_eq!(enc.winner(), Some(Team::Player));
    let raider_state = enc.unit(raider).unwrap();
    assert!(raider_state.alive());
    assert!(raider_state.unconscious);
    assert!(enc.grapples().is_empty());

    let report = enc.report().unwrap();
    assert!(report.kill_log.is_empty());
    assert_eq!(report.rounds, 4);
    // Knocked out is still breathing: both names stay on the survivor list
    assert!(report.survivors.contains(&grappler));
    assert!(report.survivors.contains(&raider));

    let events = enc.drain_events();
    // Intermediate choke ticks are narrated before the finish
    assert!(events
        .iter()
        .any(|e| matches!(e.kind, EventKind::LogEntry { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e.kind, EventKind::UnitUnconscious { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e.kind, EventKind::CombatEnded { .. })));
}

/// The defender under top control breaks the grip and can move again.
#[test]
fn test_break_grip_releases_the_hold() {
    let (mut enc, grappler, raider) = grappler_pair(1);
    // Double leg damage roll, then the escape roll: 10 beats the 25%
    // chance of escaping Ground from under Top
    let mut rolls = ScriptedRolls::new(&[10, 10]);

    enc.submit_action(grappler, technique(raider, "clinch_entry"), &mut rolls)
        .unwrap();
    enc.submit_action(grappler, technique(raider, "double_leg"), &mut rolls)
        .unwrap();
    enc.end_turn(grappler).unwrap();

    // Pinned down, the raider cannot walk away
    let blocked = enc.submit_action(
        raider,
        Action::Move {
            to: GridPos::new(3, 0),
        },
        &mut rolls,
    );
    assert!(blocked.is_err());

    enc.submit_action(raider, technique(grappler, "break_grip"), &mut rolls)
        .unwrap();
    assert!(enc.grapples().is_empty());
    let events = enc.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e.kind, EventKind::EscapeAttempted { escaped: true, .. })));

    // Free again: movement works
    enc.submit_action(
        raider,
        Action::Move {
            to: GridPos::new(3, 0),
        },
        &mut rolls,
    )
    .unwrap();
    assert_eq!(enc.unit(raider).unwrap().pos, GridPos::new(3, 0));
}

/// A failed escape costs the AP and leaves the hold exactly as it was.
#[test]
fn test_failed_escape_keeps_the_hold() {
    let (mut enc, grappler, raider) = grappler_pair(1);
    let mut rolls = ScriptedRolls::new(&[10, 90]);

    enc.submit_action(grappler, technique(raider, "clinch_entry"), &mut rolls)
        .unwrap();
    enc.submit_action(grappler, technique(raider, "double_leg"), &mut rolls)
        .unwrap();
    enc.end_turn(grappler).unwrap();

    enc.submit_action(raider, technique(grappler, "break_grip"), &mut rolls)
        .unwrap();
    assert_eq!(enc.grapples()[0].state, GrappleState::Ground);
    assert_eq!(enc.unit(raider).unwrap().ap, 3);
    let events = enc.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e.kind, EventKind::EscapeAttempted { escaped: false, .. })));
}

/// A technical standup is a partial escape: the hold survives but climbs
/// back to standing with the positional advantage gone.
#[test]
fn test_technical_standup_escapes_to_standing() {
    let (mut enc, grappler, raider) = grappler_pair(1);
    let mut rolls = ScriptedRolls::new(&[10, 10]);

    enc.submit_action(grappler, technique(raider, "clinch_entry"), &mut rolls)
        .unwrap();
    enc.submit_action(grappler, technique(raider, "double_leg"), &mut rolls)
        .unwrap();
    enc.end_turn(grappler).unwrap();

    enc.submit_action(raider, technique(grappler, "technical_standup"), &mut rolls)
        .unwrap();
    let grapple = &enc.grapples()[0];
    assert_eq!(grapple.state, GrappleState::Standing);
    assert_eq!(grapple.attacker_position, GrapplePosition::Side);
}

/// Techniques the state machine forbids are rejected without side effects.
#[test]
fn test_illegal_technique_rejected_without_mutation() {
    let (mut enc, grappler, raider) = grappler_pair(3);
    let mut rolls = ScriptedRolls::default();

    enc.submit_action(grappler, technique(raider, "clinch_entry"), &mut rolls)
        .unwrap();
    assert_eq!(enc.unit(grappler).unwrap().ap, 3);

    // No choke from a standing clinch
    let err = enc.submit_action(grappler, technique(raider, "rear_naked_choke"), &mut rolls);
    assert!(matches!(err, Err(EngineError::IllegalAction(_))));
    assert_eq!(enc.unit(grappler).unwrap().ap, 3);
    assert_eq!(enc.grapples()[0].state, GrappleState::Standing);
}

/// Belt level gates advanced holds.
#[test]
fn test_belt_gate_blocks_advanced_holds() {
    let (mut enc, grappler, raider) = grappler_pair(1);
    let mut rolls = ScriptedRolls::new(&[10]);

    enc.submit_action(grappler, technique(raider, "clinch_entry"), &mut rolls)
        .unwrap();
    enc.submit_action(grappler, technique(raider, "double_leg"), &mut rolls)
        .unwrap();

    // Side control needs belt 2
    let err = enc.submit_action(grappler, technique(raider, "side_control"), &mut rolls);
    assert!(matches!(err, Err(EngineError::IllegalAction(_))));
    assert_eq!(enc.grapples()[0].state, GrappleState::Ground);
}

/// Grapple techniques need an adjacent target when no hold exists yet.
#[test]
fn test_entry_requires_adjacency() {
    let mut grappler = CombatUnit::new("Grappler", Team::Player, GridPos::new(0, 0));
    grappler.stats.agility = 9;
    let grappler_id = grappler.id;
    let raider = CombatUnit::new("Raider", Team::Enemy, GridPos::new(5, 0));
    let raider_id = raider.id;

    let mut enc = EncounterState::new(Catalog::builtin());
    enc.add_unit(grappler).unwrap();
    enc.add_unit(raider).unwrap();
    enc.start().unwrap();

    let mut rolls = ScriptedRolls::default();
    let err = enc.submit_action(grappler_id, technique(raider_id, "clinch_entry"), &mut rolls);
    assert!(matches!(err, Err(EngineError::IllegalAction(_))));
    assert!(enc.grapples().is_empty());
}
