//! Command/event bridge between a host (UI, script, netcode) and the engine
//!
//! The engine is headless: commands come in through `handle`, events
//! accumulate in an outbound queue the host drains when it likes. A unit
//! selection is the only pending state; it can be cancelled any time
//! before an action is submitted. Resolved actions are final.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Catalog;
use crate::core::{EngineError, Result, RollSource, UnitId};

use super::events::EngineEvent;
use super::scheduler::{Action, EncounterState, Phase};
use super::stats::CombatReport;
use super::unit::CombatUnit;

/// Inbound commands from the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Replace any current encounter with a fresh roster
    LoadEncounter { units: Vec<CombatUnit> },
    /// Stage a unit for the next action
    SelectUnit(UnitId),
    /// Drop the staged selection
    CancelAction,
    /// Resolve an action for the selected unit
    SubmitAction(Action),
    EndTurn,
}

/// Headless engine: one encounter at a time plus the outbound queue
pub struct Engine {
    catalog: Catalog,
    encounter: Option<EncounterState>,
    selected: Option<UnitId>,
}

impl Engine {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            encounter: None,
            selected: None,
        }
    }

    pub fn encounter(&self) -> Option<&EncounterState> {
        self.encounter.as_ref()
    }

    pub fn selected(&self) -> Option<UnitId> {
        self.selected
    }

    /// Final report of the current encounter, once it has ended
    pub fn report(&self) -> Option<&CombatReport> {
        self.encounter.as_ref().and_then(|e| e.report())
    }

    /// Pull everything that happened since the last drain.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.encounter
            .as_mut()
            .map(|e| e.drain_events())
            .unwrap_or_default()
    }

    fn running(&mut self) -> Result<&mut EncounterState> {
        self.encounter
            .as_mut()
            .ok_or_else(|| EngineError::IllegalAction("no encounter loaded".to_string()))
    }

    pub fn handle(&mut self, command: Command, rolls: &mut dyn RollSource) -> Result<()> {
        debug!(?command, "engine command");
        match command {
            Command::LoadEncounter { units } => {
                let mut encounter = EncounterState::new(self.catalog.clone());
                for unit in units {
                    encounter.add_unit(unit)?;
                }
                encounter.start()?;
                self.encounter = Some(encounter);
                self.selected = None;
                Ok(())
            }
            Command::SelectUnit(id) => {
                let encounter = self.running()?;
                encounter.unit(id)?;
                let current = encounter.current_unit().map(|u| u.id);
                if current != Some(id) {
                    return Err(EngineError::IllegalAction(format!(
                        "{:?} is not the active unit",
                        id
                    )));
                }
                self.selected = Some(id);
                Ok(())
            }
            Command::CancelAction => {
                if self.selected.take().is_none() {
                    return Err(EngineError::IllegalAction(
                        "nothing selected to cancel".to_string(),
                    ));
                }
                Ok(())
            }
            Command::SubmitAction(action) => {
                let actor = self.selected.ok_or_else(|| {
                    EngineError::IllegalAction("select a unit first".to_string())
                })?;
                let encounter = self.running()?;
                encounter.submit_action(actor, action, rolls)?;
                // Selection survives for follow-up actions unless the
                // turn moved on
                if encounter.current_unit().map(|u| u.id) != Some(actor) {
                    self.selected = None;
                }
                Ok(())
            }
            Command::EndTurn => {
                let actor = self.selected.ok_or_else(|| {
                    EngineError::IllegalAction("select a unit first".to_string())
                })?;
                let encounter = self.running()?;
                encounter.end_turn(actor)?;
                self.selected = None;
                Ok(())
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.encounter
            .as_ref()
            .map(|e| e.phase() == Phase::Complete)
            .unwrap_or(false)
    }
}
