//! Resolution Module
//!
//! Applies an already validated [`Action`] to the game state. Lookups that validation guarantees
//! are still re-checked, and a miss is reported as an unsuccessful [`ResolutionResult`] rather
//! than a panic, since it means the content and the state have drifted apart.

use delve_data::{DiceExpr, SpellCategory, SpellDef, StatusKind, TargetRule};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionKind, RestType};
use crate::content::ContentRepository;
use crate::dice::{self, DieSource, RollResult};
use crate::encounter::EncounterState;
use crate::entity::{Entity, EntityId, EntityKind};
use crate::events::{EventSink, GameEvent};
use crate::status::{StatusEffect, StatusTick};
use crate::world::{GameMode, GlobalGameState};

/// Outcome of an attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackDetails {
    pub attack_id: String,
    pub target_id: EntityId,
    pub roll: u32,
    pub to_hit_modifier: i32,
    pub total_to_hit: i32,
    pub target_ac: i32,
    pub hit: bool,
    pub damage_roll: Option<RollResult>,
    pub damage_applied: u32,
    pub target_hp: u32,
}

/// What a spell did to one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpellEffect {
    Damage { amount: u32, hp_after: u32 },
    Heal { amount: u32, hp_after: u32 },
    Status { effect_type: StatusKind, duration: i32, magnitude: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellTargetDetail {
    pub target_id: EntityId,
    #[serde(flatten)]
    pub effect: SpellEffect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellDetails {
    pub spell_id: String,
    pub roll: Option<RollResult>,
    pub targets: Vec<SpellTargetDetail>,
}

/// Hit points and spell slots of one player before and after a rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestSnapshot {
    pub entity_id: EntityId,
    pub hp_before: u32,
    pub hp_after: u32,
    pub spell_slots_before: u32,
    pub spell_slots_after: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestDetails {
    pub rest_type: RestType,
    pub players: Vec<RestSnapshot>,
}

/// Structured outcome data, by action kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionDetails {
    Attack(AttackDetails),
    Spell(SpellDetails),
    Rest(RestDetails),
    TurnEnded { round: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub success: bool,
    pub narration: String,
    pub details: Option<ResolutionDetails>,
}

impl ResolutionResult {
    pub fn success(narration: impl Into<String>, details: ResolutionDetails) -> Self {
        Self {
            success: true,
            narration: narration.into(),
            details: Some(details),
        }
    }

    pub fn failure(narration: impl Into<String>) -> Self {
        Self {
            success: false,
            narration: narration.into(),
            details: None,
        }
    }
}

fn emit(events: &mut Option<&mut dyn EventSink>, event: GameEvent) {
    if let Some(sink) = events.as_deref_mut() {
        sink.record(event);
    }
}

fn emit_death(events: &mut Option<&mut dyn EventSink>, entity: &Entity, killed_by: Option<&str>) {
    info!("{} has been defeated", entity.name);
    emit(
        events,
        GameEvent::EntityDied {
            entity_id: entity.entity_id.clone(),
            name: entity.name.clone(),
            final_hp: entity.hp,
            killed_by: killed_by.map(ToString::to_string),
        },
    );
}

fn emit_status_applied(events: &mut Option<&mut dyn EventSink>, entity_id: &str, effect: &StatusEffect) {
    emit(
        events,
        GameEvent::StatusEffectApplied {
            entity_id: entity_id.to_string(),
            effect_type: effect.kind.clone(),
            duration: effect.duration,
            magnitude: effect.magnitude,
            source_id: effect.source_id.clone(),
        },
    );
}

/// Hit points a short rest restores: a quarter of the maximum, at least one.
pub fn short_rest_heal(max_hp: u32) -> u32 {
    (max_hp / 4).max(1)
}

/// The state-mutating stage.
pub struct ResolutionEngine<'a> {
    content: &'a dyn ContentRepository,
    dice: &'a mut dyn DieSource,
}

impl<'a> ResolutionEngine<'a> {
    pub fn new(content: &'a dyn ContentRepository, dice: &'a mut dyn DieSource) -> Self {
        Self { content, dice }
    }

    /// Apply `action` to the state.
    pub fn resolve(
        &mut self,
        action: &Action,
        global: &mut GlobalGameState,
        encounter: Option<&mut EncounterState>,
        mut events: Option<&mut dyn EventSink>,
    ) -> ResolutionResult {
        match global.game_mode {
            GameMode::Exploration => match action.kind() {
                ActionKind::Rest { rest_type } => Self::resolve_rest(*rest_type, global, &mut events),
                _ => ResolutionResult::failure(format!(
                    "Action '{}' is handled by the exploration driver, not the rules core.",
                    action.action_type()
                )),
            },
            GameMode::Encounter => {
                let Some(encounter) = encounter else {
                    return ResolutionResult::failure("Encounter state is required to resolve combat actions.");
                };
                match action.kind() {
                    ActionKind::Attack { target_id, attack_id } => {
                        self.resolve_attack(action.actor_id(), target_id, attack_id, global, encounter, &mut events)
                    },
                    ActionKind::CastSpell { spell_id, target_id } => self.resolve_spell(
                        action.actor_id(),
                        spell_id,
                        target_id.as_deref(),
                        global,
                        encounter,
                        &mut events,
                    ),
                    ActionKind::EndTurn => {
                        encounter.advance_turn();
                        ResolutionResult::success(
                            "Turn ended.",
                            ResolutionDetails::TurnEnded { round: encounter.round },
                        )
                    },
                    _ => ResolutionResult::failure(format!(
                        "Action '{}' cannot be resolved during an encounter.",
                        action.action_type()
                    )),
                }
            },
            GameMode::GameOver => ResolutionResult::failure("The game is over."),
        }
    }

    /// Run the start-of-turn tick for `entity`, reporting each damage-over-time trigger and a death
    /// if the tick was fatal.
    pub fn resolve_start_of_turn(entity: &mut Entity, mut events: Option<&mut dyn EventSink>) -> StatusTick {
        let was_alive = entity.is_alive();
        let tick = entity.tick_start_of_turn();
        for fx in &tick.triggered {
            emit(
                &mut events,
                GameEvent::StatusEffectTriggered {
                    entity_id: entity.entity_id.clone(),
                    effect_type: fx.effect_type.clone(),
                    damage_applied: fx.damage_applied,
                    duration_remaining: fx.duration_remaining,
                },
            );
        }
        if was_alive && !entity.is_alive() {
            emit_death(&mut events, entity, None);
        }
        tick
    }

    fn resolve_rest(
        rest_type: RestType,
        global: &mut GlobalGameState,
        events: &mut Option<&mut dyn EventSink>,
    ) -> ResolutionResult {
        let mut snapshots = Vec::new();
        for player in global.roster.players_mut().filter(|p| p.is_alive()) {
            let hp_before = player.hp;
            let spell_slots_before = player.spell_slots.current;
            match rest_type {
                RestType::Short => {
                    player.heal(short_rest_heal(player.max_hp));
                    if player.spell_slots.max > 0 {
                        player.spell_slots.restore(1);
                    }
                },
                RestType::Long => {
                    player.restore_full_health();
                    player.spell_slots.restore_all();
                },
            }
            snapshots.push(RestSnapshot {
                entity_id: player.entity_id.clone(),
                hp_before,
                hp_after: player.hp,
                spell_slots_before,
                spell_slots_after: player.spell_slots.current,
            });
        }

        let room_id = global.current_room_id.clone();
        global.dungeon_state.mark_rested(&room_id);
        info!("party takes a {rest_type} rest in '{room_id}'");
        emit(
            events,
            GameEvent::RestCompleted {
                rest_type,
                room_id,
                player_states_after: snapshots.clone(),
            },
        );

        ResolutionResult::success(
            format!("The party takes a {rest_type} rest."),
            ResolutionDetails::Rest(RestDetails {
                rest_type,
                players: snapshots,
            }),
        )
    }

    fn resolve_attack(
        &mut self,
        actor_id: &str,
        target_id: &str,
        attack_id: &str,
        global: &mut GlobalGameState,
        encounter: &EncounterState,
        events: &mut Option<&mut dyn EventSink>,
    ) -> ResolutionResult {
        let (Some(actor), Some(target)) = (
            encounter.entity(&global.roster, actor_id),
            encounter.entity(&global.roster, target_id),
        ) else {
            return ResolutionResult::failure("Attack failed: invalid actor or target.");
        };
        let content = self.content;
        let Some(attack) = content.attack(attack_id) else {
            return ResolutionResult::failure("Attack failed: attack data not found.");
        };
        let damage_expr = match DiceExpr::parse(attack.damage.as_str()) {
            Ok(expr) => expr,
            Err(err) => {
                warn!("attack '{attack_id}' has bad damage dice: {err}");
                return ResolutionResult::failure(format!("Attack failed: invalid damage dice ({err})."));
            },
        };

        let actor_name = actor.name.clone();
        let target_name = target.name.clone();
        let to_hit_modifier = actor.effective_attack_modifier() + attack.to_hit_modifier;
        let target_ac = target.effective_ac();

        let roll = dice::roll_d20(self.dice);
        let total_to_hit = i32::try_from(roll).unwrap_or(i32::MAX).saturating_add(to_hit_modifier);
        let hit = total_to_hit >= target_ac;

        let Some(target) = global.roster.get_mut(target_id) else {
            return ResolutionResult::failure("Attack failed: invalid actor or target.");
        };
        if !hit {
            info!("{actor_name} misses {target_name} ({total_to_hit} vs AC {target_ac})");
            return ResolutionResult::success(
                format!("{actor_name} misses {target_name} with {}.", attack.name),
                ResolutionDetails::Attack(AttackDetails {
                    attack_id: attack_id.to_string(),
                    target_id: target_id.to_string(),
                    roll,
                    to_hit_modifier,
                    total_to_hit,
                    target_ac,
                    hit,
                    damage_roll: None,
                    damage_applied: 0,
                    target_hp: target.hp,
                }),
            );
        }

        let damage_roll = dice::roll(self.dice, damage_expr);
        let damage_applied = target.take_damage(damage_roll.amount());
        info!("{actor_name} hits {target_name} with {} for {damage_applied}", attack.name);

        if let Some(def) = &attack.status_effect {
            let effect = StatusEffect::from_def(def, Some(actor_id));
            emit_status_applied(events, target_id, &effect);
            target.apply_status_effect(effect);
        }
        if damage_applied > 0 && !target.is_alive() {
            emit_death(events, target, Some(actor_id));
        }

        ResolutionResult::success(
            format!(
                "{actor_name} hits {target_name} with {} for {damage_applied} damage.",
                attack.name
            ),
            ResolutionDetails::Attack(AttackDetails {
                attack_id: attack_id.to_string(),
                target_id: target_id.to_string(),
                roll,
                to_hit_modifier,
                total_to_hit,
                target_ac,
                hit,
                damage_roll: Some(damage_roll),
                damage_applied,
                target_hp: target.hp,
            }),
        )
    }

    fn resolve_spell(
        &mut self,
        actor_id: &str,
        spell_id: &str,
        target_id: Option<&str>,
        global: &mut GlobalGameState,
        encounter: &EncounterState,
        events: &mut Option<&mut dyn EventSink>,
    ) -> ResolutionResult {
        let content = self.content;
        let Some(actor) = encounter.entity(&global.roster, actor_id) else {
            return ResolutionResult::failure("Spell failed: invalid actor.");
        };
        let actor_name = actor.name.clone();
        let actor_kind = actor.kind;
        let Some(spell) = content.spell(spell_id) else {
            return ResolutionResult::failure("Spell failed: spell data not found.");
        };

        let spent = global
            .roster
            .get_mut(actor_id)
            .is_some_and(|actor| actor.spell_slots.use_slot());
        if !spent {
            return ResolutionResult::failure("Spell failed: no spell slots available.");
        }

        let targets = spell_targets(spell, actor_id, actor_kind, target_id, global, encounter);
        if targets.is_empty() {
            return ResolutionResult::failure("Spell failed: no valid targets.");
        }

        let (roll, effects) = match spell.category {
            SpellCategory::Damage | SpellCategory::Heal => {
                let notation = if spell.category == SpellCategory::Damage {
                    spell.damage.as_ref()
                } else {
                    spell.heal.as_ref()
                };
                let Some(notation) = notation else {
                    return ResolutionResult::failure("Spell failed: missing dice.");
                };
                let roll = match dice::roll_notation(self.dice, notation.as_str()) {
                    Ok(roll) => roll,
                    Err(err) => {
                        warn!("spell '{spell_id}' has bad dice: {err}");
                        return ResolutionResult::failure(format!("Spell failed: invalid dice ({err})."));
                    },
                };
                let effects = apply_rolled(spell.category, roll.amount(), actor_id, &targets, global, events);
                (Some(roll), effects)
            },
            SpellCategory::Status => {
                let Some(def) = &spell.status_effect else {
                    return ResolutionResult::failure("Spell failed: missing status effect.");
                };
                let mut effects = Vec::with_capacity(targets.len());
                for id in &targets {
                    if let Some(target) = global.roster.get_mut(id) {
                        let effect = StatusEffect::from_def(def, Some(actor_id));
                        emit_status_applied(events, id, &effect);
                        effects.push(SpellTargetDetail {
                            target_id: id.clone(),
                            effect: SpellEffect::Status {
                                effect_type: effect.kind.clone(),
                                duration: effect.duration,
                                magnitude: effect.magnitude,
                            },
                        });
                        target.apply_status_effect(effect);
                    }
                }
                (None, effects)
            },
            SpellCategory::Unknown => return ResolutionResult::failure("Spell failed: unknown category."),
        };

        let names: Vec<&str> = targets
            .iter()
            .filter_map(|id| global.roster.get(id))
            .map(|e| e.name.as_str())
            .collect();
        info!("{actor_name} casts {} on {}", spell.name, names.join(", "));
        ResolutionResult::success(
            format!("{actor_name} casts {} on {}.", spell.name, names.join(", ")),
            ResolutionDetails::Spell(SpellDetails {
                spell_id: spell_id.to_string(),
                roll,
                targets: effects,
            }),
        )
    }
}

/// Apply one rolled amount of damage or healing to every target.
fn apply_rolled(
    category: SpellCategory,
    amount: u32,
    actor_id: &str,
    targets: &[EntityId],
    global: &mut GlobalGameState,
    events: &mut Option<&mut dyn EventSink>,
) -> Vec<SpellTargetDetail> {
    let mut effects = Vec::with_capacity(targets.len());
    for id in targets {
        let Some(target) = global.roster.get_mut(id) else {
            continue;
        };
        let effect = if category == SpellCategory::Damage {
            let applied = target.take_damage(amount);
            if applied > 0 && !target.is_alive() {
                emit_death(events, target, Some(actor_id));
            }
            SpellEffect::Damage {
                amount: applied,
                hp_after: target.hp,
            }
        } else {
            SpellEffect::Heal {
                amount: target.heal(amount),
                hp_after: target.hp,
            }
        };
        effects.push(SpellTargetDetail {
            target_id: id.clone(),
            effect,
        });
    }
    effects
}

/// Resolve a spell's target rule into entity ids. Area rules are relative to the caster's side.
fn spell_targets(
    spell: &SpellDef,
    actor_id: &str,
    actor_kind: EntityKind,
    target_id: Option<&str>,
    global: &GlobalGameState,
    encounter: &EncounterState,
) -> Vec<EntityId> {
    let opposing = match actor_kind {
        EntityKind::Player => EntityKind::Enemy,
        EntityKind::Enemy => EntityKind::Player,
    };
    let side = |kind: EntityKind| -> Vec<EntityId> {
        encounter
            .living_of_kind(&global.roster, kind)
            .into_iter()
            .map(|e| e.entity_id.clone())
            .collect()
    };
    match spell.target {
        TargetRule::Caster => vec![actor_id.to_string()],
        TargetRule::Enemy | TargetRule::Ally => target_id
            .and_then(|id| encounter.entity(&global.roster, id))
            .map(|e| vec![e.entity_id.clone()])
            .unwrap_or_default(),
        TargetRule::Enemies => side(opposing),
        TargetRule::Allies => side(actor_kind),
    }
}
