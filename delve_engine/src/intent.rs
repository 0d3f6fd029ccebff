//! Intent parsing
//!
//! Deterministic keyword scoring over normalized player input. The parser never fails: input it
//! cannot classify comes back with no intent and zero confidence, and the caller decides how to
//! re-prompt.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::action::{ActionType, RestType};
use crate::content::ContentRepository;
use crate::encounter::EncounterState;
use crate::entity::Entity;
use crate::world::GlobalGameState;

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s]").expect("normalization pattern is valid"));

const INTENT_KEYWORDS: [(ActionType, &[&str]); 6] = [
    (
        ActionType::Move,
        &["move", "go", "walk", "run", "head", "travel", "enter", "leave"],
    ),
    (
        ActionType::Attack,
        &["attack", "hit", "strike", "slash", "stab", "smash", "shoot"],
    ),
    (ActionType::CastSpell, &["cast", "spell", "magic", "conjure", "incant"]),
    (ActionType::Rest, &["rest", "sleep", "camp", "recover"]),
    (
        ActionType::EndTurn,
        &["end turn", "end my turn", "finish", "done", "pass", "wait"],
    ),
    (
        ActionType::Explore,
        &["explore", "look", "inspect", "examine", "search", "observe"],
    ),
];

// short is checked first, so "short" wins over "long" when both appear
const REST_KEYWORDS: [(RestType, &[&str]); 2] = [
    (RestType::Short, &["short", "short rest"]),
    (RestType::Long, &["long", "long rest", "full rest"]),
];

const SELF_WORDS: [&str; 3] = ["self", "me", "myself"];

const SPELL_BONUS: u32 = 3;
const ATTACK_BONUS: u32 = 3;
const ROOM_BONUS: u32 = 2;
const END_TURN_BONUS: u32 = 3;
const AMBIGUOUS_CONFIDENCE: f32 = 0.6;

/// An id matched in the input, with the display name that matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameMatch {
    pub id: String,
    pub name: String,
}

/// Structured result of parsing one line of player input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedIntent {
    /// `None` when no keyword or name matched at all.
    pub intent: Option<ActionType>,
    pub confidence: f32,
    pub raw_text: String,
    pub target: Option<NameMatch>,
    pub spell: Option<NameMatch>,
    pub attack: Option<NameMatch>,
    pub room: Option<NameMatch>,
    pub rest_type: Option<RestType>,
    pub is_ambiguous: bool,
    /// Score per intent, for diagnostics.
    pub candidates: BTreeMap<ActionType, u32>,
}

impl ParsedIntent {
    pub fn is_unknown(&self) -> bool {
        self.intent.is_none()
    }

    /// Intent tag for logs: the action type, or `unknown`.
    pub fn label(&self) -> &'static str {
        self.intent.map_or("unknown", ActionType::as_str)
    }

    pub fn target_id(&self) -> Option<&str> {
        self.target.as_ref().map(|m| m.id.as_str())
    }

    pub fn spell_id(&self) -> Option<&str> {
        self.spell.as_ref().map(|m| m.id.as_str())
    }

    pub fn attack_id(&self) -> Option<&str> {
        self.attack.as_ref().map(|m| m.id.as_str())
    }

    pub fn room_id(&self) -> Option<&str> {
        self.room.as_ref().map(|m| m.id.as_str())
    }
}

/// Lowercase, turn every non-alphanumeric character into a space, and collapse whitespace.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let replaced = NON_ALPHANUMERIC.replace_all(&lowered, " ");
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Every keyword the parser recognizes, for input completion.
pub fn keywords() -> impl Iterator<Item = &'static str> {
    INTENT_KEYWORDS
        .iter()
        .flat_map(|(_, words)| words.iter().copied())
        .chain(REST_KEYWORDS.iter().flat_map(|(_, words)| words.iter().copied()))
}

/// Single words match whole words only; phrases match anywhere in the normalized text.
fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    let phrase = phrase.trim();
    if phrase.is_empty() {
        return false;
    }
    if phrase.contains(' ') {
        normalized.contains(phrase)
    } else {
        normalized.split(' ').any(|word| word == phrase)
    }
}

/// Find the longest candidate name contained in the input.
///
/// Candidates with normalized names of equal length keep their given order.
fn find_name_match<'a>(normalized: &str, candidates: impl IntoIterator<Item = (&'a str, &'a str)>) -> Option<NameMatch> {
    let mut named: Vec<(&str, &str, String)> = candidates
        .into_iter()
        .map(|(id, name)| (id, name, normalize(name)))
        .collect();
    named.sort_by(|a, b| b.2.len().cmp(&a.2.len()));
    named
        .into_iter()
        .find(|(_, _, norm)| !norm.is_empty() && normalized.contains(norm.as_str()))
        .map(|(id, name, _)| NameMatch {
            id: id.to_string(),
            name: name.to_string(),
        })
}

fn display_name<'a>(name: &'a str, id: &'a str) -> &'a str {
    if name.trim().is_empty() { id } else { name }
}

/// Rule-based intent parser.
#[derive(Clone, Copy, Default)]
pub struct IntentParser<'c> {
    content: Option<&'c dyn ContentRepository>,
}

impl<'c> IntentParser<'c> {
    pub fn new(content: &'c dyn ContentRepository) -> Self {
        Self { content: Some(content) }
    }

    /// Parse free text into an intent.
    ///
    /// Spell and attack names are scoped to what `actor` knows when an actor is given. Room names
    /// come from the current dungeon in `global`; target names from the participants of
    /// `encounter`, which needs `global` for its roster.
    pub fn parse(
        &self,
        text: &str,
        actor: Option<&Entity>,
        global: Option<&GlobalGameState>,
        encounter: Option<&EncounterState>,
    ) -> ParsedIntent {
        let normalized = normalize(text);

        let spell = self.find_spell(&normalized, actor);
        let attack = self.find_attack(&normalized, actor);
        let room = self.find_room(&normalized, global);
        let target = find_target(&normalized, actor, global, encounter);

        let candidates = score_intents(&normalized, spell.is_some(), attack.is_some(), room.is_some());
        let (intent, confidence, is_ambiguous) = pick_intent(&candidates);

        let mut rest_type = extract_rest_type(&normalized);
        if intent == Some(ActionType::Rest) && rest_type.is_none() {
            rest_type = Some(RestType::Short);
        }

        ParsedIntent {
            intent,
            confidence,
            raw_text: text.to_string(),
            target,
            spell,
            attack,
            room,
            rest_type,
            is_ambiguous,
            candidates,
        }
    }

    fn find_spell(&self, normalized: &str, actor: Option<&Entity>) -> Option<NameMatch> {
        let content = self.content?;
        match actor {
            Some(actor) => find_name_match(
                normalized,
                actor
                    .known_spells
                    .iter()
                    .filter_map(|id| content.spell(id))
                    .map(|s| (s.id.as_str(), display_name(&s.name, &s.id))),
            ),
            None => find_name_match(
                normalized,
                content.spells().map(|s| (s.id.as_str(), display_name(&s.name, &s.id))),
            ),
        }
    }

    fn find_attack(&self, normalized: &str, actor: Option<&Entity>) -> Option<NameMatch> {
        let content = self.content?;
        match actor {
            Some(actor) => find_name_match(
                normalized,
                actor
                    .known_attacks
                    .iter()
                    .filter_map(|id| content.attack(id))
                    .map(|a| (a.id.as_str(), display_name(&a.name, &a.id))),
            ),
            None => find_name_match(
                normalized,
                content.attacks().map(|a| (a.id.as_str(), display_name(&a.name, &a.id))),
            ),
        }
    }

    fn find_room(&self, normalized: &str, global: Option<&GlobalGameState>) -> Option<NameMatch> {
        let dungeon = self.content?.dungeon(&global?.current_dungeon_id)?;
        find_name_match(
            normalized,
            dungeon
                .rooms
                .iter()
                .map(|(id, room)| (id.as_str(), display_name(&room.name, id))),
        )
    }
}

fn find_target(
    normalized: &str,
    actor: Option<&Entity>,
    global: Option<&GlobalGameState>,
    encounter: Option<&EncounterState>,
) -> Option<NameMatch> {
    if let Some(actor) = actor
        && SELF_WORDS.iter().any(|word| contains_phrase(normalized, word))
    {
        return Some(NameMatch {
            id: actor.entity_id.clone(),
            name: actor.name.clone(),
        });
    }
    let (global, encounter) = (global?, encounter?);
    find_name_match(
        normalized,
        encounter
            .entities(&global.roster)
            .into_iter()
            .map(|e| (e.entity_id.as_str(), e.name.as_str())),
    )
}

fn score_intents(normalized: &str, spell: bool, attack: bool, room: bool) -> BTreeMap<ActionType, u32> {
    let mut scores: BTreeMap<ActionType, u32> = INTENT_KEYWORDS
        .iter()
        .map(|(intent, keywords)| {
            let hits = keywords.iter().filter(|kw| contains_phrase(normalized, kw)).count();
            (*intent, u32::try_from(hits).unwrap_or(u32::MAX))
        })
        .collect();

    let mut bump = |intent: ActionType, bonus: u32| {
        if let Some(score) = scores.get_mut(&intent) {
            *score += bonus;
        }
    };
    if spell {
        bump(ActionType::CastSpell, SPELL_BONUS);
    }
    if attack {
        bump(ActionType::Attack, ATTACK_BONUS);
    }
    if room {
        bump(ActionType::Move, ROOM_BONUS);
    }
    if normalized.contains("end turn") || normalized.contains("end my turn") {
        bump(ActionType::EndTurn, END_TURN_BONUS);
    }
    scores
}

/// Highest score wins; ties go to the earliest intent in declaration order.
#[allow(clippy::cast_precision_loss)]
fn pick_intent(scores: &BTreeMap<ActionType, u32>) -> (Option<ActionType>, f32, bool) {
    let mut top: Option<(ActionType, u32)> = None;
    for (&intent, &score) in scores {
        if top.is_none_or(|(_, best)| score > best) {
            top = Some((intent, score));
        }
    }
    let Some((intent, top_score)) = top.filter(|(_, score)| *score > 0) else {
        return (None, 0.0, false);
    };
    let tied = scores.values().filter(|&&score| score == top_score).count();
    if tied > 1 {
        (Some(intent), AMBIGUOUS_CONFIDENCE, true)
    } else {
        (Some(intent), (0.5 + top_score as f32 / 6.0).min(1.0), false)
    }
}

fn extract_rest_type(normalized: &str) -> Option<RestType> {
    REST_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| contains_phrase(normalized, kw)))
        .map(|(rest_type, _)| *rest_type)
}
