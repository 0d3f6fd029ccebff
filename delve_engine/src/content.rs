//! Read-only content lookups used by the rules core.

use std::collections::HashMap;

use delve_data::{AttackDef, ClassDef, ContentDef, DungeonDef, EncounterDef, EnemyDef, RaceDef, RoomDef, SpellDef};

/// Lookup contract the parser, mapper, validator and resolver depend on.
pub trait ContentRepository {
    fn dungeon(&self, id: &str) -> Option<&DungeonDef>;
    fn encounter(&self, id: &str) -> Option<&EncounterDef>;
    fn spell(&self, id: &str) -> Option<&SpellDef>;
    fn attack(&self, id: &str) -> Option<&AttackDef>;
    fn enemy(&self, id: &str) -> Option<&EnemyDef>;
    fn class(&self, id: &str) -> Option<&ClassDef>;
    fn race(&self, id: &str) -> Option<&RaceDef>;
    /// Every spell, in authored order.
    fn spells(&self) -> Box<dyn Iterator<Item = &SpellDef> + '_>;
    /// Every attack, in authored order.
    fn attacks(&self) -> Box<dyn Iterator<Item = &AttackDef> + '_>;

    fn room(&self, dungeon_id: &str, room_id: &str) -> Option<&RoomDef> {
        self.dungeon(dungeon_id).and_then(|d| d.room(room_id))
    }
}

/// In-memory content, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct Content {
    def: ContentDef,
    dungeons: HashMap<String, usize>,
    encounters: HashMap<String, usize>,
    spells: HashMap<String, usize>,
    attacks: HashMap<String, usize>,
    enemies: HashMap<String, usize>,
    classes: HashMap<String, usize>,
    races: HashMap<String, usize>,
}

fn index<T>(items: &[T], id: impl Fn(&T) -> &str) -> HashMap<String, usize> {
    items.iter().enumerate().map(|(i, item)| (id(item).to_string(), i)).collect()
}

impl Content {
    pub fn new(def: ContentDef) -> Self {
        Self {
            dungeons: index(&def.dungeons, |d| d.id.as_str()),
            encounters: index(&def.encounters, |e| e.id.as_str()),
            spells: index(&def.spells, |s| s.id.as_str()),
            attacks: index(&def.attacks, |a| a.id.as_str()),
            enemies: index(&def.enemies, |e| e.id.as_str()),
            classes: index(&def.classes, |c| c.id.as_str()),
            races: index(&def.races, |r| r.id.as_str()),
            def,
        }
    }

    pub fn def(&self) -> &ContentDef {
        &self.def
    }
}

impl From<ContentDef> for Content {
    fn from(def: ContentDef) -> Self {
        Content::new(def)
    }
}

impl ContentRepository for Content {
    fn dungeon(&self, id: &str) -> Option<&DungeonDef> {
        self.dungeons.get(id).map(|&i| &self.def.dungeons[i])
    }

    fn encounter(&self, id: &str) -> Option<&EncounterDef> {
        self.encounters.get(id).map(|&i| &self.def.encounters[i])
    }

    fn spell(&self, id: &str) -> Option<&SpellDef> {
        self.spells.get(id).map(|&i| &self.def.spells[i])
    }

    fn attack(&self, id: &str) -> Option<&AttackDef> {
        self.attacks.get(id).map(|&i| &self.def.attacks[i])
    }

    fn enemy(&self, id: &str) -> Option<&EnemyDef> {
        self.enemies.get(id).map(|&i| &self.def.enemies[i])
    }

    fn class(&self, id: &str) -> Option<&ClassDef> {
        self.classes.get(id).map(|&i| &self.def.classes[i])
    }

    fn race(&self, id: &str) -> Option<&RaceDef> {
        self.races.get(id).map(|&i| &self.def.races[i])
    }

    fn spells(&self) -> Box<dyn Iterator<Item = &SpellDef> + '_> {
        Box::new(self.def.spells.iter())
    }

    fn attacks(&self) -> Box<dyn Iterator<Item = &AttackDef> + '_> {
        Box::new(self.def.attacks.iter())
    }
}
