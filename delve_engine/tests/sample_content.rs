use std::path::Path;

use delve_engine::loader::{load_content_def, validate_content_def};
use delve_engine::*;

fn sample_path() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data/content.ron"))
}

#[test]
fn bundled_content_loads_and_validates() {
    let def = load_content_def(sample_path()).expect("sample content parses");
    validate_content_def(&def).expect("sample content validates");

    let content = load_content(sample_path()).expect("sample content loads");
    let crypt = content.dungeon("sunken_crypt").expect("crypt is defined");
    assert!(crypt.rooms.contains_key(&crypt.start_room));
    assert!(crypt.rooms.contains_key(&crypt.exit_room));
    assert!(content.spell("shield_of_faith").is_some());
}

#[test]
fn default_party_builds_from_bundled_content() {
    let content = load_content(sample_path()).expect("sample content loads");
    let party = build_party(&content, &EngineConfig::default().party).expect("default party builds");
    let ids: Vec<_> = party.iter().map(|p| p.entity_id.as_str()).collect();
    assert_eq!(ids, ["player_1", "player_2"]);
    assert_eq!((party[0].max_hp, party[0].ac), (22, 16));
    assert_eq!(party[1].spell_slots.max, 3);
}
