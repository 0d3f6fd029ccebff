use std::path::Path;

use delve_engine::events::SessionLog;
use delve_engine::*;

fn new_session(faces: &[u32]) -> Session {
    let path = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data/content.ron"));
    let content = load_content(path).expect("sample content loads");
    let party = build_party(&content, &EngineConfig::default().party).expect("default party builds");
    Session::new(
        content,
        Some("sunken_crypt"),
        party,
        Box::new(ScriptedDice::new(faces.iter().copied())),
    )
    .expect("session starts")
}

fn hp(session: &Session, id: &str) -> u32 {
    session.global().roster.get(id).map_or(0, |e| e.hp)
}

#[test]
fn scripted_run_clears_the_crypt() {
    // every die lands on its highest face
    let mut session = new_session(&[20]);

    let opening = session.start();
    assert_eq!(opening.lines[0], "Chapel Stairs");
    assert_eq!(opening.outcome, TurnOutcome::Continue);

    let report = session.submit("go to the ossuary");
    assert!(report.lines.iter().any(|l| l == "Combat begins: Restless Dead!"));
    assert_eq!(session.acting_player().map(|p| p.name.as_str()), Some("Brannoc"));

    let report = session.submit("attack skeleton 1 with my longsword");
    assert!(report.lines.iter().any(|l| l == "Brannoc hits Skeleton 1 with Longsword for 9 damage."));
    assert_eq!(session.acting_player().map(|p| p.name.as_str()), Some("Ilsa"));

    let report = session.submit("cast burning hands");
    assert!(report.lines.iter().any(|l| l == "Skeleton 1 is defeated."));
    assert!(report.lines.iter().any(|l| l == "Skeleton 2 hits Ilsa with Rusty Blade for 6 damage."));
    assert_eq!(hp(&session, "player_2"), 5);
    assert_eq!(session.encounter().map(|e| e.round), Some(2));

    let report = session.submit("attack skeleton 2");
    assert_eq!(report.outcome, TurnOutcome::Victory);
    assert!(report.lines.iter().any(|l| l == "Victory! The party earns 40 reward."));
    assert_eq!(session.global().game_mode, GameMode::Exploration);
    assert!(session.encounter().is_none());

    let report = session.submit("take a short rest");
    assert!(report.lines.iter().any(|l| l.contains("not allowed") || l.contains("rest")));
    assert_eq!(hp(&session, "player_2"), 5);

    session.submit("go back to the chapel stairs");
    let report = session.submit("take a long rest");
    assert!(report.lines.iter().any(|l| l == "The party takes a long rest."));
    assert_eq!(hp(&session, "player_2"), 11);

    session.submit("go to the ossuary");
    assert!(session.encounter().is_none(), "cleared encounters stay cleared");

    let report = session.submit("go to the flooded gallery");
    assert!(report.lines.iter().any(|l| l == "Combat begins: The Drowned Guard!"));
    let mut guard = 0;
    while session.encounter().is_some() && guard < 10 {
        let target = if hp(&session, "drowned_knight_1") > 0 { "drowned knight" } else { "cultist" };
        session.submit(&format!("attack the {target}"));
        guard += 1;
    }
    assert!(session.encounter().is_none());
    assert_eq!(session.global().progression.total_rewards, 140);
    assert_eq!(session.global().progression.encounters_cleared, 2);

    let report = session.submit("go to the reliquary");
    assert_eq!(report.outcome, TurnOutcome::Complete);
    assert_eq!(session.result(), GameResult::GameComplete);
    assert_eq!(session.global().game_mode, GameMode::GameOver);

    let after = session.submit("look around");
    assert_eq!(after.lines, vec!["The adventure is over.".to_string()]);

    assert_eq!(session.log().of_type("combat_started").count(), 2);
    assert_eq!(session.log().of_type("encounter_ended").count(), 2);
    assert_eq!(session.log().of_type("game_ended").count(), 1);

    let dir = tempfile::tempdir().expect("tempdir");
    session.save_log(dir.path()).expect("log saves");
    let saved = SessionLog::load(dir.path(), &session.log().session_id)
        .expect("log reads")
        .expect("log exists");
    assert_eq!(saved.result, Some(GameResult::GameComplete));
    assert_eq!(saved.dungeon_id.as_deref(), Some("sunken_crypt"));
    assert_eq!(saved.len(), session.log().len());
}

#[test]
fn seeded_runs_replay_identically() {
    let play = || {
        let path = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data/content.ron"));
        let content = load_content(path).expect("sample content loads");
        let party = build_party(&content, &EngineConfig::default().party).expect("default party builds");
        let mut session =
            Session::new(content, None, party, Box::new(SeededDice::new(42))).expect("session starts");
        let mut lines = session.start().lines;
        for input in ["go to the ossuary", "attack skeleton 1", "attack skeleton 1", "end turn", "status"] {
            lines.extend(session.submit(input).lines);
        }
        (lines, session.global().clone())
    };
    assert_eq!(play(), play());
}

#[test]
fn invalid_moves_leave_state_untouched() {
    let mut session = new_session(&[20]);
    session.start();
    let before = session.global().clone();

    let report = session.submit("go to the reliquary");
    assert!(!report.lines.is_empty());
    assert_eq!(session.global(), &before);

    let report = session.submit("cast fire bolt at the skeleton");
    assert!(!report.lines.is_empty());
    assert_eq!(session.global(), &before);
}
