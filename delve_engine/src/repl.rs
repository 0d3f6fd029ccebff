//! REPL and command handling.
//!
//! The game runs in a read-eval-print loop. Lines starting with `:` are meta commands handled in
//! [`system`]; everything else is handed to the [`Session`] as a player intent.

mod input;
pub mod system;

pub use system::*;

use anyhow::Result;
use log::info;

use crate::config::EngineConfig;
use crate::session::{Session, TurnOutcome, TurnReport};
use crate::style::{GameStyle, style_line};

use input::{InputEvent, InputManager};

/// Control flow signal used by handlers to exit the REPL.
pub enum ReplControl {
    Continue,
    Quit,
}

/// Run the read-eval-print loop until the player quits or input ends.
///
/// # Errors
/// Returns an error if stdin cannot be read at all.
pub fn run_repl(session: &mut Session, config: &EngineConfig) -> Result<()> {
    let mut input_manager = InputManager::new(&config.save_dir);
    let mut inputs = 0_u32;

    let opening = session.start();
    print_report(&opening);

    loop {
        let prompt = build_prompt(session).prompt_style().to_string();
        let line = match input_manager.read_line(&prompt)? {
            InputEvent::Line(line) => line,
            InputEvent::Eof => ":quit".to_string(),
            InputEvent::Interrupted => {
                print_lines(&["Command canceled.".engine_style().to_string()]);
                continue;
            },
        };
        if line.trim().is_empty() {
            continue;
        }

        if let Some(command) = parse_meta(&line) {
            if let ReplControl::Quit = handle_meta(session, config, command) {
                break;
            }
            continue;
        }

        inputs += 1;
        info!("================> INPUT {inputs} <================");
        let report = session.submit(&line);
        print_report(&report);
        if matches!(report.outcome, TurnOutcome::GameOver | TurnOutcome::Complete) {
            print_lines(&["Type :load to try again from a save, or :quit to leave.".engine_style().to_string()]);
        }
    }
    Ok(())
}

fn handle_meta(session: &mut Session, config: &EngineConfig, command: MetaCommand) -> ReplControl {
    match command {
        MetaCommand::Help => print_plain(&help_handler()),
        MetaCommand::Status => print_plain(&session.status_lines()),
        MetaCommand::Save(slot) => match save_handler(session, &config.save_dir, &slot) {
            Ok(message) => print_plain(&[message]),
            Err(err) => print_error(&format!("Save failed: {err:#}")),
        },
        MetaCommand::Load(slot) => match load_handler(session, &config.save_dir, &slot) {
            Ok(lines) => print_plain(&lines),
            Err(err) => print_error(&format!("Load failed: {err:#}")),
        },
        MetaCommand::ListSaves => print_plain(&list_saves_handler(&config.save_dir)),
        MetaCommand::Quit => {
            print_plain(&quit_handler(session, &config.log_dir));
            return ReplControl::Quit;
        },
        MetaCommand::Unknown(verb) => print_error(&format!("Unknown command ':{verb}'. Try :help.")),
    }
    ReplControl::Continue
}

/// The prompt names whoever `submit` will act for.
fn build_prompt(session: &Session) -> String {
    match (session.acting_player(), session.encounter()) {
        (Some(player), Some(encounter)) => format!(
            "\n[Round {}|{} {}/{} hp]>> ",
            encounter.round, player.name, player.hp, player.max_hp
        ),
        (Some(player), None) => format!("\n[{} {}/{} hp]>> ", player.name, player.hp, player.max_hp),
        (None, _) => "\n[--]>> ".to_string(),
    }
}

fn print_report(report: &TurnReport) {
    let styled: Vec<String> = report
        .lines
        .iter()
        .map(|line| style_line(&wrap(line)).to_string())
        .collect();
    print_lines(&styled);
}

fn print_plain(lines: &[String]) {
    let wrapped: Vec<String> = lines.iter().map(|line| wrap(line)).collect();
    print_lines(&wrapped);
}

fn print_error(message: &str) {
    print_lines(&[wrap(message).error_style().to_string()]);
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

fn wrap(line: &str) -> String {
    textwrap::fill(line, textwrap::termwidth().min(100))
}
