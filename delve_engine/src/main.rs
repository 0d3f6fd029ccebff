#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** Delve **
//! Dungeon-crawl REPL on top of the Delve rules engine.

use std::io::Write;
use std::path::Path;

use delve_engine::style::GameStyle;
use delve_engine::{
    ContentRepository, DELVE_VERSION, DieSource, SeededDice, Session, ThreadDice, build_party, load_config, load_content,
    run_repl,
};

use anyhow::{Context, Result};
use colored::Colorize;
use log::info;

fn main() -> Result<()> {
    env_logger::init();
    let config = load_config(Path::new("delve.toml"));
    info!("Start: loading content from '{}'...", config.content_path.display());
    let content = load_content(&config.content_path).context("while loading game content")?;
    let party = build_party(&content, &config.party).context("while building the party")?;

    let dice: Box<dyn DieSource> = match config.seed {
        Some(seed) => {
            info!("using seeded dice ({seed})");
            Box::new(SeededDice::new(seed))
        },
        None => Box::new(ThreadDice),
    };
    let mut session =
        Session::new(content, config.dungeon.as_deref(), party, dice).context("while starting the run")?;

    // clear the screen
    print!("\x1B[2J\x1B[H");
    std::io::stdout().flush()?;
    info!("Starting the game!");

    let title = format!("DELVE v{DELVE_VERSION}");
    println!("{:^84}", title.title_style());
    let dungeon_name = session
        .content()
        .dungeon(&session.global().current_dungeon_id)
        .map_or("the dungeon", |d| d.name.as_str())
        .to_string();
    let names: Vec<String> = session
        .global()
        .players()
        .map(|p| p.name.bold().bright_blue().to_string())
        .collect();
    println!("\nYour party, {}, stands at the entrance of {dungeon_name}.", names.join(" and "));
    println!("{}\n", "Type :help for commands.".engine_style());

    run_repl(&mut session, &config)
}
