//! Interactive narrative session

use anyhow::{Context, Result};
use questscribe_core::SubmissionWindow;
use std::path::PathBuf;
use tracing::{debug, warn};

use super::{App, Input};
use crate::render;

const HELP: &str = "\
Type an action to tell the Dungeon Master what you do.
  :prev / :next     step through recent turns
  :latest           jump to the newest turn
  :history          list the turns held in memory
  :finalize <path>  save the session document to a file
  :quit             leave the session";

#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Action(String),
    Previous,
    Next,
    Latest,
    History,
    Finalize(PathBuf),
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ReplCommand {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(command) = line.strip_prefix(':') else {
            return if line.is_empty() {
                ReplCommand::Empty
            } else {
                ReplCommand::Action(line.to_string())
            };
        };

        let (name, argument) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };
        match (name, argument) {
            ("prev" | "p", _) => ReplCommand::Previous,
            ("next" | "n", _) => ReplCommand::Next,
            ("latest" | "l", _) => ReplCommand::Latest,
            ("history" | "h", _) => ReplCommand::History,
            ("finalize" | "f", path) if !path.is_empty() => {
                ReplCommand::Finalize(PathBuf::from(path))
            }
            ("help" | "?", _) => ReplCommand::Help,
            ("quit" | "q", _) => ReplCommand::Quit,
            _ => ReplCommand::Unknown(line.to_string()),
        }
    }
}

fn print_selected(window: &SubmissionWindow) {
    match (window.selected_index(), window.selected()) {
        (Some(index), Some(entry)) => {
            println!("{}", render::submission(entry, index + 1, window.len()));
        }
        _ => println!("No turns yet."),
    }
}

pub async fn play(app: &App, character_id: i64) -> Result<()> {
    app.require_login()?;
    let client = &app.client;

    let character = client.get_character(character_id).await?;
    let mut session = client.get_or_create_session(character_id).await?;
    debug!(character_id, session_id = %session.session_id, "Session loaded");

    let mut window = SubmissionWindow::new(app.settings.session.history_window);
    match client
        .session_history(
            &session.session_id,
            1,
            u32::try_from(window.capacity()).unwrap_or(u32::MAX),
        )
        .await
    {
        Ok(page) => window.load(page.submissions),
        Err(e) if e.is_unauthenticated() => return Err(e.into()),
        Err(e) => warn!("Could not load session history: {e}"),
    }

    println!("Playing {}\n", character.name);
    if let Some(latest) = window.latest() {
        println!("{}", render::format_ai_message(&latest.narrative));
    } else if let Some(summary) = session.summary.as_deref().filter(|s| !s.is_empty()) {
        println!("{}", render::format_ai_message(summary));
    } else {
        let opening = client.start_session(&session.session_id).await?;
        if let Some(notes) = &opening.dm_notes {
            debug!("DM notes: {notes}");
        }
        println!("{}", render::format_ai_message(&opening.narrative));
        session.advance(&opening.narrative);
    }
    println!("\n(:help for commands)");

    let mut input = Input::new();
    loop {
        let Some(line) = input.prompt("\n> ").await? else {
            return Ok(());
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Empty => {}
            ReplCommand::Quit => return Ok(()),
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Unknown(command) => println!("Unknown command {command}. Try :help"),
            ReplCommand::Previous => {
                if window.previous() {
                    print_selected(&window);
                } else {
                    println!("Already at the oldest turn held.");
                }
            }
            ReplCommand::Next => {
                if window.next() {
                    print_selected(&window);
                } else {
                    println!("Already at the newest turn.");
                }
            }
            ReplCommand::Latest => {
                window.go_to_latest();
                print_selected(&window);
            }
            ReplCommand::History => {
                if window.is_empty() {
                    println!("No turns yet.");
                }
                let selected = window.selected_index();
                for (index, entry) in window.entries().enumerate() {
                    let marker = if Some(index) == selected { '*' } else { ' ' };
                    println!("{marker} #{:<4} {}", entry.sequence, entry.action);
                }
            }
            ReplCommand::Finalize(path) => {
                let document = match client.finalize_session(&session.session_id).await {
                    Ok(document) => document,
                    Err(e) if e.is_unauthenticated() => return Err(e.into()),
                    Err(e) => {
                        println!("Error: {e}");
                        continue;
                    }
                };
                match tokio::fs::write(&path, &document)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))
                {
                    Ok(()) => println!("Saved session document to {}", path.display()),
                    Err(e) => println!("Error: {e:#}"),
                }
            }
            ReplCommand::Action(action) => {
                match client
                    .submit_action(&session.session_id, &action, session.summary.clone())
                    .await
                {
                    Ok(result) => {
                        println!("\n{}", render::format_ai_message(&result.narrative));
                        session.advance(&result.narrative);
                        window.push(action, result.narrative);
                    }
                    Err(e) if e.is_unauthenticated() => return Err(e.into()),
                    Err(e) => println!("Error: {e}"),
                }
            }
        }
    }
}
