//! Character listing, editing and AI-assisted creation

use anyhow::{Context, Result};
use clap::Subcommand;
use questscribe_core::ConversationMessage;
use questscribe_core::types::{SaveCharacterRequest, Sender};
use std::path::PathBuf;
use tracing::{info, warn};

use super::{App, Input};
use crate::render;

#[derive(Subcommand)]
pub enum CharacterCommands {
    /// List your characters
    List,

    /// Show a character's sheet and creation conversation
    Show {
        character_id: i64,
    },

    /// Delete a character with its sessions and logs
    Delete {
        character_id: i64,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Replace a character sheet with the contents of a file
    Sheet {
        character_id: i64,

        /// Markdown or text file holding the new sheet
        #[arg(long)]
        file: PathBuf,
    },

    /// Generate a portrait and attach it to the character
    Image {
        character_id: i64,

        /// Extra guidance for the image generator
        #[arg(long)]
        prompt: Option<String>,
    },
}

impl CharacterCommands {
    pub async fn execute(self, app: &App) -> Result<()> {
        app.require_login()?;
        let client = &app.client;

        match self {
            CharacterCommands::List => {
                let characters = client.list_characters().await?;
                if characters.is_empty() {
                    println!("No characters yet. Create one with `questscribe create`.");
                }
                for character in &characters {
                    println!("{}", render::character_line(character));
                }
                Ok(())
            }
            CharacterCommands::Show { character_id } => {
                let character = client.get_character(character_id).await?;
                print!("{}", render::character_details(&character));
                Ok(())
            }
            CharacterCommands::Delete { character_id, yes } => {
                let character = client.get_character(character_id).await?;
                if !yes {
                    let question = format!(
                        "Delete {} and all of their sessions and logs? This cannot be undone.",
                        character.name
                    );
                    if !Input::new().confirm(&question).await? {
                        println!("Nothing deleted");
                        return Ok(());
                    }
                }
                client.delete_character(character_id).await?;
                info!(character_id, "Character deleted");
                println!("Deleted {}", character.name);
                Ok(())
            }
            CharacterCommands::Sheet { character_id, file } => {
                let sheet = tokio::fs::read_to_string(&file)
                    .await
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                client.update_character_sheet(character_id, sheet).await?;
                println!("Character sheet updated");
                Ok(())
            }
            CharacterCommands::Image {
                character_id,
                prompt,
            } => {
                let image = client.generate_character_image(character_id, prompt).await?;
                client
                    .save_character_image(character_id, image.image_url.clone())
                    .await?;
                println!("Image saved: {}", image.image_url);
                Ok(())
            }
        }
    }
}

/// Talk a character through with the AI, then save it and open its session
pub async fn create(app: &App) -> Result<()> {
    app.require_login()?;
    let client = &app.client;
    let mut input = Input::new();
    let mut messages: Vec<ConversationMessage> = Vec::new();

    println!("Describe the character you would like to play.");
    println!("Type :save when the sheet looks right, or :quit to give up.");

    loop {
        let Some(line) = input.prompt("you> ").await? else {
            return Ok(());
        };

        match line.as_str() {
            "" => continue,
            ":quit" | ":q" => return Ok(()),
            ":save" => {
                if !messages.iter().any(|m| m.sender == Sender::Ai) {
                    println!("Talk with the AI first so it can write a character sheet.");
                    continue;
                }
                let Some(name) = input.prompt("Enter a name for your character: ").await? else {
                    return Ok(());
                };
                if name.is_empty() {
                    continue;
                }

                let request = SaveCharacterRequest::from_conversation(&name, messages.clone());
                let saved = client.save_character_from_conversation(&request).await?;
                println!("Character '{name}' saved successfully!");

                let session = client.get_or_create_session(saved.character_id).await?;
                info!(character_id = saved.character_id, session_id = %session.session_id, "Session ready");
                println!(
                    "Start playing with `questscribe play {}`",
                    saved.character_id
                );
                return Ok(());
            }
            text => {
                messages.push(ConversationMessage::user(text));
                match client.negotiate_character(&messages).await {
                    Ok(reply) => {
                        println!("\n{}\n", render::format_ai_message(&reply));
                        messages.push(ConversationMessage::ai(reply));
                    }
                    Err(e) if e.is_unauthenticated() => return Err(e.into()),
                    Err(e) => {
                        warn!("Negotiation failed: {e}");
                        println!("Error: {e}");
                    }
                }
            }
        }
    }
}
