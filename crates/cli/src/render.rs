//! Terminal rendering of AI text and records

use questscribe_core::subscription::{format_currency, format_date};
use questscribe_core::types::{Backstory, Character, Sender};
use questscribe_core::{Submission, Transaction};

/// Tidy an AI message for display.
///
/// `#### Heading` lines become bullets and blank-line paragraph breaks
/// collapse to single newlines.
pub fn format_ai_message(text: &str) -> String {
    let bulleted = text
        .split('\n')
        .map(|line| match line.strip_prefix("#### ") {
            Some(rest) => format!("• {rest}"),
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n");
    bulleted.replace("\n\n", "\n")
}

pub fn character_line(character: &Character) -> String {
    let mut line = format!("{:>6}  {}", character.character_id, character.name);
    match (&character.class, character.level) {
        (Some(class), Some(level)) => line.push_str(&format!(" ({class}, level {level})")),
        (Some(class), None) => line.push_str(&format!(" ({class})")),
        (None, Some(level)) => line.push_str(&format!(" (level {level})")),
        (None, None) => {}
    }
    line
}

pub fn character_details(character: &Character) -> String {
    let mut out = format!("{}\n", character_line(character).trim_start());
    if let Some(url) = &character.image_url {
        out.push_str(&format!("Image: {url}\n"));
    }
    out.push_str("\nCharacter sheet\n---------------\n");
    out.push_str(character.sheet_or_placeholder());
    out.push('\n');

    match character.parsed_backstory() {
        Some(Backstory::Conversation(messages)) => {
            out.push_str("\nCreation conversation\n---------------------\n");
            for message in messages {
                let speaker = match message.sender {
                    Sender::User => "You",
                    Sender::Ai => "AI",
                };
                out.push_str(&format!("{speaker}: {}\n", format_ai_message(&message.text)));
            }
        }
        Some(Backstory::Text(text)) => {
            out.push_str("\nBackstory\n---------\n");
            out.push_str(&text);
            out.push('\n');
        }
        None => {}
    }
    out
}

/// One window entry; `position` is 1-based inside the window
pub fn submission(entry: &Submission, position: usize, held: usize) -> String {
    format!(
        "[{position}/{held}] #{}\n> {}\n{}",
        entry.sequence,
        entry.action,
        format_ai_message(&entry.narrative)
    )
}

pub fn transaction_line(transaction: &Transaction) -> String {
    let mut line = format!(
        "{}  {:<12} {:<10} {:>12}",
        format_date(&transaction.created_at),
        transaction.kind,
        transaction.status,
        format_currency(transaction.amount, &transaction.currency),
    );
    if let Some(description) = &transaction.description {
        line.push_str("  ");
        line.push_str(description);
    }
    if let Some(reason) = &transaction.failure_reason {
        line.push_str(&format!("  ({reason})"));
    }
    line
}
