use std::io::Write;

use color_print::cwriteln;
use crossterm::QueueableCommand;
use crossterm::cursor::MoveToPreviousLine;
use crossterm::terminal::{Clear, ClearType};
use eyre::Result;

use super::conversation_state::{Message, MessageKind, Sender};

/// Writes one transcript entry. Text is printed as received; markdown is not
/// interpreted.
pub fn render_message(output: &mut dyn Write, message: &Message) -> Result<()> {
    let time = message.created_at().format("%H:%M");

    match (message.sender(), message.kind()) {
        (Sender::User, _) => {
            cwriteln!(output, "<dim>[{}]</> <bold>you</>: {}", time, message.text())?;
        }
        (Sender::Assistant, MessageKind::Failure) => {
            cwriteln!(output, "<dim>[{}]</> <bold><cyan>assistant</></>: <red>{}</>", time, message.text())?;
        }
        (Sender::Assistant, _) => {
            cwriteln!(output, "<dim>[{}]</> <bold><cyan>assistant</></>: {}", time, message.text())?;
        }
    }

    if let Some(image) = message.image() {
        cwriteln!(output, "  <underline>{}</>", image)?;
    }

    writeln!(output)?;
    Ok(())
}

pub fn show_status(output: &mut dyn Write, status: &str) -> Result<()> {
    cwriteln!(output, "<dim>{}</>", status)?;
    output.flush()?;
    Ok(())
}

/// Erases the status line written by [`show_status`].
pub fn clear_status(output: &mut dyn Write) -> Result<()> {
    output
        .queue(MoveToPreviousLine(1))?
        .queue(Clear(ClearType::CurrentLine))?;
    output.flush()?;
    Ok(())
}
