use rustyline::{Config, Editor, Result};

/// Prompt text; lists the suggestion commands while they are available.
pub fn generate_prompt(suggestions_visible: bool) -> String {
    if suggestions_visible {
        "[/visualize /designer] > ".to_string()
    } else {
        "> ".to_string()
    }
}

pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(rustyline::CompletionType::List)
        .build();
    Editor::with_config(config)
}
