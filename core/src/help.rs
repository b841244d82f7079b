//! Plain-text help output.

use crate::command::Command;

/// Renders the help screen of `command`: path, descriptions, visible
/// subcommands in registration order and every flag in name order.
pub(crate) fn render(command: &Command) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", command.path()));
    out.push_str(&format!("{}\n\n", command.short_description()));
    if !command.long_description().is_empty() {
        out.push_str(&format!("{}\n\n", command.long_description()));
    }

    let visible: Vec<&Command> = command.subcommands().iter().filter(|c| !c.is_hidden()).collect();
    if !visible.is_empty() {
        let width = visible.iter().map(|c| c.name().len()).max().unwrap_or(0);
        out.push_str("Commands:\n\n");
        for child in visible {
            let line = format!("  {:<width$} {}", child.name(), child.short_description());
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out.push('\n');
    }

    out.push_str("Flags:\n\n");
    for entry in command.flag_set().entries() {
        out.push_str(&format!("  -{}", entry.name));
        if !entry.usage.is_empty() {
            out.push_str(&format!(" {}", entry.usage));
        }
        out.push('\n');
    }
    out.push('\n');
    out
}
