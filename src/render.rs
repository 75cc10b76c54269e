//! Terminal rendering of chats, notices and the chat history

use crate::chat::{Chat, ChatBook, Message, NoticeKind, Role};
use crate::theme::Theme;
use colored::Colorize;
use prettytable::{format, Table};

pub const WELCOME_TITLE: &str = "Welcome to Growth";
pub const WELCOME_TEXT: &str =
    "Your AI-powered chat assistant. Start a conversation by typing a message below.";
pub const EMPTY_HISTORY: &str = "No chats yet";

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human-readable file size
///
/// # Examples
///
/// ```
/// use growth_chat::render::format_file_size;
///
/// assert_eq!(format_file_size(0), "0 Bytes");
/// assert_eq!(format_file_size(1536), "1.5 KB");
/// assert_eq!(format_file_size(1024 * 1024), "1 MB");
/// ```
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let fixed = format!("{:.2}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

/// Avatar letter shown next to a message
pub fn avatar(role: Role) -> &'static str {
    match role {
        Role::User => "U",
        Role::Assistant | Role::System => "G",
    }
}

/// Input counter, e.g. `12/4000`
pub fn input_counter(text: &str, max_chars: usize) -> String {
    format!("{}/{}", text.chars().count(), max_chars)
}

pub fn render_welcome(theme: Theme) -> String {
    let palette = theme.palette();
    format!(
        "{}\n{}",
        WELCOME_TITLE.bold(),
        WELCOME_TEXT.color(palette.muted)
    )
}

pub fn render_message(message: &Message, theme: Theme) -> String {
    let palette = theme.palette();
    match message.role {
        Role::User => format!(
            "{} {}",
            format!("[{}]", avatar(Role::User)).color(palette.user).bold(),
            message.content.color(palette.user)
        ),
        Role::Assistant => format!(
            "{} {}",
            format!("[{}]", avatar(Role::Assistant))
                .color(palette.assistant)
                .bold(),
            message.content
        ),
        Role::System => {
            let color = match message.kind.unwrap_or_default() {
                NoticeKind::Info => palette.info,
                NoticeKind::Success => palette.success,
                NoticeKind::Error => palette.error,
            };
            format!("    {}", message.content.color(color))
        }
    }
}

/// Every message of `chat`, or the welcome text for an empty chat
pub fn render_chat(chat: &Chat, theme: Theme) -> String {
    if chat.messages.is_empty() {
        return render_welcome(theme);
    }
    chat.messages
        .iter()
        .map(|m| render_message(m, theme))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Assistant prefix printed before a streamed reply
pub fn assistant_prefix(theme: Theme) -> String {
    format!("[{}] ", avatar(Role::Assistant))
        .color(theme.palette().assistant)
        .bold()
        .to_string()
}

/// Shown while waiting for a non-streamed reply
pub fn typing_indicator(theme: Theme) -> String {
    format!("{}{}", assistant_prefix(theme), "...".color(theme.palette().muted))
}

/// History table, most recent first with the current chat marked
///
/// Returns `None` when there are no chats.
pub fn history_table(book: &ChatBook) -> Option<Table> {
    let history = book.history();
    if history.is_empty() {
        return None;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row![
        "#".bold(),
        "".bold(),
        "ID".bold(),
        "Title".bold(),
        "Messages".bold(),
        "Last Updated".bold()
    ]);

    for (position, chat) in history.into_iter().enumerate() {
        let marker = if book.current_id() == Some(chat.id.as_str()) {
            "*".green().to_string()
        } else {
            String::new()
        };
        let updated = chat.updated_at.format("%Y-%m-%d %H:%M").to_string();
        table.add_row(prettytable::row![
            position + 1,
            marker,
            chat.id.cyan(),
            chat.title,
            chat.messages.len(),
            updated
        ]);
    }
    Some(table)
}

/// Print the history table, or the empty-history text
pub fn print_history(book: &ChatBook, theme: Theme) {
    match history_table(book) {
        Some(table) => {
            println!();
            table.printstd();
            println!();
        }
        None => println!("{}", EMPTY_HISTORY.color(theme.palette().muted)),
    }
}
