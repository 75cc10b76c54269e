//! Special commands parser for interactive chat mode
//!
//! Special commands act on the session (chats, theme, sidebar, account)
//! instead of being sent to the assistant. They start with `/`; the command
//! word is case-insensitive while arguments keep their case.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an argument it does not take
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a new chat
    NewChat,

    /// List stored chats
    ListChats,

    /// Open a chat by id or `#position`
    OpenChat(String),

    /// Delete a chat by id or `#position`
    DeleteChat(String),

    /// Show or hide the chat history before each prompt
    ToggleSidebar,

    /// Switch between light and dark
    ToggleTheme,

    /// Upload a document
    Upload(PathBuf),

    /// Sign in
    Login,

    /// Create an account
    Signup,

    /// Sign out
    Logout,

    /// Show the signed-in user
    WhoAmI,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent to the assistant.
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns [`CommandError::UnknownCommand`] for an unrecognised `/word`,
/// [`CommandError::MissingArgument`] when `/open`, `/delete` or `/upload`
/// has no argument, and [`CommandError::UnsupportedArgument`] when a
/// command that takes none is given one.
///
/// # Examples
///
/// ```
/// use growth_chat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::NewChat);
/// assert_eq!(
///     parse_special_command("/open #2").unwrap(),
///     SpecialCommand::OpenChat("#2".to_string())
/// );
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if lower == "exit" || lower == "quit" {
        return Ok(SpecialCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let (word, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    let no_arg = |command: SpecialCommand| {
        if arg.is_empty() {
            Ok(command)
        } else {
            Err(CommandError::UnsupportedArgument {
                command: word.clone(),
                arg: arg.to_string(),
            })
        }
    };
    let with_arg = |usage: &str| {
        if arg.is_empty() {
            Err(CommandError::MissingArgument {
                command: word.clone(),
                usage: usage.to_string(),
            })
        } else {
            Ok(arg.to_string())
        }
    };

    match word.as_str() {
        "/new" => no_arg(SpecialCommand::NewChat),
        "/chats" | "/history" => no_arg(SpecialCommand::ListChats),
        "/open" | "/load" => with_arg("/open <id|#n>").map(SpecialCommand::OpenChat),
        "/delete" => with_arg("/delete <id|#n>").map(SpecialCommand::DeleteChat),
        "/sidebar" => no_arg(SpecialCommand::ToggleSidebar),
        "/theme" => no_arg(SpecialCommand::ToggleTheme),
        "/upload" => with_arg("/upload <path>").map(|p| SpecialCommand::Upload(PathBuf::from(p))),
        "/login" => no_arg(SpecialCommand::Login),
        "/signup" => no_arg(SpecialCommand::Signup),
        "/logout" => no_arg(SpecialCommand::Logout),
        "/whoami" => no_arg(SpecialCommand::WhoAmI),
        "/help" | "/?" => no_arg(SpecialCommand::Help),
        "/exit" | "/quit" => no_arg(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print the special commands reference
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
===========================================

CHATS:
  /new              - Start a new chat
  /chats            - List stored chats, most recent first
  /open <id|#n>     - Open a chat by id or by its number in /chats
  /delete <id|#n>   - Delete a chat
  /sidebar          - Show or hide the chat list before each prompt

DOCUMENTS:
  /upload <path>    - Upload a PDF or Excel file for analysis

ACCOUNT:
  /login            - Sign in to sync your chats
  /signup           - Create an account
  /logout           - Sign out and continue as a guest
  /whoami           - Show the signed-in user

DISPLAY:
  /theme            - Switch between light and dark

SESSION CONTROL:
  /help             - Show this help message
  exit              - Exit interactive mode
  quit              - Same as exit

NOTES:
  - Commands are case-insensitive
  - Regular text (not starting with /) is sent to the assistant
"#
    );
}
