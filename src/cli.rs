//! Command-line interface definition for Growth Chat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for chatting, uploads, authentication, chat
//! history management and theme selection.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Growth - terminal chat client
///
/// Talk to the Growth assistant, keep your chats locally and sync them
/// with your account when signed in.
#[derive(Parser, Debug, Clone)]
#[command(name = "growth")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Path of the local store file (chats, theme, session)
    #[arg(long, env = "GROWTH_STORE_PATH")]
    pub store_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Growth
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Request streamed replies
        #[arg(short, long)]
        stream: bool,

        /// Open this chat instead of the most recent one
        #[arg(long)]
        chat: Option<String>,
    },

    /// Send a single message and print the reply
    Send {
        /// Message text
        message: String,

        /// Request a streamed reply
        #[arg(short, long)]
        stream: bool,

        /// Chat to append to (defaults to the most recent chat)
        #[arg(long)]
        chat: Option<String>,
    },

    /// Upload a document for analysis
    Upload {
        /// File to upload (.pdf, .xlsx, .xls)
        path: PathBuf,
    },

    /// Account management
    Auth {
        /// Authentication subcommand
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Manage stored chats
    Chats {
        /// Chat history subcommand
        #[command(subcommand)]
        command: ChatsCommand,
    },

    /// Show or change the colour theme
    Theme {
        /// Theme subcommand
        #[command(subcommand)]
        command: ThemeCommand,
    },
}

/// Authentication subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommand {
    /// Sign in with email or username
    Login {
        /// Email address or username
        #[arg(short, long)]
        email: Option<String>,

        /// Password (prompted when omitted)
        #[arg(short, long, env = "GROWTH_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Keep the session across restarts
        #[arg(short, long)]
        remember_me: bool,
    },

    /// Create a new account
    Signup {
        /// Email address
        #[arg(short, long)]
        email: Option<String>,

        /// Username (letters, numbers, underscores)
        #[arg(short, long)]
        username: Option<String>,

        /// Password (prompted when omitted)
        #[arg(short, long, env = "GROWTH_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Accept the Terms of Service and Privacy Policy
        #[arg(long)]
        agree_terms: bool,
    },

    /// Sign out and continue as a guest
    Logout,

    /// Show the signed-in user, if any
    Status,
}

/// Chat history subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ChatsCommand {
    /// List stored chats, most recent first
    List,

    /// Print the messages of a chat
    Show {
        /// Chat identifier
        id: String,
    },

    /// Start a new empty chat
    New,

    /// Delete a chat
    Delete {
        /// Chat identifier
        id: String,
    },

    /// Merge chats stored on the server into the local store
    Sync,
}

/// Theme subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ThemeCommand {
    /// Print the active theme
    Show,

    /// Switch between light and dark
    Toggle,

    /// Set the theme explicitly
    Set {
        /// "light" or "dark"
        theme: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
