/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes these top-level command modules:

- `chat`    - Interactive chat session
- `send`    - Send a single message
- `upload`  - Upload a document
- `auth`    - Sign in, sign up, sign out
- `theme`   - Show or change the colour theme
- `history` - Manage stored chats

Each handler builds a [`GrowthChat`] from the configuration and drives it;
all state changes go through the controller.
*/

use crate::app::{GrowthChat, SendOutcome};
use crate::chat::{Message, NoticeKind};
use crate::config::Config;
use crate::error::{GrowthError, Result};
use crate::render;
use crate::session::AuthOutcome;
use crate::validation::{LoginForm, SignupForm, ValidationErrors};
use colored::Colorize;
use rustyline::DefaultEditor;
use std::io::Write;

// Special commands parser for the interactive session
pub mod special_commands;

// Chat history management commands
pub mod history;

/// Print messages with the active theme
fn print_messages(app: &GrowthChat, messages: &[Message]) {
    for message in messages {
        println!("{}", render::render_message(message, app.theme()));
    }
}

/// Ask for a value on the terminal
fn ask(rl: &mut DefaultEditor, label: &str) -> Result<String> {
    let line = rl.readline(&format!("{}: ", label))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Ask a yes/no question, defaulting to no
fn confirm(rl: &mut DefaultEditor, question: &str) -> Result<bool> {
    let answer = rl.readline(&format!("{} [y/N]: ", question))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_validation_errors(errors: &ValidationErrors) {
    for error in &errors.0 {
        eprintln!("{}", format!("{}: {}", error.field, error.message).red());
    }
}

/// Collect any login fields not given on the command line
fn login_form(
    rl: &mut DefaultEditor,
    identifier: Option<String>,
    password: Option<String>,
    remember_me: bool,
) -> Result<LoginForm> {
    let identifier = match identifier {
        Some(identifier) => identifier,
        None => ask(rl, "Email or username")?,
    };
    let password = match password {
        Some(password) => password,
        None => ask(rl, "Password")?,
    };
    Ok(LoginForm {
        identifier,
        password,
        remember_me,
    })
}

/// Collect any signup fields not given on the command line
///
/// The confirmation is only asked for when the password is typed in.
fn signup_form(
    rl: &mut DefaultEditor,
    email: Option<String>,
    username: Option<String>,
    password: Option<String>,
    agree_terms: bool,
) -> Result<SignupForm> {
    let email = match email {
        Some(email) => email,
        None => ask(rl, "Email address")?,
    };
    let username = match username {
        Some(username) => username,
        None => ask(rl, "Username")?,
    };
    let (password, confirm_password) = match password {
        Some(password) => (password.clone(), password),
        None => (ask(rl, "Password")?, ask(rl, "Confirm password")?),
    };
    let agree_terms =
        agree_terms || confirm(rl, "Agree to the Terms of Service and Privacy Policy?")?;
    Ok(SignupForm {
        email,
        username,
        password,
        confirm_password,
        agree_terms,
    })
}

/// Submit a login form and print the outcome
async fn submit_login(app: &mut GrowthChat, form: &LoginForm) -> Result<()> {
    match app.login(form).await {
        Ok(AuthOutcome::Accepted { user, message }) => {
            println!("{}", message.green());
            if let Some(user) = user {
                println!("Signed in as {}", user.username.cyan());
            }
            Ok(())
        }
        Ok(AuthOutcome::Rejected(message)) => {
            Err(GrowthError::Authentication(message).into())
        }
        Err(errors) => {
            print_validation_errors(&errors);
            Err(GrowthError::Validation(errors.to_string()).into())
        }
    }
}

/// Submit a signup form and print the outcome
async fn submit_signup(app: &mut GrowthChat, form: &SignupForm) -> Result<()> {
    match app.signup(form).await {
        Ok(AuthOutcome::Accepted { message, .. }) => {
            println!("{}", message.green());
            Ok(())
        }
        Ok(AuthOutcome::Rejected(message)) => {
            Err(GrowthError::Authentication(message).into())
        }
        Err(errors) => {
            print_validation_errors(&errors);
            Err(GrowthError::Validation(errors.to_string()).into())
        }
    }
}

/// Open the chat named by `selector`, if any
fn open_requested_chat(app: &mut GrowthChat, selector: Option<&str>) -> Result<()> {
    let Some(selector) = selector else {
        return Ok(());
    };
    match app.resolve_chat(selector) {
        Some(id) => {
            app.load_chat(&id);
            Ok(())
        }
        None => Err(GrowthError::Validation(format!("Chat not found: {}", selector)).into()),
    }
}

/// Send `text` and print the reply as it arrives
///
/// Returns the outcome so callers can decide how to report failures.
async fn send_and_print(app: &mut GrowthChat, text: &str) -> SendOutcome {
    let theme = app.theme();
    let streaming = app.streaming();
    let mut streamed = String::new();

    if streaming {
        print!("{}", render::assistant_prefix(theme));
    } else {
        println!("{}", render::typing_indicator(theme));
    }
    let _ = std::io::stdout().flush();

    let outcome = app
        .send_message(text, |chunk| {
            streamed.push_str(chunk);
            print!("{}", chunk);
            let _ = std::io::stdout().flush();
        })
        .await;

    match &outcome {
        SendOutcome::Replied(reply) if streaming => {
            println!();
            if reply.content != streamed {
                println!("{}", render::render_message(reply, theme));
            }
        }
        SendOutcome::Replied(reply) | SendOutcome::Rejected(reply) => {
            println!("{}", render::render_message(reply, theme));
        }
        SendOutcome::Skipped => {
            if streaming {
                println!();
            }
        }
    }
    outcome
}

// Chat command handler
pub mod chat {
    //! Interactive chat session.
    //!
    //! Runs a readline loop: plain lines are sent to the assistant, lines
    //! starting with `/` are special commands.

    use super::*;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use rustyline::error::ReadlineError;

    /// Start the interactive session
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `stream` - Request streamed replies regardless of configuration
    /// * `chat` - Chat id or `#n` to open instead of the most recent chat
    pub async fn run_chat(config: Config, stream: bool, chat: Option<String>) -> Result<()> {
        tracing::info!("Starting interactive chat session");

        let mut app = GrowthChat::connect(config)?;
        if stream {
            app.set_streaming(true);
        }
        app.startup().await;
        open_requested_chat(&mut app, chat.as_deref())?;

        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&app);
        print_current_chat(&app);

        loop {
            if app.sync_session() {
                print_account_line(&app);
            }
            if app.sidebar().is_open() {
                render::print_history(app.book(), app.theme());
            }

            let prompt = format_prompt(&app);
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}", e.to_string().red());
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => {}
                        other => {
                            if let Err(e) = handle_special_command(&mut app, &mut rl, other).await
                            {
                                eprintln!("{}", format!("Error: {}", e).red());
                            }
                            continue;
                        }
                    }

                    rl.add_history_entry(trimmed)?;
                    let status = app.input_status(trimmed);
                    tracing::debug!("Sending message ({})", status.counter);
                    println!("{}", status.counter.color(app.theme().palette().muted));

                    send_and_print(&mut app, trimmed).await;
                    println!();
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Run one special command against the session
    async fn handle_special_command(
        app: &mut GrowthChat,
        rl: &mut DefaultEditor,
        command: SpecialCommand,
    ) -> Result<()> {
        match command {
            SpecialCommand::NewChat => {
                app.new_chat().await;
                print_current_chat(app);
            }
            SpecialCommand::ListChats => render::print_history(app.book(), app.theme()),
            SpecialCommand::OpenChat(selector) => {
                open_requested_chat(app, Some(&selector))?;
                print_current_chat(app);
            }
            SpecialCommand::DeleteChat(selector) => {
                let id = app
                    .resolve_chat(&selector)
                    .ok_or_else(|| GrowthError::Validation(format!("Chat not found: {}", selector)))?;
                let was_current = app.book().current_id() == Some(id.as_str());
                app.delete_chat(&id).await;
                println!("{}", format!("Deleted chat {}", id).green());
                if was_current {
                    print_current_chat(app);
                }
            }
            SpecialCommand::ToggleSidebar => {
                if !app.toggle_sidebar() {
                    println!("{}", "Chat list hidden".color(app.theme().palette().muted));
                }
            }
            SpecialCommand::ToggleTheme => {
                let theme = app.toggle_theme();
                println!(
                    "Theme: {} (use /theme for {})",
                    theme.colored_tag(),
                    theme.toggle_label()
                );
            }
            SpecialCommand::Upload(path) => {
                let notices = app.upload_file(&path).await;
                print_messages(app, &notices);
            }
            SpecialCommand::Login => {
                let form = login_form(rl, None, None, false)?;
                let remember_me = confirm(rl, "Remember me?")?;
                submit_login(app, &LoginForm { remember_me, ..form }).await?;
            }
            SpecialCommand::Signup => {
                let form = signup_form(rl, None, None, None, false)?;
                submit_signup(app, &form).await?;
            }
            SpecialCommand::Logout => {
                if let Some(notice) = app.logout().await {
                    print_messages(app, &[notice]);
                }
            }
            SpecialCommand::WhoAmI => print_account_line(app),
            SpecialCommand::Help => print_help(),
            SpecialCommand::Exit | SpecialCommand::None => {}
        }
        Ok(())
    }

    fn format_prompt(app: &GrowthChat) -> String {
        let user = match app.session().user() {
            Some(user) => user.username.cyan().to_string(),
            None => "guest".dimmed().to_string(),
        };
        format!("{} {} >>> ", app.theme().colored_tag(), user)
    }

    fn print_account_line(app: &GrowthChat) {
        match app.session().user() {
            Some(user) => println!("Signed in as {} <{}>", user.username.cyan(), user.email),
            None => println!("{}", "Not signed in (guest)".dimmed()),
        }
    }

    fn print_current_chat(app: &GrowthChat) {
        if let Some(chat) = app.book().current() {
            println!("\n{}", chat.title.bold());
            println!("{}\n", render::render_chat(chat, app.theme()));
        }
    }

    /// Display welcome banner at the start of the interactive session
    fn print_welcome_banner(app: &GrowthChat) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                 Growth Chat - Interactive Mode               ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!(
            "Theme:  {}  Replies: {}",
            app.theme().colored_tag(),
            if app.streaming() { "streamed" } else { "whole" }
        );
        print_account_line(app);
        println!("Type '/help' for available commands, 'exit' to quit");
    }
}

// One-shot message command
pub mod send {
    use super::*;

    /// Send one message and print the reply
    pub async fn run_send(
        config: Config,
        message: String,
        stream: bool,
        chat: Option<String>,
    ) -> Result<()> {
        let mut app = GrowthChat::connect(config)?;
        if stream {
            app.set_streaming(true);
        }
        app.startup().await;
        open_requested_chat(&mut app, chat.as_deref())?;

        match send_and_print(&mut app, &message).await {
            SendOutcome::Replied(_) => Ok(()),
            SendOutcome::Rejected(notice) => Err(GrowthError::Validation(notice.content).into()),
            SendOutcome::Skipped => {
                Err(GrowthError::Validation("Nothing to send".to_string()).into())
            }
        }
    }
}

// Upload command
pub mod upload {
    use super::*;
    use std::path::Path;

    /// Upload a document into the current chat
    pub async fn run_upload(config: Config, path: &Path) -> Result<()> {
        let mut app = GrowthChat::connect(config)?;
        app.startup().await;

        let notices = app.upload_file(path).await;
        print_messages(&app, &notices);

        match notices.last() {
            Some(notice) if notice.kind == Some(NoticeKind::Error) => Err(GrowthError::Upload(
                path.display().to_string(),
            )
            .into()),
            _ => Ok(()),
        }
    }
}

/// Auth command(s)
pub mod auth {
    use super::*;
    use crate::cli::AuthCommand;

    /// Handle account subcommands
    pub async fn handle_auth(config: Config, command: AuthCommand) -> Result<()> {
        let mut app = GrowthChat::connect(config)?;

        match command {
            AuthCommand::Login {
                email,
                password,
                remember_me,
            } => {
                app.startup().await;
                let mut rl = DefaultEditor::new()?;
                let form = login_form(&mut rl, email, password, remember_me)?;
                submit_login(&mut app, &form).await
            }
            AuthCommand::Signup {
                email,
                username,
                password,
                agree_terms,
            } => {
                let mut rl = DefaultEditor::new()?;
                let form = signup_form(&mut rl, email, username, password, agree_terms)?;
                submit_signup(&mut app, &form).await
            }
            AuthCommand::Logout => {
                app.startup().await;
                if let Some(notice) = app.logout().await {
                    print_messages(&app, &[notice]);
                }
                Ok(())
            }
            AuthCommand::Status => {
                if app.check_auth().await {
                    if let Some(user) = app.session().user() {
                        println!("Signed in as {} <{}>", user.username.cyan(), user.email);
                    }
                } else {
                    println!("Not signed in (guest)");
                }
                Ok(())
            }
        }
    }
}

/// Theme command
pub mod theme {
    use super::*;
    use crate::cli::ThemeCommand;
    use crate::theme::Theme;

    /// Show or change the stored theme
    pub fn handle_theme(config: Config, command: ThemeCommand) -> Result<()> {
        let mut app = GrowthChat::connect(config)?;
        let theme = match command {
            ThemeCommand::Show => app.theme(),
            ThemeCommand::Toggle => app.toggle_theme(),
            ThemeCommand::Set { theme } => {
                let theme = Theme::parse_str(&theme).map_err(GrowthError::Validation)?;
                app.set_theme(theme)
            }
        };
        println!("{} (toggle: {})", theme, theme.toggle_label());
        Ok(())
    }
}
