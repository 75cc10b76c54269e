use crate::app::GrowthChat;
use crate::cli::ChatsCommand;
use crate::config::Config;
use crate::error::{GrowthError, Result};
use crate::render;
use colored::Colorize;

/// Handle stored-chat commands
pub async fn handle_chats(config: Config, command: ChatsCommand) -> Result<()> {
    let mut app = GrowthChat::connect(config)?;

    match command {
        ChatsCommand::List => {
            render::print_history(app.book(), app.theme());
            if !app.book().is_empty() {
                println!(
                    "Use {} to continue a chat.",
                    "growth chat --chat <ID|#n>".cyan()
                );
                println!();
            }
        }
        ChatsCommand::Show { id } => {
            let chat_id = app
                .resolve_chat(&id)
                .ok_or_else(|| GrowthError::Validation(format!("Chat not found: {}", id)))?;
            if let Some(chat) = app.book().get(&chat_id) {
                println!("{} {}", chat.title.bold(), format!("({})", chat.id).dimmed());
                println!("{}", render::render_chat(chat, app.theme()));
            }
        }
        ChatsCommand::New => {
            let chat_id = app.new_chat().await;
            println!("{}", format!("Created chat {}", chat_id).green());
        }
        ChatsCommand::Delete { id } => {
            let chat_id = app
                .resolve_chat(&id)
                .ok_or_else(|| GrowthError::Validation(format!("Chat not found: {}", id)))?;
            app.delete_chat(&chat_id).await;
            println!("{}", format!("Deleted chat {}", chat_id).green());
        }
        ChatsCommand::Sync => {
            app.startup().await;
            if !app.session().is_authenticated() && !app.check_auth().await {
                return Err(
                    GrowthError::Authentication("Sign in to sync your chats".to_string()).into(),
                );
            }
            if !app.load_user_chats().await {
                return Err(GrowthError::Api("Could not load chats from the server".to_string()).into());
            }
            println!(
                "{}",
                format!("Synced {} chats", app.book().len()).green()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        Config {
            storage: StorageConfig {
                path: Some(dir.path().join("growth.db").to_string_lossy().to_string()),
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_new_then_delete_by_position() {
        let dir = TempDir::new().unwrap();
        handle_chats(config_in(&dir), ChatsCommand::New).await.unwrap();

        let app = GrowthChat::connect(config_in(&dir)).unwrap();
        assert_eq!(app.book().len(), 1);

        handle_chats(
            config_in(&dir),
            ChatsCommand::Delete {
                id: "#1".to_string(),
            },
        )
        .await
        .unwrap();
        let app = GrowthChat::connect(config_in(&dir)).unwrap();
        assert!(app.book().is_empty());
    }

    #[tokio::test]
    async fn test_show_unknown_chat_fails() {
        let dir = TempDir::new().unwrap();
        let result = handle_chats(
            config_in(&dir),
            ChatsCommand::Show {
                id: "42".to_string(),
            },
        )
        .await;
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GrowthError>(),
            Some(GrowthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_list_empty_store() {
        let dir = TempDir::new().unwrap();
        handle_chats(config_in(&dir), ChatsCommand::List).await.unwrap();
    }
}
