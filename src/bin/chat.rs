//! POS Admin chat client
//!
//! A line-based terminal client for the staff chat.
//!
//! Usage: `pos-chat [<username> <password>]`. Without credentials the
//! token saved by a previous login is reused.

use anyhow::{bail, Context};
use pos_admin::chat::{ChatEngine, Conversation, MessageType, WsConnector};
use pos_admin::config::Settings;
use pos_admin::gateway::Gateway;
use pos_admin::session::Session;
use pos_admin::storage::LocalStore;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

const SETTINGS_FILE: &str = "pos-admin.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pos_admin::init();

    let settings_path =
        std::env::var("POS_ADMIN_SETTINGS").unwrap_or_else(|_| SETTINGS_FILE.to_string());
    let settings = Settings::load(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path))?;

    let store = Arc::new(
        LocalStore::new(&settings.storage_path).context("Failed to open local storage")?,
    );
    let session = Session::new(store)?.with_cookie_lifetime(settings.token_cookie_lifetime());
    let gateway = Gateway::from_settings(&settings, session.clone())?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let user = match args.as_slice() {
        [username, password] => session
            .login(&gateway, username, password)
            .await
            .context("Login failed")?,
        [] => {
            session.check_auth(&gateway).await?;
            match session.current_user().await {
                Some(user) => user,
                None => bail!("Not logged in. Usage: pos-chat <username> <password>"),
            }
        }
        _ => bail!("Usage: pos-chat [<username> <password>]"),
    };
    println!("Logged in as {}", user.display_name());

    let chat = ChatEngine::from_settings(gateway.clone(), WsConnector, session.clone(), &settings);
    let preview_items = settings.receipt_preview_items;
    chat.set_message_handler(move |msg| {
        let sender = msg.sender_name.as_deref().unwrap_or("?");
        match msg.msg_type {
            MessageType::Text => println!("[{}] {}", sender, msg.content),
            MessageType::Image => println!("[{}] (image) {}", sender, msg.content),
            MessageType::Receipt => match msg.receipt() {
                Some(Ok(receipt)) => {
                    println!("[{}] (receipt)", sender);
                    for line in receipt.card_lines(preview_items) {
                        println!("  {}", line);
                    }
                }
                _ => println!("[{}] (invalid receipt)", sender),
            },
        }
    })
    .await;
    chat.set_notification_handler(|msg| {
        println!(
            "* New message from {} in another conversation",
            msg.sender_name.as_deref().unwrap_or("?")
        );
    })
    .await;

    chat.connect().await?;
    chat.set_active_conversation(Conversation::General).await?;
    for msg in chat.visible_messages().await {
        println!("[{}] {}", msg.sender_name.as_deref().unwrap_or("?"), msg.content);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let result = match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit", _) => break,
            ("/general", _) => chat.set_active_conversation(Conversation::General).await,
            ("/dm", id) => match id.trim().parse() {
                Ok(id) => chat.set_active_conversation(Conversation::Direct(id)).await,
                Err(_) => {
                    eprintln!("Usage: /dm <user id>");
                    continue;
                }
            },
            ("/online", _) => {
                let mut online: Vec<_> = chat.online_users().await.into_iter().collect();
                online.sort_unstable();
                println!("Online: {:?}", online);
                continue;
            }
            _ => chat.send(line, MessageType::Text).await,
        };

        if let Err(e) = result {
            eprintln!("Error: {}", e);
        }
    }

    chat.disconnect().await;
    Ok(())
}
