//! Realtime staff chat
//!
//! The engine owns one socket at a time and moves through
//! `Disconnected -> Connecting -> Connected`. An unintended close schedules
//! a single reconnect after a fixed delay; `disconnect` cancels it. Every
//! connection attempt gets a generation number, and events from an older
//! generation are ignored, so a close reported after `disconnect` never
//! triggers a reconnect.

use crate::{
    chat::{
        connection::{chat_url, ConnectionState, Connector, SocketLink},
        frame::{decode_chat_frame, decode_message, InboundFrame, OutboundFrame},
        log::MessageLog,
        message::{ChatMessage, Conversation, MessageType},
    },
    config::Settings,
    gateway::Backend,
    models::UserId,
    receipt::Receipt,
    session::Session,
    Error, Result,
};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Callback for chat messages
pub type MessageHandler = Arc<dyn Fn(&ChatMessage) + Send + Sync>;

struct ActiveLink {
    outbound: mpsc::UnboundedSender<String>,
    reader: JoinHandle<()>,
}

#[derive(Default)]
struct ChatState {
    connection: ConnectionState,
    generation: u64,
    link: Option<ActiveLink>,
    reconnect: Option<JoinHandle<()>>,
    log: MessageLog,
    active: Conversation,
    online: HashSet<UserId>,
    loading_history: bool,
    last_local_id: i64,
}

impl ChatState {
    fn next_local_id(&mut self) -> i64 {
        self.last_local_id = Utc::now()
            .timestamp_millis()
            .max(self.last_local_id + 1);
        self.last_local_id
    }

    fn cancel_reconnect(&mut self) {
        if let Some(timer) = self.reconnect.take() {
            timer.abort();
        }
    }
}

struct Inner<B, C> {
    backend: B,
    connector: C,
    session: Session,
    ws_url: String,
    reconnect_delay: Duration,
    state: Mutex<ChatState>,
    message_handler: Mutex<Option<MessageHandler>>,
    notification_handler: Mutex<Option<MessageHandler>>,
}

/// Chat engine
///
/// Cloning is cheap; clones share the connection and the log.
///
/// # Example
/// ```rust,no_run
/// use pos_admin::chat::{ChatEngine, Conversation, MessageType, WsConnector};
/// use pos_admin::config::Settings;
/// use pos_admin::gateway::Gateway;
///
/// # async fn example(gateway: Gateway) -> pos_admin::Result<()> {
/// let settings = Settings::default();
/// let chat = ChatEngine::from_settings(gateway.clone(), WsConnector, gateway.session().clone(), &settings);
///
/// chat.set_message_handler(|msg| println!("{:?}: {}", msg.sender_name, msg.content)).await;
/// chat.connect().await?;
/// chat.set_active_conversation(Conversation::General).await?;
/// chat.send("Morning all", MessageType::Text).await?;
/// # Ok(())
/// # }
/// ```
pub struct ChatEngine<B: Backend, C: Connector> {
    inner: Arc<Inner<B, C>>,
}

impl<B: Backend, C: Connector> Clone for ChatEngine<B, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Backend, C: Connector> ChatEngine<B, C> {
    /// Create an engine
    pub fn new(
        backend: B,
        connector: C,
        session: Session,
        ws_url: impl Into<String>,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                connector,
                session,
                ws_url: ws_url.into(),
                reconnect_delay,
                state: Mutex::new(ChatState::default()),
                message_handler: Mutex::new(None),
                notification_handler: Mutex::new(None),
            }),
        }
    }

    /// Create an engine from client settings
    pub fn from_settings(backend: B, connector: C, session: Session, settings: &Settings) -> Self {
        Self::new(
            backend,
            connector,
            session,
            &settings.ws_url,
            settings.reconnect_delay(),
        )
    }

    /// Set the callback for every confirmed inbound message
    pub async fn set_message_handler<F>(&self, handler: F)
    where
        F: Fn(&ChatMessage) + Send + Sync + 'static,
    {
        *self.inner.message_handler.lock().await = Some(Arc::new(handler));
    }

    /// Set the callback for messages from others outside the active conversation
    pub async fn set_notification_handler<F>(&self, handler: F)
    where
        F: Fn(&ChatMessage) + Send + Sync + 'static,
    {
        *self.inner.notification_handler.lock().await = Some(Arc::new(handler));
    }

    /// Current connection state
    pub async fn connection_state(&self) -> ConnectionState {
        self.inner.state.lock().await.connection
    }

    /// Whether the socket is open
    pub async fn is_connected(&self) -> bool {
        self.connection_state().await == ConnectionState::Connected
    }

    /// Whether a reconnect timer is pending
    pub async fn has_pending_reconnect(&self) -> bool {
        self.inner.state.lock().await.reconnect.is_some()
    }

    /// Copy of the message log
    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.inner.state.lock().await.log.messages().to_vec()
    }

    /// Messages that belong to the active conversation
    pub async fn visible_messages(&self) -> Vec<ChatMessage> {
        let me = self.inner.session.current_user_id().await;
        let state = self.inner.state.lock().await;
        state
            .log
            .messages()
            .iter()
            .filter(|m| m.is_visible_in(state.active, me))
            .cloned()
            .collect()
    }

    /// Conversation receiving outbound messages
    pub async fn active_conversation(&self) -> Conversation {
        self.inner.state.lock().await.active
    }

    /// Whether a history fetch is running
    pub async fn is_loading_history(&self) -> bool {
        self.inner.state.lock().await.loading_history
    }

    /// Users in the latest presence snapshot
    pub async fn online_users(&self) -> HashSet<UserId> {
        self.inner.state.lock().await.online.clone()
    }

    /// Whether a user is in the latest presence snapshot
    pub async fn is_online(&self, user_id: UserId) -> bool {
        self.inner.state.lock().await.online.contains(&user_id)
    }

    /// Open the socket
    ///
    /// Does nothing without a session token or when a socket is already
    /// open or opening. A failed attempt is logged and retried after the
    /// reconnect delay.
    pub async fn connect(&self) -> Result<()> {
        self.open_socket(None).await
    }

    /// Connect from a reconnect timer armed at `generation`
    ///
    /// Clearing the timer handle and claiming the connection happen under
    /// one lock, so a `disconnect` that bumped the generation since the
    /// timer was armed always wins.
    pub(crate) async fn reconnect(&self, generation: u64) -> Result<()> {
        self.open_socket(Some(generation)).await
    }

    async fn open_socket(&self, armed_at: Option<u64>) -> Result<()> {
        let token = self.inner.session.token().await;

        let (generation, url) = {
            let mut state = self.inner.state.lock().await;
            if let Some(armed_at) = armed_at {
                if state.generation != armed_at {
                    debug!("Reconnect cancelled by disconnect");
                    return Ok(());
                }
                state.reconnect = None;
            }
            let Some(token) = token else {
                debug!("No session token, chat stays offline");
                return Ok(());
            };
            if state.connection != ConnectionState::Disconnected {
                return Ok(());
            }
            let url = chat_url(&self.inner.ws_url, &token)?;
            state.cancel_reconnect();
            state.connection = ConnectionState::Connecting;
            state.generation += 1;
            (state.generation, url)
        };

        debug!("Opening chat socket to {}", self.inner.ws_url);
        match self.inner.connector.open(&url).await {
            Ok(link) => self.on_open(generation, link).await,
            Err(e) => {
                warn!("Chat connection failed: {}", e);
                self.on_close(generation).await;
            }
        }
        Ok(())
    }

    /// Current connection generation
    pub(crate) async fn generation(&self) -> u64 {
        self.inner.state.lock().await.generation
    }

    async fn on_open(&self, generation: u64, link: SocketLink) {
        let mut state = self.inner.state.lock().await;
        if state.generation != generation {
            debug!("Dropping chat socket opened after disconnect");
            return;
        }

        let SocketLink {
            outbound,
            mut inbound,
        } = link;
        let engine = self.clone();
        let reader = tokio::spawn(async move {
            while let Some(frame) = inbound.recv().await {
                engine.handle_frame(&frame).await;
            }
            engine.on_close(generation).await;
        });

        state.cancel_reconnect();
        state.connection = ConnectionState::Connected;
        state.link = Some(ActiveLink { outbound, reader });
        info!("Chat connected");
    }

    async fn on_close(&self, generation: u64) {
        let mut state = self.inner.state.lock().await;
        if state.generation != generation {
            return;
        }

        state.connection = ConnectionState::Disconnected;
        state.link = None;
        info!(
            "Chat disconnected, reconnecting in {} ms",
            self.inner.reconnect_delay.as_millis()
        );
        self.schedule_reconnect(&mut state);
    }

    fn schedule_reconnect(&self, state: &mut ChatState) {
        state.cancel_reconnect();

        let engine = self.clone();
        let delay = self.inner.reconnect_delay;
        let generation = state.generation;
        state.reconnect = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = engine.reconnect(generation).await {
                warn!("Chat reconnect failed: {}", e);
            }
        }));
    }

    /// Close the socket and cancel any pending reconnect
    pub async fn disconnect(&self) {
        let mut state = self.inner.state.lock().await;
        state.generation += 1;
        state.cancel_reconnect();
        if let Some(link) = state.link.take() {
            link.reader.abort();
        }
        if state.connection != ConnectionState::Disconnected {
            info!("Chat closed");
        }
        state.connection = ConnectionState::Disconnected;
    }

    /// Switch conversation and load its history
    ///
    /// The log is cleared immediately. If the user switches again before
    /// the history arrives, the late response is dropped.
    pub async fn set_active_conversation(&self, conversation: Conversation) -> Result<()> {
        {
            let mut state = self.inner.state.lock().await;
            state.active = conversation;
            state.log.clear();
            state.loading_history = true;
        }

        let result = self
            .inner
            .backend
            .chat_history(conversation.recipient())
            .await;

        let mut state = self.inner.state.lock().await;
        if state.active != conversation {
            debug!("Discarding history for {}", conversation);
            return Ok(());
        }
        state.loading_history = false;

        match result {
            Ok(raw) => {
                let history = raw
                    .iter()
                    .filter_map(|value| match decode_message(value) {
                        Ok(message) => Some(message),
                        Err(e) => {
                            warn!("Skipping undecodable history entry: {}", e);
                            None
                        }
                    })
                    .collect();
                state.log.load_history(history);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to fetch chat history: {}", e);
                Err(e)
            }
        }
    }

    /// Send a message to the active conversation
    ///
    /// A placeholder is added to the log at once and replaced when the
    /// server echoes the message. Nothing is queued while offline.
    pub async fn send(&self, content: &str, msg_type: MessageType) -> Result<()> {
        let user = self
            .inner
            .session
            .current_user()
            .await
            .ok_or(Error::NotAuthenticated)?;

        let mut state = self.inner.state.lock().await;
        if state.connection != ConnectionState::Connected || state.link.is_none() {
            warn!("Chat socket not connected, message not sent");
            return Err(Error::NotConnected);
        }

        let recipient_id = state.active.recipient();
        let payload = OutboundFrame {
            content,
            msg_type,
            recipient_id,
        }
        .encode()?;

        let local_id = state.next_local_id();
        state.log.insert(ChatMessage::optimistic(
            local_id,
            &user,
            content,
            msg_type,
            recipient_id,
        ));

        let sent = state
            .link
            .as_ref()
            .is_some_and(|link| link.outbound.send(payload).is_ok());
        if !sent {
            state.log.remove_optimistic(local_id);
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    /// Upload an image and return its URL
    pub async fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        self.inner.backend.upload_chat_file(file_name, bytes).await
    }

    /// Upload an image and send its URL as an IMAGE message
    pub async fn send_image(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let url = self.upload_image(file_name, bytes).await?;
        self.send(&url, MessageType::Image).await?;
        Ok(url)
    }

    /// Send a receipt as a RECEIPT message
    pub async fn share_receipt(&self, receipt: &Receipt) -> Result<()> {
        let content = receipt.to_content()?;
        self.send(&content, MessageType::Receipt).await
    }

    /// Apply one inbound text frame
    pub(crate) async fn handle_frame(&self, raw: &str) {
        let frame = match decode_chat_frame(raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Ignoring undecodable chat frame: {}", e);
                return;
            }
        };

        let message = match frame {
            InboundFrame::Presence(users) => {
                debug!("{} users online", users.len());
                self.inner.state.lock().await.online = users;
                return;
            }
            InboundFrame::Message(message) => message,
        };

        let me = self.inner.session.current_user_id().await;
        let notify = {
            let mut state = self.inner.state.lock().await;
            let visible = message.is_visible_in(state.active, me);
            state.log.receive(message.clone(), me);
            !message.is_from(me) && !visible
        };

        let handler = self.inner.message_handler.lock().await.clone();
        if let Some(handler) = handler {
            handler(&message);
        }

        if notify {
            let handler = self.inner.notification_handler.lock().await.clone();
            if let Some(handler) = handler {
                handler(&message);
            }
        }
    }
}
