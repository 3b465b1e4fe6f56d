//! Staff chat: socket connection, message log and presence

pub mod connection;
pub mod engine;
pub mod frame;
pub mod log;
pub mod message;

pub use connection::{chat_url, ConnectionState, Connector, SocketLink, WsConnector};
pub use engine::{ChatEngine, MessageHandler};
pub use frame::{decode_chat_frame, decode_message, InboundFrame, OutboundFrame};
pub use log::MessageLog;
pub use message::{ChatMessage, Conversation, MessageType};
