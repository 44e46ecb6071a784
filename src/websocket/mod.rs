pub mod connection;
pub mod handler;
pub mod msg_edit_handler;
pub mod msg_join_handler;
pub mod msg_ping_handler;

pub use handler::websocket_handler;
