pub mod api_client;
pub mod chat_socket;
pub mod config;
pub mod messages;

pub use api_client::ApiClient;
pub use chat_socket::{ChatSocket, ConnectionState};
pub use config::{ApiConfig, Environment, WindowEnv};
pub use messages::ChatFrame;
