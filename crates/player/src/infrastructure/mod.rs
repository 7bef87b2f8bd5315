pub mod config;
pub mod websocket;

#[cfg(test)]
pub mod testing;

pub use config::PlayerConfig;
pub use websocket::{PhoenixChannel, PhoenixSocket, PhoenixSocketFactory};
