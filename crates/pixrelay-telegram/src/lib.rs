pub mod allow;
pub mod client;
pub mod download;
pub mod error;
pub mod parse;
pub mod send;
pub mod webhook;

pub use allow::ChatAllowList;
pub use client::TelegramClient;
pub use error::TelegramError;
pub use parse::{parse_update, update_id};
