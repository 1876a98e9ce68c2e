pub mod client;
pub mod error;
pub mod mime;
pub mod response;

pub use client::ImgBedClient;
pub use error::ImgBedError;
