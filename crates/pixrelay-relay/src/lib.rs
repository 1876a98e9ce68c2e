pub mod error;
pub mod inflight;
pub mod relay;
pub mod reply;

pub use error::RelayError;
pub use relay::{Relay, RelayOutcome, RelaySettings};
pub use reply::render_reply_text;
