pub mod http;

pub use http::{FetchStreamTransport, HttpConversationBackend};
