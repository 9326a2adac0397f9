pub mod ports;
pub mod stream;
pub mod store;
pub mod machine;
pub mod lifecycle;
pub mod session;
pub mod directory;
pub mod event_bus;


pub use tokio_util::sync::CancellationToken;
pub use directory::ConversationDirectory;
pub use event_bus::EventBus;
pub use session::{ChatSession, SendOutcome};
