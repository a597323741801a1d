pub mod controller;
pub mod state;

pub use controller::ChatController;
pub use state::{ChatAction, ChatEntry, ChatPhase, ChatView, Delivery};
