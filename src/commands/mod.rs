//! Screen actions. Errors stop here and become the status text the user sees.

pub mod catalog;
pub mod chat;
pub mod settings;
