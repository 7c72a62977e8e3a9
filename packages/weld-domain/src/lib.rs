pub mod contact;
pub mod resolve;

pub use contact::{Contact, ContactSummary, LinkPrecedence};
