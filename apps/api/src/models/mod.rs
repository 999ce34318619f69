pub mod prompt;
pub mod user;

pub use prompt::{PromptRow, PublicPrompt, UNTITLED_PROMPT};
pub use user::{PublicUser, UserRow};
