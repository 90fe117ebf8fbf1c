pub mod ai_parser;
pub mod ai_prompt;
pub mod import_session;
pub mod matcher;
pub mod notifications;
pub mod rebuild;
pub mod registration;
pub mod resolution;
