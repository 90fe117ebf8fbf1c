pub mod gemini;
pub mod library;
pub mod models;
