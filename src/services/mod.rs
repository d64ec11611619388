pub mod conversation;
pub mod interruption;
pub mod recognizer;
