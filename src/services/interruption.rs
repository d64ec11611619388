//! Global interruptions checked before a message reaches the dialog stack.

pub const CANCEL_MESSAGE: &str = "Cancelling...";
pub const HELP_MESSAGE: &str =
    "I can set up a meeting for you. Answer the question below, or say \"cancel\" to stop.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interruption {
    Cancel,
    Help,
}

pub fn detect(message: &str) -> Option<Interruption> {
    match message.trim().to_lowercase().as_str() {
        "cancel" | "quit" => Some(Interruption::Cancel),
        "help" | "?" => Some(Interruption::Help),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(detect("Cancel"), Some(Interruption::Cancel));
        assert_eq!(detect("  quit "), Some(Interruption::Cancel));
        assert_eq!(detect("help"), Some(Interruption::Help));
        assert_eq!(detect("?"), Some(Interruption::Help));
        assert_eq!(detect("cancel the meeting with bob"), None);
        assert_eq!(detect("Planning"), None);
    }
}
