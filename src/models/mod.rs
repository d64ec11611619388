pub mod booking;
pub mod session;
pub mod timex;

pub use booking::{BookingDetails, BookingPatch};
pub use session::DialogSession;
pub use timex::{TimexError, TimexProperty, TimexType};
