//! Address safety checks.
//!
//! Classifies addresses the validation server would refuse to contact.

mod reserved;

pub use reserved::is_address_reserved;
