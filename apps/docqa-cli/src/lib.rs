//! docqa-cli
//!
//! Terminal front end: the interactive controller that owns what the user
//! sees, and the command grammar of the prompt loop.

pub mod command;
pub mod controller;

pub use command::Command;
pub use controller::{InteractiveController, UiUpdate};
