//! Library side of the streaming report CLI.

pub mod logging;
pub mod settings;
