//! Request handlers.

pub mod caption;
pub mod health;
pub mod process;
pub mod tts;

pub use caption::*;
pub use health::*;
pub use process::*;
pub use tts::*;
