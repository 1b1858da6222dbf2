// Application layer - the banker session that a front end drives.
// The CLI and the interactive loop both go through BankerSession.

pub mod config;
pub mod error;
pub mod session;

pub use config::*;
pub use error::*;
pub use session::*;
