pub mod application;
pub mod cli;
pub mod domain;
pub mod storage;

pub use application::{AppError, BankerConfig, BankerSession};
pub use domain::*;
pub use storage::StateStore;
