mod account;
mod history;
mod ledger;
mod money;
mod name_reset;
mod player;
mod snapshot;

pub use account::*;
pub use history::*;
pub use ledger::*;
pub use money::*;
pub use name_reset::*;
pub use player::*;
pub use snapshot::*;
