pub mod bot;
pub mod settler;

pub use bot::{BotWorker, Command};
pub use settler::SettlementWorker;
