pub mod tips;

pub use tips::{LedgerSummary, TipStore};
