pub mod layout;
pub mod ledger;

pub use layout::StorageLayout;
pub use ledger::RecordLedger;
