// Models module - Database entity representations

pub mod slot;

pub use slot::{SlotId, SlotRecord, SlotState, SlotStatus};
