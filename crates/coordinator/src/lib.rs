pub mod actions;
pub mod reducer;
pub mod scheduler;
pub mod selection;
pub mod state;
pub mod store;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

pub use actions::Action;
pub use reducer::{effect_for, reduce};
pub use scheduler::{Effect, EffectScheduler};
pub use state::{Collection, ConflictPolicy, OperationKind, PendingOp, PendingSet, RosterState};
pub use store::{DispatchHandle, RosterStore, StoreClosed, StoreOptions};
