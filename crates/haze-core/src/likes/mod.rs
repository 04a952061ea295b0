pub mod local;
pub mod reconcile;
pub mod set;

pub use local::LocalLikeStore;
pub use reconcile::{LikeReconciler, RemoveOutcome, SingleFlight, SyncReport, ToggleOutcome};
pub use set::{LikeSet, Merge, needs_write_back};
