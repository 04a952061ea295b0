//! Quote browsing state: which positions were shown, and the fade gate that
//! paces movement between them.

pub mod history;
pub mod transition;

pub use history::{MAX_HISTORY, NavigationHistory};
pub use transition::{FadeStep, NavAction, TransitionGate};
