//! Admission control for asynchronous thumbnail and image loads.

pub mod queue;
pub mod state;

pub use queue::{LoadHandle, LoadQueue, PathLoadQueue};
pub use state::{Admission, AdmissionState, Completion};
