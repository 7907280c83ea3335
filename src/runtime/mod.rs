//! Host collaborators and the script-facing API surface.

pub mod api;
pub mod clock;

pub use api::{ScriptApi, ThreadSnapshot};
pub use clock::{FrameClock, HostClock, ManualClock};
