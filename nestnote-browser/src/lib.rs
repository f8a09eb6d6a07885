//! Folder-browsing screen controllers for Nest Note.
//!
//! The GUI shell owns one [`FolderBrowser`] per visible folder screen and
//! renders its [`sections`](FolderBrowser::sections). Everything here runs on
//! the shell's UI thread; fetches are applied through liveness tokens and
//! section builds through a single-slot gate.

pub mod browser;
pub mod build_gate;
pub mod liveness;

// Re-export the core library so the shell needs a single dependency.
pub use nestnote_core::*;

#[doc(inline)]
pub use browser::{CompletedBuild, EntryOpen, FolderBrowser, LoadState, PendingBuild};
#[doc(inline)]
pub use build_gate::{BuildGate, BuildTicket};
#[doc(inline)]
pub use liveness::{AliveToken, Liveness};
