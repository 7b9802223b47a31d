//! Artdrop Upload Pipeline
//!
//! The client-side engine behind the batch character uploader: a shared
//! [`BatchStore`] holding file state, duplicate checks with stale-response
//! protection, a sequential batch [`UploadExecutor`], single-slot undo,
//! connectivity monitoring, and random name generation. [`UploadSession`]
//! wires the pieces together around one scoped event notifier.

pub mod checks;
pub mod executor;
pub mod names;
pub mod network;
pub mod preview;
pub mod session;
pub mod store;
pub mod undo;

// Re-export commonly used types
pub use checks::{run_checks, CheckSummary};
pub use executor::UploadExecutor;
pub use names::{NameGenerator, FALLBACK_NAMES};
pub use network::{ConnectionClass, LinkState, NetworkMonitor};
pub use preview::Preview;
pub use session::{SessionRemotes, UploadSession};
pub use store::{BatchStore, CheckOutcome, CheckTicket, FileIntake, IntakeReport, RejectedFile};
