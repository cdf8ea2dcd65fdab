//! # CTC History
//!
//! Lookup history for the Clean Truck Check compliance coach.
//!
//! ```text
//! UI event ──> HistoryCommand
//!                 │
//!                 ├──> HistoryManager   normalize, dedupe, prepend, cap
//!                 │       └─> Store     write-through, one key per bucket
//!                 │
//!                 └──> QueryView        filter + stable sort, display only
//! ```
//!
//! History is kept per signed-in identity (or in one global bucket while anonymous),
//! capped at [`DEFAULT_CAP`] entries unless configured otherwise.
//!
//! ## Example
//!
//! ```
//! use ctc_history::{project, HistoryConfig, HistoryManager, LookupKind, SortMode};
//! use ctc_store::MemoryStore;
//!
//! let mut history = HistoryManager::new(MemoryStore::new(), HistoryConfig::default());
//! history.record_lookup(" 1hgbh41jxmn109186", LookupKind::Vin);
//! let list = history.record_lookup("1HGBH41JXMN109186", LookupKind::Vin);
//! assert_eq!(list.len(), 1);
//!
//! let view = project(&list, "186", SortMode::Newest);
//! assert_eq!(view[0].value, "1HGBH41JXMN109186");
//! ```

mod clock;
mod commands;
mod error;
mod item;
pub mod keys;
mod manager;
pub mod prefs;
mod query;
pub mod recent;
pub mod session;

pub use clock::{Clock, IdMint, ManualClock, SystemClock};
pub use commands::{HistoryCommand, HistoryController};
pub use error::{HistoryError, Result};
pub use item::{lookup_url_for, normalize_value, HistoryItem, LookupKind, LOOKUP_ENDPOINT};
pub use manager::{Bucket, BucketPolicy, HistoryConfig, HistoryManager, DEFAULT_CAP};
pub use prefs::Theme;
pub use query::{project, QueryView, SortMode};
