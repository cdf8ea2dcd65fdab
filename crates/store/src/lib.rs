//! # CTC Store
//!
//! Local persistent key-value storage for the compliance coach: one JSON document per
//! key, surviving restarts on a single device.
//!
//! ```text
//! Store (trait)
//!     ├──> FileStore   <data dir>/<key>.json, tmp + rename writes
//!     └──> MemoryStore BTreeMap, tests and embedders
//!
//! read_json / read_json_or_default / write_json
//!     └──> corrupt content becomes an empty collection, never an error upstream
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use ctc_store::{read_json_or_default, write_json, FileStore};
//!
//! fn main() -> ctc_store::Result<()> {
//!     let mut store = FileStore::open("/tmp/ctc")?;
//!     let mut seen: Vec<String> = read_json_or_default(&store, "seen");
//!     seen.push("1HGBH41JXMN109186".to_string());
//!     write_json(&mut store, "seen", &seen)?;
//!     Ok(())
//! }
//! ```

mod error;
mod file;
mod json;
mod memory;
mod store;

pub use error::{DecodeError, Result, StoreError};
pub use file::FileStore;
pub use json::{read_json, read_json_or_default, write_json};
pub use memory::MemoryStore;
pub use store::{validate_key, Store};
