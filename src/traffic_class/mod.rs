//! Traffic class records and their editing sessions
//!
//! A [`TrafficClassSession`] edits one [`TrafficClass`] either through the
//! tree editor or as raw text, and saves it through a [`TrafficClassStore`].

mod raw;
mod record;
mod session;
mod store;

pub use raw::{parser_for, ExpressionParser, RawTextParser, YamlWireParser};
pub use record::{SiteId, TrafficClass};
pub use session::{EditMode, TrafficClassSession};
pub use store::{MemoryStore, TrafficClassStore};
