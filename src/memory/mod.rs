//! Long-term memory for chefbot.
//!
//! - `longterm`: the JSON-backed store of remembered facts
//! - `bm25_searcher`: keyword ranking shared with the local corpora
//! - `extractor`: post-turn hook that decides what is worth remembering

pub mod bm25_searcher;
pub mod extractor;
pub mod longterm;
pub mod traits;

pub use bm25_searcher::Bm25Searcher;
pub use extractor::{parse_extraction, ExtractionResult, LlmMemoryExtractor, MemoryExtractor};
pub use longterm::{LongTermMemory, MemoryEntry, MemoryType};
pub use traits::MemorySearcher;
