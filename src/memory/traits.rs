//! Trait definitions for pluggable text scoring.

/// Ranking backend shared by long-term memory and the local corpora.
///
/// Implementations score a text chunk against a query in `0.0..=1.0`.
/// Stateful scorers keep an index of known documents so rare terms weigh
/// more; stateless scorers can ignore `index`/`remove`.
pub trait MemorySearcher: Send + Sync {
    /// Backend name (e.g., "bm25").
    fn name(&self) -> &str;

    /// Score a text chunk against a query. Returns 0.0..=1.0.
    fn score(&self, chunk: &str, query: &str) -> f32;

    /// Index a document under `key`, replacing any previous text.
    fn index(&self, _key: &str, _text: &str) {}

    /// Remove a document from the index.
    fn remove(&self, _key: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedScorer(f32);

    impl MemorySearcher for FixedScorer {
        fn name(&self) -> &str {
            "fixed"
        }
        fn score(&self, _chunk: &str, _query: &str) -> f32 {
            self.0
        }
    }

    #[test]
    fn test_trait_object_construction() {
        let searcher: Box<dyn MemorySearcher> = Box::new(FixedScorer(0.5));
        assert_eq!(searcher.name(), "fixed");
        assert_eq!(searcher.score("hello", "world"), 0.5);
        searcher.index("key", "text");
        searcher.remove("key");
    }
}
