//! Local document corpora for recipe and food-knowledge search.
//!
//! Both corpora are JSON files loaded once at startup and ranked with BM25.
//! A recipe is flattened into one text document (name, tags, difficulty,
//! description, ingredients, steps) so any of those fields can match.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{ChefError, Result};
use crate::memory::{Bm25Searcher, MemorySearcher};

/// One ingredient line of a recipe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    pub name: String,
    pub amount: String,
}

/// A recipe record as stored in the recipe corpus file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipe {
    pub recipe_id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
    pub cook_time_minutes: u32,
    /// 하 / 중 / 상
    pub difficulty: String,
    #[serde(default)]
    pub views: u64,
}

impl Recipe {
    /// Flatten the recipe into the text that is indexed and shown to the model.
    pub fn to_document_text(&self) -> String {
        let ingredients = self
            .ingredients
            .iter()
            .map(|i| format!("- {}: {}", i.name, i.amount))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "요리명: {} (ID: {})\n태그: {}\n난이도: {} (조리 시간: {}분)\n\n[소개]\n{}\n\n[재료]\n{}\n\n[조리법]\n{}",
            self.name,
            self.recipe_id,
            self.keywords.join(", "),
            self.difficulty,
            self.cook_time_minutes,
            self.description,
            ingredients,
            self.instructions.join("\n"),
        )
    }
}

/// A passage of the food-knowledge corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgePassage {
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
}

/// A searchable document.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Document {
    pub content: String,
    pub metadata: Value,
}

/// BM25-ranked collection of documents.
pub struct DocumentIndex {
    docs: Vec<Document>,
    searcher: Bm25Searcher,
}

impl DocumentIndex {
    /// Build an index over the given documents.
    pub fn new(docs: Vec<Document>) -> Self {
        let searcher = Bm25Searcher::new();
        for (i, doc) in docs.iter().enumerate() {
            searcher.index(&i.to_string(), &doc.content);
        }
        Self { docs, searcher }
    }

    /// Index recipes, keeping identifying fields as metadata.
    pub fn from_recipes(recipes: Vec<Recipe>, source: &str) -> Self {
        let docs = recipes
            .into_iter()
            .map(|r| Document {
                content: r.to_document_text(),
                metadata: json!({
                    "recipe_id": r.recipe_id,
                    "name": r.name,
                    "difficulty": r.difficulty,
                    "cook_time_minutes": r.cook_time_minutes,
                    "views": r.views,
                    "source": source,
                }),
            })
            .collect();
        Self::new(docs)
    }

    /// Index knowledge passages, keeping their source as metadata.
    pub fn from_passages(passages: Vec<KnowledgePassage>) -> Self {
        let docs = passages
            .into_iter()
            .map(|p| Document {
                content: p.content,
                metadata: json!({ "source": p.source }),
            })
            .collect();
        Self::new(docs)
    }

    /// Load a recipe corpus from a JSON array file.
    pub fn load_recipes(path: &Path) -> Result<Self> {
        let recipes: Vec<Recipe> = read_json(path)?;
        info!(path = %path.display(), count = recipes.len(), "Loaded recipe corpus");
        Ok(Self::from_recipes(recipes, &path.display().to_string()))
    }

    /// Load a knowledge corpus from a JSON array file.
    pub fn load_passages(path: &Path) -> Result<Self> {
        let passages: Vec<KnowledgePassage> = read_json(path)?;
        info!(path = %path.display(), count = passages.len(), "Loaded knowledge corpus");
        Ok(Self::from_passages(passages))
    }

    /// Up to `k` documents matching `query`, best first.
    pub fn search(&self, query: &str, k: usize) -> Vec<&Document> {
        let mut scored: Vec<(usize, f32)> = self
            .docs
            .iter()
            .enumerate()
            .map(|(i, doc)| (i, self.searcher.score(&doc.content, query)))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(k)
            .map(|(i, _)| &self.docs[i])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(ChefError::NotFound(format!("corpus {}", path.display())));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
