mod loader;

pub use loader::{load_documents, parse_document};

use crate::error::Result;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_MAX_RESULTS: usize = 5;
const QUESTION_WEIGHT: f64 = 2.0;

pub const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for", "from", "how",
    "i", "if", "in", "is", "it", "my", "of", "on", "or", "should", "that", "the", "this", "to",
    "was", "what", "when", "where", "which", "who", "why", "will", "with", "you",
];

#[derive(Debug, Clone, PartialEq)]
pub struct FaqDocument {
    pub filename: String,
    pub id: Option<String>,
    pub question: Option<String>,
    pub section: Option<String>,
    pub content: String,
    pub metadata: Map<String, Value>,
}

/// One search hit as handed to the model.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub content: String,
    #[serde(skip)]
    pub score: f64,
}

struct IndexedDocument {
    document: FaqDocument,
    question_terms: HashMap<String, usize>,
    content_terms: HashMap<String, usize>,
}

/// In-memory keyword index over FAQ entries.
pub struct FaqIndex {
    documents: Vec<IndexedDocument>,
    tokenizer: Regex,
}

impl FaqIndex {
    pub fn new(documents: Vec<FaqDocument>) -> Self {
        let tokenizer = Regex::new(r"[a-z0-9]+").expect("static regex");
        let documents = documents
            .into_iter()
            .map(|document| IndexedDocument {
                question_terms: term_counts(&tokenizer, document.question.as_deref().unwrap_or("")),
                content_terms: term_counts(&tokenizer, &document.content),
                document,
            })
            .collect();

        Self {
            documents,
            tokenizer,
        }
    }

    pub fn from_directory(root: &Path, filter: &str) -> Result<Self> {
        Ok(Self::new(load_documents(root, filter)?))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Top `limit` documents by weighted term frequency. Documents sharing
    /// no term with the query are never returned.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let query_terms = term_counts(&self.tokenizer, query);
        if query_terms.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = self
            .documents
            .iter()
            .filter_map(|indexed| {
                let score: f64 = query_terms
                    .keys()
                    .map(|term| {
                        let in_question = *indexed.question_terms.get(term).unwrap_or(&0) as f64;
                        let in_content = *indexed.content_terms.get(term).unwrap_or(&0) as f64;
                        in_question * QUESTION_WEIGHT + in_content
                    })
                    .sum();

                if score > 0.0 {
                    let doc = &indexed.document;
                    Some(SearchHit {
                        filename: doc.filename.clone(),
                        question: doc.question.clone(),
                        section: doc.section.clone(),
                        content: doc.content.clone(),
                        score,
                    })
                } else {
                    None
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.filename.cmp(&b.filename))
        });
        hits.truncate(limit);
        hits
    }
}

fn term_counts(tokenizer: &Regex, text: &str) -> HashMap<String, usize> {
    let lower = text.to_lowercase();
    let mut counts = HashMap::new();
    for token in tokenizer.find_iter(&lower).map(|m| m.as_str()) {
        if token.len() < 2 || STOP_WORDS.contains(&token) {
            continue;
        }
        *counts.entry(token.to_string()).or_insert(0) += 1;
    }
    counts
}
