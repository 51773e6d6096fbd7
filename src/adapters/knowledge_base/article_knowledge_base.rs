//! Knowledge base over a fixed set of help-center articles.
//!
//! Articles are pulled once from an [`ArticleSource`] and tokenized. A query is
//! scored against each article by how many of its terms appear in the title,
//! tags or body; the best article above the relevance threshold is summarized
//! for voice.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::ports::{
    AIProvider, Article, ArticleSource, CompletionRequest, KnowledgeBase, KnowledgeBaseError,
    MessageRole, RequestMetadata,
};

pub const DEFAULT_RELEVANCE_THRESHOLD: f64 = 0.5;

const TITLE_WEIGHT: f64 = 1.0;
const TAG_WEIGHT: f64 = 1.0;
const CONTENT_WEIGHT: f64 = 0.6;

/// Units of text kept by the extractive summary, after the title.
const EXTRACT_UNITS: usize = 3;

const SUMMARY_PROMPT: &str = "You summarize help-center articles for a phone support assistant. \
Answer the caller's question using only the article. \
Use two or three short sentences that sound natural when read aloud, \
and include concrete steps when they matter.";

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "you", "your", "with", "this", "that", "have", "has", "was", "are",
    "can", "cant", "can't", "not", "but", "how", "what", "why", "when", "where", "who", "from",
    "about", "into", "our", "out", "get", "got", "need", "want", "help", "please", "there",
    "some", "any", "its", "it's", "i'm", "my", "me", "is", "to", "do", "does", "did",
];

struct IndexedArticle {
    article: Article,
    title: HashSet<String>,
    tags: HashSet<String>,
    content: HashSet<String>,
}

impl IndexedArticle {
    fn new(article: Article) -> Self {
        let tags = article
            .tags
            .iter()
            .flat_map(|t| tokenize(t))
            .collect::<HashSet<_>>();
        Self {
            title: tokenize(&article.title).into_iter().collect(),
            content: tokenize(&article.content).into_iter().collect(),
            tags,
            article,
        }
    }

    /// Weighted fraction of query terms found in the article, in `[0, 1]`.
    fn score(&self, terms: &[String]) -> f64 {
        if terms.is_empty() {
            return 0.0;
        }
        let total: f64 = terms
            .iter()
            .map(|term| {
                if matches_any(term, &self.title) {
                    TITLE_WEIGHT
                } else if matches_any(term, &self.tags) {
                    TAG_WEIGHT
                } else if matches_any(term, &self.content) {
                    CONTENT_WEIGHT
                } else {
                    0.0
                }
            })
            .sum();
        total / terms.len() as f64
    }
}

pub struct ArticleKnowledgeBase {
    source: Arc<dyn ArticleSource>,
    summarizer: Option<Arc<dyn AIProvider>>,
    threshold: f64,
    index: RwLock<Option<Vec<IndexedArticle>>>,
}

impl ArticleKnowledgeBase {
    pub fn new(source: Arc<dyn ArticleSource>) -> Self {
        Self {
            source,
            summarizer: None,
            threshold: DEFAULT_RELEVANCE_THRESHOLD,
            index: RwLock::new(None),
        }
    }

    /// Uses a language model for summaries instead of the extractive fallback.
    pub fn with_summarizer(mut self, provider: Arc<dyn AIProvider>) -> Self {
        self.summarizer = Some(provider);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Best article for the query, with its score, if any clears the threshold.
    pub async fn best_match(&self, query: &str) -> Result<Option<(Article, f64)>, KnowledgeBaseError> {
        let guard = self.index.read().await;
        let index = guard.as_ref().ok_or(KnowledgeBaseError::NotInitialized)?;

        let terms = tokenize(query);
        let best = index
            .iter()
            .map(|entry| (entry, entry.score(&terms)))
            .max_by(|a, b| a.1.total_cmp(&b.1));

        Ok(match best {
            Some((entry, score)) if score >= self.threshold => {
                Some((entry.article.clone(), score))
            }
            Some((entry, score)) => {
                debug!(article_id = %entry.article.id, score, "Best article below threshold");
                None
            }
            None => None,
        })
    }

    async fn summarize(&self, article: &Article, query: &str) -> String {
        let Some(provider) = &self.summarizer else {
            return extractive_summary(article);
        };

        let request = CompletionRequest::new(RequestMetadata::new("summarize_article"))
            .with_system_prompt(SUMMARY_PROMPT)
            .with_message(
                MessageRole::User,
                format!(
                    "Question: {}\n\nArticle title: {}\n\nArticle:\n{}",
                    query, article.title, article.content
                ),
            )
            .with_max_tokens(150)
            .with_temperature(0.3);

        match provider.complete(request).await {
            Ok(response) if !response.content.trim().is_empty() => response.content.trim().to_string(),
            Ok(_) => extractive_summary(article),
            Err(err) => {
                warn!(error = %err, article_id = %article.id, "Summary generation failed, using extract");
                extractive_summary(article)
            }
        }
    }
}

#[async_trait]
impl KnowledgeBase for ArticleKnowledgeBase {
    async fn initialize(&self) -> Result<(), KnowledgeBaseError> {
        let articles = self.source.list_articles().await?;
        let count = articles.len();
        let indexed = articles.into_iter().map(IndexedArticle::new).collect();
        *self.index.write().await = Some(indexed);
        info!(articles = count, "Knowledge base initialized");
        Ok(())
    }

    async fn search_and_summarize(&self, query: &str) -> Result<Option<String>, KnowledgeBaseError> {
        match self.best_match(query).await? {
            Some((article, score)) => {
                debug!(article_id = %article.id, score, "Matched article");
                Ok(Some(self.summarize(&article, query).await))
            }
            None => Ok(None),
        }
    }
}

/// Lowercased word tokens with stopwords and very short words removed.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\'').to_lowercase())
        .filter(|t| t.len() >= 3 && !STOPWORDS.contains(&t.as_str()))
        .collect()
}

/// Exact match, or a shared stem of at least four characters ("bill" / "billing").
fn matches_any(term: &str, words: &HashSet<String>) -> bool {
    words.contains(term)
        || words.iter().any(|w| {
            let (short, long) = if w.len() <= term.len() { (w.as_str(), term) } else { (term, w.as_str()) };
            short.len() >= 4 && long.starts_with(short)
        })
}

/// Title followed by the first few lines or sentences of the body.
pub(crate) fn extractive_summary(article: &Article) -> String {
    let units: Vec<String> = article
        .content
        .lines()
        .map(|line| line.trim().trim_start_matches(|c: char| c.is_ascii_digit() || matches!(c, '.' | '-' | '*' | ')')).trim())
        .filter(|line| !line.is_empty())
        .flat_map(split_sentences)
        .take(EXTRACT_UNITS)
        .collect();

    let mut summary = terminate(article.title.trim());
    for unit in units {
        summary.push(' ');
        summary.push_str(&terminate(&unit));
    }
    summary
}

fn split_sentences(line: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for c in line.chars() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            let s = current.trim().to_string();
            if !s.is_empty() {
                sentences.push(s);
            }
            current.clear();
        }
    }
    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

fn terminate(text: &str) -> String {
    let text = text.trim_end_matches(':');
    if text.ends_with(['.', '!', '?']) {
        text.to_string()
    } else {
        format!("{}.", text)
    }
}
