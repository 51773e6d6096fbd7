//! Knowledge base adapters.

mod article_knowledge_base;

pub use article_knowledge_base::{ArticleKnowledgeBase, DEFAULT_RELEVANCE_THRESHOLD};
