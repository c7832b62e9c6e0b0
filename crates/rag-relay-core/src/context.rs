//! Retrieval context assembly.
//!
//! Turns a ranked list of documents into the single system message that is
//! injected ahead of the conversation:
//!
//! 1. Load each document through a [`ContentLoader`], in rank order.
//! 2. Join the contents with `"\n"`.
//! 3. Truncate the joined text to the character budget ([`truncate_chars`]).
//! 4. Wrap the result in the fixed instruction template.
//!
//! Loading is all-or-nothing: a missing document fails the whole assembly.

use async_trait::async_trait;

use crate::error::PipelineError;
use crate::models::{ChatMessage, DocumentReference, RankedCandidate};

/// Default character budget for the joined context text.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 16384;

/// Instruction text placed before the retrieved context.
pub const CONTEXT_PREAMBLE: &str = "You are a helpful assistant that replies to user messages. \
You are a Ruby on Rails and React expert. You have extensive knowledge of how designs systems \
work and best practices, especially the Primer design system.  Use the following context when \
responding to a message.\n";

/// Reads the raw content of a retrieved document.
#[async_trait]
pub trait ContentLoader: Send + Sync {
    async fn load(&self, reference: &DocumentReference) -> std::io::Result<Vec<u8>>;
}

/// Truncate `text` to at most `max_chars` characters.
///
/// Counts Unicode scalar values and always cuts on a character boundary.
/// Returns the input unchanged when it already fits.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Load, join, and truncate the contents of `candidates`.
pub async fn join_contents<L: ContentLoader + ?Sized>(
    candidates: &[RankedCandidate],
    loader: &L,
    max_chars: usize,
) -> Result<String, PipelineError> {
    let mut contents = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let bytes = loader
            .load(&candidate.reference)
            .await
            .map_err(|source| PipelineError::ContentLoad {
                reference: candidate.reference.path.clone(),
                source,
            })?;
        contents.push(String::from_utf8_lossy(&bytes).into_owned());
    }

    let joined = contents.join("\n");
    Ok(truncate_chars(&joined, max_chars).to_string())
}

/// Wrap context text into the system instruction message.
pub fn context_message(context: &str) -> ChatMessage {
    ChatMessage::system(format!("{}Context: {}", CONTEXT_PREAMBLE, context))
}

/// Build the system message for a set of retrieved documents.
///
/// Returns `Ok(None)` for an empty candidate list: a turn without context
/// gets no system message at all.
pub async fn assemble_context<L: ContentLoader + ?Sized>(
    candidates: &[RankedCandidate],
    loader: &L,
    max_chars: usize,
) -> Result<Option<ChatMessage>, PipelineError> {
    if candidates.is_empty() {
        return Ok(None);
    }
    let text = join_contents(candidates, loader, max_chars).await?;
    Ok(Some(context_message(&text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatRole;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MapLoader {
        docs: HashMap<String, String>,
        calls: Mutex<Vec<String>>,
    }

    impl MapLoader {
        fn new(docs: &[(&str, &str)]) -> Self {
            Self {
                docs: docs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ContentLoader for MapLoader {
        async fn load(&self, reference: &DocumentReference) -> std::io::Result<Vec<u8>> {
            self.calls.lock().unwrap().push(reference.path.clone());
            self.docs
                .get(&reference.path)
                .map(|s| s.as_bytes().to_vec())
                .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))
        }
    }

    fn ranked(paths: &[&str]) -> Vec<RankedCandidate> {
        paths
            .iter()
            .enumerate()
            .map(|(i, p)| RankedCandidate {
                reference: DocumentReference::from_path(*p),
                score: 1.0 - i as f32 * 0.1,
            })
            .collect()
    }

    #[test]
    fn test_truncate_shorter_is_noop() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_exact_chars() {
        assert_eq!(truncate_chars("hello world", 5), "hello");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_truncate_multibyte_boundary() {
        let text = "héllo wörld ✓✓✓";
        let cut = truncate_chars(text, 13);
        assert_eq!(cut.chars().count(), 13);
        assert_eq!(cut, "héllo wörld ✓");
    }

    #[tokio::test]
    async fn test_over_budget_is_exactly_max_chars() {
        let (a, b, c) = ("a".repeat(40), "b".repeat(40), "c".repeat(40));
        let loader = MapLoader::new(&[("a.mdx", a.as_str()), ("b.mdx", b.as_str()), ("c.mdx", c.as_str())]);
        let text = join_contents(&ranked(&["a.mdx", "b.mdx", "c.mdx"]), &loader, 100)
            .await
            .unwrap();
        assert_eq!(text.chars().count(), 100);
        assert!(text.starts_with(&"a".repeat(40)));
        assert_eq!(&text[40..41], "\n");
    }

    #[tokio::test]
    async fn test_under_budget_is_full_concatenation() {
        let loader = MapLoader::new(&[("a.mdx", "alpha"), ("b.mdx", "beta"), ("c.mdx", "gamma")]);
        let text = join_contents(&ranked(&["c.mdx", "a.mdx", "b.mdx"]), &loader, 100)
            .await
            .unwrap();
        assert_eq!(text, "gamma\nalpha\nbeta");
    }

    #[tokio::test]
    async fn test_empty_candidates_yield_no_message() {
        let loader = MapLoader::new(&[]);
        let msg = assemble_context(&[], &loader, 100).await.unwrap();
        assert!(msg.is_none());
        assert!(loader.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_message_wraps_template() {
        let loader = MapLoader::new(&[("a.mdx", "Buttons are great.")]);
        let msg = assemble_context(&ranked(&["a.mdx"]), &loader, DEFAULT_MAX_CONTEXT_CHARS)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(msg.role, ChatRole::System);
        assert!(msg.content.starts_with(CONTEXT_PREAMBLE));
        assert!(msg.content.ends_with("Context: Buttons are great."));
    }

    #[tokio::test]
    async fn test_missing_document_fails_whole_assembly() {
        let loader = MapLoader::new(&[("a.mdx", "alpha")]);
        let err = assemble_context(&ranked(&["a.mdx", "gone.mdx"]), &loader, 100)
            .await
            .unwrap_err();
        match err {
            PipelineError::ContentLoad { reference, .. } => assert_eq!(reference, "gone.mdx"),
            other => panic!("expected ContentLoad, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_loads_in_rank_order() {
        let loader = MapLoader::new(&[("a.mdx", "1"), ("b.mdx", "2")]);
        join_contents(&ranked(&["b.mdx", "a.mdx"]), &loader, 100)
            .await
            .unwrap();
        assert_eq!(*loader.calls.lock().unwrap(), vec!["b.mdx", "a.mdx"]);
    }
}
