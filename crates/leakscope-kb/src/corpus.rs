//! JSONL corpus loading and retrieval.
//!
//! The corpus is loaded fully into memory at construction time; a missing
//! or malformed corpus file is fatal at init. Retrieval is deterministic
//! for an identical query and corpus.

use std::collections::HashSet;
use std::path::Path;

use tracing::info;

use leakscope_types::errors::LeakscopeError;
use leakscope_types::records::KbDocument;
use leakscope_types::traits::DocumentStore;

/// How `search` interprets the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Rank by the number of distinct query terms found in title + text.
    /// Documents matching no terms are dropped; ties keep corpus order.
    Keyword,
    /// Ignore the query and return the corpus front-to-back. This is the
    /// return-everything tool used to guarantee the model sees planted
    /// secrets regardless of its query.
    DumpAll,
}

impl RetrievalMode {
    /// Retrieval mode implied by a corpus variant letter.
    ///
    /// Variant `A` is the ranked corpus; every other variant is the
    /// dump-all stress corpus.
    pub fn for_variant(variant: &str) -> Self {
        if variant.eq_ignore_ascii_case("a") {
            RetrievalMode::Keyword
        } else {
            RetrievalMode::DumpAll
        }
    }
}

/// The mock knowledge-base search tool.
#[derive(Debug)]
pub struct KbSearchTool {
    docs: Vec<KbDocument>,
    mode: RetrievalMode,
}

impl KbSearchTool {
    /// Load a corpus from a JSONL file, one document per line.
    ///
    /// Blank lines are skipped. A missing file or an unparsable line is
    /// fatal; the harness must not run against a partial corpus.
    pub fn load(path: &Path, mode: RetrievalMode) -> Result<Self, LeakscopeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LeakscopeError::Kb(format!("corpus file not found: {}: {e}", path.display()))
        })?;

        let mut docs = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let doc: KbDocument = serde_json::from_str(line).map_err(|e| {
                LeakscopeError::Kb(format!(
                    "malformed corpus line {} in {}: {e}",
                    line_no + 1,
                    path.display()
                ))
            })?;
            docs.push(doc);
        }

        info!(
            path = %path.display(),
            docs = docs.len(),
            mode = ?mode,
            "loaded knowledge-base corpus"
        );
        Ok(Self { docs, mode })
    }

    /// Build a tool directly from documents. Intended for tests and
    /// synthetic corpora.
    pub fn from_docs(docs: Vec<KbDocument>, mode: RetrievalMode) -> Self {
        Self { docs, mode }
    }

    /// Number of documents in the corpus.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the corpus is empty.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn keyword_search(&self, query: &str, k: usize) -> Vec<KbDocument> {
        let lowered = query.to_lowercase();
        let terms: HashSet<&str> = lowered.split_whitespace().collect();
        if terms.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, &KbDocument)> = self
            .docs
            .iter()
            .filter_map(|doc| {
                let haystack = format!("{} {}", doc.title, doc.text).to_lowercase();
                let score = terms.iter().filter(|t| haystack.contains(*t)).count();
                (score > 0).then_some((score, doc))
            })
            .collect();

        // Stable sort: equal scores keep corpus order.
        scored.sort_by_key(|(score, _)| std::cmp::Reverse(*score));
        scored.into_iter().take(k).map(|(_, d)| d.clone()).collect()
    }
}

impl DocumentStore for KbSearchTool {
    fn search(&self, query: &str, k: usize) -> Vec<KbDocument> {
        match self.mode {
            RetrievalMode::DumpAll => self.docs.iter().take(k).cloned().collect(),
            RetrievalMode::Keyword => self.keyword_search(query, k),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn doc(id: &str, title: &str, text: &str) -> KbDocument {
        KbDocument {
            id: id.to_string(),
            title: title.to_string(),
            text: text.to_string(),
        }
    }

    fn sample_docs() -> Vec<KbDocument> {
        vec![
            doc("kb-001", "Password reset policy", "Resets expire after 24 hours."),
            doc("kb-002", "Refund policy", "Refunds are processed within 5 days."),
            doc("kb-003", "API usage note", "Internal API keys rotate monthly."),
        ]
    }

    #[test]
    fn test_dump_all_ignores_query() {
        let kb = KbSearchTool::from_docs(sample_docs(), RetrievalMode::DumpAll);
        let results = kb.search("completely unrelated query", 3);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].id, "kb-001");
    }

    #[test]
    fn test_dump_all_respects_k() {
        let kb = KbSearchTool::from_docs(sample_docs(), RetrievalMode::DumpAll);
        assert_eq!(kb.search("", 2).len(), 2);
    }

    #[test]
    fn test_keyword_ranks_by_term_overlap() {
        let kb = KbSearchTool::from_docs(sample_docs(), RetrievalMode::Keyword);
        let results = kb.search("refund policy", 3);

        // "refund policy" matches both terms in kb-002, only "policy" in kb-001.
        assert_eq!(results[0].id, "kb-002");
        assert_eq!(results[1].id, "kb-001");
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_keyword_drops_non_matching_docs() {
        let kb = KbSearchTool::from_docs(sample_docs(), RetrievalMode::Keyword);
        let results = kb.search("zebra", 3);
        assert!(results.is_empty());
    }

    #[test]
    fn test_keyword_is_case_insensitive() {
        let kb = KbSearchTool::from_docs(sample_docs(), RetrievalMode::Keyword);
        let results = kb.search("REFUND", 3);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "kb-002");
    }

    #[test]
    fn test_keyword_tie_keeps_corpus_order() {
        let kb = KbSearchTool::from_docs(sample_docs(), RetrievalMode::Keyword);
        // "policy" appears in kb-001 and kb-002 with equal score.
        let results = kb.search("policy", 3);
        assert_eq!(results[0].id, "kb-001");
        assert_eq!(results[1].id, "kb-002");
    }

    #[test]
    fn test_search_is_deterministic() {
        let kb = KbSearchTool::from_docs(sample_docs(), RetrievalMode::Keyword);
        let first = kb.search("api usage", 3);
        let second = kb.search("api usage", 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_load_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id":"d1","title":"One","text":"first"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"id":"d2","title":"Two","text":"second"}}"#).unwrap();

        let kb = KbSearchTool::load(file.path(), RetrievalMode::DumpAll).unwrap();
        assert_eq!(kb.len(), 2);
    }

    #[test]
    fn test_load_missing_file_is_fatal() {
        let err =
            KbSearchTool::load(Path::new("/nonexistent/kb_B.jsonl"), RetrievalMode::DumpAll)
                .unwrap_err();
        match err {
            LeakscopeError::Kb(msg) => assert!(msg.contains("kb_B.jsonl"), "got: {msg}"),
            other => panic!("expected Kb error, got: {other}"),
        }
    }

    #[test]
    fn test_load_malformed_line_reports_line_number() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id":"d1","title":"One","text":"first"}}"#).unwrap();
        writeln!(file, "not json at all").unwrap();

        let err = KbSearchTool::load(file.path(), RetrievalMode::DumpAll).unwrap_err();
        match err {
            LeakscopeError::Kb(msg) => assert!(msg.contains("line 2"), "got: {msg}"),
            other => panic!("expected Kb error, got: {other}"),
        }
    }

    #[test]
    fn test_mode_for_variant() {
        assert_eq!(RetrievalMode::for_variant("A"), RetrievalMode::Keyword);
        assert_eq!(RetrievalMode::for_variant("a"), RetrievalMode::Keyword);
        assert_eq!(RetrievalMode::for_variant("B"), RetrievalMode::DumpAll);
        assert_eq!(RetrievalMode::for_variant("C"), RetrievalMode::DumpAll);
    }
}
