//! Search index over node labels and configuration keys.
//!
//! This module provides an inverted n-gram index that narrows substring
//! search to the terms sharing all of the query's n-grams, instead of a
//! linear scan over every key.
//!
//! The index is built from one graph snapshot and owns everything it
//! returns. When the graph is replaced, build a new index.

use crate::graph::ConfigGraph;
use crate::node::GraphNode;
use confgraph_core::{ConfigSearchResult, UsageLocation};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Minimum n-gram length for indexing.
const MIN_NGRAM_LEN: usize = 2;

/// Maximum n-gram length for indexing.
const MAX_NGRAM_LEN: usize = 4;

/// Where inside a node a term was found. Labels rank before keys, keys
/// rank by their position in the node's key list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchSite {
    Label,
    Key(usize),
}

/// One searchable string.
#[derive(Debug, Clone)]
struct Term {
    /// Lowercased text.
    text: String,
    /// Position of the owning node in `SearchIndex::nodes`.
    node: usize,
    site: MatchSite,
}

/// An inverted index for label and key search.
#[derive(Debug, Default, Clone)]
pub struct SearchIndex {
    /// Indexed nodes, sorted by id.
    nodes: Vec<Arc<GraphNode>>,
    /// Every label and key, in node order.
    terms: Vec<Term>,
    /// Maps lowercased n-grams to term positions.
    ngram_index: HashMap<String, HashSet<usize>>,
}

impl SearchIndex {
    /// Builds the index for a graph. Linear in the total number of keys.
    pub fn build(graph: &ConfigGraph) -> Self {
        let mut nodes: Vec<Arc<GraphNode>> = graph.nodes().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut index = Self {
            nodes: Vec::with_capacity(nodes.len()),
            terms: Vec::new(),
            ngram_index: HashMap::new(),
        };

        for (position, node) in nodes.iter().enumerate() {
            index.insert_term(&node.label, position, MatchSite::Label);
            for (key_position, key) in node.keys().iter().enumerate() {
                index.insert_term(key, position, MatchSite::Key(key_position));
            }
        }

        index.nodes = nodes;
        index
    }

    fn insert_term(&mut self, text: &str, node: usize, site: MatchSite) {
        let lower = text.to_lowercase();
        let term_id = self.terms.len();

        for ngram in generate_ngrams(&lower) {
            self.ngram_index.entry(ngram).or_default().insert(term_id);
        }

        self.terms.push(Term {
            text: lower,
            node,
            site,
        });
    }

    /// Case-insensitive substring search over labels and keys.
    ///
    /// An empty query returns nothing. Results are ordered by the earliest
    /// match inside each node (label first, then key position), ties broken
    /// by node id.
    pub fn search_by_text(&self, query: &str) -> Vec<Arc<GraphNode>> {
        if query.is_empty() {
            return Vec::new();
        }

        let query_lower = query.to_lowercase();
        let mut best: BTreeMap<usize, MatchSite> = BTreeMap::new();

        for term_id in self.candidates(&query_lower) {
            let term = &self.terms[term_id];
            // n-gram intersection can have false positives
            if !term.text.contains(&query_lower) {
                continue;
            }
            best.entry(term.node)
                .and_modify(|site| *site = (*site).min(term.site))
                .or_insert(term.site);
        }

        let mut ranked: Vec<(MatchSite, usize)> =
            best.into_iter().map(|(node, site)| (site, node)).collect();
        // Nodes are stored in id order, so position order is id order.
        ranked.sort();

        ranked
            .into_iter()
            .map(|(_, node)| Arc::clone(&self.nodes[node]))
            .collect()
    }

    /// Term positions that may contain the query.
    fn candidates(&self, query_lower: &str) -> Vec<usize> {
        // For very short queries, every term is a candidate
        if query_lower.chars().count() < MIN_NGRAM_LEN {
            return (0..self.terms.len()).collect();
        }

        let mut candidates: Option<HashSet<usize>> = None;

        for ngram in generate_ngrams(query_lower) {
            let Some(ids) = self.ngram_index.get(&ngram) else {
                // If any n-gram has no matches, the query has no results
                return Vec::new();
            };
            match &mut candidates {
                None => candidates = Some(ids.clone()),
                Some(c) => c.retain(|id| ids.contains(id)),
            }
        }

        let mut ids: Vec<usize> = candidates.unwrap_or_default().into_iter().collect();
        ids.sort_unstable();
        ids
    }

    /// Finds where `key` is declared across the indexed files.
    ///
    /// A declared key matches when it equals `key` or is nested under it
    /// (`key.child`, `key[0]`). Matching is case-sensitive. Results are
    /// grouped per file in path order; each carries one usage per matching
    /// declaration, in key-list order. Only the loaded key lists are
    /// consulted, so line and column are unknown.
    pub fn find_usages(&self, key: &str) -> Vec<ConfigSearchResult> {
        if key.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<ConfigSearchResult> = self
            .nodes
            .iter()
            .filter_map(|node| {
                let source = node.as_file()?;
                let usages: Vec<UsageLocation> = source
                    .keys
                    .iter()
                    .filter(|declared| key_matches(declared, key))
                    .map(|declared| UsageLocation {
                        file: source.path.clone(),
                        line: None,
                        column: None,
                        context: declared.clone(),
                    })
                    .collect();

                (!usages.is_empty()).then(|| ConfigSearchResult {
                    key: key.to_string(),
                    file: source.path.clone(),
                    value: None,
                    usages,
                })
            })
            .collect();

        results.sort_by(|a, b| a.file.cmp(&b.file));
        results
    }

    /// Returns the number of indexed nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of indexed labels and keys.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }
}

/// Whether `declared` is `key` itself or nested under it.
fn key_matches(declared: &str, key: &str) -> bool {
    match declared.strip_prefix(key) {
        Some("") => true,
        Some(rest) => rest.starts_with('.') || rest.starts_with('['),
        None => false,
    }
}

/// Generates n-grams for a lowercased string.
fn generate_ngrams(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut ngrams = Vec::new();

    for n in MIN_NGRAM_LEN..=MAX_NGRAM_LEN {
        if chars.len() >= n {
            for i in 0..=(chars.len() - n) {
                ngrams.push(chars[i..i + n].iter().collect());
            }
        }
    }

    ngrams
}
