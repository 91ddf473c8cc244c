//! Canonical labeling of blank nodes.
//!
//! The algorithm follows [RDF Dataset Canonicalization](https://www.w3.org/TR/rdf-canon/):
//! blank nodes are first distinguished by the hash of the quads they appear in
//! and the remaining ties are broken by exploring the permutations of their related blank nodes.

use crate::issuer::IdentifierIssuer;
use crate::permutation::{for_each_permutation, permutation_count};
use crate::{BlankNode, Dataset, Quad, TermSerializer};
use sha2::Digest;
use std::collections::BTreeMap;
use tracing::{debug, trace};

const CANONICAL_PREFIX: &str = "c14n";
const TEMPORARY_PREFIX: &str = "b";

/// The digest algorithm used to hash serialized quads. Digests are written as lowercase hexadecimal strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha384,
}

impl HashAlgorithm {
    pub fn digest(self, data: &str) -> String {
        match self {
            Self::Sha256 => hex::encode(sha2::Sha256::digest(data.as_bytes())),
            Self::Sha384 => hex::encode(sha2::Sha384::digest(data.as_bytes())),
        }
    }
}

/// Computes canonical labels for the blank nodes of a [`Dataset`].
///
/// Two isomorphic datasets get the same canonical form,
/// whatever the original blank node identifiers and insertion order are.
/// ```
/// use yardf::*;
///
/// let ex = NamedNode::new("http://example.com/knows")?;
/// let mut dataset = Dataset::new();
/// dataset.add(&Quad::new_default_graph(BlankNode::new("x")?, ex.clone(), BlankNode::new("y")?)?);
/// dataset.add(&Quad::new_default_graph(BlankNode::new("y")?, ex, BlankNode::new("x")?)?);
///
/// let canonical = Canonicalizer::new().canonicalize(&dataset)?;
/// assert_eq!(
///     canonical.to_string(),
///     "_:c14n0 <http://example.com/knows> _:c14n1 .\n_:c14n1 <http://example.com/knows> _:c14n0 .\n"
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
///
/// The worst case complexity is factorial in the number of related blank nodes that can't be distinguished.
/// [`with_permutation_limit`](Self::with_permutation_limit) and [`with_depth_limit`](Self::with_depth_limit)
/// allow to bound the work done on untrusted data.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct Canonicalizer {
    hash_algorithm: HashAlgorithm,
    permutation_limit: Option<usize>,
    depth_limit: Option<usize>,
}

impl Canonicalizer {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the digest algorithm. SHA-256 is the default.
    #[inline]
    pub fn with_hash_algorithm(mut self, hash_algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = hash_algorithm;
        self
    }

    /// Fails if more than `limit` permutations of related blank nodes would have to be explored at once.
    #[inline]
    pub fn with_permutation_limit(mut self, limit: usize) -> Self {
        self.permutation_limit = Some(limit);
        self
    }

    /// Fails if the exploration of related blank nodes recurses deeper than `limit`.
    #[inline]
    pub fn with_depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = Some(limit);
        self
    }

    /// Returns a copy of the dataset with each blank node replaced by its canonical label.
    pub fn canonicalize(&self, dataset: &Dataset) -> Result<Dataset, CanonicalizationError> {
        let labels = self.canonical_labels(dataset)?;
        Ok(dataset
            .iter()
            .map(|quad| {
                quad.map_blank_nodes(&mut |node| {
                    labels.get(node).cloned().unwrap_or_else(|| node.clone())
                })
            })
            .collect())
    }

    /// Returns the map from the dataset blank nodes to their canonical labels (`c14n0`, `c14n1`...).
    pub fn canonical_labels(
        &self,
        dataset: &Dataset,
    ) -> Result<BTreeMap<BlankNode, BlankNode>, CanonicalizationError> {
        CanonicalizationState::new(self, dataset.iter().collect()).run()
    }
}

/// An error raised when canonicalization exceeds a resource limit of the [`Canonicalizer`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum CanonicalizationError {
    #[error(
        "Distinguishing {nodes} related blank nodes requires more than the limit of {limit} permutations"
    )]
    TooManyPermutations { nodes: usize, limit: usize },
    #[error("The exploration of related blank nodes is deeper than the limit of {limit}")]
    DepthLimitExceeded { limit: usize },
}

struct CanonicalizationState<'a> {
    config: &'a Canonicalizer,
    quads: Vec<Quad>,
    /// Indexes in `quads` of the quads each blank node appears in
    quads_by_blank_node: BTreeMap<BlankNode, Vec<usize>>,
    first_degree_hashes: BTreeMap<BlankNode, String>,
    canonical_issuer: IdentifierIssuer,
}

impl<'a> CanonicalizationState<'a> {
    fn new(config: &'a Canonicalizer, quads: Vec<Quad>) -> Self {
        let mut quads_by_blank_node = BTreeMap::<BlankNode, Vec<usize>>::new();
        for (i, quad) in quads.iter().enumerate() {
            for term in [quad.subject(), quad.object(), quad.graph_name()] {
                term.for_each_blank_node(&mut |node| {
                    let indexes = quads_by_blank_node.entry(node.clone()).or_default();
                    if indexes.last() != Some(&i) {
                        indexes.push(i);
                    }
                });
            }
        }
        Self {
            config,
            quads,
            quads_by_blank_node,
            first_degree_hashes: BTreeMap::new(),
            canonical_issuer: IdentifierIssuer::new(CANONICAL_PREFIX),
        }
    }

    fn run(mut self) -> Result<BTreeMap<BlankNode, BlankNode>, CanonicalizationError> {
        let hashes = self
            .quads_by_blank_node
            .keys()
            .map(|node| (node.clone(), self.hash_first_degree_quads(node)))
            .collect::<Vec<_>>();
        let mut nodes_by_hash = BTreeMap::<String, Vec<BlankNode>>::new();
        for (node, hash) in hashes {
            nodes_by_hash
                .entry(hash.clone())
                .or_default()
                .push(node.clone());
            self.first_degree_hashes.insert(node, hash);
        }
        debug!(
            "Computed first degree hashes of {} blank nodes: {} distinct values",
            self.first_degree_hashes.len(),
            nodes_by_hash.len()
        );

        // Unique hashes are enough to label their blank node
        let mut shared_hash_groups = Vec::new();
        for nodes in nodes_by_hash.into_values() {
            if let [node] = nodes.as_slice() {
                self.canonical_issuer.issue(node);
            } else {
                shared_hash_groups.push(nodes);
            }
        }
        debug!(
            "{} blank nodes labeled from first degree hashes, {} groups left",
            self.canonical_issuer.len(),
            shared_hash_groups.len()
        );

        for nodes in shared_hash_groups {
            let mut results = Vec::new();
            for node in &nodes {
                if self.canonical_issuer.has(node) {
                    continue;
                }
                let mut issuer = IdentifierIssuer::new(TEMPORARY_PREFIX);
                issuer.issue(node);
                results.push(self.hash_n_degree_quads(node, &issuer, 0)?);
            }
            results.sort_by(|(left, _), (right, _)| left.cmp(right));
            for (_, issuer) in results {
                for node in issuer.issued_order() {
                    self.canonical_issuer.issue(node);
                }
            }
        }
        debug!(
            "Canonicalized {} quads with {} blank nodes",
            self.quads.len(),
            self.canonical_issuer.len()
        );
        Ok(self.canonical_issuer.into_issued())
    }

    fn quads_of<'b>(&'b self, node: &BlankNode) -> impl Iterator<Item = &'b Quad> + use<'b> {
        self.quads_by_blank_node
            .get(node)
            .into_iter()
            .flatten()
            .filter_map(|i| self.quads.get(*i))
    }

    /// Hashes the quads of `node`, `node` being written `_:a` and all other blank nodes `_:z`.
    fn hash_first_degree_quads(&self, node: &BlankNode) -> String {
        let reference = BlankNode::new_unchecked("a");
        let other = BlankNode::new_unchecked("z");
        let quads = self
            .quads_of(node)
            .map(|quad| {
                quad.map_blank_nodes(&mut |b| {
                    if b == node {
                        reference.clone()
                    } else {
                        other.clone()
                    }
                })
            })
            .collect::<Vec<_>>();
        let hash = self
            .config
            .hash_algorithm
            .digest(&TermSerializer::new().sorted_lines(&quads));
        trace!("First degree hash of {node}: {hash}");
        hash
    }

    fn hash_related_blank_node(
        &self,
        related: &BlankNode,
        quad: &Quad,
        issuer: &IdentifierIssuer,
        position: &str,
    ) -> String {
        let serializer = TermSerializer::new();
        let mut input = String::from(position);
        if position != "g" {
            input.push_str(&serializer.term_to_string(quad.predicate()));
        }
        if let Some(id) = self
            .canonical_issuer
            .get(related)
            .or_else(|| issuer.get(related))
        {
            input.push_str("_:");
            input.push_str(id.as_str());
        } else if let Some(hash) = self.first_degree_hashes.get(related) {
            input.push_str(hash);
        } else {
            input.push_str(&self.hash_first_degree_quads(related));
        }
        self.config.hash_algorithm.digest(&input)
    }

    fn hash_n_degree_quads(
        &self,
        node: &BlankNode,
        issuer: &IdentifierIssuer,
        depth: usize,
    ) -> Result<(String, IdentifierIssuer), CanonicalizationError> {
        if let Some(limit) = self.config.depth_limit {
            if depth > limit {
                return Err(CanonicalizationError::DepthLimitExceeded { limit });
            }
        }

        let mut related_by_hash = BTreeMap::<String, Vec<BlankNode>>::new();
        for quad in self.quads_of(node) {
            for (position, term) in [
                ("s", quad.subject()),
                ("o", quad.object()),
                ("g", quad.graph_name()),
            ] {
                term.for_each_blank_node(&mut |related| {
                    if related != node {
                        let hash = self.hash_related_blank_node(related, quad, issuer, position);
                        related_by_hash
                            .entry(hash)
                            .or_default()
                            .push(related.clone());
                    }
                });
            }
        }

        let mut data_to_hash = String::new();
        let mut current_issuer = issuer.clone();
        for (related_hash, mut related) in related_by_hash {
            data_to_hash.push_str(&related_hash);
            self.check_permutation_limit(related.len())?;
            let mut chosen_path = String::new();
            let mut chosen_issuer = None;
            for_each_permutation(&mut related, |permutation| -> Result<(), CanonicalizationError> {
                let mut issuer_copy = current_issuer.clone();
                let mut path = String::new();
                let mut recursion_list = Vec::new();
                for related in permutation {
                    if let Some(id) = self.canonical_issuer.get(related) {
                        path.push_str("_:");
                        path.push_str(id.as_str());
                    } else {
                        if !issuer_copy.has(related) {
                            recursion_list.push(related);
                        }
                        path.push_str("_:");
                        path.push_str(issuer_copy.issue(related).as_str());
                    }
                }
                if is_worse_path(&path, &chosen_path) {
                    trace!("Pruned permutation with path {path}");
                    return Ok(());
                }
                for related in recursion_list {
                    let (hash, result_issuer) =
                        self.hash_n_degree_quads(related, &issuer_copy, depth + 1)?;
                    path.push_str("_:");
                    path.push_str(issuer_copy.issue(related).as_str());
                    path.push('<');
                    path.push_str(&hash);
                    path.push('>');
                    issuer_copy = result_issuer;
                    if is_worse_path(&path, &chosen_path) {
                        trace!("Pruned permutation with path {path}");
                        return Ok(());
                    }
                }
                if chosen_path.is_empty() || path < chosen_path {
                    chosen_path = path;
                    chosen_issuer = Some(issuer_copy);
                }
                Ok(())
            })?;
            data_to_hash.push_str(&chosen_path);
            if let Some(chosen_issuer) = chosen_issuer {
                current_issuer = chosen_issuer;
            }
        }
        let hash = self.config.hash_algorithm.digest(&data_to_hash);
        trace!("N-degree hash of {node} at depth {depth}: {hash}");
        Ok((hash, current_issuer))
    }

    fn check_permutation_limit(&self, nodes: usize) -> Result<(), CanonicalizationError> {
        let Some(limit) = self.config.permutation_limit else {
            return Ok(());
        };
        if permutation_count(nodes).is_none_or(|count| count > limit) {
            return Err(CanonicalizationError::TooManyPermutations { nodes, limit });
        }
        Ok(())
    }
}

/// A candidate path can't be chosen anymore once it is at least as long as the chosen one and greater.
fn is_worse_path(path: &str, chosen_path: &str) -> bool {
    !chosen_path.is_empty() && path.len() >= chosen_path.len() && path > chosen_path
}
