use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::trace;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::Xxh64;

use crate::error::{HuffmanError, Result};
use crate::min_heap::{HeapErr, MinHeap};

/// Index of a node inside a [`HuffmanTree`] arena.
pub type NodeId = usize;

/// A code as a sequence of bits: `false` = left, `true` = right.
pub type Code = Vec<bool>;

/// Symbol occurrence counts. Every count is positive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<char, u64>,
}

impl FrequencyTable {
    pub fn from_text(text: &str) -> Self {
        let counts = text.chars().fold(BTreeMap::new(), |mut acc, symbol| {
            *acc.entry(symbol).or_insert(0u64) += 1;
            acc
        });
        FrequencyTable { counts }
    }

    /// Zero counts are dropped. Fails when the counts add up past `u64::MAX`.
    pub fn from_counts<I>(counts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (char, u64)>,
    {
        let mut table = BTreeMap::new();
        let mut total = 0u64;
        for (symbol, count) in counts {
            if count == 0 {
                continue;
            }
            total = total
                .checked_add(count)
                .ok_or_else(|| HuffmanError::tree_construction("symbol counts overflow u64"))?;
            *table.entry(symbol).or_insert(0) += count;
        }
        Ok(FrequencyTable { counts: table })
    }

    pub fn get(&self, symbol: char) -> Option<u64> {
        self.counts.get(&symbol).copied()
    }

    /// Number of distinct symbols
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, u64)> + '_ {
        self.counts.iter().map(|(&s, &c)| (s, c))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffNode {
    Leaf {
        weight: u64,
        symbol: char,
    },
    Internal {
        weight: u64,
        left: NodeId,
        right: NodeId,
    },
}

impl HuffNode {
    pub fn weight(&self) -> u64 {
        match self {
            HuffNode::Leaf { weight, .. } => *weight,
            HuffNode::Internal { weight, .. } => *weight,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, HuffNode::Leaf { .. })
    }
}

/// Priority queue entry. Ties on weight go to the node created first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueueEntry {
    weight: u64,
    id: NodeId,
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .cmp(&other.weight)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl From<HeapErr> for HuffmanError {
    fn from(e: HeapErr) -> Self {
        HuffmanError::tree_construction(format!("priority queue: {:?}", e))
    }
}

/// Huffman code tree stored as an arena. Node ids are creation order, so
/// children always have smaller ids than their parent in a freshly built tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    nodes: Vec<HuffNode>,
    root: NodeId,
}

impl HuffmanTree {
    pub fn from_text(text: &str) -> Result<Self> {
        Self::from_frequencies(&FrequencyTable::from_text(text))
    }

    /// Greedy Huffman construction.
    ///
    /// Leaves enter the queue ordered by `(weight, symbol)` and take ids in
    /// that order; every merged node takes the next id. The queue pops the
    /// lowest `(weight, id)`, so among equal weights the earliest created
    /// node goes first. The first node popped becomes the left child.
    pub fn from_frequencies(frequencies: &FrequencyTable) -> Result<Self> {
        if frequencies.is_empty() {
            return Err(HuffmanError::tree_construction("empty frequency table"));
        }

        let mut leaves: Vec<(char, u64)> = frequencies.iter().collect();
        leaves.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        let mut nodes = Vec::with_capacity(2 * leaves.len() - 1);
        let mut entries = Vec::with_capacity(leaves.len());
        for (symbol, weight) in leaves {
            entries.push(QueueEntry { weight, id: nodes.len() });
            nodes.push(HuffNode::Leaf { weight, symbol });
        }

        let mut heap = MinHeap::build(entries);
        while heap.heap_size() > 1 {
            let x = heap.extract_min()?;
            let y = heap.extract_min()?;

            let weight = x.weight.checked_add(y.weight).ok_or_else(|| {
                HuffmanError::tree_construction(format!("weight overflow merging #{} and #{}", x.id, y.id))
            })?;
            let id = nodes.len();
            trace!("merge #{} (w={}) + #{} (w={}) -> #{}", x.id, x.weight, y.id, y.weight, id);
            nodes.push(HuffNode::Internal {
                weight,
                left: x.id,
                right: y.id,
            });
            heap.insert(QueueEntry { weight, id });
        }

        let root = heap.extract_min()?.id;
        Ok(HuffmanTree { nodes, root })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&HuffNode> {
        self.nodes.get(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// True when the whole tree is one leaf (single distinct symbol).
    pub fn is_single_leaf(&self) -> bool {
        self.nodes[self.root].is_leaf()
    }

    /// Frequencies recovered from leaf weights.
    pub fn frequencies(&self) -> Result<FrequencyTable> {
        FrequencyTable::from_counts(self.nodes.iter().filter_map(|node| match node {
            HuffNode::Leaf { weight, symbol } => Some((*symbol, *weight)),
            HuffNode::Internal { .. } => None,
        }))
    }

    /// Root-to-leaf paths for every symbol. A lone leaf gets the code `0`.
    pub fn generate_table(&self) -> CodeTable {
        let mut codes = BTreeMap::new();

        if let HuffNode::Leaf { symbol, .. } = self.nodes[self.root] {
            codes.insert(symbol, vec![false]);
            return CodeTable { codes };
        }

        let mut stack: Vec<(NodeId, Code)> = vec![(self.root, Vec::new())];
        while let Some((id, path)) = stack.pop() {
            match &self.nodes[id] {
                HuffNode::Leaf { symbol, .. } => {
                    codes.insert(*symbol, path);
                }
                HuffNode::Internal { left, right, .. } => {
                    let mut right_path = path.clone();
                    right_path.push(true);
                    stack.push((*right, right_path));

                    let mut left_path = path;
                    left_path.push(false);
                    stack.push((*left, left_path));
                }
            }
        }

        CodeTable { codes }
    }

    pub fn serialize(&self) -> SerializedTree {
        let nodes = self
            .nodes
            .iter()
            .map(|node| match node {
                HuffNode::Leaf { weight, symbol } => SerializedNode {
                    symbol: Some(*symbol),
                    weight: Some(*weight),
                    left: None,
                    right: None,
                },
                HuffNode::Internal { weight, left, right } => SerializedNode {
                    symbol: None,
                    weight: Some(*weight),
                    left: Some(*left),
                    right: Some(*right),
                },
            })
            .collect();

        SerializedTree { root: self.root, nodes }
    }

    /// Rebuild a tree, rejecting anything that is not a finite binary tree
    /// with unique leaf symbols. Missing weights become 0.
    pub fn deserialize(tree: &SerializedTree) -> Result<Self> {
        let count = tree.nodes.len();
        if count == 0 {
            return Err(HuffmanError::invalid_tree("tree has no nodes"));
        }
        if tree.root >= count {
            return Err(HuffmanError::invalid_tree(format!(
                "root index {} out of range for {} nodes",
                tree.root, count
            )));
        }

        let mut nodes = Vec::with_capacity(count);
        for (id, node) in tree.nodes.iter().enumerate() {
            let weight = node.weight.unwrap_or(0);
            let rebuilt = match (node.symbol, node.left, node.right) {
                (Some(symbol), None, None) => HuffNode::Leaf { weight, symbol },
                (None, Some(left), Some(right)) => {
                    for child in [left, right] {
                        if child >= count {
                            return Err(HuffmanError::invalid_tree(format!(
                                "node {} points at missing child {}",
                                id, child
                            )));
                        }
                    }
                    HuffNode::Internal { weight, left, right }
                }
                _ => {
                    return Err(HuffmanError::invalid_tree(format!(
                        "node {} is neither a leaf nor an internal node with two children",
                        id
                    )))
                }
            };
            nodes.push(rebuilt);
        }

        let mut visited = vec![false; count];
        let mut symbols = BTreeSet::new();
        let mut stack = vec![tree.root];
        while let Some(id) = stack.pop() {
            if visited[id] {
                return Err(HuffmanError::invalid_tree(format!(
                    "node {} is reachable more than once",
                    id
                )));
            }
            visited[id] = true;

            match &nodes[id] {
                HuffNode::Leaf { symbol, .. } => {
                    if !symbols.insert(*symbol) {
                        return Err(HuffmanError::invalid_tree(format!(
                            "symbol {:?} appears in more than one leaf",
                            symbol
                        )));
                    }
                }
                HuffNode::Internal { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }

        if let Some(orphan) = visited.iter().position(|v| !v) {
            return Err(HuffmanError::invalid_tree(format!(
                "node {} is not reachable from the root",
                orphan
            )));
        }

        Ok(HuffmanTree {
            nodes,
            root: tree.root,
        })
    }
}

impl TryFrom<&str> for HuffmanTree {
    type Error = HuffmanError;

    fn try_from(text: &str) -> Result<Self> {
        HuffmanTree::from_text(text)
    }
}

impl fmt::Display for HuffmanTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Huffman Tree Structure:")?;
        let mut stack = vec![(self.root, 0usize, "root")];
        while let Some((id, depth, label)) = stack.pop() {
            let indent = "  ".repeat(depth);
            match &self.nodes[id] {
                HuffNode::Leaf { weight, symbol } => {
                    writeln!(f, "{}{}-> Leaf: {:?} [weight: {}]", indent, label, symbol, weight)?;
                }
                HuffNode::Internal { weight, left, right } => {
                    writeln!(f, "{}{}-> Internal [weight: {}]", indent, label, weight)?;
                    stack.push((*right, depth + 1, "R"));
                    stack.push((*left, depth + 1, "L"));
                }
            }
        }
        Ok(())
    }
}

/// Symbol -> code mapping derived from a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTable {
    codes: BTreeMap<char, Code>,
}

impl CodeTable {
    pub fn get(&self, symbol: char) -> Option<&[bool]> {
        self.codes.get(&symbol).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, &[bool])> + '_ {
        self.codes.iter().map(|(&s, c)| (s, c.as_slice()))
    }

    pub fn max_code_length(&self) -> usize {
        self.codes.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Total encoded length in bits for the given frequencies, saturating at `u64::MAX`.
    pub fn encoded_bits(&self, frequencies: &FrequencyTable) -> u64 {
        frequencies.iter().fold(0u64, |acc, (symbol, count)| {
            let len = self.codes.get(&symbol).map_or(0, |c| c.len() as u64);
            acc.saturating_add(len.saturating_mul(count))
        })
    }

    /// xxh64 over every `(symbol, code)` pair. Two tables fingerprint the same
    /// exactly when they put the same symbols at the same paths.
    pub fn fingerprint(&self) -> u64 {
        let mut xxh = Xxh64::new(0);
        for (symbol, code) in &self.codes {
            xxh.update(&u32::from(*symbol).to_le_bytes());
            xxh.update(&(code.len() as u64).to_le_bytes());
            let bits: Vec<u8> = code.iter().map(|&b| u8::from(b)).collect();
            xxh.update(&bits);
        }
        xxh.digest()
    }

    /// Codes rendered as `0`/`1` strings.
    pub fn to_strings(&self) -> BTreeMap<char, String> {
        self.codes
            .iter()
            .map(|(&s, code)| (s, code.iter().map(|&b| if b { '1' } else { '0' }).collect()))
            .collect()
    }

    pub fn is_prefix_free(&self) -> bool {
        // after sorting, a prefix sorts immediately before some extension of itself
        let mut sorted: Vec<&Code> = self.codes.values().collect();
        sorted.sort();
        sorted.windows(2).all(|w| !w[1].starts_with(w[0]))
    }
}

/// Transport-neutral tree: a flat node list addressed by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SerializedTree {
    pub root: usize,
    pub nodes: Vec<SerializedNode>,
}

/// One serialized node: leaves carry a symbol and no children, internal
/// nodes carry two children and no symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SerializedNode {
    #[serde(default)]
    pub symbol: Option<char>,
    #[serde(default)]
    pub weight: Option<u64>,
    #[serde(default)]
    pub left: Option<usize>,
    #[serde(default)]
    pub right: Option<usize>,
}
