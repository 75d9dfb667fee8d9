//! Rooted phylogenetic tree with branch lengths.
//!
//! Trees are stored with the arena pattern: a flat `Vec` of nodes referenced
//! by index, with parent/child links. This keeps pruning and path walks cheap
//! and avoids recursive ownership.
//!
//! Branch lengths default to 1.0 when the newick source omits them, so
//! topology-only trees still support distance-based metrics.

use crate::error::{PhyloError, Result};
use nalgebra::DMatrix;
use std::collections::HashSet;

/// A node in the tree arena.
#[derive(Debug, Clone)]
struct TreeNode {
    parent: Option<usize>,
    children: Vec<usize>,
    /// Length of the branch connecting this node to its parent (0.0 at the root).
    branch_length: f64,
    /// Tip label; internal nodes may carry a label but it is never used.
    label: Option<String>,
}

/// A rooted phylogenetic tree over named tips.
#[derive(Debug, Clone)]
pub struct PhyloTree {
    nodes: Vec<TreeNode>,
    root: usize,
}

impl PhyloTree {
    /// Parse a tree from a newick string, e.g. `"((a:1,b:2):0.5,c:3);"`.
    ///
    /// Branches without an explicit `:length` get a default length of 1.0;
    /// the root branch is always 0.0.
    pub fn from_newick(newick: &str) -> Result<Self> {
        let mut parser = NewickParser {
            bytes: newick.as_bytes(),
            pos: 0,
        };
        parser.skip_whitespace();
        let mut nodes = Vec::new();
        let root = parser.parse_subtree(&mut nodes, None)?;
        nodes[root].branch_length = 0.0;
        parser.skip_whitespace();
        if !parser.eat(b';') {
            return Err(PhyloError::NewickParse(
                "expected terminating ';'".to_string(),
            ));
        }
        let tree = Self { nodes, root };
        if tree.n_tips() < 2 {
            return Err(PhyloError::NewickParse(
                "tree must have at least 2 tips".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for label in tree.tip_labels() {
            if !seen.insert(label.to_string()) {
                return Err(PhyloError::NewickParse(format!(
                    "duplicate tip label '{}'",
                    label
                )));
            }
        }
        Ok(tree)
    }

    /// Number of tips (leaves).
    pub fn n_tips(&self) -> usize {
        self.nodes.iter().filter(|n| n.children.is_empty()).count()
    }

    /// Tip labels in arena order.
    pub fn tip_labels(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| n.children.is_empty())
            .filter_map(|n| n.label.as_deref())
            .collect()
    }

    /// Whether every label in `labels` is a tip of this tree.
    pub fn has_tips(&self, labels: &[String]) -> bool {
        let tips: HashSet<&str> = self.tip_labels().into_iter().collect();
        labels.iter().all(|l| tips.contains(l.as_str()))
    }

    fn tip_index(&self, label: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.children.is_empty() && n.label.as_deref() == Some(label))
    }

    /// Depth (summed branch length from the root) of every node.
    fn depths(&self) -> Vec<f64> {
        let mut depths = vec![0.0; self.nodes.len()];
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            for &child in &self.nodes[idx].children {
                depths[child] = depths[idx] + self.nodes[child].branch_length;
                stack.push(child);
            }
        }
        depths
    }

    /// Prune the tree down to the given tip set.
    ///
    /// Internal nodes left with a single child are suppressed (their branch
    /// length is added to the child's); the root is always kept so that
    /// root-inclusive path sums remain well defined. Fails with
    /// `SpeciesMismatch` if a requested label is not a tip.
    pub fn prune_to(&self, keep: &[String]) -> Result<Self> {
        if keep.is_empty() {
            return Err(PhyloError::EmptyData(
                "cannot prune tree to an empty tip set".to_string(),
            ));
        }
        let mut retained = vec![false; self.nodes.len()];
        for label in keep {
            let tip = self.tip_index(label).ok_or_else(|| {
                PhyloError::SpeciesMismatch(format!("'{}' is not a tip of the tree", label))
            })?;
            let mut cur = Some(tip);
            while let Some(idx) = cur {
                if retained[idx] {
                    break;
                }
                retained[idx] = true;
                cur = self.nodes[idx].parent;
            }
        }

        let mut nodes = Vec::new();
        let root = self.copy_retained(self.root, None, 0.0, &retained, &mut nodes);
        Ok(Self { nodes, root })
    }

    /// Copy `idx` (known retained) into `out`, suppressing unifurcations.
    /// `length` is the branch length accumulated from `idx` up to the nearest
    /// copied ancestor, spanning any suppressed pass-through nodes.
    fn copy_retained(
        &self,
        idx: usize,
        parent: Option<usize>,
        length: f64,
        retained: &[bool],
        out: &mut Vec<TreeNode>,
    ) -> usize {
        let kept_children: Vec<usize> = self.nodes[idx]
            .children
            .iter()
            .copied()
            .filter(|&c| retained[c])
            .collect();

        // Suppress non-root pass-through nodes.
        if kept_children.len() == 1 && parent.is_some() {
            let child = kept_children[0];
            return self.copy_retained(
                child,
                parent,
                length + self.nodes[child].branch_length,
                retained,
                out,
            );
        }

        let new_idx = out.len();
        out.push(TreeNode {
            parent,
            children: Vec::new(),
            branch_length: length,
            label: self.nodes[idx].label.clone(),
        });
        for child in kept_children {
            let new_child = self.copy_retained(
                child,
                Some(new_idx),
                self.nodes[child].branch_length,
                retained,
                out,
            );
            out[new_idx].children.push(new_child);
        }
        new_idx
    }

    /// Pairwise cophenetic (tip-to-tip path) distances in the given label order.
    ///
    /// The result is a symmetric matrix with zeros on the diagonal, rows and
    /// columns aligned with `order`.
    pub fn cophenetic(&self, order: &[String]) -> Result<DMatrix<f64>> {
        let n = order.len();
        let mut tips = Vec::with_capacity(n);
        for label in order {
            let tip = self.tip_index(label).ok_or_else(|| {
                PhyloError::SpeciesMismatch(format!("'{}' is not a tip of the tree", label))
            })?;
            tips.push(tip);
        }
        let depths = self.depths();

        let mut dist = DMatrix::zeros(n, n);
        for i in 0..n {
            let ancestors_i: HashSet<usize> = self.ancestor_path(tips[i]).into_iter().collect();
            for j in (i + 1)..n {
                let mut lca = tips[j];
                while !ancestors_i.contains(&lca) {
                    lca = self.nodes[lca]
                        .parent
                        .expect("two tips of a rooted tree always share an ancestor");
                }
                let d = depths[tips[i]] + depths[tips[j]] - 2.0 * depths[lca];
                dist[(i, j)] = d;
                dist[(j, i)] = d;
            }
        }
        Ok(dist)
    }

    /// Faith's phylogenetic diversity: total branch length of the subtree
    /// spanning the given tips, root-inclusive (paths run all the way to the
    /// root, so a single tip contributes its full root-to-tip length).
    pub fn pd(&self, labels: &[String]) -> Result<f64> {
        if labels.is_empty() {
            return Ok(0.0);
        }
        let mut marked = HashSet::new();
        for label in labels {
            let tip = self.tip_index(label).ok_or_else(|| {
                PhyloError::SpeciesMismatch(format!("'{}' is not a tip of the tree", label))
            })?;
            let mut cur = Some(tip);
            while let Some(idx) = cur {
                if !marked.insert(idx) {
                    break;
                }
                cur = self.nodes[idx].parent;
            }
        }
        Ok(marked
            .iter()
            .filter(|&&idx| idx != self.root)
            .map(|&idx| self.nodes[idx].branch_length)
            .sum())
    }

    /// Node indices from a node up to and including the root.
    fn ancestor_path(&self, mut idx: usize) -> Vec<usize> {
        let mut path = vec![idx];
        while let Some(parent) = self.nodes[idx].parent {
            path.push(parent);
            idx = parent;
        }
        path
    }

    /// Check that every species label is a tip of this tree, naming the
    /// missing ones otherwise.
    pub fn check_coverage(&self, species: &[String]) -> Result<()> {
        let tips: HashSet<&str> = self.tip_labels().into_iter().collect();
        let missing: Vec<&String> = species
            .iter()
            .filter(|s| !tips.contains(s.as_str()))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PhyloError::SpeciesMismatch(format!(
                "tree is missing tips for species {:?}",
                missing
            )))
        }
    }
}

struct NewickParser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> NewickParser<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn parse_subtree(&mut self, nodes: &mut Vec<TreeNode>, parent: Option<usize>) -> Result<usize> {
        self.skip_whitespace();
        let idx = nodes.len();
        nodes.push(TreeNode {
            parent,
            children: Vec::new(),
            branch_length: 1.0,
            label: None,
        });

        if self.eat(b'(') {
            loop {
                let child = self.parse_subtree(nodes, Some(idx))?;
                nodes[idx].children.push(child);
                self.skip_whitespace();
                if self.eat(b',') {
                    continue;
                }
                if self.eat(b')') {
                    break;
                }
                return Err(PhyloError::NewickParse(format!(
                    "expected ',' or ')' at byte {}",
                    self.pos
                )));
            }
        }

        self.skip_whitespace();
        let label = self.parse_label();
        if !label.is_empty() {
            nodes[idx].label = Some(label);
        } else if nodes[idx].children.is_empty() {
            return Err(PhyloError::NewickParse(format!(
                "unlabelled tip at byte {}",
                self.pos
            )));
        }

        if self.eat(b':') {
            nodes[idx].branch_length = self.parse_number()?;
        }
        Ok(idx)
    }

    fn parse_label(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b'(' | b')' | b',' | b':' | b';') || b.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned()
    }

    fn parse_number(&mut self) -> Result<f64> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b'0'..=b'9' | b'.' | b'-' | b'+' | b'e' | b'E') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|_| PhyloError::NewickParse("invalid branch length".to_string()))?;
        text.parse::<f64>().map_err(|_| {
            PhyloError::NewickParse(format!("invalid branch length '{}'", text))
        })
    }
}
