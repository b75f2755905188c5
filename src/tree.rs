//! CART decision tree classifier with gini impurity
//!
//! Nodes are stored in a flat arena. Split nodes send a row left when its
//! feature value is `<= threshold`; leaves keep the class distribution of
//! the training rows that reached them, which backs `predict_proba`.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth; the root is depth 0.
    pub max_depth: usize,
    /// Minimum rows a node needs before a split is attempted.
    pub min_samples_split: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Class probabilities, indexed by class id.
        distribution: Vec<f64>,
    },
}

/// A fitted classification tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    n_features: usize,
    n_classes: usize,
    importances: Vec<f64>,
}

struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeBuilder<'a> {
    x: ArrayView2<'a, f64>,
    y: &'a [usize],
    n_classes: usize,
    params: TreeParams,
    nodes: Vec<TreeNode>,
    importances: Vec<f64>,
}

impl DecisionTree {
    /// Fit a tree on rows of `x` with class ids `y` (each `< n_classes`).
    ///
    /// Candidate features are scanned in column order and a split only
    /// replaces the current best on strictly larger gain, so fitting is
    /// deterministic for a given input.
    pub fn fit<'a>(x: ArrayView2<'a, f64>, y: &'a [usize], n_classes: usize, params: TreeParams) -> Self {
        assert_eq!(x.nrows(), y.len(), "feature rows and labels differ in length");

        let mut builder = TreeBuilder {
            x,
            y,
            n_classes,
            params,
            nodes: Vec::new(),
            importances: vec![0.0; x.ncols()],
        };
        let mut rows: Vec<usize> = (0..y.len()).collect();
        builder.grow(&mut rows, 0);

        let total: f64 = builder.importances.iter().sum();
        if total > 0.0 {
            builder.importances.iter_mut().for_each(|v| *v /= total);
        }

        Self {
            nodes: builder.nodes,
            n_features: x.ncols(),
            n_classes,
            importances: builder.importances,
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest leaf.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match &nodes[idx] {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Normalised impurity decrease per feature; sums to 1 unless the tree is a single leaf.
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    /// Class distribution of the leaf `row` falls into.
    pub fn predict_proba(&self, row: &[f64]) -> &[f64] {
        debug_assert_eq!(row.len(), self.n_features);
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { distribution } => return distribution,
            }
        }
    }

    /// Most probable class; ties go to the lowest class id.
    pub fn predict(&self, row: &[f64]) -> usize {
        argmax(self.predict_proba(row))
    }
}

impl TreeBuilder<'_> {
    fn grow(&mut self, rows: &mut [usize], depth: usize) -> usize {
        let counts = self.class_counts(rows);
        let node_id = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            distribution: normalize(&counts),
        });

        let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        if depth >= self.params.max_depth || rows.len() < self.params.min_samples_split || is_pure {
            return node_id;
        }

        let Some(split) = self.best_split(rows, &counts) else {
            return node_id;
        };
        self.importances[split.feature] += split.gain * rows.len() as f64;

        let (mut left, mut right): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&r| self.x[[r, split.feature]] <= split.threshold);
        let left_id = self.grow(&mut left, depth + 1);
        let right_id = self.grow(&mut right, depth + 1);

        self.nodes[node_id] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: left_id,
            right: right_id,
        };
        node_id
    }

    fn class_counts(&self, rows: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &r in rows {
            counts[self.y[r]] += 1;
        }
        counts
    }

    fn best_split(&self, rows: &[usize], parent: &[usize]) -> Option<Split> {
        let n = rows.len() as f64;
        let parent_gini = gini(parent, rows.len());
        let mut best: Option<Split> = None;
        let mut order = rows.to_vec();

        for feature in 0..self.x.ncols() {
            order.copy_from_slice(rows);
            order.sort_by(|&a, &b| self.x[[a, feature]].total_cmp(&self.x[[b, feature]]));

            let mut left = vec![0usize; self.n_classes];
            let mut right = parent.to_vec();
            for k in 0..order.len() - 1 {
                let class = self.y[order[k]];
                left[class] += 1;
                right[class] -= 1;

                let lo = self.x[[order[k], feature]];
                let hi = self.x[[order[k + 1], feature]];
                if lo >= hi {
                    continue;
                }

                let n_left = k + 1;
                let n_right = order.len() - n_left;
                let child = (n_left as f64 / n) * gini(&left, n_left)
                    + (n_right as f64 / n) * gini(&right, n_right);
                let gain = parent_gini - child;

                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    let mut threshold = (lo + hi) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(Split {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }
        best
    }
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

fn normalize(counts: &[usize]) -> Vec<f64> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    counts.iter().map(|&c| c as f64 / total as f64).collect()
}

pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (idx, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = idx;
        }
    }
    best
}
