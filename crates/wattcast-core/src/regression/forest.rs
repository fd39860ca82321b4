//! Random forest regressor
//!
//! Bagged regression trees with variance-reduction splits. Every tree draws a
//! bootstrap sample from its own `ChaCha8Rng` seeded from the forest seed, so
//! a fit is reproducible.

use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::Result;

use super::{check_shape, FittedModel, Regressor};

/// Random forest configuration
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl RandomForestRegressor {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators: n_estimators.max(1),
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self::new(100)
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, features: ArrayView1<f64>) -> f64 {
        match self {
            Node::Leaf(value) => *value,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                let value = features.get(*feature).copied().unwrap_or(0.0);
                if value <= *threshold {
                    left.predict(features)
                } else {
                    right.predict(features)
                }
            }
        }
    }
}

/// Fitted forest: mean of the tree predictions
#[derive(Debug, Clone)]
pub struct ForestModel {
    trees: Vec<Node>,
}

impl FittedModel for ForestModel {
    fn predict(&self, features: ArrayView1<f64>) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict(features)).sum::<f64>() / self.trees.len() as f64
    }
}

impl Regressor for RandomForestRegressor {
    fn name(&self) -> &'static str {
        "random_forest"
    }

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Box<dyn FittedModel>> {
        let width = check_shape(x, y)?;
        let n = x.nrows();

        let trees = (0..self.n_estimators)
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(tree_idx as u64));
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                self.build(x, y, width, sample, 0)
            })
            .collect();

        Ok(Box::new(ForestModel { trees }))
    }
}

impl RandomForestRegressor {
    fn build(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        width: usize,
        indices: Vec<usize>,
        depth: usize,
    ) -> Node {
        let mean = indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64;

        let depth_reached = self.max_depth.is_some_and(|max| depth >= max);
        if depth_reached || indices.len() < self.min_samples_split {
            return Node::Leaf(mean);
        }

        match best_split(x, y, width, &indices) {
            Some((feature, threshold)) => {
                let (left, right): (Vec<usize>, Vec<usize>) =
                    indices.into_iter().partition(|&i| x[[i, feature]] <= threshold);
                Node::Split {
                    feature,
                    threshold,
                    left: Box::new(self.build(x, y, width, left, depth + 1)),
                    right: Box::new(self.build(x, y, width, right, depth + 1)),
                }
            }
            None => Node::Leaf(mean),
        }
    }
}

/// Split minimizing the summed squared error of both sides
///
/// Returns None when no split reduces the error (constant targets or features).
fn best_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    width: usize,
    indices: &[usize],
) -> Option<(usize, f64)> {
    let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
    let count = indices.len() as f64;
    let parent_sse = total_sq - total_sum * total_sum / count;

    let mut best: Option<(usize, f64, f64)> = None;

    for feature in 0..width {
        let mut sorted = indices.to_vec();
        sorted.sort_by(|&a, &b| {
            x[[a, feature]]
                .partial_cmp(&x[[b, feature]])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for pos in 0..sorted.len() - 1 {
            let i = sorted[pos];
            left_sum += y[i];
            left_sq += y[i] * y[i];

            let here = x[[i, feature]];
            let next = x[[sorted[pos + 1], feature]];
            if here == next {
                continue;
            }

            let left_n = (pos + 1) as f64;
            let right_n = count - left_n;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / left_n)
                + (right_sq - right_sum * right_sum / right_n);

            if best.map_or(true, |(_, _, b)| sse < b) {
                best = Some((feature, (here + next) / 2.0, sse));
            }
        }
    }

    best.filter(|(_, _, sse)| *sse < parent_sse - 1e-12)
        .map(|(feature, threshold, _)| (feature, threshold))
}
