//! Bagged regression trees with squared-error splits.

use crate::utils::error::{ProjectError, Result};
use crate::utils::validation::Validate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub random_state: u64,
    /// 0 means one worker per available core.
    pub n_jobs: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: None,
            min_samples_split: 2,
            random_state: 42,
            n_jobs: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl RegressionTree {
    /// Fits on the rows of `x` selected by `samples` (repeats allowed).
    pub fn fit(
        x: &[Vec<f64>],
        y: &[f64],
        samples: Vec<usize>,
        max_depth: Option<usize>,
        min_samples_split: usize,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, y, samples, 0, max_depth, min_samples_split.max(2));
        tree
    }

    fn grow(
        &mut self,
        x: &[Vec<f64>],
        y: &[f64],
        samples: Vec<usize>,
        depth: usize,
        max_depth: Option<usize>,
        min_samples_split: usize,
    ) -> usize {
        let id = self.nodes.len();
        let value = mean_of(y, &samples);
        self.nodes.push(Node::Leaf { value });

        let depth_exhausted = max_depth.is_some_and(|d| depth >= d);
        if depth_exhausted || samples.len() < min_samples_split || is_constant(y, &samples) {
            return id;
        }

        let Some(split) = best_split(x, y, &samples) else {
            return id;
        };

        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| x[i][split.feature] <= split.threshold);

        let left = self.grow(x, y, left_samples, depth + 1, max_depth, min_samples_split);
        let right = self.grow(x, y, right_samples, depth + 1, max_depth, min_samples_split);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row.get(*feature).copied().unwrap_or(0.0) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

fn mean_of(y: &[f64], samples: &[usize]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|&i| y[i]).sum::<f64>() / samples.len() as f64
}

fn is_constant(y: &[f64], samples: &[usize]) -> bool {
    samples.windows(2).all(|w| y[w[0]] == y[w[1]])
}

/// Maximizes `sum_l^2/n_l + sum_r^2/n_r`, which minimizes the summed squared
/// error of the two children. Thresholds sit halfway between distinct values.
fn best_split(x: &[Vec<f64>], y: &[f64], samples: &[usize]) -> Option<SplitCandidate> {
    let n = samples.len();
    let total: f64 = samples.iter().map(|&i| y[i]).sum();
    let parent_score = total * total / n as f64;
    let n_features = x.get(samples[0]).map_or(0, Vec::len);

    let mut best: Option<SplitCandidate> = None;
    let mut order = samples.to_vec();

    for feature in 0..n_features {
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_sum = 0.0;
        for pos in 1..n {
            left_sum += y[order[pos - 1]];
            let prev = x[order[pos - 1]][feature];
            let next = x[order[pos]][feature];
            if prev == next {
                continue;
            }

            let right_sum = total - left_sum;
            let score = left_sum * left_sum / pos as f64 + right_sum * right_sum / (n - pos) as f64;
            if score <= parent_score + 1e-12 * parent_score.abs().max(1.0) {
                continue;
            }
            if best.as_ref().is_some_and(|b| score <= b.score) {
                continue;
            }

            let mut threshold = prev + (next - prev) / 2.0;
            if threshold >= next {
                threshold = prev;
            }
            best = Some(SplitCandidate {
                feature,
                threshold,
                score,
            });
        }
    }

    best
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Each tree sees a bootstrap sample drawn from its own seed
    /// (`random_state + tree index`), so results do not depend on `n_jobs`.
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: &ForestParams) -> Self {
        let n_trees = params.n_estimators.max(1);
        let workers = resolve_jobs(params.n_jobs).min(n_trees);

        let fit_tree = |t: usize| {
            let mut rng = StdRng::seed_from_u64(params.random_state.wrapping_add(t as u64));
            let samples: Vec<usize> = if y.is_empty() {
                Vec::new()
            } else {
                (0..y.len()).map(|_| rng.random_range(0..y.len())).collect()
            };
            RegressionTree::fit(x, y, samples, params.max_depth, params.min_samples_split)
        };

        let trees = if workers <= 1 {
            (0..n_trees).map(&fit_tree).collect()
        } else {
            let mut indexed: Vec<(usize, RegressionTree)> = std::thread::scope(|scope| {
                let handles: Vec<_> = (0..workers)
                    .map(|w| {
                        let fit_tree = &fit_tree;
                        scope.spawn(move || {
                            (w..n_trees)
                                .step_by(workers)
                                .map(|t| (t, fit_tree(t)))
                                .collect::<Vec<_>>()
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .flat_map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                    .collect()
            });
            indexed.sort_by_key(|(t, _)| *t);
            indexed.into_iter().map(|(_, tree)| tree).collect()
        };

        tracing::debug!("Fitted {} trees on {} workers", n_trees, workers);
        Self { trees }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / self.trees.len() as f64
    }

    pub fn predict_all(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|r| self.predict(r)).collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Validate for RegressionTree {
    /// Children must point forward into `nodes`, which also rules out cycles.
    fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(ProjectError::ProcessingError {
                message: "regression tree has no nodes".to_string(),
            });
        }
        for (id, node) in self.nodes.iter().enumerate() {
            if let Node::Split { left, right, .. } = node {
                for child in [*left, *right] {
                    if child <= id || child >= self.nodes.len() {
                        return Err(ProjectError::ProcessingError {
                            message: format!("node {} points to invalid child {}", id, child),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl Validate for RandomForest {
    fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(ProjectError::ProcessingError {
                message: "random forest has no trees".to_string(),
            });
        }
        self.trees.iter().try_for_each(Validate::validate)
    }
}

fn resolve_jobs(n_jobs: usize) -> usize {
    if n_jobs > 0 {
        n_jobs
    } else {
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, 0.0]).collect();
        let y: Vec<f64> = (0..20).map(|i| if i < 10 { 1.0 } else { 5.0 }).collect();
        (x, y)
    }

    #[test]
    fn test_tree_learns_step_function() {
        let (x, y) = step_data();
        let tree = RegressionTree::fit(&x, &y, (0..20).collect(), None, 2);

        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.predict(&[3.0, 0.0]), 1.0);
        assert_eq!(tree.predict(&[15.0, 0.0]), 5.0);
        // threshold sits halfway between 9 and 10
        assert_eq!(tree.predict(&[9.4, 0.0]), 1.0);
        assert_eq!(tree.predict(&[9.6, 0.0]), 5.0);
    }

    #[test]
    fn test_tree_respects_max_depth() {
        let x: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..8).map(|i| i as f64).collect();

        let stump = RegressionTree::fit(&x, &y, (0..8).collect(), Some(1), 2);
        assert_eq!(stump.node_count(), 3);

        let full = RegressionTree::fit(&x, &y, (0..8).collect(), None, 2);
        assert_eq!(full.node_count(), 15);
        assert_eq!(full.predict(&[5.0]), 5.0);
    }

    #[test]
    fn test_constant_target_is_single_leaf() {
        let x: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64]).collect();
        let y = vec![2.0; 5];
        let tree = RegressionTree::fit(&x, &y, (0..5).collect(), None, 2);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict(&[100.0]), 2.0);
    }

    #[test]
    fn test_forest_is_deterministic_across_worker_counts() {
        let (x, y) = step_data();
        let serial = RandomForest::fit(
            &x,
            &y,
            &ForestParams {
                n_estimators: 12,
                n_jobs: 1,
                ..Default::default()
            },
        );
        let parallel = RandomForest::fit(
            &x,
            &y,
            &ForestParams {
                n_estimators: 12,
                n_jobs: 4,
                ..Default::default()
            },
        );

        assert_eq!(serial.n_trees(), 12);
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_forest_predictions_follow_target() {
        let (x, y) = step_data();
        let forest = RandomForest::fit(
            &x,
            &y,
            &ForestParams {
                n_estimators: 30,
                n_jobs: 2,
                ..Default::default()
            },
        );

        assert!(forest.predict(&[2.0, 0.0]) < 2.0);
        assert!(forest.predict(&[17.0, 0.0]) > 4.0);
    }

    #[test]
    fn test_validate_tree_structure() {
        let (x, y) = step_data();
        let forest = RandomForest::fit(
            &x,
            &y,
            &ForestParams {
                n_estimators: 3,
                n_jobs: 1,
                ..Default::default()
            },
        );
        assert!(forest.validate().is_ok());

        let empty_tree = RegressionTree { nodes: Vec::new() };
        assert!(empty_tree.validate().is_err());

        let dangling = RegressionTree {
            nodes: vec![
                Node::Split {
                    feature: 0,
                    threshold: 1.0,
                    left: 1,
                    right: 7,
                },
                Node::Leaf { value: 1.0 },
            ],
        };
        assert!(dangling.validate().is_err());

        let cyclic = RegressionTree {
            nodes: vec![
                Node::Split {
                    feature: 0,
                    threshold: 1.0,
                    left: 0,
                    right: 1,
                },
                Node::Leaf { value: 1.0 },
            ],
        };
        assert!(cyclic.validate().is_err());

        assert!(RandomForest { trees: Vec::new() }.validate().is_err());
    }
}
