use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::SplitStrategy;

/// Row indices assigned to each side of a train/validation split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// Number of validation rows: `ceil(fraction * n)`, leaving at least one
/// training row.
pub fn validation_size(n: usize, fraction: f64) -> usize {
    let size = (fraction.clamp(0.0, 1.0) * n as f64).ceil() as usize;
    size.min(n.saturating_sub(1))
}

pub fn train_validation_split(n: usize, fraction: f64, strategy: SplitStrategy) -> SplitIndices {
    let n_validation = validation_size(n, fraction);
    let mut indices: Vec<usize> = (0..n).collect();

    match strategy {
        SplitStrategy::Shuffled { seed } => {
            let mut rng = StdRng::seed_from_u64(seed);
            indices.shuffle(&mut rng);
            let train = indices.split_off(n_validation);
            SplitIndices {
                train,
                validation: indices,
            }
        }
        SplitStrategy::Chronological => {
            let validation = indices.split_off(n - n_validation);
            SplitIndices {
                train: indices,
                validation,
            }
        }
    }
}

pub fn select<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| items[i].clone()).collect()
}
