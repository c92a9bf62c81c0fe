//! Train/val splitting over an indexed dataset.

use crate::types::SampleIndex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Shuffle the index and reserve the trailing `val_ratio` fraction for
/// validation. A seed makes the split repeatable across runs.
pub fn split_pairs(
    mut indices: Vec<SampleIndex>,
    val_ratio: f32,
    seed: Option<u64>,
) -> (Vec<SampleIndex>, Vec<SampleIndex>) {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    indices.shuffle(&mut rng);
    let val_ratio = val_ratio.clamp(0.0, 1.0);
    let val_len = ((indices.len() as f32) * val_ratio).round() as usize;
    let split_at = indices.len() - val_len.min(indices.len());
    let val = indices.split_off(split_at);
    (indices, val)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fake_indices(n: usize) -> Vec<SampleIndex> {
        (0..n)
            .map(|i| SampleIndex {
                image_path: PathBuf::from(format!("img{i}.png")),
                mask_path: PathBuf::from(format!("mask{i}.png")),
            })
            .collect()
    }

    #[test]
    fn split_respects_ratio() {
        let (train, val) = split_pairs(fake_indices(10), 0.2, Some(7));
        assert_eq!(train.len(), 8);
        assert_eq!(val.len(), 2);
    }

    #[test]
    fn split_is_seed_deterministic() {
        let (train_a, val_a) = split_pairs(fake_indices(10), 0.3, Some(42));
        let (train_b, val_b) = split_pairs(fake_indices(10), 0.3, Some(42));
        let paths = |v: &[SampleIndex]| -> Vec<PathBuf> {
            v.iter().map(|i| i.image_path.clone()).collect()
        };
        assert_eq!(paths(&train_a), paths(&train_b));
        assert_eq!(paths(&val_a), paths(&val_b));
    }

    #[test]
    fn zero_ratio_keeps_everything_in_train() {
        let (train, val) = split_pairs(fake_indices(5), 0.0, Some(1));
        assert_eq!(train.len(), 5);
        assert!(val.is_empty());
    }
}
