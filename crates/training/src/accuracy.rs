//! Pixel-accuracy helpers over class-id grids.

/// Fraction of positions where two equally-sized class grids agree, in
/// [0, 1]. Equal length is a caller contract.
pub fn accuracy_check(label: &[i64], pred: &[i64]) -> f64 {
    debug_assert_eq!(label.len(), pred.len());
    if label.is_empty() {
        return 0.0;
    }
    let matches = label.iter().zip(pred.iter()).filter(|(l, p)| l == p).count();
    matches as f64 / label.len() as f64
}

/// Mean of per-sample [`accuracy_check`] over the leading batch dimension.
/// `labels` and `preds` hold `batch_size` equally-sized grids back to back.
pub fn accuracy_check_for_batch(labels: &[i64], preds: &[i64], batch_size: usize) -> f64 {
    debug_assert_eq!(labels.len(), preds.len());
    if batch_size == 0 || labels.is_empty() {
        return 0.0;
    }
    let per_sample = labels.len() / batch_size;
    let mut total_acc = 0.0;
    for i in 0..batch_size {
        let start = i * per_sample;
        let end = start + per_sample;
        total_acc += accuracy_check(&labels[start..end], &preds[start..end]);
    }
    total_acc / batch_size as f64
}
