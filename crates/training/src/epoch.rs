//! Training and evaluation passes over a batch source.

use anyhow::Result;
use burn::lr_scheduler::LrScheduler;
use burn::module::AutodiffModule;
use burn::nn::loss::CrossEntropyLoss;
use burn::optim::{GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{Int, Tensor};
use models::Segmenter;
use seg_dataset::SegBatchIter;
use std::path::Path;
use vision_core::{mask_to_rgb, ClassPalette};

use crate::accuracy::accuracy_check_for_batch;

/// Cross-entropy over per-pixel logits: flatten `[N, C, H, W]` logits and
/// `[N, H, W]` labels into one classification problem per pixel.
fn batch_loss<B: Backend>(
    criterion: &CrossEntropyLoss<B>,
    logits: Tensor<B, 4>,
    labels: Tensor<B, 3, Int>,
) -> Tensor<B, 1> {
    let [n, c, h, w] = logits.dims();
    let flat_logits = logits.permute([0, 2, 3, 1]).reshape([n * h * w, c]);
    let flat_labels = labels.reshape([n * h * w]);
    criterion.forward(flat_logits, flat_labels)
}

fn scalar_f32<B: Backend>(loss: Tensor<B, 1>) -> f32 {
    loss.into_data()
        .to_vec::<f32>()
        .unwrap_or_default()
        .into_iter()
        .next()
        .unwrap_or(0.0)
}

fn to_host_i64<B: Backend, const D: usize>(tensor: Tensor<B, D, Int>) -> Result<Vec<i64>> {
    tensor
        .into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .map_err(|e| anyhow::anyhow!("failed to read tensor data: {e:?}"))
}

/// One training pass over the batch source: per batch, move to the device,
/// forward, cross-entropy loss, backward, one optimizer step, and print the
/// loss. The scheduler is accepted for call compatibility but never stepped;
/// the learning rate stays at `lr` for the whole pass.
#[allow(clippy::too_many_arguments)]
pub fn train_epoch<B, M, O, S>(
    iter: &mut SegBatchIter,
    mut model: M,
    criterion: &CrossEntropyLoss<B>,
    optim: &mut O,
    _scheduler: &mut S,
    lr: f64,
    batch_size: usize,
    device: &B::Device,
) -> Result<M>
where
    B: AutodiffBackend,
    M: Segmenter<B> + AutodiffModule<B>,
    O: Optimizer<M, B>,
    S: LrScheduler,
{
    while let Some(batch) = iter.next_batch::<B>(batch_size, device)? {
        let images = batch.images.to_device(device);
        let labels = batch.labels.to_device(device);

        let logits = model.forward(images);
        let loss = batch_loss(criterion, logits, labels);
        let loss_detached = loss.clone().detach();
        let grads = GradientsParams::from_grads(loss.backward(), &model);
        model = optim.step(lr, model, grads);

        println!("loss: {:.6}", scalar_f32(loss_detached));
    }
    Ok(model)
}

/// One inference pass: per batch, loss plus arg-max decoding over the class
/// dimension and batch pixel accuracy. Returns `(mean accuracy, mean loss)`
/// where the denominator is the number of batches processed, not samples.
pub fn evaluate<B, M>(
    iter: &mut SegBatchIter,
    model: &M,
    criterion: &CrossEntropyLoss<B>,
    batch_size: usize,
    device: &B::Device,
) -> Result<(f64, f64)>
where
    B: Backend,
    M: Segmenter<B>,
{
    let mut total_acc = 0.0;
    let mut total_loss = 0.0;
    let mut batches = 0usize;

    while let Some(batch) = iter.next_batch::<B>(batch_size, device)? {
        let images = batch.images.to_device(device);
        let labels = batch.labels.to_device(device);

        let logits = model.forward(images);
        let loss = batch_loss(criterion, logits.clone(), labels.clone());
        let [n, _c, h, w] = logits.dims();
        let preds = logits.argmax(1).reshape([n, h, w]);

        let preds_host = to_host_i64(preds)?;
        let labels_host = to_host_i64(labels)?;
        total_acc += accuracy_check_for_batch(&labels_host, &preds_host, n);
        total_loss += scalar_f32(loss) as f64;
        batches += 1;
    }

    if batches == 0 {
        anyhow::bail!("evaluation iterator produced no batches");
    }
    Ok((total_acc / batches as f64, total_loss / batches as f64))
}

/// Same aggregates as [`evaluate`], and additionally renders every sample's
/// predicted and ground-truth grids through the palette, saved as
/// `<dir>/<n>label.png` and `<dir>/<n>result.png`. The sample counter is
/// local to the call. Files written before an error are left in place.
pub fn evaluate_with_masks<B, M>(
    iter: &mut SegBatchIter,
    model: &M,
    criterion: &CrossEntropyLoss<B>,
    palette: &ClassPalette,
    out_dir: &Path,
    batch_size: usize,
    device: &B::Device,
) -> Result<(f64, f64)>
where
    B: Backend,
    M: Segmenter<B>,
{
    let mut total_acc = 0.0;
    let mut total_loss = 0.0;
    let mut batches = 0usize;
    let mut sample_idx = 0usize;

    while let Some(batch) = iter.next_batch::<B>(batch_size, device)? {
        let images = batch.images.to_device(device);
        let labels = batch.labels.to_device(device);

        let logits = model.forward(images);
        let loss = batch_loss(criterion, logits.clone(), labels.clone());
        let [n, _c, h, w] = logits.dims();
        let preds = logits.argmax(1).reshape([n, h, w]);

        let preds_host = to_host_i64(preds)?;
        let labels_host = to_host_i64(labels)?;
        total_acc += accuracy_check_for_batch(&labels_host, &preds_host, n);
        total_loss += scalar_f32(loss) as f64;
        batches += 1;

        let per_sample = h * w;
        for i in 0..n {
            let start = i * per_sample;
            let end = start + per_sample;
            let label_img =
                mask_to_rgb(&labels_host[start..end], w as u32, h as u32, palette)?;
            let result_img = mask_to_rgb(&preds_host[start..end], w as u32, h as u32, palette)?;
            label_img.save(out_dir.join(format!("{sample_idx}label.png")))?;
            result_img.save(out_dir.join(format!("{sample_idx}result.png")))?;
            sample_idx += 1;
        }
    }

    if batches == 0 {
        anyhow::bail!("evaluation iterator produced no batches");
    }
    Ok((total_acc / batches as f64, total_loss / batches as f64))
}
