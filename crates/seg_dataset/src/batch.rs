//! Batch iteration for training and validation.

use crate::index::load_sample;
use crate::types::{DatasetResult, SampleIndex, SegDatasetConfig, SegDatasetError, SegSample};
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor, TensorData};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

/// One device-resident batch: images `[N, 3, H, W]` and per-pixel class
/// labels `[N, H, W]`.
pub struct SegBatch<B: Backend> {
    pub images: Tensor<B, 4>,
    pub labels: Tensor<B, 3, Int>,
}

enum Source {
    Disk(Vec<SampleIndex>),
    Memory(Vec<SegSample>),
}

impl Source {
    fn len(&self) -> usize {
        match self {
            Source::Disk(v) => v.len(),
            Source::Memory(v) => v.len(),
        }
    }
}

/// Sequential batch source over an indexed dataset. Each `next_batch` call
/// decodes the next slice of samples (in parallel for on-disk sources) and
/// assembles device tensors; `reset` rewinds for another epoch.
pub struct SegBatchIter {
    source: Source,
    order: Vec<usize>,
    cursor: usize,
    epoch: u64,
    cfg: SegDatasetConfig,
}

impl SegBatchIter {
    pub fn from_indices(indices: Vec<SampleIndex>, cfg: SegDatasetConfig) -> DatasetResult<Self> {
        let mut iter = Self {
            order: (0..indices.len()).collect(),
            source: Source::Disk(indices),
            cursor: 0,
            epoch: 0,
            cfg,
        };
        iter.shuffle_order();
        Ok(iter)
    }

    /// In-memory source, used by tests and synthetic pipelines. Samples are
    /// validated up front the same way on-disk masks are.
    pub fn from_samples(samples: Vec<SegSample>, cfg: SegDatasetConfig) -> DatasetResult<Self> {
        for (i, sample) in samples.iter().enumerate() {
            let pixels = (sample.width * sample.height) as usize;
            if sample.classes.len() != pixels || sample.image_chw.len() != 3 * pixels {
                return Err(SegDatasetError::Other(format!(
                    "sample {i} buffers do not match {}x{}",
                    sample.width, sample.height
                )));
            }
            if let Some(bad) = sample
                .classes
                .iter()
                .find(|c| **c < 0 || **c as usize >= cfg.num_classes)
            {
                return Err(SegDatasetError::Other(format!(
                    "sample {i} class id {bad} out of range 0..{}",
                    cfg.num_classes
                )));
            }
        }
        let mut iter = Self {
            order: (0..samples.len()).collect(),
            source: Source::Memory(samples),
            cursor: 0,
            epoch: 0,
            cfg,
        };
        iter.shuffle_order();
        Ok(iter)
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.len() == 0
    }

    /// Rewind for another pass; reshuffles when the config asks for it, with
    /// an epoch-varied seed so passes differ but stay reproducible.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.epoch += 1;
        self.shuffle_order();
    }

    fn shuffle_order(&mut self) {
        if !self.cfg.shuffle {
            return;
        }
        let mut rng = match self.cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(self.epoch)),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        self.order.shuffle(&mut rng);
    }

    pub fn next_batch<B: Backend>(
        &mut self,
        batch_size: usize,
        device: &B::Device,
    ) -> DatasetResult<Option<SegBatch<B>>> {
        let batch_size = batch_size.max(1);
        loop {
            if self.cursor >= self.order.len() {
                return Ok(None);
            }
            let end = (self.cursor + batch_size).min(self.order.len());
            let slice = &self.order[self.cursor..end];
            self.cursor = end;

            if self.cfg.drop_last && slice.len() < batch_size {
                continue;
            }

            let samples: Vec<SegSample> = match &self.source {
                Source::Disk(indices) => {
                    let mut loaded: Vec<(usize, DatasetResult<SegSample>)> = slice
                        .par_iter()
                        .enumerate()
                        .map(|(i, idx)| (i, load_sample(&indices[*idx], self.cfg.num_classes)))
                        .collect();
                    loaded.sort_by_key(|(i, _)| *i);
                    loaded
                        .into_iter()
                        .map(|(_, res)| res)
                        .collect::<DatasetResult<Vec<_>>>()?
                }
                Source::Memory(samples) => slice.iter().map(|idx| samples[*idx].clone()).collect(),
            };

            let (width, height) = (samples[0].width, samples[0].height);
            let mut images_buf: Vec<f32> =
                Vec::with_capacity(samples.len() * 3 * (width * height) as usize);
            let mut labels_buf: Vec<i64> =
                Vec::with_capacity(samples.len() * (width * height) as usize);
            for sample in &samples {
                if (sample.width, sample.height) != (width, height) {
                    return Err(SegDatasetError::Other(format!(
                        "batch contains varying image sizes: {}x{} and {}x{}",
                        width, height, sample.width, sample.height
                    )));
                }
                images_buf.extend_from_slice(&sample.image_chw);
                labels_buf.extend_from_slice(&sample.classes);
            }

            let batch_len = samples.len();
            let images = Tensor::<B, 1>::from_floats(images_buf.as_slice(), device).reshape([
                batch_len,
                3,
                height as usize,
                width as usize,
            ]);
            let labels = Tensor::<B, 3, Int>::from_data(
                TensorData::new(labels_buf, [batch_len, height as usize, width as usize]),
                device,
            );

            return Ok(Some(SegBatch { images, labels }));
        }
    }
}
