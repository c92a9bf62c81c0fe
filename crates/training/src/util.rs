//! Training-run orchestration: CLI arguments, backend selection, and the
//! epoch driver used by the `train` binary.

use anyhow::Result;
use burn::backend::Autodiff;
use burn::lr_scheduler::linear::LinearLrSchedulerConfig;
use burn::module::AutodiffModule;
use burn::nn::loss::CrossEntropyLossConfig;
use burn::optim::AdamConfig;
use clap::{Parser, ValueEnum};
use models::{UNet, UNetConfig};
use seg_dataset::{index_pairs, split_pairs, SegBatchIter, SegDatasetConfig};
use std::fs;
use std::path::Path;
use vision_core::ClassPalette;

use crate::epoch::{evaluate, evaluate_with_masks, train_epoch};
use crate::TrainBackend;

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum BackendKind {
    NdArray,
    Wgpu,
}

#[derive(Parser, Debug)]
#[command(name = "train", about = "Train the UNet segmentation model")]
pub struct TrainArgs {
    /// Directory containing the input images.
    #[arg(long, default_value = "assets/datasets/images")]
    pub images_dir: String,
    /// Directory containing grayscale class-id masks named by image stem.
    #[arg(long, default_value = "assets/datasets/masks")]
    pub masks_dir: String,
    /// Backend to use (ndarray or wgpu if enabled).
    #[arg(long, value_enum, default_value_t = BackendKind::NdArray)]
    pub backend: BackendKind,
    /// Validation ratio (0..1).
    #[arg(long, default_value_t = 0.2)]
    pub val_ratio: f32,
    /// Number of epochs.
    #[arg(long, default_value_t = 1)]
    pub epochs: usize,
    /// Batch size.
    #[arg(long, default_value_t = 2)]
    pub batch_size: usize,
    /// Learning rate.
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,
    /// Number of segmentation classes (must not exceed the palette).
    #[arg(long, default_value_t = 51)]
    pub num_classes: usize,
    /// Channel count of the first UNet encoder stage.
    #[arg(long, default_value_t = 16)]
    pub base_channels: usize,
    /// Optional shuffle seed for deterministic splits/batching.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Output directory for validation mask renderings; when set, the final
    /// validation pass writes <n>label.png / <n>result.png pairs there.
    #[arg(long)]
    pub mask_dir: Option<String>,
}

pub fn validate_backend_choice(kind: BackendKind) -> Result<()> {
    let built_wgpu = cfg!(feature = "backend-wgpu");
    match (kind, built_wgpu) {
        (BackendKind::Wgpu, false) => {
            anyhow::bail!("backend-wgpu feature not enabled; rebuild with --features backend-wgpu or choose ndarray backend")
        }
        (BackendKind::NdArray, true) => {
            println!("note: built with backend-wgpu; training will still use the WGPU backend despite --backend ndarray");
        }
        _ => {}
    }
    Ok(())
}

type ADBackend = Autodiff<TrainBackend>;

pub fn run_train(args: TrainArgs) -> Result<()> {
    validate_backend_choice(args.backend)?;

    let device = <TrainBackend as burn::tensor::backend::Backend>::Device::default();
    let indices = index_pairs(Path::new(&args.images_dir), Path::new(&args.masks_dir))?;
    if indices.is_empty() {
        anyhow::bail!("no image/mask pairs found under {}", args.images_dir);
    }
    let (train_idx, val_idx) = split_pairs(indices, args.val_ratio, args.seed);
    if train_idx.is_empty() {
        anyhow::bail!("training split is empty; lower --val-ratio");
    }

    let palette = ClassPalette::voc_extended();
    if args.num_classes > palette.num_classes() {
        anyhow::bail!(
            "palette covers {} classes, cannot train with {}",
            palette.num_classes(),
            args.num_classes
        );
    }

    let train_cfg = SegDatasetConfig {
        shuffle: true,
        seed: args.seed,
        drop_last: false,
        num_classes: args.num_classes,
    };
    let val_cfg = SegDatasetConfig {
        shuffle: false,
        ..train_cfg.clone()
    };

    let mut model = UNet::<ADBackend>::new(
        UNetConfig {
            in_channels: 3,
            num_classes: args.num_classes,
            base_channels: args.base_channels,
        },
        &device,
    );
    let mut optim = AdamConfig::new().init();
    let criterion = CrossEntropyLossConfig::new().init::<ADBackend>(&device);
    let val_criterion = CrossEntropyLossConfig::new().init::<TrainBackend>(&device);

    // The loop accepts a scheduler for call compatibility but never steps
    // it; a flat schedule keeps that explicit.
    let batch_size = args.batch_size.max(1);
    let total_steps = {
        let per_epoch = (train_idx.len() + batch_size - 1) / batch_size;
        (per_epoch * args.epochs).max(1)
    };
    let mut scheduler = LinearLrSchedulerConfig::new(args.lr, args.lr, total_steps)
        .init()
        .map_err(anyhow::Error::msg)?;

    for epoch in 0..args.epochs {
        println!("epoch {}", epoch + 1);
        let mut train_iter = SegBatchIter::from_indices(train_idx.clone(), train_cfg.clone())?;
        model = train_epoch(
            &mut train_iter,
            model,
            &criterion,
            &mut optim,
            &mut scheduler,
            args.lr,
            batch_size,
            &device,
        )?;

        if !val_idx.is_empty() {
            let mut val_iter = SegBatchIter::from_indices(val_idx.clone(), val_cfg.clone())?;
            let eval_model = model.valid();
            let (acc, loss) = evaluate(
                &mut val_iter,
                &eval_model,
                &val_criterion,
                batch_size,
                &device,
            )?;
            println!("epoch {}: val acc {:.4}, val loss {:.4}", epoch + 1, acc, loss);
        }
    }

    if let Some(dir) = &args.mask_dir {
        if val_idx.is_empty() {
            anyhow::bail!("--mask-dir requires a non-empty validation split");
        }
        fs::create_dir_all(dir)?;
        let mut val_iter = SegBatchIter::from_indices(val_idx, val_cfg)?;
        let eval_model = model.valid();
        let (acc, loss) = evaluate_with_masks(
            &mut val_iter,
            &eval_model,
            &val_criterion,
            &palette,
            Path::new(dir),
            batch_size,
            &device,
        )?;
        println!("val acc {:.4}, val loss {:.4}; masks written to {}", acc, loss, dir);
    }

    Ok(())
}
