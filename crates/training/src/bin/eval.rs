use anyhow::Result;
use burn::nn::loss::CrossEntropyLossConfig;
use clap::Parser;
use models::{UNet, UNetConfig};
use seg_dataset::{index_pairs, SegBatchIter, SegDatasetConfig};
use std::fs;
use std::path::Path;
use training::util::{validate_backend_choice, BackendKind};
use training::{evaluate, evaluate_with_masks, TrainBackend};
use vision_core::ClassPalette;

#[derive(Parser, Debug)]
#[command(
    name = "eval",
    about = "Evaluate the UNet segmentation model on a dataset (pixel accuracy + loss)"
)]
struct Args {
    /// Directory containing the input images.
    #[arg(long, default_value = "assets/datasets/images")]
    images_dir: String,
    /// Directory containing grayscale class-id masks named by image stem.
    #[arg(long, default_value = "assets/datasets/masks")]
    masks_dir: String,
    /// Backend to use (ndarray or wgpu if enabled).
    #[arg(long, value_enum, default_value_t = BackendKind::NdArray)]
    backend: BackendKind,
    /// Batch size.
    #[arg(long, default_value_t = 2)]
    batch_size: usize,
    /// Number of segmentation classes (must not exceed the palette).
    #[arg(long, default_value_t = 51)]
    num_classes: usize,
    /// Channel count of the first UNet encoder stage.
    #[arg(long, default_value_t = 16)]
    base_channels: usize,
    /// Optional output directory for mask renderings; when set, writes a
    /// <n>label.png / <n>result.png pair per sample.
    #[arg(long)]
    mask_dir: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    validate_backend_choice(args.backend)?;

    let indices = index_pairs(Path::new(&args.images_dir), Path::new(&args.masks_dir))?;
    if indices.is_empty() {
        println!("No image/mask pairs found under {}", args.images_dir);
        return Ok(());
    }

    let palette = ClassPalette::voc_extended();
    if args.num_classes > palette.num_classes() {
        anyhow::bail!(
            "palette covers {} classes, cannot evaluate with {}",
            palette.num_classes(),
            args.num_classes
        );
    }

    let cfg = SegDatasetConfig {
        shuffle: false,
        seed: None,
        drop_last: false,
        num_classes: args.num_classes,
    };
    let mut iter = SegBatchIter::from_indices(indices, cfg)?;

    let device = <TrainBackend as burn::tensor::backend::Backend>::Device::default();
    let model = UNet::<TrainBackend>::new(
        UNetConfig {
            in_channels: 3,
            num_classes: args.num_classes,
            base_channels: args.base_channels,
        },
        &device,
    );
    let criterion = CrossEntropyLossConfig::new().init::<TrainBackend>(&device);
    println!("No persisted weights defined; evaluating a freshly initialized model");

    let (acc, loss) = match &args.mask_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            evaluate_with_masks(
                &mut iter,
                &model,
                &criterion,
                &palette,
                Path::new(dir),
                args.batch_size,
                &device,
            )?
        }
        None => evaluate(&mut iter, &model, &criterion, args.batch_size, &device)?,
    };

    println!("Eval complete: accuracy={:.4}, loss={:.4}", acc, loss);
    Ok(())
}
