use burn::nn::loss::CrossEntropyLossConfig;
use burn::tensor::Tensor;
use models::Segmenter;
use seg_dataset::{SegBatchIter, SegDatasetConfig, SegSample};
use training::{evaluate, evaluate_with_masks, TrainBackend};
use vision_core::ClassPalette;

type B = TrainBackend;

/// Predicts, per pixel, the class nearest to the value in channel 0. With
/// images whose pixels hold their own class id, this model is always right.
struct NearestClassModel {
    num_classes: usize,
}

impl Segmenter<B> for NearestClassModel {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        let [n, _c, h, w] = images.dims();
        let x = images.slice([0..n, 0..1, 0..h, 0..w]);
        let mut per_class = Vec::with_capacity(self.num_classes);
        for class in 0..self.num_classes {
            let diff = x.clone().sub_scalar(class as f32);
            per_class.push(diff.clone().mul(diff).neg());
        }
        Tensor::cat(per_class, 1)
    }
}

/// Ignores the input and always scores `class` highest.
struct FixedClassModel {
    num_classes: usize,
    class: usize,
}

impl Segmenter<B> for FixedClassModel {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        let [n, _c, h, w] = images.dims();
        let device = images.device();
        let mut per_class = Vec::with_capacity(self.num_classes);
        for class in 0..self.num_classes {
            let score = if class == self.class { 1.0 } else { 0.0 };
            per_class.push(Tensor::<B, 4>::full([n, 1, h, w], score, &device));
        }
        Tensor::cat(per_class, 1)
    }
}

/// Sample whose image pixels hold the class id in every channel.
fn encoded_sample(size: u32, classes: Vec<i64>) -> SegSample {
    let pixels = (size * size) as usize;
    assert_eq!(classes.len(), pixels);
    let plane: Vec<f32> = classes.iter().map(|c| *c as f32).collect();
    let mut image_chw = Vec::with_capacity(3 * pixels);
    for _ in 0..3 {
        image_chw.extend_from_slice(&plane);
    }
    SegSample {
        image_chw,
        classes,
        width: size,
        height: size,
    }
}

fn cfg(num_classes: usize) -> SegDatasetConfig {
    SegDatasetConfig {
        shuffle: false,
        seed: None,
        drop_last: false,
        num_classes,
    }
}

#[test]
fn perfect_model_scores_full_accuracy() -> anyhow::Result<()> {
    let samples = vec![
        encoded_sample(4, vec![0, 1, 2, 0, 1, 2, 0, 1, 2, 0, 1, 2, 0, 1, 2, 0]),
        encoded_sample(4, vec![2; 16]),
        encoded_sample(4, vec![1; 16]),
    ];
    let mut iter = SegBatchIter::from_samples(samples, cfg(3))?;
    let device = Default::default();
    let model = NearestClassModel { num_classes: 3 };
    let criterion = CrossEntropyLossConfig::new().init::<B>(&device);

    let (acc, loss) = evaluate(&mut iter, &model, &criterion, 2, &device)?;
    assert_eq!(acc, 1.0);
    assert!(loss.is_finite());
    Ok(())
}

#[test]
fn averaging_uses_batch_count_not_sample_count() -> anyhow::Result<()> {
    // Batch 1 holds a wrong sample and a right one (accuracy 0.5), batch 2
    // a single right sample (accuracy 1.0). Batch-mean is 0.75; the
    // sample-weighted mean would be 2/3.
    let samples = vec![
        encoded_sample(2, vec![1; 4]),
        encoded_sample(2, vec![0; 4]),
        encoded_sample(2, vec![0; 4]),
    ];
    let mut iter = SegBatchIter::from_samples(samples, cfg(2))?;
    let device = Default::default();
    let model = FixedClassModel {
        num_classes: 2,
        class: 0,
    };
    let criterion = CrossEntropyLossConfig::new().init::<B>(&device);

    let (acc, _loss) = evaluate(&mut iter, &model, &criterion, 2, &device)?;
    assert!((acc - 0.75).abs() < 1e-9);
    Ok(())
}

#[test]
fn empty_iterator_is_an_error() -> anyhow::Result<()> {
    let mut iter = SegBatchIter::from_samples(Vec::new(), cfg(2))?;
    let device = Default::default();
    let model = FixedClassModel {
        num_classes: 2,
        class: 0,
    };
    let criterion = CrossEntropyLossConfig::new().init::<B>(&device);
    assert!(evaluate(&mut iter, &model, &criterion, 2, &device).is_err());
    Ok(())
}

#[test]
fn mask_eval_writes_label_and_result_pairs() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let samples = vec![
        encoded_sample(2, vec![0; 4]),
        encoded_sample(2, vec![0; 4]),
        encoded_sample(2, vec![1; 4]),
    ];
    let mut iter = SegBatchIter::from_samples(samples, cfg(2))?;
    let device = Default::default();
    let model = NearestClassModel { num_classes: 2 };
    let criterion = CrossEntropyLossConfig::new().init::<B>(&device);
    let palette = ClassPalette::from_colors(vec![[0, 0, 0], [128, 0, 0]]);

    let (acc, _loss) = evaluate_with_masks(
        &mut iter,
        &model,
        &criterion,
        &palette,
        temp.path(),
        2,
        &device,
    )?;
    assert_eq!(acc, 1.0);

    // Prediction equals label, so sample 0 is all background: both files
    // come out all black.
    let label = image::open(temp.path().join("0label.png"))?.to_rgb8();
    let result = image::open(temp.path().join("0result.png"))?.to_rgb8();
    assert!(label.pixels().all(|p| *p == image::Rgb([0, 0, 0])));
    assert!(result.pixels().all(|p| *p == image::Rgb([0, 0, 0])));

    // The sample counter keeps counting across batches.
    assert!(temp.path().join("2label.png").exists());
    assert!(temp.path().join("2result.png").exists());

    // Sample 2 is class 1 everywhere: dark red per the palette.
    let last = image::open(temp.path().join("2result.png"))?.to_rgb8();
    assert!(last.pixels().all(|p| *p == image::Rgb([128, 0, 0])));
    Ok(())
}
