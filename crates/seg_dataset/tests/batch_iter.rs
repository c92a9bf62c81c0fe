use seg_dataset::{
    index_pairs, load_sample, SegBatchIter, SegDatasetConfig, SegDatasetError, SegSample,
};
use std::fs;

type Backend = burn_ndarray::NdArray<f32>;

fn write_pair(dir: &std::path::Path, name: &str, size: u32, class_id: u8) -> anyhow::Result<()> {
    let images_dir = dir.join("images");
    let masks_dir = dir.join("masks");
    fs::create_dir_all(&images_dir)?;
    fs::create_dir_all(&masks_dir)?;
    let img = image::RgbImage::from_fn(size, size, |_x, _y| image::Rgb([128, 64, 32]));
    img.save(images_dir.join(format!("{name}.png")))?;
    let mask = image::GrayImage::from_fn(size, size, |_x, _y| image::Luma([class_id]));
    mask.save(masks_dir.join(format!("{name}.png")))?;
    Ok(())
}

fn unshuffled(num_classes: usize) -> SegDatasetConfig {
    SegDatasetConfig {
        shuffle: false,
        seed: Some(1),
        drop_last: false,
        num_classes,
    }
}

#[test]
fn index_and_iterate_disk_pairs() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    write_pair(temp.path(), "a", 4, 2)?;
    write_pair(temp.path(), "b", 4, 3)?;

    let indices = index_pairs(&temp.path().join("images"), &temp.path().join("masks"))?;
    assert_eq!(indices.len(), 2);

    let mut iter = SegBatchIter::from_indices(indices, unshuffled(5))?;
    let device = Default::default();
    let batch = iter
        .next_batch::<Backend>(2, &device)?
        .expect("one full batch");
    assert_eq!(batch.images.dims(), [2, 3, 4, 4]);
    assert_eq!(batch.labels.dims(), [2, 4, 4]);

    let labels: Vec<i64> = batch.labels.into_data().to_vec().unwrap();
    assert!(labels[..16].iter().all(|v| *v == 2));
    assert!(labels[16..].iter().all(|v| *v == 3));
    assert!(iter.next_batch::<Backend>(2, &device)?.is_none());
    Ok(())
}

#[test]
fn missing_mask_is_an_error() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    write_pair(temp.path(), "a", 4, 0)?;
    fs::remove_file(temp.path().join("masks").join("a.png"))?;

    let err = index_pairs(&temp.path().join("images"), &temp.path().join("masks"))
        .expect_err("mask is gone");
    assert!(matches!(err, SegDatasetError::MissingMask { .. }));
    Ok(())
}

#[test]
fn out_of_range_class_id_is_rejected() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    write_pair(temp.path(), "a", 4, 9)?;
    let indices = index_pairs(&temp.path().join("images"), &temp.path().join("masks"))?;

    let err = load_sample(&indices[0], 5).expect_err("class 9 exceeds 5 classes");
    assert!(matches!(err, SegDatasetError::Validation { .. }));
    Ok(())
}

#[test]
fn mask_dimension_mismatch_is_rejected() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    write_pair(temp.path(), "a", 4, 0)?;
    let small = image::GrayImage::from_fn(2, 2, |_x, _y| image::Luma([0]));
    small.save(temp.path().join("masks").join("a.png"))?;

    let indices = index_pairs(&temp.path().join("images"), &temp.path().join("masks"))?;
    let err = load_sample(&indices[0], 5).expect_err("mask smaller than image");
    assert!(matches!(err, SegDatasetError::Validation { .. }));
    Ok(())
}

fn constant_sample(size: u32, class_id: i64) -> SegSample {
    let pixels = (size * size) as usize;
    SegSample {
        image_chw: vec![0.5; 3 * pixels],
        classes: vec![class_id; pixels],
        width: size,
        height: size,
    }
}

#[test]
fn drop_last_skips_short_tail() -> anyhow::Result<()> {
    let samples = vec![
        constant_sample(4, 0),
        constant_sample(4, 1),
        constant_sample(4, 2),
    ];
    let cfg = SegDatasetConfig {
        drop_last: true,
        ..unshuffled(5)
    };
    let mut iter = SegBatchIter::from_samples(samples, cfg)?;
    let device = Default::default();

    let first = iter.next_batch::<Backend>(2, &device)?.expect("full batch");
    assert_eq!(first.images.dims()[0], 2);
    // The trailing singleton is dropped.
    assert!(iter.next_batch::<Backend>(2, &device)?.is_none());
    Ok(())
}

#[test]
fn varying_sizes_within_batch_fail() -> anyhow::Result<()> {
    let samples = vec![constant_sample(4, 0), constant_sample(8, 0)];
    let mut iter = SegBatchIter::from_samples(samples, unshuffled(5))?;
    let device = Default::default();
    assert!(iter.next_batch::<Backend>(2, &device).is_err());
    Ok(())
}

#[test]
fn reset_allows_second_epoch() -> anyhow::Result<()> {
    let samples = vec![constant_sample(4, 0), constant_sample(4, 1)];
    let mut iter = SegBatchIter::from_samples(samples, unshuffled(5))?;
    let device = Default::default();

    assert!(iter.next_batch::<Backend>(2, &device)?.is_some());
    assert!(iter.next_batch::<Backend>(2, &device)?.is_none());
    iter.reset();
    assert!(iter.next_batch::<Backend>(2, &device)?.is_some());
    Ok(())
}
