//! Burn ML models for semantic segmentation.
//!
//! This crate defines the network architecture used for per-pixel
//! classification:
//! - `UNet`: encoder/decoder segmentation network with skip connections.
//!
//! These are pure Burn Modules with no awareness of datasets or training
//! loops. The `training` crate drives them through the `Segmenter` trait.

use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::PaddingConfig2d;
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Anything that maps an image batch `[N, C, H, W]` to per-class logits
/// `[N, num_classes, H, W]`. The training and evaluation loops are generic
/// over this seam.
pub trait Segmenter<B: Backend> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4>;
}

#[derive(Debug, Clone)]
pub struct UNetConfig {
    pub in_channels: usize,
    pub num_classes: usize,
    /// Channel count of the first encoder stage; doubles at each level.
    pub base_channels: usize,
}

impl Default for UNetConfig {
    fn default() -> Self {
        Self {
            in_channels: 3,
            num_classes: 51,
            base_channels: 16,
        }
    }
}

/// Two padded 3x3 convolutions with ReLU, the basic U-Net block.
#[derive(Debug, Module)]
pub struct DoubleConv<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
}

impl<B: Backend> DoubleConv<B> {
    pub fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        let conv1 = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let conv2 = Conv2dConfig::new([out_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        Self { conv1, conv2 }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = relu(self.conv1.forward(input));
        relu(self.conv2.forward(x))
    }
}

/// Four-level U-Net. Input height and width must be divisible by 16 so the
/// pooled encoder stages line up with the upsampled decoder stages.
#[derive(Debug, Module)]
pub struct UNet<B: Backend> {
    enc1: DoubleConv<B>,
    enc2: DoubleConv<B>,
    enc3: DoubleConv<B>,
    enc4: DoubleConv<B>,
    bottleneck: DoubleConv<B>,
    up4: ConvTranspose2d<B>,
    dec4: DoubleConv<B>,
    up3: ConvTranspose2d<B>,
    dec3: DoubleConv<B>,
    up2: ConvTranspose2d<B>,
    dec2: DoubleConv<B>,
    up1: ConvTranspose2d<B>,
    dec1: DoubleConv<B>,
    head: Conv2d<B>,
    pool: MaxPool2d,
}

impl<B: Backend> UNet<B> {
    pub fn new(cfg: UNetConfig, device: &B::Device) -> Self {
        let c = cfg.base_channels.max(1);
        let upconv = |from: usize, to: usize| {
            ConvTranspose2dConfig::new([from, to], [2, 2])
                .with_stride([2, 2])
                .init(device)
        };
        Self {
            enc1: DoubleConv::new(cfg.in_channels, c, device),
            enc2: DoubleConv::new(c, c * 2, device),
            enc3: DoubleConv::new(c * 2, c * 4, device),
            enc4: DoubleConv::new(c * 4, c * 8, device),
            bottleneck: DoubleConv::new(c * 8, c * 16, device),
            up4: upconv(c * 16, c * 8),
            dec4: DoubleConv::new(c * 16, c * 8, device),
            up3: upconv(c * 8, c * 4),
            dec3: DoubleConv::new(c * 8, c * 4, device),
            up2: upconv(c * 4, c * 2),
            dec2: DoubleConv::new(c * 4, c * 2, device),
            up1: upconv(c * 2, c),
            dec1: DoubleConv::new(c * 2, c, device),
            head: Conv2dConfig::new([c, cfg.num_classes], [1, 1]).init(device),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
        }
    }

    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        let e1 = self.enc1.forward(images);
        let e2 = self.enc2.forward(self.pool.forward(e1.clone()));
        let e3 = self.enc3.forward(self.pool.forward(e2.clone()));
        let e4 = self.enc4.forward(self.pool.forward(e3.clone()));
        let bottom = self.bottleneck.forward(self.pool.forward(e4.clone()));

        let d4 = self
            .dec4
            .forward(Tensor::cat(vec![self.up4.forward(bottom), e4], 1));
        let d3 = self
            .dec3
            .forward(Tensor::cat(vec![self.up3.forward(d4), e3], 1));
        let d2 = self
            .dec2
            .forward(Tensor::cat(vec![self.up2.forward(d3), e2], 1));
        let d1 = self
            .dec1
            .forward(Tensor::cat(vec![self.up1.forward(d2), e1], 1));

        self.head.forward(d1)
    }
}

impl<B: Backend> Segmenter<B> for UNet<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        UNet::forward(self, images)
    }
}

pub mod prelude {
    pub use super::{Segmenter, UNet, UNetConfig};
}
