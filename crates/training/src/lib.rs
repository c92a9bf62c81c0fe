#![recursion_limit = "256"]

pub mod accuracy;
pub mod epoch;
pub mod util;

pub use accuracy::{accuracy_check, accuracy_check_for_batch};
pub use epoch::{evaluate, evaluate_with_masks, train_epoch};
pub use util::{run_train, validate_backend_choice, TrainArgs};

/// Backend alias for training/eval (NdArray by default; WGPU if enabled).
#[cfg(feature = "backend-wgpu")]
pub type TrainBackend = burn_wgpu::Wgpu<f32>;
#[cfg(not(feature = "backend-wgpu"))]
pub type TrainBackend = burn_ndarray::NdArray<f32>;
