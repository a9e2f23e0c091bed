//! Trains one layer on MNIST digits through the request/response service, then tests it.
//!
//! Every request goes through `LayerService`, the same way a socket transport would drive it.
//! After testing, the active columns and the back projection of the last test digit are written
//! as PNG images next to the working directory.
//!
//! Run with `RUST_LOG=htm_layer=debug` to see every step.

use anyhow::{bail, Context};
use image::GrayImage;
use mnist::{Mnist, MnistBuilder};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use htm_layer::core::{
    probabilities::LABEL_COUNT,
    repository::LayerRepository,
    service::{LayerService, Request, Response},
    ActiveColumns, Settings,
};

const IMAGE_DIM: usize = 28;
const TRAINING_LEN: usize = 8_000;
const TEST_LEN: usize = 2_000;

fn one_hot(label: u8) -> Vec<f32> {
    let mut output = vec![0.0; LABEL_COUNT];
    output[label as usize] = 1.0;
    output
}

fn normalize(image: &[u8]) -> Vec<f32> {
    image.iter().map(|&p| p as f32 / 255.0).collect()
}

fn active_columns_image(active: &ActiveColumns, side: usize) -> anyhow::Result<GrayImage> {
    let pixels = active
        .values()
        .iter()
        .enumerate()
        .map(|(col, &potential)| {
            if active.is_fired(col) {
                255
            } else {
                (potential * 64.0) as u8
            }
        })
        .collect();
    GrayImage::from_raw(side as u32, side as u32, pixels).context("active column grid size")
}

fn back_projection_image(projection: &[f32]) -> anyhow::Result<GrayImage> {
    let max = projection.iter().copied().fold(f32::EPSILON, f32::max);
    let pixels = projection.iter().map(|&v| (v / max * 255.0) as u8).collect();
    GrayImage::from_raw(IMAGE_DIM as u32, IMAGE_DIM as u32, pixels).context("back projection size")
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::from_path(&path).with_context(|| format!("loading {path}"))?,
        None => Settings::default(),
    };

    info!("Loading MNIST dataset...");

    let Mnist {
        trn_img,
        trn_lbl,
        tst_img,
        tst_lbl,
        ..
    } = MnistBuilder::new()
        .label_format_digit()
        .training_set_length(TRAINING_LEN as u32)
        .test_set_length(TEST_LEN as u32)
        .finalize();

    let image_len = IMAGE_DIM * IMAGE_DIM;
    let side = settings.column_sqrt_count;
    let service = LayerService::new(Arc::new(LayerRepository::new()), settings);

    let Response::LayerCreated { layer_id } = service.handle(Request::CreateLayer { settings: None })? else {
        bail!("layer was not created");
    };

    info!(%layer_id, "Training on {} images...", trn_lbl.len());

    for (i, (&label, image)) in trn_lbl.iter().zip(trn_img.chunks(image_len)).enumerate() {
        service.handle(Request::Train {
            layer_id,
            input: normalize(image),
            output: one_hot(label),
        })?;

        if (i + 1) % 1_000 == 0 {
            info!("  Trained {}/{} images", i + 1, trn_lbl.len());
        }
    }

    info!("Testing on {} images...", tst_lbl.len());

    let mut correct = 0;
    let mut last = None;

    for (&label, image) in tst_lbl.iter().zip(tst_img.chunks(image_len)) {
        let response = service.handle(Request::Test {
            layer_id,
            input: normalize(image),
            output: Some(one_hot(label)),
        })?;

        if let Response::Guess {
            inference, correct: Some(hit), ..
        } = response
        {
            if hit {
                correct += 1;
            }
            last = Some(inference);
        }
    }

    info!(
        "Accuracy: {:.2}%, Total: {} images, Correct: {}",
        100.0 * (correct as f32 / tst_lbl.len() as f32),
        tst_lbl.len(),
        correct
    );

    if let Some(inference) = last {
        active_columns_image(&inference.active_columns, side)?.save("active_columns.png")?;
        back_projection_image(&inference.back_projection)?.save("back_projection.png")?;
        info!("Wrote active_columns.png and back_projection.png");
    }

    Ok(())
}
