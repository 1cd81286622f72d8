//! Background helpers for front ends that must keep their own thread free.
//!
//! The pipeline is synchronous. These wrappers move a call onto tokio's
//! blocking pool; there is no cancellation, and dropping the returned future
//! just discards the result once the run finishes.

use std::path::PathBuf;
use std::sync::Arc;
use crate::buffer::PixelBuffer;
use crate::codec::{self, LoadedImage};
use crate::error::{PixelArtError, Result};
use crate::pixelate::apply_pixelation;
use crate::settings::{ProcessingParameters, SaveOptions};

fn join_error(e: tokio::task::JoinError) -> PixelArtError {
    PixelArtError::Worker(format!("Task join error: {}", e))
}

pub async fn apply_pixelation_in_background(
    original: Arc<PixelBuffer>,
    params: ProcessingParameters,
) -> Result<PixelBuffer> {
    tokio::task::spawn_blocking(move || apply_pixelation(&original, &params))
        .await
        .map_err(join_error)?
}

pub async fn load_in_background(path: PathBuf) -> Result<LoadedImage> {
    tokio::task::spawn_blocking(move || codec::load(&path))
        .await
        .map_err(join_error)?
}

pub async fn save_in_background(
    buffer: Arc<PixelBuffer>,
    path: PathBuf,
    options: SaveOptions,
) -> Result<()> {
    tokio::task::spawn_blocking(move || codec::save(&buffer, &path, &options))
        .await
        .map_err(join_error)?
}
