//! Visualization and persistence of materialized tensors.

use crate::tensor::{Outputs, Tensor};
use basalt_core::{Result, RunnerError};
use std::path::{Path, PathBuf};

/// Normalize one channel slice in place for display.
///
/// Subtracts the channel mean, then divides by the range of the
/// mean-subtracted values only when that range is strictly positive. A
/// constant channel therefore ends up at zero everywhere instead of
/// dividing by zero. Scaling to the 0-255 display range is the caller's
/// step.
pub fn normalize_channel(values: &mut [f32]) {
    if values.is_empty() {
        return;
    }
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    for v in values.iter_mut() {
        *v -= mean;
    }
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in values.iter() {
        min = min.min(v);
        max = max.max(v);
    }
    let range = max - min;
    if range > 0.0 {
        for v in values.iter_mut() {
            *v /= range;
        }
    }
}

/// Write each channel of an `(height, width, channels)` tensor as an
/// independent 8-bit grayscale PNG named `<prefix>-<channel>.png`.
///
/// Channels are normalized with [`normalize_channel`], scaled to 0-255,
/// and clamped. Returns the written paths in channel order.
///
/// # Errors
/// Fails with [`RunnerError::Export`] if the tensor is not 3-D or a file
/// cannot be written.
pub fn save_channel_images(prefix: &str, tensor: &Tensor) -> Result<Vec<PathBuf>> {
    let &[h, w, channels] = tensor.shape() else {
        return Err(RunnerError::Export(format!(
            "expected a (height, width, channels) tensor, got shape {:?}",
            tensor.shape()
        )));
    };

    let mut paths = Vec::with_capacity(channels);
    for c in 0..channels {
        let mut slice = tensor.channel(c)?;
        normalize_channel(&mut slice);

        let pixels: Vec<u8> = slice
            .iter()
            .map(|&v| (v * 255.0).clamp(0.0, 255.0) as u8)
            .collect();
        let img = image::GrayImage::from_raw(w as u32, h as u32, pixels).ok_or_else(|| {
            RunnerError::Export(format!("channel {c} does not fill a {w}x{h} image"))
        })?;

        let path = PathBuf::from(format!("{prefix}-{c}.png"));
        img.save(&path)
            .map_err(|e| RunnerError::Export(format!("writing {}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), "saved channel image");
        paths.push(path);
    }
    Ok(paths)
}

/// The external persistence collaborator.
///
/// Accepts an n-dimensional float tensor and a destination path,
/// synchronously. The on-disk layout is owned entirely by the
/// implementor; the runner assumes nothing about it.
pub trait TensorSink {
    /// Persist `tensor` to `path`.
    ///
    /// # Errors
    /// Implementors map their own failures into [`RunnerError::Export`].
    fn persist(&mut self, path: &Path, tensor: &Tensor) -> Result<()>;
}

/// Hand every output tensor to `sink`, once each, in binding order.
///
/// `path_for` maps a semantic output name to its destination path.
///
/// # Errors
/// Stops at and propagates the first sink failure.
pub fn persist_outputs<S, F>(sink: &mut S, outputs: &Outputs, mut path_for: F) -> Result<()>
where
    S: TensorSink + ?Sized,
    F: FnMut(&str) -> PathBuf,
{
    for (name, tensor) in outputs.iter() {
        let path = path_for(name);
        sink.persist(&path, tensor)?;
        tracing::info!(name, path = %path.display(), "persisted tensor");
    }
    Ok(())
}
