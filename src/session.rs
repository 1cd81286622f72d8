//! Session State
//!
//! A [`Session`] is the explicit context a front end holds between runs:
//! - `original` - the decoded source, shared so background runs need no copy
//! - `processed` - the latest pipeline output, if any
//! - source path, container format and transparency flag for display
//!
//! Sessions are independent values. Two sessions can be processed from
//! different threads at the same time; one session is mutated by one caller.

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use crate::buffer::{detect_transparency, PixelBuffer};
use crate::codec::{self, format_name};
use crate::error::{PixelArtError, Result};
use crate::pixelate::apply_pixelation;
use crate::settings::{ProcessingParameters, SaveOptions};

// ============================================================================
// IMAGE INFO
// ============================================================================

/// Summary of a source image for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    /// Container format name such as "PNG"; `None` for in-memory sources
    pub source_format: Option<String>,
}

pub fn get_image_info(buffer: &PixelBuffer, source_format: Option<ImageFormat>) -> ImageInfo {
    ImageInfo {
        width: buffer.width(),
        height: buffer.height(),
        has_alpha: buffer.has_alpha(),
        source_format: source_format.map(format_name),
    }
}

// ============================================================================
// SESSION
// ============================================================================

#[derive(Debug, Clone)]
pub struct Session {
    original: Arc<PixelBuffer>,
    processed: Option<PixelBuffer>,
    source_path: Option<PathBuf>,
    source_format: Option<ImageFormat>,
    has_transparency: bool,
}

impl Session {
    /// Load a file and start a session around it
    pub fn open(path: &Path) -> Result<Self> {
        let loaded = codec::load(path)?;
        let mut session = Self::from_buffer(loaded.buffer);
        session.source_path = Some(path.to_path_buf());
        session.source_format = loaded.format;
        Ok(session)
    }

    /// Start a session from an in-memory buffer
    pub fn from_buffer(buffer: PixelBuffer) -> Self {
        let has_transparency = detect_transparency(&buffer);
        Self {
            original: Arc::new(buffer),
            processed: None,
            source_path: None,
            source_format: None,
            has_transparency,
        }
    }

    pub fn original(&self) -> &PixelBuffer {
        &self.original
    }

    /// Shared handle to the original, for handing to a background worker
    pub fn original_shared(&self) -> Arc<PixelBuffer> {
        Arc::clone(&self.original)
    }

    pub fn processed(&self) -> Option<&PixelBuffer> {
        self.processed.as_ref()
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn has_transparency(&self) -> bool {
        self.has_transparency
    }

    pub fn image_info(&self) -> ImageInfo {
        get_image_info(&self.original, self.source_format)
    }

    /// Run the pipeline on the original and keep the result.
    ///
    /// On failure the previous `processed` buffer is left as it was.
    pub fn apply(&mut self, params: &ProcessingParameters) -> Result<&PixelBuffer> {
        let result = apply_pixelation(&self.original, params)?;
        Ok(self.processed.insert(result))
    }

    /// Store a result produced elsewhere, e.g. by a background worker
    pub fn set_processed(&mut self, buffer: PixelBuffer) {
        self.processed = Some(buffer);
    }

    /// Forget the processed result, keeping the original
    pub fn reset(&mut self) {
        self.processed = None;
    }

    pub fn save_processed(&self, path: &Path, options: &SaveOptions) -> Result<()> {
        let processed = self.processed.as_ref().ok_or_else(|| {
            PixelArtError::SaveFailure("No processed image to save".to_string())
        })?;
        codec::save(processed, path, options)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Layout;

    fn opaque() -> PixelBuffer {
        let samples: Vec<u8> = (0..20 * 20).flat_map(|i| [(i % 256) as u8, 40, 90]).collect();
        PixelBuffer::new(20, 20, Layout::Rgb, samples).unwrap()
    }

    #[test]
    fn test_session_new() {
        let session = Session::from_buffer(opaque());
        assert!(session.processed().is_none());
        assert!(!session.has_transparency());
        assert_eq!(
            session.image_info(),
            ImageInfo {
                width: 20,
                height: 20,
                has_alpha: false,
                source_format: None,
            }
        );
    }

    #[test]
    fn test_apply_repeatedly_from_same_original() {
        let mut session = Session::from_buffer(opaque());
        let coarse = session
            .apply(&ProcessingParameters {
                pixel_size: 10,
                num_colors: 2,
                ..ProcessingParameters::default()
            })
            .unwrap()
            .clone();
        let fine = session
            .apply(&ProcessingParameters {
                pixel_size: 2,
                num_colors: 16,
                ..ProcessingParameters::default()
            })
            .unwrap()
            .clone();

        assert_ne!(coarse, fine);
        assert_eq!(session.processed(), Some(&fine));
        assert_eq!(session.original(), &opaque());
    }

    #[test]
    fn test_failed_apply_keeps_previous_result() {
        let mut session = Session::from_buffer(opaque());
        session.apply(&ProcessingParameters::default()).unwrap();
        let before = session.processed().cloned();

        let err = session
            .apply(&ProcessingParameters {
                pixel_size: 50,
                ..ProcessingParameters::default()
            })
            .unwrap_err();
        assert!(matches!(err, PixelArtError::DegenerateOutput { .. }));
        assert_eq!(session.processed().cloned(), before);
    }

    #[test]
    fn test_save_without_processing_fails() {
        let session = Session::from_buffer(opaque());
        let dir = tempfile::tempdir().unwrap();
        let err = session
            .save_processed(&dir.path().join("out.png"), &SaveOptions::default())
            .unwrap_err();
        assert!(matches!(err, PixelArtError::SaveFailure(_)));
    }

    #[test]
    fn test_open_process_save() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        codec::save(&opaque(), &input, &SaveOptions::default()).unwrap();

        let mut session = Session::open(&input).unwrap();
        assert_eq!(session.source_path(), Some(input.as_path()));
        assert_eq!(session.image_info().source_format.as_deref(), Some("PNG"));

        session.apply(&ProcessingParameters::default()).unwrap();
        let output = dir.path().join("out.bmp");
        session.save_processed(&output, &SaveOptions::default()).unwrap();
        assert!(output.exists());

        session.reset();
        assert!(session.processed().is_none());
    }
}
