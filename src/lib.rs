//! Image to pixel art conversion.
//!
//! Load an image, then run [`apply_pixelation`] as often as needed with
//! different [`ProcessingParameters`]:
//!
//! ```no_run
//! use img2pix::{ProcessingParameters, SaveOptions, Session};
//! use std::path::Path;
//!
//! let mut session = Session::open(Path::new("photo.png"))?;
//! session.apply(&ProcessingParameters { pixel_size: 10, num_colors: 8, ..Default::default() })?;
//! session.save_processed(Path::new("photo-pixel.png"), &SaveOptions::default())?;
//! # Ok::<(), img2pix::PixelArtError>(())
//! ```

pub mod buffer;
pub mod codec;
pub mod composite;
pub mod enhance;
pub mod error;
pub mod pixelate;
pub mod quantize;
pub mod session;
pub mod settings;
pub mod worker;

pub use buffer::{detect_transparency, ColorPlanes, Layout, PixelBuffer};
pub use codec::{encode_png, load, save, LoadedImage, OutputFormat};
pub use composite::composite;
pub use enhance::enhance;
pub use error::{PixelArtError, Result};
pub use pixelate::{apply_pixelation, fit_within, pixelate};
pub use quantize::{build_palette, count_colors, quantize, Palette};
pub use session::{get_image_info, ImageInfo, Session};
pub use settings::{ProcessingParameters, SaveOptions};
