use thiserror::Error;

#[derive(Error, Debug)]
pub enum PixelArtError {
    #[error("Failed to load image: {0}")]
    LoadFailure(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Image of {width}x{height} is too small for pixel size {pixel_size}")]
    DegenerateOutput {
        width: u32,
        height: u32,
        pixel_size: u32,
    },

    #[error("Failed to save image: {0}")]
    SaveFailure(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Background task failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, PixelArtError>;

impl From<serde_json::Error> for PixelArtError {
    fn from(e: serde_json::Error) -> Self {
        PixelArtError::Config(e.to_string())
    }
}

// Implement Serialize so UI error responses carry the display message
impl serde::Serialize for PixelArtError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_message() {
        let err = PixelArtError::DegenerateOutput {
            width: 4,
            height: 3,
            pixel_size: 8,
        };
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Image of 4x3 is too small for pixel size 8\"");
    }

    #[test]
    fn test_json_error_maps_to_config() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: PixelArtError = parse.unwrap_err().into();
        assert!(matches!(err, PixelArtError::Config(_)));
    }
}
