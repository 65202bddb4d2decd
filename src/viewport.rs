use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Page viewport dimensions in CSS pixels.
///
/// The default matches the browser engine's own default viewport, so captures
/// without any viewport configuration come out at 800x600.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Error)]
pub enum ViewportParseError {
    #[error("invalid viewport format, expected WIDTHxHEIGHT (e.g. 800x600)")]
    InvalidFormat,
    #[error("invalid viewport dimension: {0}")]
    InvalidDimension(String),
    #[error("viewport dimensions must be positive")]
    ZeroDimension,
}

impl FromStr for Viewport {
    type Err = ViewportParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s.split_once('x').ok_or(ViewportParseError::InvalidFormat)?;
        if height.contains('x') {
            return Err(ViewportParseError::InvalidFormat);
        }

        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| ViewportParseError::InvalidDimension(part.trim().to_string()))
        };
        let (width, height) = (parse(width)?, parse(height)?);

        if width == 0 || height == 0 {
            return Err(ViewportParseError::ZeroDimension);
        }

        Ok(Viewport { width, height })
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
