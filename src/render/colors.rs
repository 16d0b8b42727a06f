//! Site colours and their SVG representation

use std::fmt;

use crate::error::{ArtError, Result};

/// RGB colour with each channel normalized to [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    r: f64,
    g: f64,
    b: f64,
}

impl Color {
    /// Create a colour from normalized channels
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a channel is not finite or outside [0, 1]
    pub fn new(r: f64, g: f64, b: f64) -> Result<Self> {
        for (name, value) in [("red", r), ("green", g), ("blue", b)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ArtError::InvalidInput(format!(
                    "{} channel must be within [0, 1] (got {})",
                    name, value
                )));
            }
        }
        Ok(Self { r, g, b })
    }

    /// Create a colour from a `[r, g, b]` slice
    pub fn from_slice(channels: &[f64]) -> Result<Self> {
        match channels {
            [r, g, b] => Self::new(*r, *g, *b),
            _ => Err(ArtError::InvalidInput(format!(
                "colour needs exactly 3 channels (got {})",
                channels.len()
            ))),
        }
    }

    #[inline]
    pub fn channels(&self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }

    /// Mean of a set of colours, `None` when empty
    pub fn average<'a>(colors: impl IntoIterator<Item = &'a Color>) -> Option<Color> {
        let mut sum = [0.0; 3];
        let mut n = 0usize;
        for c in colors {
            sum[0] += c.r;
            sum[1] += c.g;
            sum[2] += c.b;
            n += 1;
        }

        if n == 0 {
            return None;
        }

        let n = n as f64;
        Some(Color {
            r: (sum[0] / n).clamp(0.0, 1.0),
            g: (sum[1] / n).clamp(0.0, 1.0),
            b: (sum[2] / n).clamp(0.0, 1.0),
        })
    }

    /// Canonical `#rrggbb` form used as the SVG fill
    pub fn to_hex(&self) -> String {
        let [r, g, b] = self.channels().map(channel_to_byte);
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn channel_to_byte(value: f64) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}
