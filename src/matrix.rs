//! QR module matrix.
//!
//! Encoding is delegated to the `qrcode` crate. [`QrMatrix`] keeps only what
//! the renderers need: the side length and one boolean per module.

use qrcode::{Color, EcLevel, QrCode};
use tracing::debug;

use crate::config::EccLevel;
use crate::error::{RenderError, Result};

/// Modules covered by a finder pattern plus its separator, along one axis.
pub const FINDER_SPAN: u32 = 8;

impl From<EccLevel> for EcLevel {
    fn from(level: EccLevel) -> Self {
        match level {
            EccLevel::L => EcLevel::L,
            EccLevel::M => EcLevel::M,
            EccLevel::Q => EcLevel::Q,
            EccLevel::H => EcLevel::H,
        }
    }
}

/// A square grid of dark (`true`) and light (`false`) modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    side: u32,
    modules: Vec<bool>,
}

impl QrMatrix {
    /// Encodes `data` at the given error correction level, choosing the
    /// smallest version that fits.
    pub fn encode(data: &str, ecc: EccLevel) -> Result<Self> {
        if data.is_empty() {
            return Err(RenderError::InvalidInput("data must not be empty".into()));
        }
        let code = QrCode::with_error_correction_level(data.as_bytes(), ecc.into())?;
        let side = code.width() as u32;
        let modules = code.to_colors().into_iter().map(|c| c == Color::Dark).collect();
        debug!(side, ecc = %ecc, version = ?code.version(), "encoded QR matrix");
        Ok(Self { side, modules })
    }

    /// Side length in modules, `4 * version + 17`.
    pub fn side(&self) -> u32 {
        self.side
    }

    /// Returns whether the module at `(row, col)` is dark. Out of range is light.
    pub fn is_dark(&self, row: u32, col: u32) -> bool {
        if row >= self.side || col >= self.side {
            return false;
        }
        self.modules[(row * self.side + col) as usize]
    }

    /// Iterates `(row, col)` of every dark module in row-major order.
    pub fn dark_modules(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let side = self.side;
        self.modules
            .iter()
            .enumerate()
            .filter(|(_, dark)| **dark)
            .map(move |(i, _)| (i as u32 / side, i as u32 % side))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_fits_version_one() {
        let m = QrMatrix::encode("HELLO", EccLevel::L).unwrap();
        assert_eq!(m.side(), 21);
    }

    #[test]
    fn higher_ecc_never_shrinks_the_matrix() {
        let low = QrMatrix::encode("https://example.com", EccLevel::L).unwrap();
        let high = QrMatrix::encode("https://example.com", EccLevel::H).unwrap();
        assert!(high.side() >= low.side());
        assert_eq!((high.side() - 17) % 4, 0);
    }

    #[test]
    fn finder_pattern_corner_is_dark() {
        let m = QrMatrix::encode("corner", EccLevel::M).unwrap();
        assert!(m.is_dark(0, 0));
        assert!(m.is_dark(0, m.side() - 1));
        assert!(m.is_dark(m.side() - 1, 0));
        // separator row below the top-left finder
        assert!(!m.is_dark(7, 0));
        assert!(!m.is_dark(m.side(), 0));
    }

    #[test]
    fn dark_modules_matches_is_dark() {
        let m = QrMatrix::encode("iter", EccLevel::Q).unwrap();
        let count = m.dark_modules().count();
        let mut expected = 0;
        for row in 0..m.side() {
            for col in 0..m.side() {
                if m.is_dark(row, col) {
                    expected += 1;
                }
            }
        }
        assert_eq!(count, expected);
        assert!(m.dark_modules().all(|(r, c)| m.is_dark(r, c)));
    }

    #[test]
    fn empty_data_is_invalid_input() {
        assert!(matches!(QrMatrix::encode("", EccLevel::H), Err(RenderError::InvalidInput(_))));
    }

    #[test]
    fn oversized_data_is_an_encode_error() {
        let data = "x".repeat(4000);
        assert!(matches!(QrMatrix::encode(&data, EccLevel::H), Err(RenderError::Encode(_))));
    }
}
