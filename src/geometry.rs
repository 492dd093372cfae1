//! Pixel geometry for a render: image size, module rectangles and the
//! centered logo box with its optional contrast pad.

use std::fmt;

use tracing::{debug, warn};

use crate::helper::LogoSpec;
use crate::matrix::FINDER_SPAN;

/// Largest logo fraction that reliably stays scannable.
pub const RECOMMENDED_MAX_LOGO_FRAC: f64 = 0.25;

/// Largest image side, in pixels, a render may produce.
pub const MAX_IMAGE_SIDE_PX: u32 = u16::MAX as u32;

/// Returns `(matrix_side + 2 * border) * scale`, or `None` when it overflows
/// or exceeds [`MAX_IMAGE_SIDE_PX`].
pub fn checked_image_side(matrix_side: u32, border: u32, scale: u32) -> Option<u32> {
    border
        .checked_mul(2)
        .and_then(|b| b.checked_add(matrix_side))
        .and_then(|modules| modules.checked_mul(scale))
        .filter(|side| *side <= MAX_IMAGE_SIDE_PX)
}

/// An axis-aligned rectangle in image pixels. The origin may be negative when a
/// pad margin pushes past the image edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Grows the rectangle by `margin` on all four sides.
    pub fn expand(&self, margin: u32) -> Self {
        Self {
            x: self.x - i64::from(margin),
            y: self.y - i64::from(margin),
            width: self.width + 2 * margin,
            height: self.height + 2 * margin,
        }
    }

    pub fn center_x2(&self) -> i64 {
        2 * self.x + i64::from(self.width)
    }

    pub fn center_y2(&self) -> i64 {
        2 * self.y + i64::from(self.height)
    }
}

/// Rounded rectangle painted white behind the logo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadRect {
    pub rect: Rect,
    pub radius: u32,
}

/// Where the logo (and its pad) land on the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoPlacement {
    pub logo: Rect,
    /// Drawn before the logo so the logo renders on top.
    pub pad: Option<PadRect>,
}

impl LogoPlacement {
    /// The area the logo obstructs, pad included.
    pub fn footprint(&self) -> Rect {
        self.pad.map_or(self.logo, |p| p.rect)
    }
}

/// Conditions that make a render risky to scan. Reported, never fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryWarning {
    /// The logo footprint reaches into the finder-pattern safe zone.
    InvalidGeometry { footprint_px: u32, safe_px: u32 },
    /// The logo fraction is larger than the recommended maximum.
    AboveRecommendedFraction(f64),
}

impl fmt::Display for GeometryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryWarning::InvalidGeometry { footprint_px, safe_px } => write!(
                f,
                "logo footprint of {footprint_px}px reaches the finder-pattern safe zone ({safe_px}px); scanning may fail"
            ),
            GeometryWarning::AboveRecommendedFraction(frac) => write!(
                f,
                "logo fraction {frac} is above the recommended {RECOMMENDED_MAX_LOGO_FRAC}"
            ),
        }
    }
}

/// Everything the renderers need to lay out one image.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionPlan {
    pub matrix_side: u32,
    pub border: u32,
    /// Pixels per module.
    pub module_px: u32,
    /// Width and height of the square output image.
    pub image_side_px: u32,
    pub logo: Option<LogoPlacement>,
    pub warnings: Vec<GeometryWarning>,
}

impl CompositionPlan {
    /// Pixel rectangle of the module at `(row, col)`.
    pub fn module_rect(&self, row: u32, col: u32) -> Rect {
        Rect::new(
            i64::from((self.border + col) * self.module_px),
            i64::from((self.border + row) * self.module_px),
            self.module_px,
            self.module_px,
        )
    }

    /// Width of the central span between finder patterns, in pixels.
    pub fn safe_zone_px(&self) -> u32 {
        self.matrix_side.saturating_sub(2 * FINDER_SPAN) * self.module_px
    }
}

/// Computes the layout of one render.
///
/// The image side must already be known to fit, see [`checked_image_side`],
/// and the pad margin must not exceed [`MAX_IMAGE_SIDE_PX`]. `logo` pairs the
/// logo settings with the logo's natural `(width, height)`, used only for its
/// aspect ratio. A `width_fraction` of zero yields no logo
/// placement at all.
pub fn compute_plan(
    matrix_side: u32,
    border: u32,
    scale: u32,
    logo: Option<(&LogoSpec, (u32, u32))>,
) -> CompositionPlan {
    debug_assert!(checked_image_side(matrix_side, border, scale).is_some());
    let image_side_px = (matrix_side + 2 * border) * scale;
    let mut plan = CompositionPlan {
        matrix_side,
        border,
        module_px: scale,
        image_side_px,
        logo: None,
        warnings: Vec::new(),
    };

    let Some((spec, natural)) = logo else {
        return plan;
    };
    if spec.width_fraction <= 0.0 {
        return plan;
    }

    let (width, height) = logo_target_size(image_side_px, spec.width_fraction, natural);
    let x = (i64::from(image_side_px) - i64::from(width)) / 2;
    let y = (i64::from(image_side_px) - i64::from(height)) / 2;
    let logo_rect = Rect::new(x, y, width, height);
    let pad = spec.pad_enabled.then(|| PadRect {
        rect: logo_rect.expand(spec.pad_margin_px),
        radius: spec.pad_radius_px,
    });
    let placement = LogoPlacement { logo: logo_rect, pad };

    if spec.width_fraction > RECOMMENDED_MAX_LOGO_FRAC {
        plan.warnings.push(GeometryWarning::AboveRecommendedFraction(spec.width_fraction));
    }
    let footprint = placement.footprint();
    let footprint_px = footprint.width.max(footprint.height);
    let safe_px = plan.safe_zone_px();
    if footprint_px >= safe_px {
        plan.warnings.push(GeometryWarning::InvalidGeometry { footprint_px, safe_px });
    }
    for w in &plan.warnings {
        warn!("{w}");
    }

    debug!(image_side_px, logo = ?placement.logo, pad = ?placement.pad, "computed logo placement");
    plan.logo = Some(placement);
    plan
}

/// Target logo size: width is `round(image_width * fraction)`, height keeps
/// the logo's aspect ratio. Both are at least one pixel.
pub fn logo_target_size(image_width_px: u32, fraction: f64, natural: (u32, u32)) -> (u32, u32) {
    let width = ((f64::from(image_width_px) * fraction).round() as u32).max(1);
    let (nw, nh) = natural;
    let height = if nw == 0 || nh == 0 {
        width
    } else {
        ((f64::from(width) * f64::from(nh) / f64::from(nw)).round() as u32).max(1)
    };
    (width, height)
}
