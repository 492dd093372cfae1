//! Logo loading and compositing.
//!
//! Raster logos (PNG, JPEG) are decoded with `image`. SVG logos are kept as
//! source bytes: on SVG output they are embedded as-is, on PNG output they go
//! through an [`SvgRasterizer`] first.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose, Engine as _};
use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use tracing::debug;

use crate::error::{RenderError, Result};
use crate::geometry::{LogoPlacement, PadRect};
use crate::render::{SvgDocument, LIGHT};

/// Logo file extensions the compositor accepts.
pub const LOGO_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "svg"];

/// Turns SVG source into pixels.
pub trait SvgRasterizer {
    /// Renders `svg` stretched to exactly `width` x `height` pixels.
    fn rasterize(&self, svg: &[u8], width: u32, height: u32) -> Result<RgbaImage>;
}

/// [`SvgRasterizer`] backed by `resvg`.
#[cfg(feature = "svg-raster")]
#[derive(Debug, Default, Clone, Copy)]
pub struct ResvgRasterizer;

#[cfg(feature = "svg-raster")]
impl SvgRasterizer for ResvgRasterizer {
    fn rasterize(&self, svg: &[u8], width: u32, height: u32) -> Result<RgbaImage> {
        use resvg::tiny_skia::{Pixmap, Transform};

        let tree = parse_svg(svg)?;
        let size = tree.size();
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| RenderError::Svg(format!("cannot allocate {width}x{height} pixmap")))?;
        let transform = Transform::from_scale(
            width as f32 / size.width(),
            height as f32 / size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        // tiny-skia stores premultiplied alpha
        let mut out = RgbaImage::new(width, height);
        for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
            let c = src.demultiply();
            *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Ok(out)
    }
}

/// The rasterizer compiled into this build, if any.
pub fn default_rasterizer() -> Option<&'static dyn SvgRasterizer> {
    #[cfg(feature = "svg-raster")]
    {
        Some(&ResvgRasterizer)
    }
    #[cfg(not(feature = "svg-raster"))]
    {
        None
    }
}

fn parse_svg(svg: &[u8]) -> Result<usvg::Tree> {
    let tree = usvg::Tree::from_data(svg, &usvg::Options::default())
        .map_err(|e| RenderError::Svg(e.to_string()))?;
    let size = tree.size();
    if size.width() <= 0.0 || size.height() <= 0.0 {
        return Err(RenderError::Svg(format!(
            "invalid SVG dimensions: {}x{}",
            size.width(),
            size.height()
        )));
    }
    Ok(tree)
}

/// A decoded logo ready for compositing.
#[derive(Debug, Clone)]
pub enum LogoAsset {
    Raster(RgbaImage),
    Svg {
        path: PathBuf,
        source: Vec<u8>,
        /// Intrinsic size, used for the aspect ratio.
        natural: (u32, u32),
    },
}

impl LogoAsset {
    /// Loads a PNG, JPEG or SVG logo from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !LOGO_EXTENSIONS.contains(&ext.as_str()) {
            return Err(RenderError::InvalidInput(format!(
                "unsupported logo format {}: expected PNG, JPEG or SVG",
                path.display()
            )));
        }
        if !path.is_file() {
            return Err(RenderError::InvalidInput(format!(
                "logo not found: {}",
                path.display()
            )));
        }

        if ext == "svg" {
            let source = std::fs::read(path).map_err(|e| RenderError::filesystem(path, e))?;
            let size = parse_svg(&source)?.size();
            let natural = (size.width().round() as u32, size.height().round() as u32);
            debug!(path = %path.display(), ?natural, "loaded SVG logo");
            return Ok(LogoAsset::Svg { path: path.to_path_buf(), source, natural });
        }

        let img = image::open(path)?.to_rgba8();
        debug!(path = %path.display(), dims = ?img.dimensions(), "loaded raster logo");
        Ok(LogoAsset::Raster(img))
    }

    /// Natural `(width, height)` of the logo.
    pub fn natural_size(&self) -> (u32, u32) {
        match self {
            LogoAsset::Raster(img) => img.dimensions(),
            LogoAsset::Svg { natural, .. } => *natural,
        }
    }

    pub fn is_svg(&self) -> bool {
        matches!(self, LogoAsset::Svg { .. })
    }

    /// Data URI for embedding in an SVG document.
    fn data_uri(&self) -> Result<String> {
        let (mime, bytes) = match self {
            LogoAsset::Svg { source, .. } => ("image/svg+xml", source.clone()),
            LogoAsset::Raster(img) => {
                let mut buf = Cursor::new(Vec::new());
                img.write_to(&mut buf, ImageFormat::Png)?;
                ("image/png", buf.into_inner())
            }
        };
        Ok(format!("data:{mime};base64,{}", general_purpose::STANDARD.encode(bytes)))
    }
}

/// Pads and overlays the logo onto a rendered PNG surface.
///
/// SVG logos need `rasterizer`; without one this fails with
/// [`RenderError::MissingRasterizer`] and leaves `surface` untouched.
pub fn apply_logo_png(
    surface: &mut RgbaImage,
    logo: &LogoAsset,
    placement: &LogoPlacement,
    rasterizer: Option<&dyn SvgRasterizer>,
) -> Result<()> {
    let rect = placement.logo;
    let resized = match logo {
        LogoAsset::Raster(img) => imageops::resize(img, rect.width, rect.height, FilterType::Lanczos3),
        LogoAsset::Svg { path, source, .. } => {
            let rasterizer =
                rasterizer.ok_or_else(|| RenderError::MissingRasterizer { logo: path.clone() })?;
            rasterizer.rasterize(source, rect.width, rect.height)?
        }
    };

    if let Some(pad) = &placement.pad {
        fill_rounded_rect(surface, pad);
    }
    imageops::overlay(surface, &resized, rect.x, rect.y);
    Ok(())
}

/// Appends the pad and an embedded logo image to an SVG document.
pub fn apply_logo_svg(doc: &mut SvgDocument, logo: &LogoAsset, placement: &LogoPlacement) -> Result<()> {
    if let Some(pad) = &placement.pad {
        let r = pad.rect;
        let radius = clamped_radius(pad);
        doc.push(&format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{radius}\" ry=\"{radius}\" fill=\"#FFFFFF\"/>",
            r.x, r.y, r.width, r.height
        ));
    }
    let r = placement.logo;
    doc.push(&format!(
        "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"xMidYMid meet\" href=\"{}\"/>",
        r.x,
        r.y,
        r.width,
        r.height,
        logo.data_uri()?
    ));
    Ok(())
}

fn clamped_radius(pad: &PadRect) -> u32 {
    pad.radius.min(pad.rect.width / 2).min(pad.rect.height / 2)
}

/// Fills `pad` with white, rounding its corners. Pixels outside the surface
/// are clipped.
fn fill_rounded_rect(surface: &mut RgbaImage, pad: &PadRect) {
    let r = pad.rect;
    let radius = f64::from(clamped_radius(pad));
    let (left, top) = (r.x as f64, r.y as f64);
    let (right, bottom) = (left + f64::from(r.width), top + f64::from(r.height));

    let x0 = r.x.max(0);
    let y0 = r.y.max(0);
    let x1 = (r.x + i64::from(r.width)).min(i64::from(surface.width()));
    let y1 = (r.y + i64::from(r.height)).min(i64::from(surface.height()));

    for py in y0..y1 {
        for px in x0..x1 {
            let (cx, cy) = (px as f64 + 0.5, py as f64 + 0.5);
            let nx = cx.clamp(left + radius, right - radius);
            let ny = cy.clamp(top + radius, bottom - radius);
            let (dx, dy) = (cx - nx, cy - ny);
            if dx * dx + dy * dy <= radius * radius {
                surface.put_pixel(px as u32, py as u32, LIGHT);
            }
        }
    }
}
