//! High-level entry points: build a [`RenderRequest`] and turn it into a file.
//!
//! One call runs encode → plan → render → logo → write, sequentially. The
//! output is written through a temporary file in the destination directory
//! and renamed into place, so a failed render never leaves a partial file.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use image::ImageFormat;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::{Config, EccLevel};
use crate::error::{RenderError, Result};
use crate::geometry::{checked_image_side, compute_plan, MAX_IMAGE_SIDE_PX};
use crate::logo::{self, default_rasterizer, LogoAsset, SvgRasterizer};
use crate::matrix::QrMatrix;
use crate::render::{render_png, render_svg};

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Svg,
}

impl OutputFormat {
    /// Infers the format from a `.png` or `.svg` extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("png") => Ok(OutputFormat::Png),
            Some("svg") => Ok(OutputFormat::Svg),
            _ => Err(RenderError::InvalidInput(format!(
                "output path must end with .png or .svg: {}",
                path.display()
            ))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

/// Logo overlay settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LogoSpec {
    pub source_path: PathBuf,
    /// Logo width as a fraction of the image width, in `[0, 1)`. Keep it at or
    /// below 0.25 for reliable scanning.
    pub width_fraction: f64,
    pub pad_enabled: bool,
    pub pad_radius_px: u32,
    pub pad_margin_px: u32,
}

/// Everything needed for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub data: String,
    pub error_correction: EccLevel,
    /// Quiet zone in modules.
    pub border: u32,
    /// Pixels per module.
    pub scale: u32,
    pub output_path: PathBuf,
    pub output_format: OutputFormat,
    pub logo: Option<LogoSpec>,
}

impl RenderRequest {
    /// Builds a request from the configured defaults. The format comes from
    /// the output path extension.
    pub fn from_config(
        data: impl Into<String>,
        output_path: impl Into<PathBuf>,
        logo_path: Option<PathBuf>,
        config: &Config,
    ) -> Result<Self> {
        let output_path = output_path.into();
        let output_format = OutputFormat::from_path(&output_path)?;
        Ok(Self {
            data: data.into(),
            error_correction: config.ecc,
            border: config.border,
            scale: config.scale,
            output_path,
            output_format,
            logo: logo_path.map(|source_path| LogoSpec {
                source_path,
                width_fraction: config.logo_frac,
                pad_enabled: config.pad_logo,
                pad_radius_px: config.pad_radius,
                pad_margin_px: config.pad_margin_px,
            }),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.data.is_empty() {
            return Err(RenderError::InvalidInput("data must not be empty".into()));
        }
        if self.scale == 0 {
            return Err(RenderError::InvalidInput("scale must be greater than 0".into()));
        }
        // smallest symbol is 21 modules; the encoded side is checked again later
        image_side(21, self.border, self.scale)?;
        if let Some(logo) = &self.logo {
            if !(0.0..1.0).contains(&logo.width_fraction) {
                return Err(RenderError::InvalidInput(format!(
                    "logo fraction must be in [0, 1) (got {})",
                    logo.width_fraction
                )));
            }
            if logo.pad_margin_px > MAX_IMAGE_SIDE_PX {
                return Err(RenderError::InvalidInput(format!(
                    "pad margin must be at most {MAX_IMAGE_SIDE_PX}px (got {})",
                    logo.pad_margin_px
                )));
            }
        }
        Ok(())
    }
}

fn image_side(matrix_side: u32, border: u32, scale: u32) -> Result<u32> {
    checked_image_side(matrix_side, border, scale).ok_or_else(|| {
        RenderError::InvalidInput(format!(
            "image side for {matrix_side} modules, border {border} and scale {scale} exceeds {MAX_IMAGE_SIDE_PX}px"
        ))
    })
}

/// Options for [`generate_qr`]. Defaults mirror [`Config::default`].
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub ecc: EccLevel,
    pub border: u32,
    pub scale: u32,
    pub logo_path: Option<PathBuf>,
    pub logo_frac: f64,
    pub pad_logo: bool,
    pub pad_radius: u32,
    pub pad_margin_px: u32,
}

impl From<&Config> for GenerateOptions {
    fn from(config: &Config) -> Self {
        Self {
            ecc: config.ecc,
            border: config.border,
            scale: config.scale,
            logo_path: None,
            logo_frac: config.logo_frac,
            pad_logo: config.pad_logo,
            pad_radius: config.pad_radius,
            pad_margin_px: config.pad_margin_px,
        }
    }
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Generates a QR image at `out_path` (`.png` or `.svg`) and returns the path.
///
/// # Example
///
/// ```rust,no_run
/// use brandqr::helper::{generate_qr, GenerateOptions};
///
/// let opts = GenerateOptions { logo_path: Some("data/logo.png".into()), ..Default::default() };
/// let written = generate_qr("https://example.com", "output/qr_code.png", &opts).unwrap();
/// println!("{}", written.display());
/// ```
pub fn generate_qr(data: &str, out_path: impl AsRef<Path>, opts: &GenerateOptions) -> Result<PathBuf> {
    let output_path = out_path.as_ref().to_path_buf();
    let request = RenderRequest {
        data: data.to_string(),
        error_correction: opts.ecc,
        border: opts.border,
        scale: opts.scale,
        output_format: OutputFormat::from_path(&output_path)?,
        output_path,
        logo: opts.logo_path.clone().map(|source_path| LogoSpec {
            source_path,
            width_fraction: opts.logo_frac,
            pad_enabled: opts.pad_logo,
            pad_radius_px: opts.pad_radius,
            pad_margin_px: opts.pad_margin_px,
        }),
    };
    generate(&request)
}

/// Renders `request` using the rasterizer compiled into this build.
pub fn generate(request: &RenderRequest) -> Result<PathBuf> {
    generate_with(request, default_rasterizer())
}

/// Renders `request`, rasterizing SVG logos with `rasterizer` when the output
/// is PNG.
pub fn generate_with(request: &RenderRequest, rasterizer: Option<&dyn SvgRasterizer>) -> Result<PathBuf> {
    let bytes = render_bytes(request, rasterizer)?;
    write_atomic(&request.output_path, &bytes)?;
    info!(
        path = %request.output_path.display(),
        format = request.output_format.extension(),
        bytes = bytes.len(),
        "QR image written"
    );
    Ok(request.output_path.clone())
}

/// Runs the pipeline up to, but not including, the file write.
pub fn render_bytes(request: &RenderRequest, rasterizer: Option<&dyn SvgRasterizer>) -> Result<Vec<u8>> {
    request.validate()?;

    let logo = match &request.logo {
        Some(spec) if spec.width_fraction > 0.0 => {
            let asset = LogoAsset::load(&spec.source_path)?;
            if asset.is_svg() && request.output_format == OutputFormat::Png && rasterizer.is_none() {
                return Err(RenderError::MissingRasterizer { logo: spec.source_path.clone() });
            }
            Some((spec, asset))
        }
        _ => None,
    };

    let qr = QrMatrix::encode(&request.data, request.error_correction)?;
    image_side(qr.side(), request.border, request.scale)?;
    let plan = compute_plan(
        qr.side(),
        request.border,
        request.scale,
        logo.as_ref().map(|(spec, asset)| (*spec, asset.natural_size())),
    );
    debug!(side = plan.image_side_px, warnings = plan.warnings.len(), "composition plan ready");

    let placed = logo.as_ref().zip(plan.logo.as_ref());
    match request.output_format {
        OutputFormat::Png => {
            let mut surface = render_png(&qr, &plan);
            if let Some(((_, asset), placement)) = placed {
                logo::apply_logo_png(&mut surface, asset, placement, rasterizer)?;
            }
            let mut buf = Cursor::new(Vec::new());
            surface.write_to(&mut buf, ImageFormat::Png)?;
            Ok(buf.into_inner())
        }
        OutputFormat::Svg => {
            let mut doc = render_svg(&qr, &plan);
            if let Some(((_, asset), placement)) = placed {
                logo::apply_logo_svg(&mut doc, asset, placement)?;
            }
            Ok(doc.finish().into_bytes())
        }
    }
}

/// Writes `bytes` to `path`, creating parent directories and replacing any
/// existing file. Either the whole file lands or nothing does.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| RenderError::filesystem(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| RenderError::filesystem(dir, e))?;
    tmp.write_all(bytes).map_err(|e| RenderError::filesystem(tmp.path(), e))?;
    tmp.flush().map_err(|e| RenderError::filesystem(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| RenderError::filesystem(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn format_is_inferred_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("a/qr.PNG")).unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::from_path(Path::new("qr.svg")).unwrap(), OutputFormat::Svg);
        assert!(matches!(
            OutputFormat::from_path(Path::new("qr.pdf")),
            Err(RenderError::InvalidInput(_))
        ));
        assert!(OutputFormat::from_path(Path::new("qr")).is_err());
    }

    #[test]
    fn request_from_config_copies_defaults() {
        let config = Config::default();
        let req = RenderRequest::from_config("hi", "out/x.svg", Some("data/l.png".into()), &config).unwrap();
        assert_eq!(req.output_format, OutputFormat::Svg);
        assert_eq!(req.border, 5);
        assert_eq!(req.scale, 14);
        let logo = req.logo.unwrap();
        assert_eq!(logo.width_fraction, 0.22);
        assert!(logo.pad_enabled);
        assert_eq!(logo.pad_radius_px, 18);
        assert_eq!(logo.pad_margin_px, 10);
    }

    #[test]
    fn invalid_requests_are_rejected() {
        let config = Config::default();
        let mut req = RenderRequest::from_config("", "qr.png", None, &config).unwrap();
        assert!(matches!(render_bytes(&req, None), Err(RenderError::InvalidInput(_))));

        req.data = "ok".into();
        req.scale = 0;
        assert!(matches!(render_bytes(&req, None), Err(RenderError::InvalidInput(_))));

        req.scale = 4;
        req.logo = Some(LogoSpec {
            source_path: "logo.png".into(),
            width_fraction: 1.5,
            pad_enabled: false,
            pad_radius_px: 0,
            pad_margin_px: 0,
        });
        assert!(matches!(render_bytes(&req, None), Err(RenderError::InvalidInput(_))));
    }

    #[test]
    fn oversized_dimensions_are_invalid_input() {
        let config = Config::default();
        let mut req = RenderRequest::from_config("big", "qr.png", None, &config).unwrap();
        req.border = u32::MAX / 2;
        assert!(matches!(render_bytes(&req, None), Err(RenderError::InvalidInput(_))));

        req.border = 0;
        req.scale = u32::MAX;
        assert!(matches!(render_bytes(&req, None), Err(RenderError::InvalidInput(_))));

        // fits the smallest symbol but not the encoded one
        req.data = "x".repeat(200);
        req.scale = MAX_IMAGE_SIDE_PX / 21;
        assert!(matches!(render_bytes(&req, None), Err(RenderError::InvalidInput(_))));

        req.data = "ok".into();
        req.scale = 4;
        req.logo = Some(LogoSpec {
            source_path: "logo.png".into(),
            width_fraction: 0.2,
            pad_enabled: true,
            pad_radius_px: 0,
            pad_margin_px: u32::MAX,
        });
        assert!(matches!(render_bytes(&req, None), Err(RenderError::InvalidInput(_))));
    }

    #[test]
    fn write_atomic_creates_parents_and_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/qr.png");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn write_atomic_reports_unusable_parent_as_filesystem_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"regular file").unwrap();
        let path = blocker.join("qr.png");
        let err = write_atomic(&path, b"bytes").unwrap_err();
        assert!(matches!(err, RenderError::Filesystem { .. }));
        assert!(!path.exists());
        assert_eq!(std::fs::read(&blocker).unwrap(), b"regular file");
    }

    #[test]
    fn generate_options_default_to_config() {
        let opts = GenerateOptions::default();
        assert_eq!(opts.ecc, EccLevel::H);
        assert_eq!(opts.scale, 14);
        assert!(opts.logo_path.is_none());
    }
}
