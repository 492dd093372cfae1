//! Rasterizer and vector renderer for a [`QrMatrix`].
//!
//! Both outputs use the same pixel coordinate mapping: module `(row, col)`
//! covers `((border + col) * scale, (border + row) * scale, scale, scale)`.

use image::{Rgba, RgbaImage};

use crate::geometry::CompositionPlan;
use crate::matrix::QrMatrix;

pub const DARK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const LIGHT: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Paints the matrix into a white RGBA buffer of `image_side_px` squared.
pub fn render_png(qr: &QrMatrix, plan: &CompositionPlan) -> RgbaImage {
    let size = plan.image_side_px;
    let scale = plan.module_px;
    let border = i64::from(plan.border);
    let mut img = RgbaImage::new(size, size);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let col = i64::from(x / scale) - border;
        let row = i64::from(y / scale) - border;
        *pixel = if row >= 0 && col >= 0 && qr.is_dark(row as u32, col as u32) {
            DARK
        } else {
            LIGHT
        };
    }

    img
}

/// An SVG document under construction. Overlays are appended with
/// [`SvgDocument::push`] and land after the QR path, before the closing tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgDocument {
    body: String,
}

impl SvgDocument {
    pub fn push(&mut self, element: &str) {
        self.body += "\t";
        self.body += element;
        self.body += "\n";
    }

    /// Returns the finished document. Always uses Unix newlines.
    pub fn finish(mut self) -> String {
        self.body += "</svg>\n";
        self.body
    }
}

/// Emits the matrix as an SVG document with one subpath per dark module.
pub fn render_svg(qr: &QrMatrix, plan: &CompositionPlan) -> SvgDocument {
    let side = plan.image_side_px;
    let s = plan.module_px;
    let mut body = String::new();
    body += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    body += &format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{0}\" height=\"{0}\" viewBox=\"0 0 {0} {0}\" stroke=\"none\">\n",
        side
    );
    body += "\t<rect width=\"100%\" height=\"100%\" fill=\"#FFFFFF\"/>\n";
    body += "\t<path d=\"";
    let mut first = true;
    for (row, col) in qr.dark_modules() {
        let r = plan.module_rect(row, col);
        if !first {
            body += " ";
        }
        first = false;
        body += &format!("M{},{}h{s}v{s}h-{s}z", r.x, r.y);
    }
    body += "\" fill=\"#000000\"/>\n";
    SvgDocument { body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EccLevel;
    use crate::geometry::compute_plan;

    fn fixture(border: u32, scale: u32) -> (QrMatrix, CompositionPlan) {
        let qr = QrMatrix::encode("HELLO WORLD", EccLevel::L).unwrap();
        let plan = compute_plan(qr.side(), border, scale, None);
        (qr, plan)
    }

    #[test]
    fn png_has_expected_dimensions() {
        let (qr, plan) = fixture(4, 3);
        let img = render_png(&qr, &plan);
        assert_eq!(img.dimensions(), ((21 + 8) * 3, (21 + 8) * 3));
    }

    #[test]
    fn png_border_is_white_and_modules_map_to_squares() {
        let (qr, plan) = fixture(2, 5);
        let img = render_png(&qr, &plan);
        assert_eq!(*img.get_pixel(0, 0), LIGHT);
        assert_eq!(*img.get_pixel(9, 9), LIGHT);
        // top-left finder corner spans the whole first module square
        for d in 0..5 {
            assert_eq!(*img.get_pixel(10 + d, 10 + d), DARK);
        }
        for row in 0..qr.side() {
            for col in 0..qr.side() {
                let r = plan.module_rect(row, col);
                let expected = if qr.is_dark(row, col) { DARK } else { LIGHT };
                assert_eq!(*img.get_pixel(r.x as u32 + 2, r.y as u32 + 2), expected);
            }
        }
    }

    #[test]
    fn svg_starts_with_prolog_and_closes() {
        let (qr, plan) = fixture(4, 1);
        let svg = render_svg(&qr, &plan).finish();
        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(svg.contains("viewBox=\"0 0 29 29\""));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn svg_has_one_subpath_per_dark_module() {
        let (qr, plan) = fixture(3, 10);
        let svg = render_svg(&qr, &plan).finish();
        assert_eq!(svg.matches('M').count(), qr.dark_modules().count());
        assert!(svg.contains("M30,30h10v10h-10z"));
    }

    #[test]
    fn pushed_elements_precede_closing_tag() {
        let (qr, plan) = fixture(3, 10);
        let mut doc = render_svg(&qr, &plan);
        doc.push("<circle r=\"1\"/>");
        let svg = doc.finish();
        assert!(svg.ends_with("\t<circle r=\"1\"/>\n</svg>\n"));
    }
}
