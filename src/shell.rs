//! Interactive prompt loop.
//!
//! Collects the data to encode, a logo from the data directory, the output
//! format and file name, then calls [`generate_with`] once. Input and output
//! are generic so the whole dialogue can be driven from a test.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Config;
use crate::error::RenderError;
use crate::helper::{generate_with, OutputFormat, RenderRequest};
use crate::logo::{SvgRasterizer, LOGO_EXTENSIONS};

/// Default output file stem.
pub const DEFAULT_STEM: &str = "qr_code";

/// How a session ended.
#[derive(Debug)]
pub enum Outcome {
    Generated(PathBuf),
    /// Nothing was entered at the data prompt.
    NoData,
    /// The user declined to continue.
    Aborted,
    Failed(RenderError),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// Lists logo candidates in `dir`, sorted by file name. A missing directory
/// yields an empty list.
pub fn list_logos(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut logos: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| LOGO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    logos.sort();
    logos
}

pub struct Shell<'a, R, W> {
    input: R,
    output: W,
    config: &'a Config,
    rasterizer: Option<&'a dyn SvgRasterizer>,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(input: R, output: W, config: &'a Config, rasterizer: Option<&'a dyn SvgRasterizer>) -> Self {
        Self { input, output, config, rasterizer }
    }

    /// Runs one session. I/O errors on the terminal itself are returned; render
    /// failures are reported to the user and carried in [`Outcome::Failed`].
    pub fn run(&mut self) -> io::Result<Outcome> {
        writeln!(self.output, "=== Branded QR Generator ===")?;
        let data = self.ask("What URL or text should the QR encode? ")?;
        if data.is_empty() {
            writeln!(self.output, "No data entered. Exiting.")?;
            return Ok(Outcome::NoData);
        }

        let mut logo = self.pick_logo()?;
        let (stem, format) = self.ask_output_name()?;
        let out_path = self.config.output_dir.join(format!("{stem}.{}", format.extension()));

        if let Some(path) = &logo {
            if self.svg_logo_needs_rasterizer(path, format) {
                if !self.confirm_without_logo()? {
                    writeln!(self.output, "Aborted. Try SVG output or convert your logo to PNG/JPG.")?;
                    return Ok(Outcome::Aborted);
                }
                logo = None;
            }
        }

        debug!(out = %out_path.display(), logo = ?logo, "starting render");
        let result = RenderRequest::from_config(data, out_path, logo, self.config)
            .and_then(|request| generate_with(&request, self.rasterizer));
        match result {
            Ok(path) => {
                writeln!(self.output, "\nDone: {}", path.display())?;
                writeln!(
                    self.output,
                    "Tip: test with multiple scanner apps. If scanning is flaky, try a larger border (4),"
                )?;
                writeln!(
                    self.output,
                    "a smaller logo (logo_frac 0.18), or keep PNG scale >= 12 for print."
                )?;
                Ok(Outcome::Generated(path))
            }
            Err(e) => {
                writeln!(self.output, "\nFailed: {e}")?;
                Ok(Outcome::Failed(e))
            }
        }
    }

    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    fn pick_logo(&mut self) -> io::Result<Option<PathBuf>> {
        let logos = list_logos(&self.config.data_dir);
        if logos.is_empty() {
            writeln!(
                self.output,
                "No logos found in {}. Continuing without a logo.",
                self.config.data_dir.display()
            )?;
            return Ok(None);
        }

        writeln!(self.output, "\nSelect a logo (or press Enter to skip):")?;
        for (i, p) in logos.iter().enumerate() {
            let name = p.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            writeln!(self.output, "  {}. {}", i + 1, name)?;
        }
        let choice = self.ask("Logo number (blank to skip): ")?;
        if choice.is_empty() {
            return Ok(None);
        }
        match choice.parse::<usize>() {
            Ok(idx) if (1..=logos.len()).contains(&idx) => Ok(Some(logos[idx - 1].clone())),
            _ => {
                writeln!(self.output, "Invalid selection. Skipping logo.")?;
                Ok(None)
            }
        }
    }

    fn ask_output_name(&mut self) -> io::Result<(String, OutputFormat)> {
        writeln!(self.output, "\nChoose output format:")?;
        writeln!(self.output, "  1. PNG (raster, great for stickers/print)")?;
        writeln!(self.output, "  2. SVG (vector, infinite scaling)")?;
        let choice = self.ask("Format [1/2] (default 1): ")?;
        let format = if choice == "2" { OutputFormat::Svg } else { OutputFormat::Png };

        let stem = self.ask(&format!("Output file name (without extension) [{DEFAULT_STEM}]: "))?;
        let stem = if stem.is_empty() { DEFAULT_STEM.to_string() } else { stem };
        Ok((stem, format))
    }

    fn svg_logo_needs_rasterizer(&self, logo: &Path, format: OutputFormat) -> bool {
        let is_svg = logo
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
        is_svg && format == OutputFormat::Png && self.rasterizer.is_none()
    }

    fn confirm_without_logo(&mut self) -> io::Result<bool> {
        writeln!(
            self.output,
            "\nHeads-up: You selected an SVG logo and PNG output, but no SVG rasterizer is available."
        )?;
        writeln!(
            self.output,
            "Options:\n  1) Switch to SVG output\n  2) Use a PNG/JPG logo\n  3) Rebuild with the `svg-raster` feature"
        )?;
        let answer = self.ask("Proceed WITHOUT a logo? [y/N]: ")?;
        Ok(answer.eq_ignore_ascii_case("y"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn config_in(root: &Path) -> Config {
        Config {
            data_dir: root.join("data"),
            output_dir: root.join("output"),
            scale: 2,
            border: 3,
            ..Config::default()
        }
    }

    fn run(input: &str, config: &Config, rasterizer: Option<&dyn SvgRasterizer>) -> (Outcome, String) {
        let mut out = Vec::new();
        let outcome = Shell::new(Cursor::new(input.as_bytes()), &mut out, config, rasterizer)
            .run()
            .unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn empty_data_exits_without_rendering() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        let (outcome, text) = run("\n", &config, None);
        assert!(matches!(outcome, Outcome::NoData));
        assert!(text.contains("No data entered"));
        assert!(!config.output_dir.exists());
    }

    #[test]
    fn defaults_produce_png_in_output_dir() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        let (outcome, text) = run("https://example.com\n\n\n", &config, None);
        let expected = config.output_dir.join("qr_code.png");
        match outcome {
            Outcome::Generated(p) => assert_eq!(p, expected),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(expected.is_file());
        assert!(text.contains("No logos found"));
        assert!(text.contains("Done:"));
    }

    #[test]
    fn svg_choice_and_custom_stem() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        let (outcome, _) = run("hello\n2\nbadge\n", &config, None);
        assert!(matches!(outcome, Outcome::Generated(_)));
        assert!(config.output_dir.join("badge.svg").is_file());
    }

    #[test]
    fn logos_are_listed_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        for name in ["b.PNG", "a.svg", "notes.txt", "c.jpeg"] {
            std::fs::write(data.join(name), b"").unwrap();
        }
        let names: Vec<String> = list_logos(&data)
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.svg", "b.PNG", "c.jpeg"]);
        assert!(list_logos(&dir.path().join("missing")).is_empty());
    }

    #[test]
    fn invalid_logo_choice_skips_logo() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::create_dir_all(&config.data_dir).unwrap();
        std::fs::write(config.data_dir.join("logo.png"), b"not really a png").unwrap();
        let (outcome, text) = run("data\n7\n\n\n", &config, None);
        assert!(text.contains("Invalid selection. Skipping logo."));
        assert!(matches!(outcome, Outcome::Generated(_)));
    }

    #[test]
    fn svg_logo_on_png_without_rasterizer_can_abort() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::create_dir_all(&config.data_dir).unwrap();
        std::fs::write(config.data_dir.join("logo.svg"), b"<svg/>").unwrap();
        let (outcome, text) = run("data\n1\n1\n\nn\n", &config, None);
        assert!(matches!(outcome, Outcome::Aborted));
        assert!(text.contains("Proceed WITHOUT a logo?"));
        assert!(!config.output_dir.join("qr_code.png").exists());
    }

    #[test]
    fn svg_logo_on_png_without_rasterizer_can_drop_logo() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::create_dir_all(&config.data_dir).unwrap();
        std::fs::write(config.data_dir.join("logo.svg"), b"<svg/>").unwrap();
        let (outcome, _) = run("data\n1\n1\n\ny\n", &config, None);
        assert!(matches!(outcome, Outcome::Generated(_)));
        assert!(config.output_dir.join("qr_code.png").is_file());
    }

    #[test]
    fn render_failure_is_reported() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::create_dir_all(&config.data_dir).unwrap();
        std::fs::write(config.data_dir.join("broken.png"), b"garbage").unwrap();
        let (outcome, text) = run("data\n1\n\n\n", &config, None);
        assert!(outcome.is_failure());
        assert!(text.contains("Failed:"));
        assert!(!config.output_dir.join("qr_code.png").exists());
    }
}
