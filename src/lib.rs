//! # brandqr
//!
//! Generate static, branded QR codes as PNG or SVG.
//!
//! `brandqr` encodes a string with the `qrcode` crate, lays out the image in
//! pixels, paints the modules, and optionally centers a brand logo (PNG, JPEG
//! or SVG) on a white rounded pad. Everything runs offline, in one synchronous
//! call, using a set of trusted defaults that keep the code scannable.
//!
//! ## Example
//!
//! ```rust,no_run
//! use brandqr::helper::{generate_qr, GenerateOptions};
//!
//! let opts = GenerateOptions {
//!     logo_path: Some("data/logo.svg".into()),
//!     ..Default::default()
//! };
//! generate_qr("https://example.com", "output/qr_code.png", &opts).expect("render failed");
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Trusted defaults and JSON overrides.
//! - [`matrix`]: QR module matrix produced by the encoder.
//! - [`geometry`]: Pixel layout of modules, logo and pad.
//! - [`render`]: PNG rasterizer and SVG renderer.
//! - [`logo`]: Logo loading, rasterization and compositing.
//! - [`helper`]: `generate` entry points and atomic file output.
//! - [`shell`]: The interactive prompt loop behind the `brandqr` binary.
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod geometry;
pub mod helper;
pub mod logo;
pub mod matrix;
pub mod render;
pub mod shell;

pub use error::{RenderError, Result};
pub use helper::{generate, generate_qr, GenerateOptions, LogoSpec, OutputFormat, RenderRequest};
