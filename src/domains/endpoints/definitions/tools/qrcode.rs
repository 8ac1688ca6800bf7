//! QR code generation endpoint.
//!
//! PNG output is returned as a data URL in `qr_code`, so `raw=true` serves
//! the image itself. SVG output is returned as markup.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, Rgb};
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::io::Cursor;

use crate::domains::endpoints::{Endpoint, EndpointError, Failure, HandlerOutcome, required};

pub const MIN_SIZE: u32 = 50;
pub const MAX_SIZE: u32 = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum QrFormat {
    #[default]
    Png,
    Svg,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QrCodeParams {
    /// Content to encode.
    pub text: Option<String>,

    /// Minimum edge length in pixels, 50 to 1000.
    #[serde(default = "default_size")]
    pub size: u32,

    /// `png` (default) or `svg`.
    #[serde(default)]
    pub format: QrFormat,

    /// Module color as six hex digits.
    #[serde(default = "default_color")]
    pub color: String,

    /// Background color as six hex digits.
    #[serde(default = "default_bgcolor")]
    pub bgcolor: String,
}

fn default_size() -> u32 {
    200
}

fn default_color() -> String {
    "000000".to_string()
}

fn default_bgcolor() -> String {
    "FFFFFF".to_string()
}

pub struct QrCodeTool;

/// Parse `RRGGBB`, with or without a leading `#`.
pub fn parse_color(raw: &str) -> Option<[u8; 3]> {
    let digits = raw.trim().trim_start_matches('#');
    if digits.len() != 6 {
        return None;
    }
    let bytes = hex::decode(digits).ok()?;
    Some([bytes[0], bytes[1], bytes[2]])
}

fn css(color: [u8; 3]) -> String {
    format!("#{}", hex::encode(color))
}

fn render_png(code: &QrCode, size: u32, dark: [u8; 3], light: [u8; 3]) -> Result<(Vec<u8>, u32), EndpointError> {
    let image = code
        .render::<Rgb<u8>>()
        .dark_color(Rgb(dark))
        .light_color(Rgb(light))
        .min_dimensions(size, size)
        .build();
    let width = image.width();

    let mut png = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| EndpointError::execution_failed(format!("PNG encoding failed: {}", e)))?;
    Ok((png, width))
}

#[async_trait]
impl Endpoint for QrCodeTool {
    const CATEGORY: &'static str = "tools";
    const NAME: &'static str = "qrcode";
    const DESCRIPTION: &'static str = "Generate a QR code as PNG or SVG";
    type Params = QrCodeParams;

    async fn execute(&self, params: QrCodeParams) -> Result<HandlerOutcome, EndpointError> {
        let text = required(params.text.as_deref(), "Text parameter is required")?;

        if !(MIN_SIZE..=MAX_SIZE).contains(&params.size) {
            return Ok(Failure::invalid_input(format!(
                "size must be between {} and {}",
                MIN_SIZE, MAX_SIZE
            ))
            .into());
        }
        let (Some(dark), Some(light)) = (parse_color(&params.color), parse_color(&params.bgcolor)) else {
            return Ok(Failure::invalid_input("Colors must be six hex digits")
                .with_suggestion("Use e.g. color=000000&bgcolor=FFFFFF")
                .into());
        };

        let code = match QrCode::with_error_correction_level(text.as_bytes(), EcLevel::H) {
            Ok(code) => code,
            Err(e) => {
                return Ok(Failure::invalid_input(format!("Cannot encode text: {}", e))
                    .with_detail("text_length", text.len())
                    .into());
            }
        };

        let (qr_code, format, width) = match params.format {
            QrFormat::Svg => {
                let (dark, light) = (css(dark), css(light));
                let markup = code
                    .render::<svg::Color>()
                    .dark_color(svg::Color(&dark))
                    .light_color(svg::Color(&light))
                    .min_dimensions(params.size, params.size)
                    .build();
                (markup, "svg", params.size)
            }
            QrFormat::Png => {
                let (png, width) = render_png(&code, params.size, dark, light)?;
                (format!("data:image/png;base64,{}", STANDARD.encode(png)), "png", width)
            }
        };

        Ok(HandlerOutcome::success(json!({
            "qr_code": qr_code,
            "format": format,
            "size": params.size,
            "width": width,
            "modules": code.width(),
            "error_correction": "H",
            "text": text,
        })))
    }
}
