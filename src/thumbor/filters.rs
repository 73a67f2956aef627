//! Thumbor filter → edit operation mapping
//!
//! Each `filters:name(args)` expression maps to exactly one operation.
//! Unknown filter names are ignored.

use regex::Regex;
use serde_json::{json, Map, Number, Value};
use std::sync::OnceLock;

use super::color;
use crate::edits::Edits;
use crate::error::ImageRequestError;
use crate::request::format::OutputFormat;

fn expression_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r":(.+)\((.*)\)").expect("static filter expression is valid"))
}

fn position_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(100|[1-9]?[0-9]|-(100|[1-9][0-9]?))p$").expect("static position pattern is valid")
    })
}

/// Apply one `filters:name(value)` expression to the edit set
///
/// `extension` is the lower-cased file extension of the request path and
/// decides which format a `quality` filter applies to.
pub fn apply_filter(
    expression: &str,
    extension: &str,
    edits: &mut Edits,
) -> Result<(), ImageRequestError> {
    let Some(caps) = expression_pattern().captures(expression) else {
        tracing::debug!(filter = %expression, "Ignoring malformed filter expression");
        return Ok(());
    };
    let name = &caps[1];
    let value = &caps[2];

    match name {
        "autojpg" => edits.insert("toFormat", json!("jpeg")),
        "background_color" => {
            let background = parse_color(name, value)?;
            edits.insert("flatten", json!({ "background": background }));
        }
        "blur" => {
            let parts: Vec<&str> = value.split(',').collect();
            let sigma = match parts.get(1).filter(|s| !s.trim().is_empty()) {
                Some(sigma) => parse_number(name, sigma)?,
                None => parse_number(name, parts[0])? / 2.0,
            };
            edits.insert("blur", number(name, sigma)?);
        }
        "convolution" => edits.insert("convolve", convolution(value)?),
        "equalize" => edits.insert("normalize", json!(true)),
        "fill" => {
            let background = parse_color(name, value)?;
            let resize = edits.object_mut("resize");
            resize.insert("fit".into(), json!("contain"));
            resize.insert("background".into(), background);
        }
        "format" => {
            let normalized: String = value
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_lowercase()
                .replace("jpg", "jpeg");
            match OutputFormat::from_edit_key(&normalized) {
                Some(format) => edits.insert("toFormat", json!(format.as_str())),
                None => tracing::debug!(format = %value, "Ignoring unsupported format filter"),
            }
        }
        "grayscale" => edits.insert("grayscale", json!(true)),
        "no_upscale" => {
            edits
                .object_mut("resize")
                .insert("withoutEnlargement".into(), json!(true));
        }
        "proportion" => {
            let ratio = parse_number(name, value)?;
            let resize = edits.object_mut("resize");
            for dimension in ["width", "height"] {
                if let Some(current) = resize.get(dimension).and_then(Value::as_f64) {
                    resize.insert(dimension.into(), number(name, current * ratio)?);
                }
            }
        }
        "quality" => {
            let target = OutputFormat::from_extension(extension)
                .or_else(|| edits.to_format().and_then(|f| f.parse().ok()));
            match target {
                Some(format) => {
                    let quality = number(name, parse_number(name, value)?)?;
                    edits.insert(format.as_str(), json!({ "quality": quality }));
                }
                None => tracing::debug!(extension = %extension, "No target format for quality filter"),
            }
        }
        "rgb" => {
            let channels: Vec<f64> = value
                .split(',')
                .map(|p| parse_number(name, p).map(|pct| 255.0 * pct / 100.0))
                .collect::<Result<_, _>>()?;
            if channels.len() != 3 {
                return Err(ImageRequestError::invalid_edit(name, "expected three percentages"));
            }
            edits.insert(
                "tint",
                json!({
                    "r": number(name, channels[0])?,
                    "g": number(name, channels[1])?,
                    "b": number(name, channels[2])?,
                }),
            );
        }
        "rotate" => edits.insert("rotate", number(name, parse_number(name, value)?)?),
        "sharpen" => {
            let amount = value
                .split(',')
                .nth(1)
                .ok_or_else(|| ImageRequestError::invalid_edit(name, "expected amount,radius"))?;
            let sigma = 1.0 + parse_number(name, amount)? / 2.0;
            edits.insert("sharpen", number(name, sigma)?);
        }
        "stretch" => {
            let resize = edits.object_mut("resize");
            if resize.get("fit").and_then(Value::as_str) != Some("inside") {
                resize.insert("fit".into(), json!("fill"));
            }
        }
        "strip_exif" | "strip_icc" => edits.insert("rotate", Value::Null),
        "upscale" => {
            edits
                .object_mut("resize")
                .insert("fit".into(), json!("inside"));
        }
        "watermark" => edits.insert("overlayWith", watermark(value)?),
        _ => tracing::debug!(filter = %name, "Ignoring unsupported filter"),
    }

    Ok(())
}

fn parse_color(filter: &str, value: &str) -> Result<Value, ImageRequestError> {
    color::parse(value)
        .map(|c| c.to_value())
        .ok_or_else(|| ImageRequestError::invalid_edit(filter, format!("unknown color '{}'", value)))
}

fn parse_number(filter: &str, value: &str) -> Result<f64, ImageRequestError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ImageRequestError::invalid_edit(filter, format!("'{}' is not a number", value)))
}

/// Integral values are emitted as JSON integers, everything else as floats
fn number(filter: &str, value: f64) -> Result<Value, ImageRequestError> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        return Ok(json!(value as i64));
    }
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| ImageRequestError::invalid_edit(filter, "value is not finite"))
}

/// `convolution(k1;k2;...;kn,width[,normalize])` → `{width, height, kernel}`
fn convolution(value: &str) -> Result<Value, ImageRequestError> {
    let mut parts = value.split(',');
    let kernel: Vec<Value> = parts
        .next()
        .unwrap_or_default()
        .split(';')
        .map(|k| parse_number("convolution", k).and_then(|v| number("convolution", v)))
        .collect::<Result<_, _>>()?;

    let width = parts
        .next()
        .ok_or_else(|| ImageRequestError::invalid_edit("convolution", "missing matrix width"))
        .and_then(|w| parse_number("convolution", w))?;
    if width < 1.0 || width.fract() != 0.0 {
        return Err(ImageRequestError::invalid_edit(
            "convolution",
            "matrix width must be a positive integer",
        ));
    }
    let width = width as usize;

    Ok(json!({
        "width": width,
        "height": kernel.len() / width,
        "kernel": kernel,
    }))
}

/// `watermark(bucket,key,x,y,alpha,wRatio,hRatio)` → `overlayWith`
fn watermark(value: &str) -> Result<Value, ImageRequestError> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let options: Vec<&str> = compact.split(',').collect();

    let bucket = options.first().filter(|b| !b.is_empty());
    let key = options.get(1).filter(|k| !k.is_empty());
    let (Some(bucket), Some(key)) = (bucket, key) else {
        return Err(ImageRequestError::invalid_edit(
            "watermark",
            "bucket and key are required",
        ));
    };

    let mut overlay = Map::new();
    overlay.insert("bucket".into(), json!(bucket));
    overlay.insert("key".into(), json!(key));
    for (index, field) in [(4, "alpha"), (5, "wRatio"), (6, "hRatio")] {
        if let Some(raw) = options.get(index).filter(|v| !v.is_empty()) {
            overlay.insert(field.into(), json!(raw));
        }
    }

    let mut position = Map::new();
    for (index, field) in [(2, "left"), (3, "top")] {
        if let Some(raw) = options.get(index).filter(|v| is_position(v)) {
            position.insert(field.into(), json!(raw));
        }
    }
    overlay.insert("options".into(), Value::Object(position));

    Ok(Value::Object(overlay))
}

/// Pixel offsets or `-100p`..`100p` percentages
fn is_position(value: &str) -> bool {
    position_pattern().is_match(value) || value.parse::<f64>().is_ok()
}
