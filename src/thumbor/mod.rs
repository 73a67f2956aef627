//! Thumbor-style path mapping
//!
//! Turns paths such as
//! ```text
//! /fit-in/10x10:90x90/300x200/filters:grayscale()/filters:quality(80)/photos/cat.jpg
//! ```
//! into an ordered edit mapping, and strips the same tokens to recover the
//! object key (`photos/cat.jpg`).
//!
//! Recognised tokens:
//! - absolute crop `LxT:RxB`
//! - resize `WxH` directly after a slash (a zero dimension is left open)
//! - `fit-in`
//! - `filters:name(args)` segments, see [`filters`]

pub mod color;
pub mod filters;

use regex::{Captures, Regex};
use serde_json::json;
use std::sync::OnceLock;

use crate::edits::Edits;
use crate::error::ImageRequestError;

fn crop_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d+)x(\d+):(\d+)x(\d+)").expect("static crop pattern is valid")
    })
}

fn resize_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/(\d+)x(\d+)/").expect("static resize pattern is valid"))
}

fn filter_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"filters:[^)]+").expect("static filter pattern is valid"))
}

/// Every token removed when recovering the key. Dimension and `fit-in`
/// tokens only count when a `/` follows them; that check happens in
/// [`parse_key`].
fn strip_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?P<token>/\d+x\d+:\d+x\d+|/\d+x\d+|/fit-in)|(?P<filter>filters:[^/]+)")
            .expect("static strip pattern is valid")
    })
}

/// Map a Thumbor path to its edit operations
pub fn map_path_to_edits(path: &str) -> Result<Edits, ImageRequestError> {
    let mut edits = map_crop(path)?;
    edits.merge(map_resize(path)?);
    edits.merge(map_fit_in(path));

    let extension = path
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase();

    // Sorted so `format` is applied before `quality`, which needs the
    // target format when the key has no usable extension.
    let mut expressions: Vec<String> = filter_pattern()
        .find_iter(path)
        .map(|m| format!("{})", m.as_str()))
        .collect();
    expressions.sort();

    for expression in &expressions {
        filters::apply_filter(expression, &extension, &mut edits)?;
    }

    Ok(edits)
}

/// Recover the object key by stripping every Thumbor token and URL-decoding
pub fn parse_key(path: &str) -> Result<String, ImageRequestError> {
    let stripped = strip_pattern().replace_all(path, |caps: &Captures| {
        if caps.name("filter").is_some() {
            return String::new();
        }
        let whole = caps.get(0).map(|m| (m.as_str(), m.end()));
        match whole {
            Some((_, end)) if path[end..].starts_with('/') => String::new(),
            Some((text, _)) => text.to_string(),
            None => String::new(),
        }
    });

    let trimmed = stripped.trim_start_matches('/');
    urlencoding::decode(trimmed)
        .map(|key| key.into_owned())
        .map_err(|_| ImageRequestError::cannot_decode_request())
}

fn map_crop(path: &str) -> Result<Edits, ImageRequestError> {
    let mut edits = Edits::new();
    let Some(caps) = crop_pattern().captures(path) else {
        return Ok(edits);
    };

    let coords: Vec<u64> = (1..=4)
        .map(|i| parse_dimension(&caps[i]))
        .collect::<Result<_, _>>()?;
    let (left, top, right, bottom) = (coords[0], coords[1], coords[2], coords[3]);

    if right < left || bottom < top {
        return Err(ImageRequestError::invalid_edit(
            "crop",
            "bottom-right corner must not precede top-left corner",
        ));
    }

    edits.insert(
        "crop",
        json!({
            "left": left,
            "top": top,
            "width": right - left,
            "height": bottom - top,
        }),
    );
    Ok(edits)
}

fn map_resize(path: &str) -> Result<Edits, ImageRequestError> {
    let mut edits = Edits::new();
    let Some(caps) = resize_pattern().captures(path) else {
        return Ok(edits);
    };

    let width = parse_dimension(&caps[1])?;
    let height = parse_dimension(&caps[2])?;
    if width == 0 && height == 0 {
        return Ok(edits);
    }

    let resize = edits.object_mut("resize");
    if width > 0 {
        resize.insert("width".into(), json!(width));
    }
    if height > 0 {
        resize.insert("height".into(), json!(height));
    }
    Ok(edits)
}

fn map_fit_in(path: &str) -> Edits {
    let mut edits = Edits::new();
    if path.contains("fit-in") {
        edits
            .object_mut("resize")
            .insert("fit".into(), json!("inside"));
    }
    edits
}

fn parse_dimension(value: &str) -> Result<u64, ImageRequestError> {
    value
        .parse()
        .map_err(|_| ImageRequestError::invalid_edit("resize", format!("'{}' is out of range", value)))
}
