//! CSS color parsing for fills, text and backgrounds.

use tiny_skia::Color;

use crate::error::{RenderError, RenderResult};

/// Parse a CSS color: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb()`,
/// `rgba()`, `transparent` or one of a handful of named colors.
///
/// # Errors
///
/// Returns an error for anything else.
pub fn parse_color(input: &str) -> RenderResult<Color> {
    let value = input.trim().to_ascii_lowercase();
    let invalid = || RenderError::Resource(format!("invalid color: {input}"));

    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(invalid);
    }
    if let Some(args) = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_rgb_args(args).ok_or_else(invalid);
    }

    let named = match value.as_str() {
        "transparent" => Color::TRANSPARENT,
        "black" => Color::BLACK,
        "white" => Color::WHITE,
        "red" => Color::from_rgba8(255, 0, 0, 255),
        "green" => Color::from_rgba8(0, 128, 0, 255),
        "blue" => Color::from_rgba8(0, 0, 255, 255),
        "gray" | "grey" => Color::from_rgba8(128, 128, 128, 255),
        _ => return Err(invalid()),
    };
    Ok(named)
}

/// Parse a color, falling back to `fallback` with a warning.
#[must_use]
pub fn parse_color_or(input: &str, fallback: Color) -> Color {
    parse_color(input).unwrap_or_else(|err| {
        tracing::warn!("{err}; using fallback");
        fallback
    })
}

fn parse_hex(hex: &str) -> Option<Color> {
    let nibble = |i: usize| u8::from_str_radix(hex.get(i..=i)?, 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    let (r, g, b, a) = match hex.len() {
        3 => (nibble(0)?, nibble(1)?, nibble(2)?, 255),
        4 => (nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?),
        6 => (byte(0)?, byte(2)?, byte(4)?, 255),
        8 => (byte(0)?, byte(2)?, byte(4)?, byte(6)?),
        _ => return None,
    };
    Some(Color::from_rgba8(r, g, b, a))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_rgb_args(args: &str) -> Option<Color> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |s: &str| -> Option<u8> {
        let v: f32 = s.parse().ok()?;
        Some(v.clamp(0.0, 255.0).round() as u8)
    };
    let alpha = match parts.get(3) {
        Some(a) => a.parse::<f32>().ok()?.clamp(0.0, 1.0),
        None => 1.0,
    };
    Color::from_rgba(
        f32::from(channel(parts[0])?) / 255.0,
        f32::from(channel(parts[1])?) / 255.0,
        f32::from(channel(parts[2])?) / 255.0,
        alpha,
    )
}
