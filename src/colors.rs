use crossterm::style::Color;

/// `#rgb` or `#rrggbb` (leading `#` optional) to components.
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.trim().trim_start_matches('#');
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match digits.len() {
        3 => {
            let mut it = digits.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
            Some((it.next()??, it.next()??, it.next()??))
        }
        6 => {
            let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
            Some((byte(0)?, byte(2)?, byte(4)?))
        }
        _ => None,
    }
}

/// `rgb(r,g,b)` / `rgba(r,g,b,a)`. Alpha is returned separately, default 1.0.
fn parse_rgb_function(s: &str) -> Option<((u8, u8, u8), f64)> {
    let s = s.trim();
    let inner = s
        .strip_prefix("rgba(")
        .or_else(|| s.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |p: &str| p.parse::<f64>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8);
    let alpha = match parts.get(3) {
        Some(a) => a.parse::<f64>().ok()?.clamp(0.0, 1.0),
        None => 1.0,
    };
    Some(((channel(parts[0])?, channel(parts[1])?, channel(parts[2])?), alpha))
}

/// CSS color string to an RGB terminal color.
///
/// Terminals have no alpha, so `rgba` colors are pre-multiplied over black.
pub fn parse_css_color(s: &str) -> Option<Color> {
    if let Some((r, g, b)) = hex_to_rgb(s) {
        return Some(Color::Rgb { r, g, b });
    }
    let ((r, g, b), a) = parse_rgb_function(s)?;
    let mul = |c: u8| (c as f64 * a).round() as u8;
    Some(Color::Rgb { r: mul(r), g: mul(g), b: mul(b) })
}

/// Parse or fall back.
pub fn css_or(s: &str, fallback: Color) -> Color {
    parse_css_color(s).unwrap_or(fallback)
}

/// Linear mix of two RGB colors; `t` = 0 gives `a`. Non-RGB colors pass through `a`.
pub fn blend(a: Color, b: Color, t: f64) -> Color {
    match (a, b) {
        (Color::Rgb { r: r1, g: g1, b: b1 }, Color::Rgb { r: r2, g: g2, b: b2 }) => {
            let t = t.clamp(0.0, 1.0);
            let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
            Color::Rgb { r: mix(r1, r2), g: mix(g1, g2), b: mix(b1, b2) }
        }
        _ => a,
    }
}

/// Scale brightness, `factor` 0..=1 darkens toward black.
pub fn dim(c: Color, factor: f64) -> Color {
    blend(Color::Rgb { r: 0, g: 0, b: 0 }, c, factor)
}
