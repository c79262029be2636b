/// Straight (non-premultiplied) RGBA8.
pub type Rgba8 = [u8; 4];

/// Parses a `#rrggbb` hex string into an opaque RGBA color.
///
/// Anything that is not six hex digits (after an optional leading `#`)
/// degrades to opaque black rather than erroring, so a malformed style
/// never aborts a field.
pub fn parse_hex(color: &str) -> Rgba8 {
    let hex = color.strip_prefix('#').unwrap_or(color);
    if hex.len() == 6
        && let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&hex[0..2], 16),
            u8::from_str_radix(&hex[2..4], 16),
            u8::from_str_radix(&hex[4..6], 16),
        )
    {
        return [r, g, b, 255];
    }
    [0, 0, 0, 255]
}
