// Color parsing for lighting-effect files.

/// Parse `0xAARRGGBB` or `#AARRGGBB` into a packed RGBA value
/// (`R | G<<8 | B<<16 | A<<24`).
///
/// With `fixup_alpha` (static lighting), an alpha of 0 on a non-black color
/// is forced to 0xFF: static keys are conventionally authored without an
/// alpha channel and must not come out fully transparent. Dynamic-effect
/// colors are taken verbatim.
pub fn parse_color(s: &str, fixup_alpha: bool) -> Option<u32> {
    let s = s.trim();
    let hex = s.strip_prefix("0x").or_else(|| s.strip_prefix('#'))?;
    let argb = u32::from_str_radix(hex, 16).ok()?;

    let mut a = (argb >> 24) as u8;
    let r = (argb >> 16) as u8;
    let g = (argb >> 8) as u8;
    let b = argb as u8;
    if fixup_alpha && a == 0 && (r != 0 || g != 0 || b != 0) {
        a = 0xFF;
    }
    Some((r as u32) | (g as u32) << 8 | (b as u32) << 16 | (a as u32) << 24)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_prefixes() {
        assert_eq!(parse_color("0xFF112233", false), Some(0x_FF_33_22_11));
        assert_eq!(parse_color("#FF112233", false), Some(0x_FF_33_22_11));
    }

    #[test]
    fn channel_repack_is_lossless() {
        // Decode then re-extract the channels: nothing but the byte order
        // changes on the dynamic (no-fixup) path.
        let rgba = parse_color("0x80A0B0C0", false).unwrap();
        assert_eq!(rgba >> 24, 0x80); // A
        assert_eq!(rgba & 0xFF, 0xA0); // R
        assert_eq!((rgba >> 8) & 0xFF, 0xB0); // G
        assert_eq!((rgba >> 16) & 0xFF, 0xC0); // B
    }

    #[test]
    fn static_alpha_fixup() {
        // Alpha 0 with red set: forced opaque on the static path.
        let rgba = parse_color("#00FF0000", true).unwrap();
        assert_eq!(rgba >> 24, 0xFF);
        assert_eq!(rgba & 0xFF, 0xFF);

        // All-zero color keeps alpha 0.
        assert_eq!(parse_color("#00000000", true), Some(0));

        // Dynamic path never gets the fixup.
        let rgba = parse_color("#00FF0000", false).unwrap();
        assert_eq!(rgba >> 24, 0x00);
    }

    #[test]
    fn short_hex_still_parses() {
        // "FF0000" means alpha 0, red FF; the static path fixes alpha up.
        let rgba = parse_color("#FF0000", true).unwrap();
        assert_eq!(rgba, 0xFF00_00FF);
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse_color("", false), None);
        assert_eq!(parse_color("FF0000", false), None); // no prefix
        assert_eq!(parse_color("#GGHHIIJJ", false), None);
        assert_eq!(parse_color("0x112233445", false), None); // overflows 32 bits
    }
}
