/// Packed 32-bit pixel orderings an engine may hand back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    /// `0xAARRGGBB`, color channels multiplied by alpha.
    Argb8888Premultiplied,
    /// `0xAARRGGBB`, straight alpha.
    Argb8888Straight,
}

pub fn pack_argb(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (u32::from(a) << 24) | (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

/// Unpack one engine pixel into straight-alpha RGBA8.
pub fn to_straight_rgba(px: u32, layout: PixelLayout) -> [u8; 4] {
    let a = (px >> 24) as u8;
    let r = (px >> 16) as u8;
    let g = (px >> 8) as u8;
    let b = px as u8;
    match layout {
        PixelLayout::Argb8888Straight => [r, g, b, a],
        PixelLayout::Argb8888Premultiplied => {
            [unpremul(r, a), unpremul(g, a), unpremul(b, a), a]
        }
    }
}

fn unpremul(c: u8, a: u8) -> u8 {
    match a {
        0 => 0,
        255 => c,
        _ => {
            let a = u32::from(a);
            ((u32::from(c) * 255 + a / 2) / a).min(255) as u8
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_puts_alpha_in_the_high_byte() {
        assert_eq!(pack_argb(0x11, 0x22, 0x33, 0x44), 0x4411_2233);
    }

    #[test]
    fn straight_layout_only_reorders() {
        let px = pack_argb(10, 20, 30, 40);
        assert_eq!(to_straight_rgba(px, PixelLayout::Argb8888Straight), [10, 20, 30, 40]);
    }

    #[test]
    fn opaque_and_transparent_premul_pixels() {
        let px = pack_argb(200, 100, 50, 255);
        assert_eq!(
            to_straight_rgba(px, PixelLayout::Argb8888Premultiplied),
            [200, 100, 50, 255]
        );
        assert_eq!(
            to_straight_rgba(0, PixelLayout::Argb8888Premultiplied),
            [0, 0, 0, 0]
        );
    }

    #[test]
    fn half_alpha_premul_is_divided_back_out() {
        let px = pack_argb(64, 32, 0, 128);
        assert_eq!(
            to_straight_rgba(px, PixelLayout::Argb8888Premultiplied),
            [128, 64, 0, 128]
        );
    }

    #[test]
    fn inconsistent_premul_saturates() {
        let px = pack_argb(200, 0, 0, 100);
        assert_eq!(to_straight_rgba(px, PixelLayout::Argb8888Premultiplied)[0], 255);
    }
}
