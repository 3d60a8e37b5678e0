use serde::{Deserialize, Serialize};

pub const PALETTE_SIZE: usize = 256;

/// Color palettes the core knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaletteKind {
    #[default]
    Smooth,
    Classic,
    Composite,
    Grayscale,
}

impl PaletteKind {
    pub const ALL: [PaletteKind; 4] = [
        PaletteKind::Smooth,
        PaletteKind::Classic,
        PaletteKind::Composite,
        PaletteKind::Grayscale,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PaletteKind::Smooth => "Smooth",
            PaletteKind::Classic => "Classic",
            PaletteKind::Composite => "Composite",
            PaletteKind::Grayscale => "Gray",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|&k| k == self).unwrap_or(0)
    }

    /// Step through the palettes, wrapping at both ends.
    pub fn cycle(self, delta: i32) -> Self {
        let len = Self::ALL.len() as i32;
        let next = (self.index() as i32 + delta).rem_euclid(len);
        Self::ALL[next as usize]
    }
}

/// Convert the core's native RGB565 palette into the display's byte order.
/// The panel takes pixels most significant byte first, so every entry is
/// byte-swapped; missing entries repeat the native palette.
pub fn build_palette(native: &[u16]) -> Box<[u16; PALETTE_SIZE]> {
    let mut palette = Box::new([0u16; PALETTE_SIZE]);
    if native.is_empty() {
        return palette;
    }
    for (i, slot) in palette.iter_mut().enumerate() {
        *slot = native[i % native.len()].swap_bytes();
    }
    palette
}

/// Pack 8-bit channels into RGB565.
pub const fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_entries_are_byte_swapped() {
        let native: Vec<u16> = (0..PALETTE_SIZE as u16).map(|i| (i << 8) | (255 - i)).collect();
        let palette = build_palette(&native);
        assert_eq!(palette[0], 0xFF00);
        assert_eq!(palette[1], 0xFE01);
        for (i, &c) in palette.iter().enumerate() {
            assert_eq!(c.swap_bytes(), native[i]);
        }
    }

    #[test]
    fn short_native_palette_repeats() {
        let palette = build_palette(&[0xF800, 0x07E0]);
        assert_eq!(palette[0], 0x00F8);
        assert_eq!(palette[1], 0xE007);
        assert_eq!(palette[254], 0x00F8);
        assert_eq!(palette[255], 0xE007);
    }

    #[test]
    fn palette_cycle_wraps() {
        assert_eq!(PaletteKind::Smooth.cycle(1), PaletteKind::Classic);
        assert_eq!(PaletteKind::Smooth.cycle(-1), PaletteKind::Grayscale);
        assert_eq!(PaletteKind::Grayscale.cycle(1), PaletteKind::Smooth);
    }

    #[test]
    fn rgb565_packing() {
        assert_eq!(rgb565(0xFF, 0xFF, 0xFF), 0xFFFF);
        assert_eq!(rgb565(0xFF, 0, 0), 0xF800);
        assert_eq!(rgb565(0, 0, 0x80), 0x0010);
    }
}
