// Software RGB565 surface backing the host display primitives.
//
// Pixels are stored most significant byte first, which is what the panel
// (and the byte-swapped core palette) expect.

pub const SCREEN_WIDTH: usize = 240;
pub const SCREEN_HEIGHT: usize = 240;
pub const FRAME_BYTES: usize = SCREEN_WIDTH * SCREEN_HEIGHT * 2;

pub mod color {
    pub const BLACK: u16 = 0x0000;
    pub const WHITE: u16 = 0xFFFF;
    pub const NAVY: u16 = 0x000F;
    pub const GREY: u16 = 0x8410;
}

// Glyphs are stretched vertically only so a 15-letter label fits the panel.
const GLYPH_SCALE_X: i32 = 1;
const GLYPH_SCALE_Y: i32 = 2;
const GLYPH_ADVANCE: i32 = 7;
const TEXT_TOP_PAD: i32 = 3;

#[derive(Clone)]
pub struct Canvas {
    pixels: Vec<u8>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    pub fn new() -> Self {
        Self {
            pixels: vec![0; FRAME_BYTES],
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> u16 {
        let i = (y * SCREEN_WIDTH + x) * 2;
        u16::from_be_bytes([self.pixels[i], self.pixels[i + 1]])
    }

    fn put(&mut self, x: i32, y: i32, color: u16) {
        if x < 0 || y < 0 || x >= SCREEN_WIDTH as i32 || y >= SCREEN_HEIGHT as i32 {
            return;
        }
        let i = (y as usize * SCREEN_WIDTH + x as usize) * 2;
        self.pixels[i..i + 2].copy_from_slice(&color.to_be_bytes());
    }

    pub fn clear(&mut self, color: u16) {
        for px in self.pixels.chunks_exact_mut(2) {
            px.copy_from_slice(&color.to_be_bytes());
        }
    }

    /// Fill the rectangle spanning corners `(x1, y1)` to `(x2, y2)`, exclusive
    /// of the far edges.
    pub fn fill_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: u16) {
        for y in y1.max(0)..y2.min(SCREEN_HEIGHT as i32) {
            for x in x1.max(0)..x2.min(SCREEN_WIDTH as i32) {
                self.put(x, y, color);
            }
        }
    }

    /// Blend a `w` x `h` RGB565 image over the surface. `alpha` 255 is an
    /// opaque copy, 0 leaves the surface untouched.
    pub fn blit_blended(&mut self, src: &[u8], x: i32, y: i32, w: i32, h: i32, alpha: u8) {
        for row in 0..h {
            for col in 0..w {
                let si = ((row * w + col) * 2) as usize;
                let Some(bytes) = src.get(si..si + 2) else {
                    return;
                };
                let (dx, dy) = (x + col, y + row);
                if dx < 0 || dy < 0 || dx >= SCREEN_WIDTH as i32 || dy >= SCREEN_HEIGHT as i32 {
                    continue;
                }
                let top = u16::from_be_bytes([bytes[0], bytes[1]]);
                let bottom = self.pixel(dx as usize, dy as usize);
                self.put(dx, dy, blend565(top, bottom, alpha));
            }
        }
    }

    pub fn text_width(&self, text: &str) -> i32 {
        text.chars().count() as i32 * GLYPH_ADVANCE
    }

    /// Draw `text` with its top-left corner at `(x, y)`. The glyph cells are
    /// painted with `bg` first so the text reads on any background.
    pub fn draw_text(&mut self, text: &str, x: i32, y: i32, fg: u16, bg: u16) {
        let cell_h = 7 * GLYPH_SCALE_Y + 2 * TEXT_TOP_PAD;
        let mut cx = x;
        for ch in text.chars() {
            if ch == '\n' {
                break;
            }
            self.fill_rect(cx, y, cx + GLYPH_ADVANCE, y + cell_h, bg);
            if let Some(rows) = glyph(ch.to_ascii_uppercase()) {
                self.draw_glyph(cx, y + TEXT_TOP_PAD, rows, fg);
            }
            cx += GLYPH_ADVANCE;
            if cx >= SCREEN_WIDTH as i32 {
                break;
            }
        }
    }

    fn draw_glyph(&mut self, x: i32, y: i32, rows: &[u8; 7], color: u16) {
        for (ry, row) in rows.iter().enumerate() {
            for rx in 0..5 {
                // MSB of the 5-bit row is the leftmost column.
                if (row >> (4 - rx)) & 1 == 1 {
                    let px = x + rx * GLYPH_SCALE_X;
                    let py = y + ry as i32 * GLYPH_SCALE_Y;
                    self.fill_rect(px, py, px + GLYPH_SCALE_X, py + GLYPH_SCALE_Y, color);
                }
            }
        }
    }

    /// Scale every channel by `percent` (10..=100), in place.
    pub fn dim(&mut self, percent: u8) {
        if percent >= 100 {
            return;
        }
        for px in self.pixels.chunks_exact_mut(2) {
            let c = u16::from_be_bytes([px[0], px[1]]);
            px.copy_from_slice(&scale565(c, percent).to_be_bytes());
        }
    }
}

fn split565(c: u16) -> (u32, u32, u32) {
    (
        u32::from((c >> 11) & 0x1F),
        u32::from((c >> 5) & 0x3F),
        u32::from(c & 0x1F),
    )
}

fn join565(r: u32, g: u32, b: u32) -> u16 {
    ((r as u16) << 11) | ((g as u16) << 5) | b as u16
}

pub fn blend565(top: u16, bottom: u16, alpha: u8) -> u16 {
    let a = u32::from(alpha);
    let (tr, tg, tb) = split565(top);
    let (br, bg, bb) = split565(bottom);
    let mix = |t: u32, b: u32| (t * a + b * (255 - a)) / 255;
    join565(mix(tr, br), mix(tg, bg), mix(tb, bb))
}

fn scale565(c: u16, percent: u8) -> u16 {
    let p = u32::from(percent.min(100));
    let (r, g, b) = split565(c);
    join565(r * p / 100, g * p / 100, b * p / 100)
}

// --- Minimal 5x7 font ---
// Each glyph is 5x7, stored as 7 rows, MSB left.
static FONT_5X7: [[u8; 7]; 44] = [
    // 'A'..'Z'
    [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // A
    [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E], // B
    [0x0F, 0x10, 0x10, 0x10, 0x10, 0x10, 0x0F], // C
    [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E], // D
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F], // E
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10], // F
    [0x0F, 0x10, 0x10, 0x17, 0x11, 0x11, 0x0F], // G
    [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // H
    [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x1F], // I
    [0x01, 0x01, 0x01, 0x01, 0x11, 0x11, 0x0E], // J
    [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11], // K
    [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F], // L
    [0x11, 0x1B, 0x15, 0x11, 0x11, 0x11, 0x11], // M
    [0x11, 0x19, 0x15, 0x13, 0x11, 0x11, 0x11], // N
    [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // O
    [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10], // P
    [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D], // Q
    [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11], // R
    [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E], // S
    [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // T
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // U
    [0x11, 0x11, 0x11, 0x0A, 0x0A, 0x04, 0x04], // V
    [0x11, 0x11, 0x11, 0x11, 0x15, 0x1B, 0x11], // W
    [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11], // X
    [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04], // Y
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F], // Z
    // '0'..'9'
    [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E], // 0
    [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E], // 1
    [0x0E, 0x11, 0x01, 0x0E, 0x10, 0x10, 0x1F], // 2
    [0x1F, 0x01, 0x02, 0x06, 0x01, 0x11, 0x0E], // 3
    [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02], // 4
    [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E], // 5
    [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E], // 6
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08], // 7
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E], // 8
    [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C], // 9
    // punctuation
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // space (36)
    [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00], // -     (37)
    [0x00, 0x00, 0x04, 0x00, 0x04, 0x00, 0x00], // :     (38)
    [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D], // &     (39)
    [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03], // %     (40)
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C], // .     (41)
    [0x01, 0x01, 0x02, 0x04, 0x08, 0x10, 0x10], // /     (42)
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04], // ?     (43)
];

fn glyph(ch: char) -> Option<&'static [u8; 7]> {
    let idx = match ch {
        'A'..='Z' => (ch as u8 - b'A') as usize,
        '0'..='9' => 26 + (ch as u8 - b'0') as usize,
        ' ' => 36,
        '-' => 37,
        ':' => 38,
        '&' => 39,
        '%' => 40,
        '.' => 41,
        '/' => 42,
        _ => 43,
    };
    FONT_5X7.get(idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixels_are_stored_big_endian() {
        let mut c = Canvas::new();
        c.fill_rect(0, 0, 1, 1, 0xF81F);
        assert_eq!(&c.bytes()[..2], &[0xF8, 0x1F]);
        assert_eq!(c.pixel(0, 0), 0xF81F);
        assert_eq!(c.pixel(1, 0), 0);
    }

    #[test]
    fn fill_rect_clips_and_excludes_far_edges() {
        let mut c = Canvas::new();
        c.fill_rect(230, 230, 300, 300, color::WHITE);
        assert_eq!(c.pixel(239, 239), color::WHITE);
        assert_eq!(c.pixel(229, 239), color::BLACK);
        c.fill_rect(10, 10, 20, 12, color::NAVY);
        assert_eq!(c.pixel(19, 11), color::NAVY);
        assert_eq!(c.pixel(20, 11), color::BLACK);
        assert_eq!(c.pixel(19, 12), color::BLACK);
    }

    #[test]
    fn blending_extremes() {
        assert_eq!(blend565(color::WHITE, color::BLACK, 255), color::WHITE);
        assert_eq!(blend565(color::WHITE, color::BLACK, 0), color::BLACK);
        let mid = blend565(color::WHITE, color::BLACK, 150);
        let (r, _, _) = split565(mid);
        assert_eq!(r, 31 * 150 / 255);
    }

    #[test]
    fn blit_of_own_contents_is_identity() {
        let mut c = Canvas::new();
        c.fill_rect(0, 0, 120, 240, 0x1234);
        let copy = c.bytes().to_vec();
        c.blit_blended(&copy, 0, 0, 240, 240, 150);
        assert_eq!(c.bytes(), &copy[..]);
    }

    #[test]
    fn text_is_drawn_inside_its_cells() {
        let mut c = Canvas::new();
        let w = c.text_width("HI");
        assert_eq!(w, 2 * GLYPH_ADVANCE);
        c.draw_text("HI", 10, 10, color::WHITE, color::NAVY);
        // Top-left of 'H' is lit; the background of the cell is navy.
        assert_eq!(c.pixel(10, 10 + TEXT_TOP_PAD as usize), color::WHITE);
        assert_eq!(c.pixel(10 + 2, 10 + TEXT_TOP_PAD as usize), color::NAVY);
        assert_eq!(c.pixel((10 + w) as usize, 12), color::BLACK);
    }

    #[test]
    fn dimming_scales_channels() {
        let mut c = Canvas::new();
        c.clear(color::WHITE);
        c.dim(50);
        assert_eq!(c.pixel(0, 0), join565(15, 31, 15));
    }
}
