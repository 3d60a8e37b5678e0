//! Pause menu drawing: the frozen game frame dimmed under a navy panel with
//! one row per entry.

use crate::canvas::{color, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::device::Display;
use crate::menu::Menu;
use crate::settings::Settings;

pub const SNAPSHOT_ALPHA: u8 = 150;
pub const PANEL: (i32, i32, i32, i32) = (40, 37, 200, 170);
pub const FIRST_ROW_Y: i32 = 50;
pub const ROW_PITCH: i32 = 22;
pub const ROW_HEIGHT: i32 = 20;
pub const LABEL_X: i32 = 60;
pub const HIGHLIGHT_X: (i32, i32) = (50, 190);
const VALUE_RIGHT_PAD: i32 = 5;

pub fn row_y(index: usize) -> i32 {
    FIRST_ROW_Y + index as i32 * ROW_PITCH
}

pub fn draw_pause_overlay<D: Display + ?Sized>(
    display: &mut D,
    snapshot: &[u8],
    menu: &Menu,
    settings: &Settings,
) {
    display.blit_blended(
        snapshot,
        0,
        0,
        SCREEN_WIDTH as i32,
        SCREEN_HEIGHT as i32,
        SNAPSHOT_ALPHA,
    );
    let (x1, y1, x2, y2) = PANEL;
    display.fill_rect(x1, y1, x2, y2, color::NAVY);

    for (index, entry) in menu.entries().iter().enumerate() {
        let y = row_y(index);
        let selected = index == menu.selection();
        let (mut fg, bg) = if selected {
            (color::NAVY, color::WHITE)
        } else {
            (color::WHITE, color::NAVY)
        };
        if selected {
            display.fill_rect(HIGHLIGHT_X.0, y, HIGHLIGHT_X.1, y + ROW_HEIGHT, color::WHITE);
        }
        if !entry.enabled {
            fg = color::GREY;
        }
        display.draw_text(entry.label, LABEL_X, y, fg, bg);

        if menu.in_options() {
            if let Some(value) = settings.readout(entry.kind) {
                let x = HIGHLIGHT_X.1 - display.text_width(&value) - VALUE_RIGHT_PAD;
                display.draw_text(&value, x, y, fg, bg);
            }
        }
    }
    display.refresh();
}
