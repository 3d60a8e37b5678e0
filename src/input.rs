// Device buttons, the NES joypad they map onto, and scripted input for
// headless runs.

use bitflags::bitflags;

use crate::menu::MenuInput;

bitflags! {
    /// Physical buttons of the handheld.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Buttons: u16 {
        const DPAD_UP = 0x0001;
        const DPAD_DOWN = 0x0002;
        const DPAD_LEFT = 0x0004;
        const DPAD_RIGHT = 0x0008;
        const A = 0x0010;
        const B = 0x0020;
        const MODE = 0x0040;
        const POWER = 0x0080;
        /// Dedicated button below the screen; opens the pause menu.
        const BOTTOM = 0x0100;
    }
}

bitflags! {
    /// Standard NES controller, in shift-register order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NesPad: u8 {
        const A = 0x01;
        const B = 0x02;
        const SELECT = 0x04;
        const START = 0x08;
        const UP = 0x10;
        const DOWN = 0x20;
        const LEFT = 0x40;
        const RIGHT = 0x80;
    }
}

/// Held device buttons as seen by player one. Mode doubles as Start and
/// Power as Select.
pub fn nes_pad(held: Buttons) -> NesPad {
    const MAP: [(Buttons, NesPad); 8] = [
        (Buttons::DPAD_UP, NesPad::UP),
        (Buttons::DPAD_RIGHT, NesPad::RIGHT),
        (Buttons::DPAD_DOWN, NesPad::DOWN),
        (Buttons::DPAD_LEFT, NesPad::LEFT),
        (Buttons::MODE, NesPad::START),
        (Buttons::POWER, NesPad::SELECT),
        (Buttons::A, NesPad::A),
        (Buttons::B, NesPad::B),
    ];
    MAP.iter()
        .filter(|(button, _)| held.contains(*button))
        .fold(NesPad::empty(), |pad, (_, bit)| pad | *bit)
}

/// Newly pressed buttons while the menu is open. One input per poll, with
/// cancel taking precedence over confirm and confirm over navigation.
pub fn menu_input(pressed: Buttons) -> Option<MenuInput> {
    if pressed.intersects(Buttons::B | Buttons::BOTTOM) {
        Some(MenuInput::Cancel)
    } else if pressed.contains(Buttons::A) {
        Some(MenuInput::Confirm)
    } else if pressed.contains(Buttons::DPAD_DOWN) {
        Some(MenuInput::Down)
    } else if pressed.contains(Buttons::DPAD_UP) {
        Some(MenuInput::Up)
    } else if pressed.contains(Buttons::DPAD_LEFT) {
        Some(MenuInput::Left)
    } else if pressed.contains(Buttons::DPAD_RIGHT) {
        Some(MenuInput::Right)
    } else {
        None
    }
}

// --- Scripted input (opt-in; used by headless runs) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScriptedInputEvent {
    start: u64,
    end: u64,
    mask: Buttons,
}

/// Buttons held over ranges of input polls, e.g. `"10:BOTTOM;12-13:A"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptedInput {
    events: Vec<ScriptedInputEvent>,
}

impl ScriptedInput {
    pub fn parse(text: &str) -> Result<Self, String> {
        fn parse_buttons(text: &str) -> Buttons {
            text.split([',', '+', '|'])
                .filter_map(|name| match name.trim().to_uppercase().as_str() {
                    "A" => Some(Buttons::A),
                    "B" => Some(Buttons::B),
                    "UP" => Some(Buttons::DPAD_UP),
                    "DOWN" => Some(Buttons::DPAD_DOWN),
                    "LEFT" => Some(Buttons::DPAD_LEFT),
                    "RIGHT" => Some(Buttons::DPAD_RIGHT),
                    "MODE" | "START" => Some(Buttons::MODE),
                    "POWER" | "SELECT" => Some(Buttons::POWER),
                    "BOTTOM" | "MENU" => Some(Buttons::BOTTOM),
                    _ => None,
                })
                .fold(Buttons::empty(), |acc, v| acc | v)
        }

        fn parse_range(text: &str) -> Option<(u64, u64)> {
            let s = text.trim();
            if s.is_empty() {
                return None;
            }
            if let Some((a, b)) = s.split_once('-') {
                let start = a.trim().parse::<u64>().ok()?;
                let end = b.trim().parse::<u64>().ok()?;
                (start <= end).then_some((start, end))
            } else {
                let t = s.parse::<u64>().ok()?;
                Some((t, t))
            }
        }

        let text = text.trim();
        if text.is_empty() {
            return Err("input events text is empty".to_string());
        }

        let mut events = Vec::new();
        for ent in text.split(';') {
            let ent = ent.trim();
            if ent.is_empty() {
                continue;
            }
            let (range_s, buttons_s) = ent
                .split_once(':')
                .map(|(r, b)| (r.trim(), b.trim()))
                .unwrap_or((ent, "MODE"));
            let (start, end) = parse_range(range_s)
                .ok_or_else(|| format!("invalid range in input event: '{}'", ent))?;
            let mask = parse_buttons(buttons_s);
            if mask.is_empty() {
                return Err(format!("invalid buttons in input event: '{}'", ent));
            }
            events.push(ScriptedInputEvent { start, end, mask });
        }

        if events.is_empty() {
            return Err("no valid input events parsed".to_string());
        }
        Ok(Self { events })
    }

    pub fn held_at(&self, poll: u64) -> Buttons {
        self.events
            .iter()
            .filter(|e| poll >= e.start && poll <= e.end)
            .fold(Buttons::empty(), |acc, e| acc | e.mask)
    }

    /// Last poll index any event touches.
    pub fn last_poll(&self) -> u64 {
        self.events.iter().map(|e| e.end).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_buttons_map_to_nes_pad() {
        assert_eq!(nes_pad(Buttons::empty()), NesPad::empty());
        assert_eq!(nes_pad(Buttons::MODE), NesPad::START);
        assert_eq!(nes_pad(Buttons::POWER), NesPad::SELECT);
        assert_eq!(
            nes_pad(Buttons::DPAD_UP | Buttons::DPAD_LEFT | Buttons::A | Buttons::B),
            NesPad::UP | NesPad::LEFT | NesPad::A | NesPad::B
        );
        // The menu button never reaches the game.
        assert_eq!(nes_pad(Buttons::BOTTOM), NesPad::empty());
    }

    #[test]
    fn menu_input_precedence() {
        assert_eq!(menu_input(Buttons::empty()), None);
        assert_eq!(menu_input(Buttons::A | Buttons::B), Some(MenuInput::Cancel));
        assert_eq!(menu_input(Buttons::BOTTOM), Some(MenuInput::Cancel));
        assert_eq!(
            menu_input(Buttons::A | Buttons::DPAD_DOWN),
            Some(MenuInput::Confirm)
        );
        assert_eq!(
            menu_input(Buttons::DPAD_DOWN | Buttons::DPAD_UP),
            Some(MenuInput::Down)
        );
        assert_eq!(menu_input(Buttons::DPAD_RIGHT), Some(MenuInput::Right));
    }

    #[test]
    fn scripted_input_ranges() {
        let script = ScriptedInput::parse("3:bottom; 5-7:a+down ;9").unwrap();
        assert_eq!(script.held_at(0), Buttons::empty());
        assert_eq!(script.held_at(3), Buttons::BOTTOM);
        assert_eq!(script.held_at(6), Buttons::A | Buttons::DPAD_DOWN);
        assert_eq!(script.held_at(9), Buttons::MODE);
        assert_eq!(script.last_poll(), 9);
    }

    #[test]
    fn scripted_input_rejects_garbage() {
        assert!(ScriptedInput::parse("").is_err());
        assert!(ScriptedInput::parse("x:A").is_err());
        assert!(ScriptedInput::parse("4:JUMP").is_err());
        assert!(ScriptedInput::parse("9-2:A").is_err());
        assert!(ScriptedInput::parse(" ; ").is_err());
    }
}
