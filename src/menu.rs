//! Pause menu state machine.
//!
//! The machine only decides where the menu goes next and which command the
//! application has to carry out; it performs no side effects itself.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    SaveAndContinue,
    LoadGame,
    Restart,
    Options,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Action(MenuAction),
    Volume,
    Brightness,
    Palette,
    Scaling,
    StateSlot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: &'static str,
    pub enabled: bool,
    pub kind: EntryKind,
}

const fn entry(label: &'static str, enabled: bool, kind: EntryKind) -> MenuEntry {
    MenuEntry {
        label,
        enabled,
        kind,
    }
}

pub const PAUSE_ENTRIES: [MenuEntry; 5] = [
    entry("Save & Continue", true, EntryKind::Action(MenuAction::SaveAndContinue)),
    entry("Load Game", true, EntryKind::Action(MenuAction::LoadGame)),
    entry("Restart", true, EntryKind::Action(MenuAction::Restart)),
    entry("Options", true, EntryKind::Action(MenuAction::Options)),
    entry("Quit", true, EntryKind::Action(MenuAction::Quit)),
];

// Scaling is listed but not offered yet: the core always renders at the
// panel's native size.
pub const OPTION_ENTRIES: [MenuEntry; 5] = [
    entry("Volume", true, EntryKind::Volume),
    entry("Brightness", true, EntryKind::Brightness),
    entry("Palette", true, EntryKind::Palette),
    entry("Scaling", false, EntryKind::Scaling),
    entry("State Slot", true, EntryKind::StateSlot),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    Running,
    PauseMenu { options: bool },
    /// Per-entry context menu. No entry opens it yet.
    ContextMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuInput {
    Pause,
    Confirm,
    Cancel,
    Up,
    Down,
    Left,
    Right,
}

/// What the application has to do after an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    None,
    /// Snapshot the frame and stop the renderer.
    Pause,
    /// Back to the game without touching emulation state.
    Resume,
    SaveAndContinue,
    LoadGame,
    Restart,
    Quit,
    /// Left the options submenu; settings may have changed.
    CloseOptions,
    Adjust { kind: EntryKind, delta: i32 },
}

#[derive(Debug, Clone)]
pub struct Menu {
    state: MenuState,
    selection: usize,
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}

impl Menu {
    pub fn new() -> Self {
        Self {
            state: MenuState::Running,
            selection: 0,
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == MenuState::Running
    }

    pub fn in_options(&self) -> bool {
        self.state == MenuState::PauseMenu { options: true }
    }

    pub fn selection(&self) -> usize {
        self.selection
    }

    /// Table shown in the current state.
    pub fn entries(&self) -> &'static [MenuEntry] {
        if self.in_options() {
            &OPTION_ENTRIES
        } else {
            &PAUSE_ENTRIES
        }
    }

    pub fn selected_entry(&self) -> MenuEntry {
        let entries = self.entries();
        entries[self.selection % entries.len()]
    }

    pub fn handle(&mut self, input: MenuInput) -> MenuCommand {
        match self.state {
            MenuState::Running => match input {
                MenuInput::Pause => {
                    self.state = MenuState::PauseMenu { options: false };
                    MenuCommand::Pause
                }
                _ => MenuCommand::None,
            },
            MenuState::PauseMenu { options } => self.handle_pause_menu(options, input),
            MenuState::ContextMenu => match input {
                MenuInput::Cancel | MenuInput::Pause => {
                    self.state = MenuState::Running;
                    MenuCommand::Resume
                }
                _ => MenuCommand::None,
            },
        }
    }

    fn handle_pause_menu(&mut self, options: bool, input: MenuInput) -> MenuCommand {
        match input {
            MenuInput::Up => {
                self.selection = wrap_prev(self.selection, self.entries().len());
                MenuCommand::None
            }
            MenuInput::Down => {
                self.selection = wrap_next(self.selection, self.entries().len());
                MenuCommand::None
            }
            MenuInput::Cancel | MenuInput::Pause => {
                if options {
                    self.state = MenuState::PauseMenu { options: false };
                    MenuCommand::CloseOptions
                } else {
                    self.state = MenuState::Running;
                    MenuCommand::Resume
                }
            }
            MenuInput::Confirm if options => self.adjust_selected(1),
            MenuInput::Left if options => self.adjust_selected(-1),
            MenuInput::Right if options => self.adjust_selected(1),
            MenuInput::Confirm => self.confirm(),
            MenuInput::Left | MenuInput::Right => MenuCommand::None,
        }
    }

    fn adjust_selected(&self, delta: i32) -> MenuCommand {
        let entry = self.selected_entry();
        if !entry.enabled {
            return MenuCommand::None;
        }
        MenuCommand::Adjust {
            kind: entry.kind,
            delta,
        }
    }

    fn confirm(&mut self) -> MenuCommand {
        let entry = self.selected_entry();
        if !entry.enabled {
            return MenuCommand::None;
        }
        let EntryKind::Action(action) = entry.kind else {
            return MenuCommand::None;
        };
        match action {
            MenuAction::Options => {
                self.state = MenuState::PauseMenu { options: true };
                MenuCommand::None
            }
            MenuAction::SaveAndContinue => self.back_to_game(MenuCommand::SaveAndContinue),
            MenuAction::LoadGame => self.back_to_game(MenuCommand::LoadGame),
            MenuAction::Restart => self.back_to_game(MenuCommand::Restart),
            MenuAction::Quit => self.back_to_game(MenuCommand::Quit),
        }
    }

    fn back_to_game(&mut self, command: MenuCommand) -> MenuCommand {
        self.state = MenuState::Running;
        command
    }
}

fn wrap_next(index: usize, len: usize) -> usize {
    if index + 1 >= len {
        0
    } else {
        index + 1
    }
}

fn wrap_prev(index: usize, len: usize) -> usize {
    if index == 0 {
        len.saturating_sub(1)
    } else {
        index - 1
    }
}
