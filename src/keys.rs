use crate::window_set::Direction;
use x11rb::protocol::xproto::ModMask;

pub type Keysym = u32;

pub const XK_RETURN: Keysym = 0xff0d;
pub const XK_1: Keysym = 0x0031;
pub const XK_9: Keysym = 0x0039;
pub const XK_H: Keysym = 0x0068;
pub const XK_J: Keysym = 0x006a;
pub const XK_K: Keysym = 0x006b;
pub const XK_L: Keysym = 0x006c;
pub const XK_P: Keysym = 0x0070;
pub const XK_Q: Keysym = 0x0071;

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Spawn(String),
    AdjustMaster(f32),
    FocusNext,
    FocusPrev,
    CloseFocused,
    Swap(Direction),
    SelectWorkspace(usize),
    SendToWorkspace(usize),
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyBinding {
    pub mask: u16,
    pub keysym: Keysym,
    pub action: Action,
}

/// Strips CapsLock and NumLock so bindings match with either active.
pub fn clean_mask(mask: u16) -> u16 {
    mask & !(u16::from(ModMask::M2) | u16::from(ModMask::LOCK))
}

/// Lock combinations a key grab has to cover for [`clean_mask`] to see the
/// event at all.
pub fn ignored_modifiers() -> [u16; 4] {
    [
        0,
        u16::from(ModMask::M2),
        u16::from(ModMask::LOCK),
        u16::from(ModMask::M2 | ModMask::LOCK),
    ]
}

/// The fixed key table, split into command keys and workspace keys.
///
/// Both tables are consulted for every key press.
pub struct Bindings {
    commands: Vec<KeyBinding>,
    workspaces: Vec<KeyBinding>,
}

impl Bindings {
    pub fn new(mod_mask: u16, terminal: &str, launcher: &str, ratio_step: f32) -> Self {
        let shift = u16::from(ModMask::SHIFT);
        let bind = |mask: u16, keysym: Keysym, action: Action| KeyBinding {
            mask,
            keysym,
            action,
        };

        let commands = vec![
            bind(mod_mask, XK_RETURN, Action::Spawn(terminal.to_string())),
            bind(mod_mask, XK_P, Action::Spawn(launcher.to_string())),
            bind(mod_mask, XK_H, Action::AdjustMaster(-ratio_step)),
            bind(mod_mask, XK_L, Action::AdjustMaster(ratio_step)),
            bind(mod_mask, XK_J, Action::FocusNext),
            bind(mod_mask, XK_K, Action::FocusPrev),
            bind(mod_mask, XK_Q, Action::CloseFocused),
            bind(mod_mask | shift, XK_J, Action::Swap(Direction::Forward)),
            bind(mod_mask | shift, XK_K, Action::Swap(Direction::Backward)),
        ];

        let workspaces = (XK_1..=XK_9)
            .enumerate()
            .flat_map(|(index, keysym)| {
                [
                    bind(mod_mask, keysym, Action::SelectWorkspace(index)),
                    bind(mod_mask | shift, keysym, Action::SendToWorkspace(index)),
                ]
            })
            .collect();

        Self {
            commands,
            workspaces,
        }
    }

    pub fn command(&self, mask: u16, keysym: Keysym) -> Option<&Action> {
        lookup(&self.commands, mask, keysym)
    }

    pub fn workspace(&self, mask: u16, keysym: Keysym) -> Option<&Action> {
        lookup(&self.workspaces, mask, keysym)
    }

    /// Every `(mask, keysym)` pair that needs a grab on the root window.
    pub fn grabs(&self) -> impl Iterator<Item = (u16, Keysym)> + '_ {
        self.commands
            .iter()
            .chain(&self.workspaces)
            .map(|b| (b.mask, b.keysym))
    }
}

// Exact match after cleaning: Super+Ctrl+J is unbound, not focus-next.
fn lookup(table: &[KeyBinding], mask: u16, keysym: Keysym) -> Option<&Action> {
    let mask = clean_mask(mask);
    table
        .iter()
        .find(|b| b.mask == mask && b.keysym == keysym)
        .map(|b| &b.action)
}
