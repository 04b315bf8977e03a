use crate::window_set::WindowSet;
use x11rb::protocol::xproto::Window;

pub const NUM_WORKSPACES: usize = 9;

pub struct Workspace {
    pub index: usize,
    pub windows: WindowSet,
}

/// The nine workspaces and the live window set.
///
/// The live set is the current workspace's set moved out of its slot; the
/// slot for `current` stays empty until the next switch moves it back.
/// Exactly one owner of every set exists at any time.
pub struct WorkspaceStore {
    workspaces: Vec<Workspace>,
    current: usize,
    live: WindowSet,
}

impl WorkspaceStore {
    pub fn new() -> Self {
        let workspaces = (0..NUM_WORKSPACES)
            .map(|index| Workspace {
                index,
                windows: WindowSet::new(),
            })
            .collect();

        Self {
            workspaces,
            current: 0,
            live: WindowSet::new(),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn live(&self) -> &WindowSet {
        &self.live
    }

    pub fn live_mut(&mut self) -> &mut WindowSet {
        &mut self.live
    }

    /// The stored set of a background workspace. The current workspace's
    /// slot is empty while its set is live, so callers wanting the current
    /// windows should use [`WorkspaceStore::live`].
    pub fn stored(&self, index: usize) -> Option<&WindowSet> {
        self.workspaces.get(index).map(|ws| &ws.windows)
    }

    pub fn stored_mut(&mut self, index: usize) -> Option<&mut WindowSet> {
        self.workspaces.get_mut(index).map(|ws| &mut ws.windows)
    }

    /// The workspace managing `window`, live or stored.
    pub fn workspace_of(&self, window: Window) -> Option<usize> {
        if self.live.contains(window) {
            return Some(self.current);
        }
        self.workspaces
            .iter()
            .find(|ws| ws.windows.contains(window))
            .map(|ws| ws.index)
    }

    /// Moves the live set back into the current slot, makes `index` current
    /// and moves its set out as the new live set.
    ///
    /// Returns `false` without touching anything when `index` is out of
    /// range or already current.
    pub fn swap_live(&mut self, index: usize) -> bool {
        if index >= NUM_WORKSPACES || index == self.current {
            return false;
        }

        self.workspaces[self.current].windows = std::mem::take(&mut self.live);
        self.current = index;
        self.live = std::mem::take(&mut self.workspaces[index].windows);
        true
    }
}
