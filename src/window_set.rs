use x11rb::protocol::xproto::Window;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Ordered clients of one workspace plus the focus cursor.
///
/// Insertion order is the stacking order used by the layout: index 0 is the
/// master. `focused` is always a valid index while `clients` is non-empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WindowSet {
    clients: Vec<Window>,
    focused: usize,
}

impl WindowSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clients(&self) -> &[Window] {
        &self.clients
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn contains(&self, window: Window) -> bool {
        self.clients.contains(&window)
    }

    pub fn focused_index(&self) -> Option<usize> {
        if self.clients.is_empty() {
            None
        } else {
            Some(self.focused)
        }
    }

    pub fn focused(&self) -> Option<Window> {
        self.clients.get(self.focused).copied()
    }

    /// Adds `window` at the end and focuses it.
    pub fn append(&mut self, window: Window) {
        self.clients.push(window);
        self.focused = self.clients.len() - 1;
    }

    /// Removes `window` if present. Returns whether anything was removed.
    ///
    /// Clients before the removed one keep their index; a cursor at or past
    /// the removed index shifts one to the left.
    pub fn remove(&mut self, window: Window) -> bool {
        let Some(pos) = self.clients.iter().position(|&w| w == window) else {
            return false;
        };
        self.clients.remove(pos);

        if self.clients.is_empty() {
            self.focused = 0;
        } else if self.focused >= pos {
            self.focused = self.focused.saturating_sub(1);
        }
        true
    }

    pub fn focus_next(&mut self) {
        if !self.clients.is_empty() {
            self.focused = (self.focused + 1) % self.clients.len();
        }
    }

    pub fn focus_prev(&mut self) {
        let len = self.clients.len();
        if len > 0 {
            self.focused = (self.focused + len - 1) % len;
        }
    }

    /// Swaps the focused client with its neighbour, wrapping at both ends.
    /// The cursor follows the originally focused client.
    pub fn swap_with_adjacent(&mut self, dir: Direction) {
        let len = self.clients.len();
        if len < 2 {
            return;
        }

        let target = match dir {
            Direction::Forward => (self.focused + 1) % len,
            Direction::Backward => (self.focused + len - 1) % len,
        };
        self.clients.swap(self.focused, target);
        self.focused = target;
    }
}
