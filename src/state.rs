use crate::backend::{BackendEvent, DisplayBackend};
use crate::config::Config;
use crate::keys::{Action, Bindings, Keysym};
use crate::layout::{self, clamp_ratio};
use crate::window_set::{Direction, WindowSet};
use crate::workspace::WorkspaceStore;
use x11rb::protocol::xproto::Window;

/// All mutable manager state. Every operation goes through `&mut self`, so
/// events are applied one at a time and no operation ever observes another
/// half-done.
pub struct WindowManager {
    workspaces: WorkspaceStore,
    bindings: Bindings,
    master_ratio: f32,
    gap: u16,
}

impl WindowManager {
    pub fn new(config: &Config) -> Self {
        Self {
            workspaces: WorkspaceStore::new(),
            bindings: Bindings::new(
                config.mod_key.mask(),
                &config.terminal,
                &config.launcher,
                config.master_ratio_step,
            ),
            master_ratio: clamp_ratio(config.master_ratio),
            gap: config.gap,
        }
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn live(&self) -> &WindowSet {
        self.workspaces.live()
    }

    pub fn current_workspace(&self) -> usize {
        self.workspaces.current()
    }

    pub fn master_ratio(&self) -> f32 {
        self.master_ratio
    }

    pub fn handle_event<B: DisplayBackend>(&mut self, backend: &B, event: BackendEvent) {
        match event {
            BackendEvent::KeyPress { modifiers, keysym } => {
                self.handle_key_press(backend, modifiers, keysym)
            }
            BackendEvent::WindowAppeared(window) => self.handle_map_request(backend, window),
            BackendEvent::WindowDestroyed(window) => self.handle_destroy_notify(backend, window),
        }
    }

    /// Runs the matching command binding, then the matching workspace
    /// binding. A key press is never consumed by the first lookup.
    fn handle_key_press<B: DisplayBackend>(&mut self, backend: &B, modifiers: u16, keysym: Keysym) {
        if let Some(action) = self.bindings.command(modifiers, keysym).cloned() {
            self.run(backend, action);
        }
        if let Some(action) = self.bindings.workspace(modifiers, keysym).cloned() {
            self.run(backend, action);
        }
    }

    pub fn run<B: DisplayBackend>(&mut self, backend: &B, action: Action) {
        log::info!("Executing: {:?}", action);
        match action {
            Action::Spawn(cmd) => backend.spawn_process(&cmd),
            Action::AdjustMaster(delta) => self.adjust_master(backend, delta),
            Action::FocusNext => self.cycle_focus(backend, Direction::Forward),
            Action::FocusPrev => self.cycle_focus(backend, Direction::Backward),
            Action::CloseFocused => self.kill_focused_window(backend),
            Action::Swap(dir) => self.move_focused_window(backend, dir),
            Action::SelectWorkspace(i) => self.switch_workspace(backend, i),
            Action::SendToWorkspace(i) => self.move_focused_to_workspace(backend, i),
        }
    }

    pub fn handle_map_request<B: DisplayBackend>(&mut self, backend: &B, window: Window) {
        match self.workspaces.workspace_of(window) {
            Some(ws) if ws == self.workspaces.current() => backend.show(window),
            Some(ws) => log::debug!("{:#x} already managed on workspace {}", window, ws + 1),
            None => {
                backend.show(window);
                self.workspaces.live_mut().append(window);
                self.refresh(backend);
            }
        }
    }

    /// Only the live set is searched; a destroyed window parked on another
    /// workspace is dropped when that workspace is next shown.
    pub fn handle_destroy_notify<B: DisplayBackend>(&mut self, backend: &B, window: Window) {
        if self.workspaces.live_mut().remove(window) {
            self.refresh(backend);
        }
    }

    pub fn cycle_focus<B: DisplayBackend>(&mut self, backend: &B, dir: Direction) {
        let live = self.workspaces.live_mut();
        if live.is_empty() {
            return;
        }
        match dir {
            Direction::Forward => live.focus_next(),
            Direction::Backward => live.focus_prev(),
        }
        self.focus_current(backend);
    }

    pub fn move_focused_window<B: DisplayBackend>(&mut self, backend: &B, dir: Direction) {
        if self.workspaces.live().len() < 2 {
            return;
        }
        self.workspaces.live_mut().swap_with_adjacent(dir);
        self.refresh(backend);
    }

    pub fn kill_focused_window<B: DisplayBackend>(&mut self, backend: &B) {
        if let Some(window) = self.workspaces.live().focused() {
            backend.destroy(window);
            self.workspaces.live_mut().remove(window);
            self.refresh(backend);
        }
    }

    pub fn adjust_master<B: DisplayBackend>(&mut self, backend: &B, delta: f32) {
        self.master_ratio = clamp_ratio(self.master_ratio + delta);
        self.refresh(backend);
    }

    pub fn switch_workspace<B: DisplayBackend>(&mut self, backend: &B, index: usize) {
        let old = self.workspaces.current();
        if !self.workspaces.swap_live(index) {
            return;
        }

        if let Some(stored) = self.workspaces.stored(old) {
            for &window in stored.clients() {
                if backend.window_is_live(window) {
                    backend.hide(window);
                } else {
                    log::debug!("Skipping hide of vanished window {:#x}", window);
                }
            }
        }

        let clients = self.workspaces.live().clients().to_vec();
        for window in clients {
            if backend.window_is_live(window) {
                backend.show(window);
            } else {
                log::debug!("Dropping vanished window {:#x}", window);
                self.workspaces.live_mut().remove(window);
            }
        }

        log::info!("Switched to workspace {}", index + 1);
        self.refresh(backend);
    }

    pub fn move_focused_to_workspace<B: DisplayBackend>(&mut self, backend: &B, index: usize) {
        if let Some(window) = self.workspaces.live().focused() {
            self.move_window_to_workspace(backend, window, index);
        }
    }

    /// Parks `window` on workspace `index`. Sending to the current
    /// workspace, to an unknown index, or sending a dead window is ignored.
    pub fn move_window_to_workspace<B: DisplayBackend>(
        &mut self,
        backend: &B,
        window: Window,
        index: usize,
    ) {
        if index == self.workspaces.current() || !backend.window_is_live(window) {
            return;
        }
        let Some(target) = self.workspaces.stored_mut(index) else {
            return;
        };

        backend.hide(window);
        target.append(window);
        self.workspaces.live_mut().remove(window);
        log::info!("Moved {:#x} to workspace {}", window, index + 1);
        self.refresh(backend);
    }

    fn focus_current<B: DisplayBackend>(&self, backend: &B) {
        if let Some(window) = self.workspaces.live().focused() {
            backend.set_focus(window);
        }
    }

    /// Lays out the live set and hands focus to its focused client.
    fn refresh<B: DisplayBackend>(&self, backend: &B) {
        let (width, height) = backend.screen_dimensions();
        let placements = layout::tile(
            self.workspaces.live().clients(),
            width,
            height,
            self.gap,
            self.master_ratio,
        );
        for p in placements {
            backend.place(p.window, p.x, p.y, p.width, p.height);
        }
        self.focus_current(backend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WmError;
    use crate::keys::{XK_1, XK_J, XK_K, XK_L, XK_Q, XK_RETURN};
    use std::cell::RefCell;
    use std::collections::HashSet;

    const SUPER: u16 = 1 << 6;
    const SHIFT: u16 = 1;

    #[derive(Clone, Debug, PartialEq)]
    enum Call {
        Place(Window, i32, i32, i32, i32),
        Show(Window),
        Hide(Window),
        Destroy(Window),
        Focus(Window),
        Spawn(String),
    }

    /// Records every command; windows count as live until `kill` is called.
    #[derive(Default)]
    struct RecorderBackend {
        calls: RefCell<Vec<Call>>,
        dead: RefCell<HashSet<Window>>,
    }

    impl RecorderBackend {
        fn kill(&self, window: Window) {
            self.dead.borrow_mut().insert(window);
        }

        fn take(&self) -> Vec<Call> {
            self.calls.take()
        }

        fn placements(&self) -> Vec<Call> {
            self.take()
                .into_iter()
                .filter(|c| matches!(c, Call::Place(..)))
                .collect()
        }

        fn record(&self, call: Call) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl DisplayBackend for RecorderBackend {
        fn next_event(&self) -> Result<BackendEvent, WmError> {
            Err(WmError::AnotherWmRunning)
        }

        fn place(&self, window: Window, x: i32, y: i32, width: i32, height: i32) {
            self.record(Call::Place(window, x, y, width, height));
        }

        fn show(&self, window: Window) {
            self.record(Call::Show(window));
        }

        fn hide(&self, window: Window) {
            self.record(Call::Hide(window));
        }

        fn destroy(&self, window: Window) {
            self.kill(window);
            self.record(Call::Destroy(window));
        }

        fn set_focus(&self, window: Window) {
            self.record(Call::Focus(window));
        }

        fn window_is_live(&self, window: Window) -> bool {
            !self.dead.borrow().contains(&window)
        }

        fn screen_dimensions(&self) -> (u16, u16) {
            (1000, 800)
        }

        fn spawn_process(&self, command: &str) {
            self.record(Call::Spawn(command.to_string()));
        }
    }

    fn setup(windows: &[Window]) -> (WindowManager, RecorderBackend) {
        let mut wm = WindowManager::new(&Config::default());
        let backend = RecorderBackend::default();
        for &w in windows {
            wm.handle_event(&backend, BackendEvent::WindowAppeared(w));
        }
        backend.take();
        (wm, backend)
    }

    fn key(wm: &mut WindowManager, backend: &RecorderBackend, modifiers: u16, keysym: Keysym) {
        wm.handle_event(backend, BackendEvent::KeyPress { modifiers, keysym });
    }

    #[test]
    fn mapped_window_is_shown_focused_and_tiled() {
        let (mut wm, backend) = setup(&[]);
        wm.handle_event(&backend, BackendEvent::WindowAppeared(0xa));
        assert_eq!(
            backend.take(),
            vec![
                Call::Show(0xa),
                Call::Place(0xa, 10, 10, 980, 780),
                Call::Focus(0xa),
            ]
        );
        assert_eq!(wm.live().focused(), Some(0xa));
    }

    #[test]
    fn three_windows_tile_master_stack() {
        let (mut wm, backend) = setup(&[0xa, 0xb]);
        wm.handle_event(&backend, BackendEvent::WindowAppeared(0xc));
        assert_eq!(
            backend.placements(),
            vec![
                Call::Place(0xa, 10, 10, 588, 780),
                Call::Place(0xb, 608, 10, 382, 385),
                Call::Place(0xc, 608, 405, 382, 385),
            ]
        );
    }

    #[test]
    fn repeated_map_request_is_not_appended_twice() {
        let (mut wm, backend) = setup(&[1, 2]);
        wm.handle_event(&backend, BackendEvent::WindowAppeared(1));
        assert_eq!(wm.live().clients(), &[1, 2]);
        assert_eq!(backend.take(), vec![Call::Show(1)]);
    }

    #[test]
    fn destroy_removes_from_live_set_and_retiles() {
        let (mut wm, backend) = setup(&[1, 2, 3]);
        wm.handle_event(&backend, BackendEvent::WindowDestroyed(2));
        assert_eq!(wm.live().clients(), &[1, 3]);
        assert_eq!(backend.placements().len(), 2);

        wm.handle_event(&backend, BackendEvent::WindowDestroyed(2));
        assert!(backend.take().is_empty());
    }

    #[test]
    fn focus_keys_move_cursor_without_retiling() {
        let (mut wm, backend) = setup(&[1, 2, 3]);
        key(&mut wm, &backend, SUPER, XK_J);
        assert_eq!(backend.take(), vec![Call::Focus(1)]);
        key(&mut wm, &backend, SUPER, XK_K);
        assert_eq!(backend.take(), vec![Call::Focus(3)]);
        assert_eq!(wm.live().clients(), &[1, 2, 3]);
    }

    #[test]
    fn focus_on_empty_workspace_does_nothing() {
        let (mut wm, backend) = setup(&[]);
        key(&mut wm, &backend, SUPER, XK_J);
        key(&mut wm, &backend, SUPER, XK_Q);
        key(&mut wm, &backend, SUPER | SHIFT, XK_K);
        assert!(backend.take().is_empty());
    }

    #[test]
    fn swap_keys_reorder_and_keep_focus_on_moved_window() {
        let (mut wm, backend) = setup(&[1, 2, 3]);
        key(&mut wm, &backend, SUPER | SHIFT, XK_K);
        assert_eq!(wm.live().clients(), &[1, 3, 2]);
        assert_eq!(wm.live().focused(), Some(3));
        key(&mut wm, &backend, SUPER | SHIFT, XK_J);
        assert_eq!(wm.live().clients(), &[1, 2, 3]);
        assert_eq!(wm.live().focused(), Some(3));
    }

    #[test]
    fn close_destroys_focused_and_removes_it() {
        let (mut wm, backend) = setup(&[1, 2, 3]);
        key(&mut wm, &backend, SUPER, XK_Q);
        assert_eq!(backend.take()[0], Call::Destroy(3));
        assert_eq!(wm.live().clients(), &[1, 2]);
        assert_eq!(wm.live().focused(), Some(2));

        // The server's destroy notification arrives afterwards.
        wm.handle_event(&backend, BackendEvent::WindowDestroyed(3));
        assert!(backend.take().is_empty());
    }

    #[test]
    fn master_ratio_steps_and_clamps() {
        let (mut wm, backend) = setup(&[1, 2]);
        key(&mut wm, &backend, SUPER, XK_L);
        assert!((wm.master_ratio() - 0.65).abs() < 1e-4);
        assert!(!backend.placements().is_empty());

        for _ in 0..20 {
            key(&mut wm, &backend, SUPER, XK_L);
        }
        assert_eq!(wm.master_ratio(), 0.9);
        for _ in 0..40 {
            key(&mut wm, &backend, SUPER, crate::keys::XK_H);
        }
        assert_eq!(wm.master_ratio(), 0.1);
    }

    #[test]
    fn spawn_keys_launch_configured_commands() {
        let (mut wm, backend) = setup(&[]);
        key(&mut wm, &backend, SUPER, XK_RETURN);
        key(&mut wm, &backend, SUPER, crate::keys::XK_P);
        assert_eq!(
            backend.take(),
            vec![
                Call::Spawn("kitty".into()),
                Call::Spawn("dmenu_run".into())
            ]
        );
    }

    #[test]
    fn unbound_keys_are_ignored() {
        let (mut wm, backend) = setup(&[1]);
        key(&mut wm, &backend, 0, XK_J);
        key(&mut wm, &backend, SUPER, 0x0030);
        assert!(backend.take().is_empty());
    }

    #[test]
    fn switch_hides_old_and_shows_new() {
        let (mut wm, backend) = setup(&[0xe]);
        key(&mut wm, &backend, SUPER, XK_1 + 2);
        wm.handle_event(&backend, BackendEvent::WindowAppeared(0xd));
        backend.take();

        key(&mut wm, &backend, SUPER, XK_1);
        assert_eq!(wm.current_workspace(), 0);
        key(&mut wm, &backend, SUPER, XK_1 + 2);
        assert_eq!(wm.current_workspace(), 2);

        let calls = backend.take();
        assert!(calls.contains(&Call::Hide(0xe)));
        assert!(calls.contains(&Call::Show(0xd)));
        assert_eq!(calls.last(), Some(&Call::Focus(0xd)));
        assert_eq!(wm.live().clients(), &[0xd]);
        assert_eq!(wm.live().focused(), Some(0xd));
    }

    #[test]
    fn switch_to_current_is_noop() {
        let (mut wm, backend) = setup(&[1]);
        key(&mut wm, &backend, SUPER, XK_1);
        assert!(backend.take().is_empty());
        wm.switch_workspace(&backend, 9);
        assert!(backend.take().is_empty());
        assert_eq!(wm.current_workspace(), 0);
    }

    #[test]
    fn switch_restores_focus_of_each_workspace() {
        let (mut wm, backend) = setup(&[1, 2, 3]);
        key(&mut wm, &backend, SUPER, XK_J); // focus 1
        key(&mut wm, &backend, SUPER, XK_1 + 1);
        key(&mut wm, &backend, SUPER, XK_1);
        assert_eq!(wm.live().clients(), &[1, 2, 3]);
        assert_eq!(wm.live().focused(), Some(1));
    }

    #[test]
    fn switch_skips_and_drops_vanished_windows() {
        let (mut wm, backend) = setup(&[1, 2]);
        key(&mut wm, &backend, SUPER, XK_1 + 4);
        backend.take();

        // Destroyed while hidden; the notification only searches the live set.
        backend.kill(2);
        wm.handle_event(&backend, BackendEvent::WindowDestroyed(2));

        key(&mut wm, &backend, SUPER, XK_1);
        let calls = backend.take();
        assert!(calls.contains(&Call::Show(1)));
        assert!(!calls.contains(&Call::Show(2)));
        assert_eq!(wm.live().clients(), &[1]);
    }

    #[test]
    fn switch_skips_hiding_vanished_windows() {
        let (mut wm, backend) = setup(&[1, 2]);

        // Gone on the server, but its destroy notification has not arrived.
        backend.kill(2);
        key(&mut wm, &backend, SUPER, XK_1 + 1);

        let calls = backend.take();
        assert!(calls.contains(&Call::Hide(1)));
        assert!(!calls.contains(&Call::Hide(2)));
        assert_eq!(wm.current_workspace(), 1);
        assert!(wm.live().is_empty());
    }

    #[test]
    fn swap_with_single_window_does_not_retile() {
        let (mut wm, backend) = setup(&[1]);
        key(&mut wm, &backend, SUPER | SHIFT, XK_J);
        assert!(backend.take().is_empty());
        assert_eq!(wm.live().clients(), &[1]);
    }

    #[test]
    fn send_to_workspace_moves_focused_window() {
        let (mut wm, backend) = setup(&[1, 2, 3]);
        key(&mut wm, &backend, SUPER | SHIFT, XK_1 + 3);

        let calls = backend.take();
        assert_eq!(calls[0], Call::Hide(3));
        assert_eq!(wm.live().clients(), &[1, 2]);
        assert_eq!(wm.live().focused(), Some(2));

        key(&mut wm, &backend, SUPER, XK_1 + 3);
        assert_eq!(wm.live().clients(), &[3]);
        assert!(backend.take().contains(&Call::Show(3)));

        key(&mut wm, &backend, SUPER, XK_1);
        assert!(!wm.live().contains(3));
    }

    #[test]
    fn send_to_current_or_dead_window_is_noop() {
        let (mut wm, backend) = setup(&[1, 2]);
        key(&mut wm, &backend, SUPER | SHIFT, XK_1);
        assert!(backend.take().is_empty());
        assert_eq!(wm.live().clients(), &[1, 2]);

        backend.kill(2);
        key(&mut wm, &backend, SUPER | SHIFT, XK_1 + 1);
        assert!(backend.take().is_empty());
        assert_eq!(wm.live().clients(), &[1, 2]);

        wm.move_window_to_workspace(&backend, 1, 12);
        assert!(backend.take().is_empty());
    }

    #[test]
    fn send_to_empty_workspace_with_no_focus_is_noop() {
        let (mut wm, backend) = setup(&[]);
        key(&mut wm, &backend, SUPER | SHIFT, XK_1 + 1);
        assert!(backend.take().is_empty());
    }
}
