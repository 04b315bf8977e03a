use crate::error::WmError;
use crate::keys::{Keysym, ignored_modifiers};
use std::collections::HashMap;
use std::process::Command;
use std::thread;
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::{
    ChangeWindowAttributesAux, ConfigureWindowAux, ConnectionExt, EventMask, GrabMode,
    InputFocus, Keycode, ModMask, Window,
};
use x11rb::rust_connection::RustConnection;

/// What the manager reacts to. Everything else the server sends is dropped
/// inside the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendEvent {
    KeyPress { modifiers: u16, keysym: Keysym },
    WindowAppeared(Window),
    WindowDestroyed(Window),
}

/// The display server as seen by the manager.
///
/// Commands are fire-and-forget: a handle that vanished in the meantime is
/// not an error worth surfacing, so implementations log and swallow
/// failures. Only [`DisplayBackend::next_event`] can fail, and only when the
/// connection itself is gone.
pub trait DisplayBackend {
    /// Blocks until the next event the manager cares about.
    fn next_event(&self) -> Result<BackendEvent, WmError>;

    fn place(&self, window: Window, x: i32, y: i32, width: i32, height: i32);
    fn show(&self, window: Window);
    fn hide(&self, window: Window);
    fn destroy(&self, window: Window);
    fn set_focus(&self, window: Window);

    fn window_is_live(&self, window: Window) -> bool;
    fn screen_dimensions(&self) -> (u16, u16);

    /// Launches `command` without tying it to the manager's lifetime.
    fn spawn_process(&self, command: &str);
}

pub struct X11Backend {
    conn: RustConnection,
    root: Window,
    width: u16,
    height: u16,
    keycode_to_keysym: HashMap<Keycode, Keysym>,
}

impl X11Backend {
    /// Connects to the default display and claims substructure redirection on
    /// the root window.
    pub fn connect() -> Result<Self, WmError> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let (width, height) = (screen.width_in_pixels, screen.height_in_pixels);

        log::info!("Connected. Screen: {}x{}", width, height);

        let change = ChangeWindowAttributesAux::new()
            .event_mask(EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY);
        if conn.change_window_attributes(root, &change)?.check().is_err() {
            return Err(WmError::AnotherWmRunning);
        }

        let keycode_to_keysym = Self::load_keymap(&conn)?;

        Ok(Self {
            conn,
            root,
            width,
            height,
            keycode_to_keysym,
        })
    }

    /// Unshifted keysym (column 0) of every keycode.
    fn load_keymap(conn: &RustConnection) -> Result<HashMap<Keycode, Keysym>, WmError> {
        let min_keycode = conn.setup().min_keycode;
        let max_keycode = conn.setup().max_keycode;
        let mapping = conn
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)?
            .reply()?;
        let per_keycode = usize::from(mapping.keysyms_per_keycode);

        let mut table = HashMap::new();
        if per_keycode == 0 {
            return Ok(table);
        }
        for (code, syms) in (min_keycode..=max_keycode).zip(mapping.keysyms.chunks(per_keycode)) {
            if let Some(&sym) = syms.first() {
                if sym != 0 {
                    table.insert(code, sym);
                }
            }
        }
        Ok(table)
    }

    fn keycode_for(&self, keysym: Keysym) -> Option<Keycode> {
        self.keycode_to_keysym
            .iter()
            .filter(|&(_, &sym)| sym == keysym)
            .map(|(&code, _)| code)
            .min()
    }

    /// Grabs every `(mask, keysym)` on the root window, once per lock
    /// combination.
    pub fn grab_keys(&self, grabs: impl IntoIterator<Item = (u16, Keysym)>) -> Result<usize, WmError> {
        let mut grabbed = 0;
        for (mask, keysym) in grabs {
            let Some(code) = self.keycode_for(keysym) else {
                log::warn!("Could not find keycode for keysym: {:#x}", keysym);
                continue;
            };

            for ignored in ignored_modifiers() {
                self.conn.grab_key(
                    true,
                    self.root,
                    ModMask::from(mask | ignored),
                    code,
                    GrabMode::ASYNC,
                    GrabMode::ASYNC,
                )?;
            }
            grabbed += 1;
        }
        self.conn.flush()?;
        Ok(grabbed)
    }

    fn swallow<T, E: std::fmt::Display>(what: &str, window: Window, result: Result<T, E>) {
        if let Err(e) = result {
            log::debug!("{} {:#x} failed: {}", what, window, e);
        }
    }
}

impl DisplayBackend for X11Backend {
    fn next_event(&self) -> Result<BackendEvent, WmError> {
        loop {
            self.conn.flush()?;
            match self.conn.wait_for_event()? {
                Event::KeyPress(evt) => {
                    if let Some(&keysym) = self.keycode_to_keysym.get(&evt.detail) {
                        return Ok(BackendEvent::KeyPress {
                            modifiers: u16::from(evt.state),
                            keysym,
                        });
                    }
                }
                Event::MapRequest(evt) => return Ok(BackendEvent::WindowAppeared(evt.window)),
                Event::DestroyNotify(evt) => {
                    return Ok(BackendEvent::WindowDestroyed(evt.window));
                }
                Event::Error(e) => log::debug!("X11 error: {:?}", e),
                _ => {}
            }
        }
    }

    fn place(&self, window: Window, x: i32, y: i32, width: i32, height: i32) {
        let changes = ConfigureWindowAux::new()
            .x(x)
            .y(y)
            .width(width.max(1) as u32)
            .height(height.max(1) as u32);
        Self::swallow("configure", window, self.conn.configure_window(window, &changes));
    }

    fn show(&self, window: Window) {
        Self::swallow("map", window, self.conn.map_window(window));
    }

    fn hide(&self, window: Window) {
        Self::swallow("unmap", window, self.conn.unmap_window(window));
    }

    fn destroy(&self, window: Window) {
        Self::swallow("destroy", window, self.conn.destroy_window(window));
    }

    fn set_focus(&self, window: Window) {
        Self::swallow(
            "focus",
            window,
            self.conn.set_input_focus(InputFocus::PARENT, window, 0u32),
        );
    }

    fn window_is_live(&self, window: Window) -> bool {
        match self.conn.get_window_attributes(window) {
            Ok(cookie) => cookie.reply().is_ok(),
            Err(_) => false,
        }
    }

    fn screen_dimensions(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn spawn_process(&self, command: &str) {
        spawn(command);
    }
}

/// Runs `command` in the background of a throwaway shell. The program ends
/// up reparented to init; the shell itself is reaped off the event loop.
pub fn spawn(command: &str) {
    match Command::new("sh")
        .arg("-c")
        .arg(format!("{} &", command))
        .spawn()
    {
        Ok(mut child) => {
            log::info!("Spawned {}", command);
            thread::spawn(move || child.wait());
        }
        Err(e) => log::error!("Failed to spawn {}: {}", command, e),
    }
}
