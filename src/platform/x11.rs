//! X11 window enumeration, focus and XTEST keyboard input

use anyhow::{Context, Result};
use tracing::{debug, trace};

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ClientMessageEvent, ConfigureWindowAux, ConnectionExt as _, EventMask,
    Keycode, Keysym, MapState, StackMode, Window, KEY_PRESS_EVENT, KEY_RELEASE_EVENT,
};
use x11rb::protocol::xtest::ConnectionExt as _;
use x11rb::rust_connection::RustConnection;
use x11rb::CURRENT_TIME;

use super::{Key, KeyMode, WindowHandle, WindowId, WindowSystem};

/// Reparenting window managers put the client one or two levels below
/// their frame window.
const MAX_TREE_DEPTH: usize = 3;

/// Longest title read from a window property, in 32-bit units
const TITLE_LENGTH: u32 = 256;

/// Window list built by walking the X11 window tree from the root
pub struct X11Windows {
    conn: RustConnection,
    root: Window,
    net_wm_name: Atom,
    net_active_window: Atom,
    utf8_string: Atom,
    keyboard: KeyboardMap,
}

/// Keysym table of the server's keyboard, as returned by GetKeyboardMapping
#[derive(Debug, Clone)]
struct KeyboardMap {
    min_keycode: Keycode,
    keysyms_per_keycode: u8,
    keysyms: Vec<Keysym>,
}

impl KeyboardMap {
    /// Keycode producing `keysym` and whether Shift is needed for it.
    /// Only the unshifted and shifted columns are searched.
    fn keycode(&self, keysym: Keysym) -> Option<(Keycode, bool)> {
        let per = usize::from(self.keysyms_per_keycode.max(1));
        self.keysyms
            .iter()
            .enumerate()
            .find(|(i, sym)| **sym == keysym && i % per < 2)
            .and_then(|(i, _)| {
                let code = u8::try_from(usize::from(self.min_keycode) + i / per).ok()?;
                Some((code, i % per == 1))
            })
    }

    /// Keycodes to hold for one key, modifiers first
    fn keycodes(&self, key: Key) -> Result<Vec<Keycode>> {
        let (code, shifted) = self
            .keycode(keysym(key))
            .ok_or_else(|| anyhow::anyhow!("No keycode for key '{}' in the keyboard map", key))?;
        match self.keycode(keysym(Key::Shift)) {
            Some((shift, _)) if shifted => Ok(vec![shift, code]),
            _ => Ok(vec![code]),
        }
    }
}

fn intern(conn: &RustConnection, name: &[u8]) -> Result<Atom> {
    Ok(conn.intern_atom(false, name)?.reply()?.atom)
}

impl X11Windows {
    /// Connect to the display named by `$DISPLAY`
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("Failed to open X11 display")?;
        let setup = conn.setup();
        let root = setup.roots[screen_num].root;
        let min_keycode = setup.min_keycode;
        let max_keycode = setup.max_keycode;

        let mapping = conn
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)?
            .reply()
            .context("Failed to read keyboard mapping")?;

        Ok(Self {
            net_wm_name: intern(&conn, b"_NET_WM_NAME")?,
            net_active_window: intern(&conn, b"_NET_ACTIVE_WINDOW")?,
            utf8_string: intern(&conn, b"UTF8_STRING")?,
            root,
            keyboard: KeyboardMap {
                min_keycode,
                keysyms_per_keycode: mapping.keysyms_per_keycode,
                keysyms: mapping.keysyms,
            },
            conn,
        })
    }

    fn title(&self, window: Window) -> Option<String> {
        let utf8 = self
            .conn
            .get_property(false, window, self.net_wm_name, self.utf8_string, 0, TITLE_LENGTH)
            .ok()?
            .reply()
            .ok()?;
        if !utf8.value.is_empty() {
            return Some(String::from_utf8_lossy(&utf8.value).into_owned());
        }

        let legacy = self
            .conn
            .get_property(false, window, AtomEnum::WM_NAME, AtomEnum::STRING, 0, TITLE_LENGTH)
            .ok()?
            .reply()
            .ok()?;
        if legacy.value.is_empty() {
            None
        } else {
            Some(legacy.value.iter().map(|&b| b as char).collect())
        }
    }

    fn is_viewable(&self, window: Window) -> bool {
        self.conn
            .get_window_attributes(window)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .map(|attrs| attrs.map_state == MapState::VIEWABLE)
            .unwrap_or(false)
    }

    /// Collect the first titled window on every branch below `parent`.
    /// Windows destroyed while walking are skipped.
    fn walk(&self, parent: Window, depth: usize, out: &mut Vec<WindowHandle>) {
        let children = match self.conn.query_tree(parent).ok().and_then(|c| c.reply().ok()) {
            Some(tree) => tree.children,
            None => return,
        };

        for child in children {
            if !self.is_viewable(child) {
                continue;
            }
            match self.title(child) {
                Some(title) => {
                    trace!("X11 window {:#x}: {}", child, title);
                    out.push(WindowHandle::new(WindowId(u64::from(child)), title));
                }
                None if depth < MAX_TREE_DEPTH => self.walk(child, depth + 1, out),
                None => {}
            }
        }
    }

    fn fake_key(&self, code: Keycode, release: bool) -> Result<()> {
        let event = if release {
            KEY_RELEASE_EVENT
        } else {
            KEY_PRESS_EVENT
        };
        self.conn
            .xtest_fake_input(event, code, CURRENT_TIME, self.root, 0, 0, 0)?;
        Ok(())
    }
}

impl WindowSystem for X11Windows {
    fn name(&self) -> &'static str {
        "x11"
    }

    fn list_windows(&self) -> Result<Vec<WindowHandle>> {
        let mut windows = Vec::new();
        self.walk(self.root, 0, &mut windows);
        Ok(windows)
    }

    fn raise(&self, window: &WindowHandle) -> Result<()> {
        let xid = u32::try_from(window.id.0).context("Window id is not an X11 window")?;

        self.conn
            .configure_window(xid, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))?;

        // Ask the window manager to activate it; source indication 2 = pager
        let activate = ClientMessageEvent::new(
            32,
            xid,
            self.net_active_window,
            [2u32, CURRENT_TIME, 0, 0, 0],
        );
        self.conn.send_event(
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            activate,
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn send_keys(&self, window: &WindowHandle, keys: &[Key], mode: KeyMode) -> Result<()> {
        // Resolve everything first so an unknown key sends nothing at all
        let strokes = keys
            .iter()
            .map(|k| self.keyboard.keycodes(*k))
            .collect::<Result<Vec<Vec<Keycode>>>>()?;

        match mode {
            KeyMode::Sequence => {
                for stroke in &strokes {
                    for code in stroke {
                        self.fake_key(*code, false)?;
                    }
                    for code in stroke.iter().rev() {
                        self.fake_key(*code, true)?;
                    }
                }
            }
            KeyMode::Together => {
                let all: Vec<Keycode> = strokes.into_iter().flatten().collect();
                for code in &all {
                    self.fake_key(*code, false)?;
                }
                for code in all.iter().rev() {
                    self.fake_key(*code, true)?;
                }
            }
        }

        self.conn.flush()?;
        debug!("Sent {} keys to window {}", keys.len(), window.id);
        Ok(())
    }
}

/// X11 keysym for a key
fn keysym(key: Key) -> Keysym {
    match key {
        Key::Char(c) => {
            let cp = c as u32;
            if (0x20..=0x7e).contains(&cp) || (0xa0..=0xff).contains(&cp) {
                cp
            } else {
                0x0100_0000 | cp
            }
        }
        Key::Return => 0xff0d,
        Key::Escape => 0xff1b,
        Key::Tab => 0xff09,
        Key::Backspace => 0xff08,
        Key::Space => 0x0020,
        Key::Shift => 0xffe1,
        Key::Control => 0xffe3,
        Key::Alt => 0xffe9,
        // ISO_Level3_Shift
        Key::AltGr => 0xfe03,
        Key::Function(n) => 0xffbe + u32::from(n.clamp(1, 12)) - 1,
        Key::Left => 0xff51,
        Key::Up => 0xff52,
        Key::Right => 0xff53,
        Key::Down => 0xff54,
    }
}
