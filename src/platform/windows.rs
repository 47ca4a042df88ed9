//! Windows-specific window enumeration and keyboard input

use anyhow::Result;
use std::mem;
use tracing::{debug, warn};

use windows::Win32::Foundation::{BOOL, HWND, LPARAM};
use windows::Win32::UI::Input::KeyboardAndMouse::*;
use windows::Win32::UI::WindowsAndMessaging::*;

use super::{Key, KeyMode, WindowHandle, WindowId, WindowSystem};

/// Win32 window list via `EnumWindows`
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Windows;

fn to_hwnd(id: WindowId) -> HWND {
    HWND(id.0 as usize as *mut std::ffi::c_void)
}

fn window_title(hwnd: HWND) -> String {
    unsafe {
        let len = GetWindowTextLengthW(hwnd);
        if len <= 0 {
            return String::new();
        }
        let mut buffer = vec![0u16; len as usize + 1];
        let copied = GetWindowTextW(hwnd, &mut buffer);
        String::from_utf16_lossy(&buffer[..copied.max(0) as usize])
    }
}

impl WindowSystem for Win32Windows {
    fn name(&self) -> &'static str {
        "win32"
    }

    fn list_windows(&self) -> Result<Vec<WindowHandle>> {
        let mut handles: Vec<HWND> = Vec::new();

        unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
            let handles = &mut *(lparam.0 as *mut Vec<HWND>);
            handles.push(hwnd);
            BOOL::from(true)
        }

        unsafe {
            EnumWindows(
                Some(enum_callback),
                LPARAM(&mut handles as *mut Vec<HWND> as isize),
            )?;
        }

        // Only visible windows, like the desktop's own task list
        let windows = handles
            .into_iter()
            .filter(|hwnd| unsafe { IsWindowVisible(*hwnd).as_bool() })
            .map(|hwnd| WindowHandle::new(WindowId(hwnd.0 as usize as u64), window_title(hwnd)))
            .collect();

        Ok(windows)
    }

    fn raise(&self, window: &WindowHandle) -> Result<()> {
        let hwnd = to_hwnd(window.id);
        unsafe {
            if !SetForegroundWindow(hwnd).as_bool() {
                warn!("SetForegroundWindow refused for window {}", window.id);
            }
            let _ = SetFocus(hwnd);
        }
        Ok(())
    }

    fn send_keys(&self, window: &WindowHandle, keys: &[Key], mode: KeyMode) -> Result<()> {
        // Resolve everything first so an unknown key sends nothing at all
        let strokes = keys
            .iter()
            .map(|k| virtual_keys(*k))
            .collect::<Result<Vec<Vec<VIRTUAL_KEY>>>>()?;

        let mut inputs = Vec::new();
        match mode {
            KeyMode::Sequence => {
                for stroke in &strokes {
                    inputs.extend(stroke.iter().map(|vk| key_input(*vk, false)));
                    inputs.extend(stroke.iter().rev().map(|vk| key_input(*vk, true)));
                }
            }
            KeyMode::Together => {
                let all: Vec<VIRTUAL_KEY> = strokes.into_iter().flatten().collect();
                inputs.extend(all.iter().map(|vk| key_input(*vk, false)));
                inputs.extend(all.iter().rev().map(|vk| key_input(*vk, true)));
            }
        }

        let sent = unsafe { SendInput(&inputs, mem::size_of::<INPUT>() as i32) };
        if sent as usize != inputs.len() {
            anyhow::bail!(
                "SendInput delivered {} of {} events to window {}",
                sent,
                inputs.len(),
                window.id
            );
        }
        debug!("Sent {} key events to window {}", sent, window.id);
        Ok(())
    }
}

fn key_input(vk: VIRTUAL_KEY, release: bool) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: vk,
                wScan: 0,
                dwFlags: if release {
                    KEYEVENTF_KEYUP
                } else {
                    KEYBD_EVENT_FLAGS(0)
                },
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

/// Virtual keys to hold for one key, modifiers first
fn virtual_keys(key: Key) -> Result<Vec<VIRTUAL_KEY>> {
    let vk = match key {
        Key::Char(c) => {
            let mut units = [0u16; 2];
            let encoded = c.encode_utf16(&mut units);
            if encoded.len() != 1 {
                anyhow::bail!("No virtual key for character '{}'", c);
            }
            let scan = unsafe { VkKeyScanW(encoded[0]) };
            if scan == -1 {
                anyhow::bail!("No virtual key for character '{}'", c);
            }
            let vk = VIRTUAL_KEY((scan & 0xff) as u16);
            let shift_state = (scan >> 8) & 0xff;
            let mut keys = Vec::new();
            if shift_state & 1 != 0 {
                keys.push(VK_SHIFT);
            }
            if shift_state & 2 != 0 {
                keys.push(VK_CONTROL);
            }
            if shift_state & 4 != 0 {
                keys.push(VK_MENU);
            }
            keys.push(vk);
            return Ok(keys);
        }
        Key::Return => VK_RETURN,
        Key::Escape => VK_ESCAPE,
        Key::Tab => VK_TAB,
        Key::Backspace => VK_BACK,
        Key::Space => VK_SPACE,
        Key::Shift => VK_SHIFT,
        Key::Control => VK_CONTROL,
        Key::Alt => VK_MENU,
        Key::AltGr => VK_RMENU,
        Key::Function(n) => VIRTUAL_KEY(VK_F1.0 + u16::from(n.clamp(1, 12)) - 1),
        Key::Up => VK_UP,
        Key::Down => VK_DOWN,
        Key::Left => VK_LEFT,
        Key::Right => VK_RIGHT,
    };
    Ok(vec![vk])
}
