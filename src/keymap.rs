use anyhow::{bail, Result};
use std::mem;
use std::os::raw::{c_int, c_uint, c_void};
use x11::xlib;

use crate::x::Display;

// Standard Xkb constant (not re-exported by the x11 crate): use the core
// keyboard device.
const XKB_USE_CORE_KBD: c_uint = 0x0100;

pub struct Keymap {
    dpy: *mut xlib::Display,
    device: c_uint,
}

impl Keymap {
    pub fn new(display: &Display) -> Result<Self> {
        let dpy = display.raw();

        let mut opcode: c_int = 0;
        let mut event_base: c_int = 0;
        let mut error_base: c_int = 0;
        let mut major: c_int = 1;
        let mut minor: c_int = 0;

        let present = unsafe {
            xlib::XkbQueryExtension(
                dpy,
                &mut opcode,
                &mut event_base,
                &mut error_base,
                &mut major,
                &mut minor,
            )
        };
        if present == xlib::False {
            bail!("Xkb extension unavailable");
        }

        let device = XKB_USE_CORE_KBD;
        let mut state: xlib::XkbStateRec = unsafe { mem::zeroed() };
        if unsafe { xlib::XkbGetState(dpy, device, &mut state) } != 0 {
            bail!("Failed to query core keyboard state");
        }

        Ok(Self { dpy, device })
    }

    pub fn resolve(&self, keycode: c_uint) -> xlib::KeySym {
        // level 0: chords match the unshifted keysym, Shift lives in the
        // modifier mask
        let mut state: xlib::XkbStateRec = unsafe { mem::zeroed() };
        let group = if unsafe { xlib::XkbGetState(self.dpy, self.device, &mut state) } == 0 {
            state.group as c_int
        } else {
            0
        };

        unsafe { xlib::XkbKeycodeToKeysym(self.dpy, keycode as xlib::KeyCode, group, 0) }
    }

    pub fn keycodes_for(&self, keysym: xlib::KeySym) -> Vec<xlib::KeyCode> {
        let mut min: c_int = 0;
        let mut max: c_int = 0;
        let mut per_keycode: c_int = 0;
        let mut keycodes = Vec::new();

        unsafe {
            xlib::XDisplayKeycodes(self.dpy, &mut min, &mut max);

            let count = max - min + 1;
            let syms =
                xlib::XGetKeyboardMapping(self.dpy, min as xlib::KeyCode, count, &mut per_keycode);
            if syms.is_null() {
                return keycodes;
            }

            for kc in 0..count {
                for col in 0..per_keycode {
                    if *syms.offset((kc * per_keycode + col) as isize) == keysym {
                        keycodes.push((min + kc) as xlib::KeyCode);
                        break;
                    }
                }
            }

            xlib::XFree(syms as *mut c_void);
        }

        keycodes
    }
}
