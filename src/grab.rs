use log::{info, warn};
use x11::xlib;

use crate::config::Config;
use crate::keymap::Keymap;
use crate::x::Display;

pub fn setup(display: &Display, keymap: &Keymap, config: &Config) {
    let mut grabbed = 0;

    for screen in 0..display.screen_count() {
        let root = display.root(screen);

        unsafe {
            xlib::XSelectInput(display.raw(), root, xlib::KeyPressMask);

            // clear grabs left over from a previous run
            xlib::XUngrabKey(display.raw(), xlib::AnyKey as i32, xlib::AnyModifier, root);
        }

        for bind in &config.bindings {
            let keycodes = keymap.keycodes_for(bind.keysym);

            if keycodes.is_empty() {
                if config.warn_failures {
                    warn!(
                        "No keycode produces keysym {:#x} on screen {}",
                        bind.keysym, screen
                    );
                }
                continue;
            }

            for keycode in keycodes {
                unsafe {
                    xlib::XGrabKey(
                        display.raw(),
                        keycode as i32,
                        bind.mods,
                        root,
                        xlib::True,
                        xlib::GrabModeAsync,
                        xlib::GrabModeAsync,
                    );
                }
                grabbed += 1;
            }
        }
    }

    info!(
        "Grabbed {} key chords on {} screens",
        grabbed,
        display.screen_count()
    );
}
