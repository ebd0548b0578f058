use anyhow::{Context, Result};
use log::debug;
use std::io;
use std::mem;
use std::os::unix::io::RawFd;
use x11::xlib;

use crate::config::Config;
use crate::grab;
use crate::keymap::Keymap;
use crate::signals;
use crate::spawn;
use crate::x::Display;

pub struct Daemon {
    display: Display,
    keymap: Keymap,
    config: Config,
    wake_fd: RawFd,
}

impl Daemon {
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        Display::set_warn_failures(config.warn_failures);

        let display = Display::open()?;
        let keymap = Keymap::new(&display)?;

        grab::setup(&display, &keymap, &config);
        // sync surfaces grab errors while the permissive handler is installed
        display.sync();
        display.set_runtime_error_handler();

        let wake_fd = signals::install()?;

        Ok(Self {
            display,
            keymap,
            config,
            wake_fd,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        while signals::running() {
            while unsafe { xlib::XPending(self.display.raw()) } > 0 {
                let mut event: xlib::XEvent = unsafe { mem::zeroed() };
                unsafe {
                    xlib::XNextEvent(self.display.raw(), &mut event);
                }

                // a shutdown delivered mid-drain stops before queued events
                if !signals::running() {
                    return Ok(());
                }

                if event.get_type() == xlib::KeyPress {
                    self.handle_key_press(xlib::XKeyEvent::from(event));
                }
            }

            if !signals::running() {
                break;
            }

            self.wait_for_input()?;
        }

        Ok(())
    }

    fn handle_key_press(&self, event: xlib::XKeyEvent) {
        let keysym = self.keymap.resolve(event.keycode);
        debug!(
            "Key press: keycode {}, state {:#x}, keysym {:#x}",
            event.keycode, event.state, keysym
        );

        for bind in self.config.matches(event.state, keysym) {
            spawn::spawn(&bind.command, self.display.fd(), self.config.warn_failures);
        }
    }

    fn wait_for_input(&self) -> Result<()> {
        let mut fds = [
            libc::pollfd {
                fd: self.display.fd(),
                events: libc::POLLIN,
                revents: 0,
            },
            libc::pollfd {
                fd: self.wake_fd,
                events: libc::POLLIN,
                revents: 0,
            },
        ];

        let ret = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, -1) };
        if ret < 0 {
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err).context("Failed to wait for events");
            }
        }

        Ok(())
    }
}
