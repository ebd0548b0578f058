use anyhow::{anyhow, Result};
use std::os::unix::io::RawFd;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use x11::xlib;

static WARN_FAILURES: AtomicBool = AtomicBool::new(true);

pub struct Display {
    raw: *mut xlib::Display,
}

impl Display {
    pub fn open() -> Result<Self> {
        // null picks up $DISPLAY
        let raw = unsafe { xlib::XOpenDisplay(ptr::null()) };

        if raw.is_null() {
            return Err(anyhow!("Failed to open X display"));
        }

        unsafe {
            xlib::XSetErrorHandler(Some(Self::setup_error_handler));
        }

        Ok(Self { raw })
    }

    pub fn raw(&self) -> *mut xlib::Display {
        self.raw
    }

    pub fn fd(&self) -> RawFd {
        unsafe { xlib::XConnectionNumber(self.raw) }
    }

    pub fn screen_count(&self) -> i32 {
        unsafe { xlib::XScreenCount(self.raw) }
    }

    pub fn root(&self, screen: i32) -> xlib::Window {
        unsafe { xlib::XRootWindow(self.raw, screen) }
    }

    pub fn sync(&self) {
        unsafe {
            xlib::XSync(self.raw, xlib::False);
        }
    }

    pub fn set_warn_failures(on: bool) {
        WARN_FAILURES.store(on, Ordering::SeqCst);
    }

    pub fn set_runtime_error_handler(&self) {
        unsafe {
            xlib::XSetErrorHandler(Some(Self::runtime_error_handler));
        }
    }

    // setup is best effort: a denied grab must not take the daemon down
    unsafe extern "C" fn setup_error_handler(
        _: *mut xlib::Display,
        e: *mut xlib::XErrorEvent,
    ) -> i32 {
        if WARN_FAILURES.load(Ordering::SeqCst) {
            log::warn!(
                "X11 error during setup: code {}, request {}",
                (*e).error_code,
                (*e).request_code
            );
        }
        0
    }

    unsafe extern "C" fn runtime_error_handler(
        _: *mut xlib::Display,
        e: *mut xlib::XErrorEvent,
    ) -> i32 {
        log::error!(
            "X11 error: serial {:#x}, resource {}, code {}",
            (*e).serial,
            (*e).resourceid,
            (*e).error_code
        );
        crate::signals::request_shutdown();
        0
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        unsafe {
            xlib::XCloseDisplay(self.raw);
        }
    }
}
