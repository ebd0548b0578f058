use anyhow::{Context, Result};
use std::io;
use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

static RUNNING: AtomicBool = AtomicBool::new(false);
static WAKE_WRITE: AtomicI32 = AtomicI32::new(-1);

pub fn running() -> bool {
    RUNNING.load(Ordering::SeqCst)
}

pub fn request_shutdown() {
    RUNNING.store(false, Ordering::SeqCst);

    let fd = WAKE_WRITE.load(Ordering::SeqCst);
    if fd >= 0 {
        let byte = [0u8];
        unsafe { libc::write(fd, byte.as_ptr() as *const libc::c_void, 1) };
    }
}

unsafe extern "C" fn handle_terminate(_: libc::c_int) {
    request_shutdown();
}

pub fn install() -> Result<RawFd> {
    let mut fds = [0 as libc::c_int; 2];
    if unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC | libc::O_NONBLOCK) } != 0 {
        return Err(io::Error::last_os_error()).context("Failed to create wake-up pipe");
    }

    WAKE_WRITE.store(fds[1], Ordering::SeqCst);
    RUNNING.store(true, Ordering::SeqCst);

    unsafe {
        libc::signal(libc::SIGCHLD, libc::SIG_IGN);
        libc::signal(libc::SIGTSTP, libc::SIG_IGN);
        libc::signal(libc::SIGTTOU, libc::SIG_IGN);
        libc::signal(libc::SIGTTIN, libc::SIG_IGN);
        libc::signal(libc::SIGHUP, libc::SIG_IGN);
        libc::signal(libc::SIGINT, handle_terminate as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handle_terminate as libc::sighandler_t);
    }

    Ok(fds[0])
}
