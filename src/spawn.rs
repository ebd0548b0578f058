use log::{debug, warn};
use std::os::unix::io::RawFd;
use std::os::unix::process::CommandExt;
use std::process::Command;

pub fn spawn(command: &[String], display_fd: RawFd, warn_failures: bool) {
    let mut cmd = Command::new(&command[0]);
    cmd.args(&command[1..]);

    unsafe {
        // the child must not keep the daemon's X connection alive
        cmd.pre_exec(move || {
            libc::setsid();
            libc::close(display_fd);
            Ok(())
        });
    }

    match cmd.spawn() {
        Ok(child) => debug!("Spawned {} (pid {})", command[0], child.id()),
        Err(e) => {
            if warn_failures {
                warn!("Failed to spawn {}: {}", command[0], e);
            }
        }
    }
}
