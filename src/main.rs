mod config;
mod daemon;
mod grab;
mod keymap;
mod signals;
mod spawn;
mod x;

use anyhow::Result;

fn main() -> Result<()> {
    env_logger::init();

    let mut daemon = daemon::Daemon::new()?;
    daemon.run()?;

    Ok(())
}
