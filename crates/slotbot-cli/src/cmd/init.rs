use slotbot_core::config::Config;
use slotbot_core::{io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(paths::slotbot_dir(root))?;
    let written = io::write_if_missing(&paths::config_path(root), Config::template().as_bytes())?;
    if written {
        println!("initialized {}", paths::config_path(root).display());
        println!("edit the config to add lessons, then run 'slotbot run'");
    } else {
        println!("already initialized: {}", paths::config_path(root).display());
    }
    Ok(())
}
