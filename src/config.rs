use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::ffi::CString;
use std::fs;
use std::path::PathBuf;
use x11::xlib;

#[derive(Deserialize)]
struct RawConfig {
    #[serde(default = "default_warn_failures")]
    warn_failures: bool,
    binds: Vec<RawBind>,
}

#[derive(Deserialize)]
struct RawBind {
    #[serde(default)]
    mods: String,
    key: String,
    command: Vec<String>,
}

fn default_warn_failures() -> bool {
    true
}

#[derive(Clone)]
pub struct Binding {
    pub mods: u32,
    pub keysym: xlib::KeySym,
    pub command: Vec<String>,
}

pub struct Config {
    pub warn_failures: bool,
    pub bindings: Vec<Binding>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        let content = fs::read_to_string(&config_path).context("Failed to read config file")?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content).context("Failed to parse config file")?;

        let mut bindings = Vec::with_capacity(raw.binds.len());
        for bind in &raw.binds {
            if bind.command.is_empty() {
                bail!("Binding for key '{}' has an empty command", bind.key);
            }

            bindings.push(Binding {
                mods: parse_mods(&bind.mods)
                    .with_context(|| format!("Invalid binding for key '{}'", bind.key))?,
                keysym: parse_key(&bind.key)?,
                command: bind.command.clone(),
            });
        }

        Ok(Self {
            warn_failures: raw.warn_failures,
            bindings,
        })
    }

    pub fn matches(&self, state: u32, keysym: xlib::KeySym) -> Vec<&Binding> {
        self.bindings
            .iter()
            .filter(|b| b.mods == state && b.keysym == keysym)
            .collect()
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").context("Failed to get HOME directory")?;

        Ok(PathBuf::from(home).join(".config/xbindd/config.toml"))
    }

    fn create_default_config(path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        fs::write(path, DEFAULT_CONFIG).context("Failed to write default config")
    }
}

pub fn parse_mods(mods: &str) -> Result<u32> {
    let mut mask = 0;
    for part in mods.split('+').map(str::trim).filter(|p| !p.is_empty()) {
        mask |= match part.to_lowercase().as_str() {
            "alt" => xlib::Mod1Mask,
            "ctrl" => xlib::ControlMask,
            "shift" => xlib::ShiftMask,
            "super" | "win" => xlib::Mod4Mask,
            other => bail!("Unknown modifier: {}", other),
        };
    }

    Ok(mask)
}

pub fn parse_key(key: &str) -> Result<xlib::KeySym> {
    let name = CString::new(key).context("Invalid key name")?;

    match unsafe { xlib::XStringToKeysym(name.as_ptr()) } {
        0 => bail!("Unknown key: {}", key),
        keysym => Ok(keysym),
    }
}

const DEFAULT_CONFIG: &str = r###"# Key chords and the commands they launch.
#
# mods combines any of: super (or win), alt, ctrl, shift, joined with +
# like mods = "super+shift". Leave it out for bare keys such as the
# XF86 media keys.
# key is an X keysym name and is case-sensitive: Return, space, d,
# XF86AudioRaiseVolume, ...
# command is the argv of the program to launch; the first element is
# looked up in PATH.

# Log a warning when a key grab or a launched command fails.
warn_failures = true

[[binds]]
mods = "super"
key = "Return"
command = ["uxterm"]

[[binds]]
mods = "super+shift"
key = "Return"
command = ["uxterm", "-e", "ranger"]

[[binds]]
mods = "super"
key = "d"
command = ["dmenu_run", "-b"]

[[binds]]
key = "XF86AudioRaiseVolume"
command = ["pactl", "set-sink-volume", "0", "+5%"]

[[binds]]
key = "XF86AudioLowerVolume"
command = ["pactl", "set-sink-volume", "0", "-5%"]

[[binds]]
key = "XF86AudioMute"
command = ["pactl", "set-sink-mute", "0", "toggle"]

[[binds]]
key = "XF86AudioMicMute"
command = ["pactl", "set-source-mute", "1", "toggle"]

[[binds]]
mods = "super"
key = "XF86AudioMute"
command = ["pavucontrol"]

[[binds]]
key = "XF86MonBrightnessUp"
command = ["xbacklight", "+", "5"]

[[binds]]
key = "XF86MonBrightnessDown"
command = ["xbacklight", "-", "5"]
"###;

#[cfg(test)]
mod tests {
    use super::*;
    use x11::keysym;

    #[test]
    fn parses_modifier_combinations() {
        assert_eq!(parse_mods("super").unwrap(), xlib::Mod4Mask);
        assert_eq!(parse_mods("win").unwrap(), xlib::Mod4Mask);
        assert_eq!(parse_mods("alt+shift").unwrap(), xlib::Mod1Mask | xlib::ShiftMask);
        assert_eq!(
            parse_mods("super + ctrl + shift").unwrap(),
            xlib::Mod4Mask | xlib::ControlMask | xlib::ShiftMask
        );
        assert_eq!(parse_mods("").unwrap(), 0);
        assert!(parse_mods("hyper").is_err());
    }

    #[test]
    fn parses_key_names() {
        assert_eq!(parse_key("Return").unwrap(), keysym::XK_Return as xlib::KeySym);
        assert_eq!(parse_key("d").unwrap(), keysym::XK_d as xlib::KeySym);
        assert_eq!(parse_key("XF86AudioRaiseVolume").unwrap(), 0x1008ff13);
        assert!(parse_key("NotAKey").is_err());
    }

    #[test]
    fn parses_default_config() {
        let config = Config::parse(DEFAULT_CONFIG).unwrap();

        assert!(config.warn_failures);
        assert_eq!(config.bindings.len(), 10);

        let dmenu = &config.bindings[2];
        assert_eq!(dmenu.mods, xlib::Mod4Mask);
        assert_eq!(dmenu.keysym, keysym::XK_d as xlib::KeySym);
        assert_eq!(dmenu.command, vec!["dmenu_run", "-b"]);

        let volume_up = &config.bindings[3];
        assert_eq!(volume_up.mods, 0);
    }

    #[test]
    fn rejects_empty_command() {
        let content = r#"
[[binds]]
key = "d"
command = []
"#;
        assert!(Config::parse(content).is_err());
    }

    #[test]
    fn rejects_unknown_key() {
        let content = r#"
[[binds]]
key = "NotAKey"
command = ["true"]
"#;
        assert!(Config::parse(content).is_err());
    }

    #[test]
    fn all_matching_bindings_fire_in_table_order() {
        let config = Config::parse(
            r#"
[[binds]]
mods = "super"
key = "d"
command = ["dmenu_run", "-b"]

[[binds]]
mods = "super"
key = "d"
command = ["rofi", "-show", "run"]

[[binds]]
mods = "super+shift"
key = "d"
command = ["other"]
"#,
        )
        .unwrap();

        let hits = config.matches(xlib::Mod4Mask, keysym::XK_d as xlib::KeySym);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].command[0], "dmenu_run");
        assert_eq!(hits[1].command[0], "rofi");
    }

    #[test]
    fn modifier_state_must_match_exactly() {
        let config = Config::parse(
            r#"
[[binds]]
mods = "super"
key = "d"
command = ["dmenu_run"]
"#,
        )
        .unwrap();

        let keysym = keysym::XK_d as xlib::KeySym;
        assert!(config.matches(xlib::Mod4Mask | xlib::ShiftMask, keysym).is_empty());
        assert!(config.matches(0, keysym).is_empty());
        assert!(config.matches(xlib::Mod4Mask, keysym::XK_e as xlib::KeySym).is_empty());
        assert_eq!(config.matches(xlib::Mod4Mask, keysym).len(), 1);
    }
}
