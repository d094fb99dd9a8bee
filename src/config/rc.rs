use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const RC_FILE_NAME: &str = ".tgnavrc";

#[derive(Debug, Clone, PartialEq)]
pub struct NavConfig {
    /// Delay before a same-context navigation fires, in milliseconds.
    pub navigation_delay_ms: u64,
    /// Footer height assumed when the host reports neither a box nor a reservation.
    pub default_footer_height: i32,
    pub scroll_margin_bottom: i32,
    pub scroll_margin_top: i32,
    /// Force instant scrolling regardless of the host preference.
    pub reduced_motion: bool,
    pub show_key_bar: bool,
    /// How many command output lines the footer shows.
    pub output_lines: usize,
    /// Pointer presses this soon after opening command mode do not close it.
    pub open_guard_ms: u64,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            navigation_delay_ms: 500,
            default_footer_height: 64,
            scroll_margin_bottom: 4,
            scroll_margin_top: 8,
            reduced_motion: false,
            show_key_bar: true,
            output_lines: 3,
            open_guard_ms: 250,
        }
    }
}

impl NavConfig {
    /// Defaults for a host that measures in terminal cells.
    pub fn terminal() -> Self {
        Self {
            default_footer_height: 2,
            scroll_margin_bottom: 1,
            scroll_margin_top: 1,
            ..Self::default()
        }
    }
}

pub struct RcLoader;

impl RcLoader {
    /// Get the path to the RC file
    /// Looks for .tgnavrc in:
    /// 1. Current directory
    /// 2. Home directory (~/.tgnavrc)
    pub fn get_rc_path() -> Option<PathBuf> {
        let current_rc = Path::new(RC_FILE_NAME);
        if current_rc.exists() {
            return Some(current_rc.to_path_buf());
        }

        if let Ok(home) = env::var("HOME") {
            let home_rc = Path::new(&home).join(RC_FILE_NAME);
            if home_rc.exists() {
                return Some(home_rc);
            }
        }

        None
    }

    /// Load and parse the RC file on top of the terminal defaults
    pub fn load_config() -> NavConfig {
        match Self::get_rc_path() {
            Some(rc_path) => Self::load_from_path(&rc_path),
            None => NavConfig::terminal(),
        }
    }

    pub fn load_from_path(rc_path: &Path) -> NavConfig {
        let mut config = NavConfig::terminal();
        match fs::read_to_string(rc_path) {
            Ok(content) => {
                log::debug!("loading config from {}", rc_path.display());
                Self::parse_config_content(&content, &mut config);
            }
            Err(e) => {
                // Unreadable rc file means defaults
                log::warn!("could not read {}: {e}", rc_path.display());
            }
        }
        config
    }

    /// Parse the content of an RC file
    pub fn parse_config_content(content: &str, config: &mut NavConfig) {
        for line in content.lines() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') || line.starts_with('"') {
                continue;
            }

            Self::parse_config_line(line, config);
        }
    }

    fn parse_config_line(line: &str, config: &mut NavConfig) {
        // Remove inline comments
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        }
        .trim();

        // vim-style "set" lines share the key=value handling below
        let setting = line.strip_prefix("set ").map(str::trim).unwrap_or(line);

        match setting {
            "reducedmotion" => config.reduced_motion = true,
            "noreducedmotion" => config.reduced_motion = false,
            "keybar" => config.show_key_bar = true,
            "nokeybar" => config.show_key_bar = false,
            _ => {
                if let Some((key, value)) = setting.split_once('=') {
                    Self::apply_setting(key.trim(), value.trim(), config);
                }
            }
        }
    }

    fn apply_setting(key: &str, value: &str, config: &mut NavConfig) {
        match key {
            "delay" | "navigation_delay" => {
                if let Ok(ms) = value.parse::<u64>() {
                    if ms <= 10_000 {
                        config.navigation_delay_ms = ms;
                    }
                }
            }
            "footerheight" | "footer_height" => {
                if let Ok(height) = value.parse::<i32>() {
                    if height > 0 {
                        config.default_footer_height = height;
                    }
                }
            }
            "scrollmargin" | "scroll_margin" => {
                if let Ok(margin) = value.parse::<i32>() {
                    if margin >= 0 {
                        config.scroll_margin_bottom = margin;
                        config.scroll_margin_top = margin;
                    }
                }
            }
            "scrollmargin_bottom" | "scroll_margin_bottom" => {
                if let Ok(margin) = value.parse::<i32>() {
                    if margin >= 0 {
                        config.scroll_margin_bottom = margin;
                    }
                }
            }
            "scrollmargin_top" | "scroll_margin_top" => {
                if let Ok(margin) = value.parse::<i32>() {
                    if margin >= 0 {
                        config.scroll_margin_top = margin;
                    }
                }
            }
            "reduced_motion" | "reducedmotion" => {
                config.reduced_motion = is_truthy(value);
            }
            "key_bar" | "keybar" => {
                config.show_key_bar = is_truthy(value);
            }
            "outputlines" | "output_lines" => {
                if let Ok(lines) = value.parse::<usize>() {
                    if lines <= 20 {
                        config.output_lines = lines;
                    }
                }
            }
            "openguard" | "open_guard" => {
                if let Ok(ms) = value.parse::<u64>() {
                    config.open_guard_ms = ms;
                }
            }
            _ => {} // Unknown setting, ignore
        }
    }

    /// Generate a sample RC file content
    pub fn generate_sample_rc() -> String {
        r#"# tg-nav configuration file (.tgnavrc)
# Lines starting with # or " are comments

# Navigation
set delay=500           # ms the loading indicator shows before navigating

# Scrolling
set scrollmargin=1      # rows kept between a selected link and the edges
set noreducedmotion     # set reducedmotion to always scroll instantly

# Footer
set keybar              # show the : / Enter / j / k button bar
set outputlines=3       # command output lines shown above the status line

# Alternative key=value syntax:
# navigation_delay=500
# footer_height=2
# reduced_motion=false
"#
        .to_string()
    }
}

fn is_truthy(value: &str) -> bool {
    value == "true" || value == "1" || value == "yes"
}
