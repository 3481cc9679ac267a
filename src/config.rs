use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};

/// Flags that can be persisted in a config file.
///
/// Every field mirrors a command-line flag of the same name, and the file
/// format is just those flags, one or more per line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub grow: bool,
    pub perf: bool,
    pub force_half_cell: bool,
    pub no_graphics: bool,
    pub capacity: Option<usize>,
    pub reserve_mib: Option<usize>,
    pub atlas_size: Option<u32>,
    pub sprite_limit: Option<usize>,
    pub font: Option<PathBuf>,
    pub font_size: Option<u32>,
    pub scale: Option<u32>,
    pub render_debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge two flag sets. Switches are OR-ed; for valued flags `other` wins.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            grow: self.grow || other.grow,
            perf: self.perf || other.perf,
            force_half_cell: self.force_half_cell || other.force_half_cell,
            no_graphics: self.no_graphics || other.no_graphics,
            capacity: other.capacity.or(self.capacity),
            reserve_mib: other.reserve_mib.or(self.reserve_mib),
            atlas_size: other.atlas_size.or(self.atlas_size),
            sprite_limit: other.sprite_limit.or(self.sprite_limit),
            font: other.font.clone().or_else(|| self.font.clone()),
            font_size: other.font_size.or(self.font_size),
            scale: other.scale.or(self.scale),
            render_debug_log: other
                .render_debug_log
                .clone()
                .or_else(|| self.render_debug_log.clone()),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("typewriter").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("typewriter")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("typewriter").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("typewriter")
                .join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".typewriterrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# typewriter defaults (saved with --save)".to_string()];
    let switches = [
        (flags.grow, "--grow"),
        (flags.perf, "--perf"),
        (flags.force_half_cell, "--force-half-cell"),
        (flags.no_graphics, "--no-graphics"),
    ];
    lines.extend(
        switches
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, flag)| (*flag).to_string()),
    );
    if let Some(capacity) = flags.capacity {
        lines.push(format!("--capacity {capacity}"));
    }
    if let Some(mib) = flags.reserve_mib {
        lines.push(format!("--reserve-mib {mib}"));
    }
    if let Some(size) = flags.atlas_size {
        lines.push(format!("--atlas-size {size}"));
    }
    if let Some(limit) = flags.sprite_limit {
        lines.push(format!("--sprite-limit {limit}"));
    }
    if let Some(font) = &flags.font {
        lines.push(format!("--font {}", font.display()));
    }
    if let Some(size) = flags.font_size {
        lines.push(format!("--font-size {size}"));
    }
    if let Some(scale) = flags.scale {
        lines.push(format!("--scale {scale}"));
    }
    if let Some(path) = &flags.render_debug_log {
        lines.push(format!("--render-debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the known flags out of a token list, ignoring everything else.
///
/// Valued flags accept both `--flag value` and `--flag=value`; values that
/// do not parse are skipped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (token, None),
        };
        let mut value = || match inline {
            Some(value) => Some(value.to_string()),
            None => {
                let next = tokens.get(i + 1).cloned();
                if next.is_some() {
                    i += 1;
                }
                next
            }
        };
        match name {
            "--grow" => flags.grow = true,
            "--perf" => flags.perf = true,
            "--force-half-cell" => flags.force_half_cell = true,
            "--no-graphics" => flags.no_graphics = true,
            "--capacity" => flags.capacity = parse_value(value()),
            "--reserve-mib" => flags.reserve_mib = parse_value(value()),
            "--atlas-size" => flags.atlas_size = parse_value(value()),
            "--sprite-limit" => flags.sprite_limit = parse_value(value()),
            "--font-size" => flags.font_size = parse_value(value()),
            "--scale" => flags.scale = parse_value(value()),
            "--font" => flags.font = value().map(PathBuf::from),
            "--render-debug-log" => flags.render_debug_log = value().map(PathBuf::from),
            _ => {}
        }
        i += 1;
    }
    flags
}

fn parse_value<T: FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.parse().ok())
}
