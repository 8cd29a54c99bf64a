use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

const CONFIG_PATH: &str = "scoreboard.ini";

// --- Minimal INI reader ---
#[derive(Debug, Default)]
pub struct SimpleIni {
    sections: HashMap<String, HashMap<String, String>>,
}

impl SimpleIni {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        self.load_str(&content);
        Ok(())
    }

    pub fn load_str(&mut self, content: &str) {
        self.sections.clear();

        let mut current_section: Option<String> = None;

        for raw_line in content.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            // Section header: [SectionName]
            if line.starts_with('[') && line.ends_with(']') && line.len() >= 2 {
                let section = line[1..line.len() - 1].trim().to_string();
                current_section = Some(section.clone());
                self.sections.entry(section).or_default();
                continue;
            }

            // Key/value pair: key=value
            if let Some(eq_idx) = line.find('=') {
                let (key_raw, value_raw) = line.split_at(eq_idx);
                let key = key_raw.trim();
                if key.is_empty() {
                    continue;
                }
                let value = value_raw[1..].trim().to_string();
                let section = current_section.clone().unwrap_or_default();
                self.sections
                    .entry(section)
                    .or_default()
                    .insert(key.to_string(), value);
            }
        }
    }

    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        self.sections.get(section).and_then(|s| s.get(key)).cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const fn as_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Off => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Error => "Error",
            Self::Warn => "Warn",
            Self::Info => "Info",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Nominal score animation length when a link carries no usable `duration`.
    pub default_duration_ms: u32,
    /// Fireworks finale when a link has no `fireworks` parameter.
    pub fireworks: bool,
    pub display_width: u32,
    pub display_height: u32,
    pub windowed: bool,
    pub vsync: bool,
    // 0 = Auto (use all logical cores)
    // 1 = Single-threaded
    // N >= 2 = cap at N threads (clamped to available cores).
    pub software_renderer_threads: u8,
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_duration_ms: 30_000,
            fireworks: false,
            display_width: 1280,
            display_height: 720,
            windowed: true,
            vsync: true,
            software_renderer_threads: 0,
            log_level: LogLevel::Warn,
        }
    }
}

impl Config {
    pub const fn software_thread_hint(&self) -> Option<usize> {
        match self.software_renderer_threads {
            0 => None,
            n => Some(n as usize),
        }
    }

    fn from_ini(conf: &SimpleIni) -> Self {
        let default = Self::default();
        let flag = |key: &str, fallback: bool| {
            conf.get("Options", key)
                .and_then(|v| v.parse::<u8>().ok())
                .map_or(fallback, |v| v != 0)
        };

        Self {
            default_duration_ms: conf
                .get("Options", "DefaultDurationMs")
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|&ms| ms > 0)
                .unwrap_or(default.default_duration_ms),
            fireworks: flag("Fireworks", default.fireworks),
            display_width: conf
                .get("Options", "DisplayWidth")
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|&w| w > 0)
                .unwrap_or(default.display_width),
            display_height: conf
                .get("Options", "DisplayHeight")
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|&h| h > 0)
                .unwrap_or(default.display_height),
            windowed: flag("Windowed", default.windowed),
            vsync: flag("Vsync", default.vsync),
            software_renderer_threads: conf
                .get("Options", "SoftwareRendererThreads")
                .and_then(|v| v.parse::<u8>().ok())
                .unwrap_or(default.software_renderer_threads),
            log_level: conf
                .get("Options", "LogLevel")
                .and_then(|v| LogLevel::from_str(&v).ok())
                .unwrap_or(default.log_level),
        }
    }

    fn to_ini_string(&self) -> String {
        // [Options] keys in alphabetical order
        let mut content = String::new();
        content.push_str("[Options]\n");
        content.push_str(&format!("DefaultDurationMs={}\n", self.default_duration_ms));
        content.push_str(&format!("DisplayHeight={}\n", self.display_height));
        content.push_str(&format!("DisplayWidth={}\n", self.display_width));
        content.push_str(&format!(
            "Fireworks={}\n",
            if self.fireworks { "1" } else { "0" }
        ));
        content.push_str(&format!("LogLevel={}\n", self.log_level.as_str()));
        content.push_str(&format!(
            "SoftwareRendererThreads={}\n",
            self.software_renderer_threads
        ));
        content.push_str(&format!("Vsync={}\n", if self.vsync { "1" } else { "0" }));
        content.push_str(&format!(
            "Windowed={}\n",
            if self.windowed { "1" } else { "0" }
        ));
        content
    }
}

// Global, mutable configuration instance.
static CONFIG: std::sync::LazyLock<Mutex<Config>> =
    std::sync::LazyLock::new(|| Mutex::new(Config::default()));

fn create_default_config_file() -> Result<(), std::io::Error> {
    info!("'{CONFIG_PATH}' not found, creating with default values.");
    std::fs::write(CONFIG_PATH, Config::default().to_ini_string())
}

pub fn load() {
    if !Path::new(CONFIG_PATH).exists()
        && let Err(e) = create_default_config_file()
    {
        warn!("Failed to create default config file: {e}");
    }

    let mut conf = SimpleIni::new();
    let loaded = match conf.load(CONFIG_PATH) {
        Ok(()) => Config::from_ini(&conf),
        Err(e) => {
            warn!("Failed to read '{CONFIG_PATH}', using defaults: {e}");
            Config::default()
        }
    };

    match CONFIG.lock() {
        Ok(mut cfg) => *cfg = loaded,
        Err(poisoned) => *poisoned.into_inner() = loaded,
    }
    info!("Configuration loaded: {loaded:?}");
}

pub fn get() -> Config {
    match CONFIG.lock() {
        Ok(cfg) => *cfg,
        Err(poisoned) => *poisoned.into_inner(),
    }
}
