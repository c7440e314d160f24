//! Configuration loading and parsing.
//!
//! Parses `burnish.toml`: the theme rule-list file to load, render knobs,
//! and extra language registrations merged over the built-ins. Unknown
//! fields are ignored (TOML deserialization tolerance) and a parse error
//! falls back to defaults; a broken config file must never block opening a
//! document.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::info;

const TAB_WIDTH_MIN: u8 = 1;
const TAB_WIDTH_MAX: u8 = 16;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ThemeConfig {
    /// Path to a JSON theme rule list; `None` keeps the built-in theme.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RenderConfig {
    #[serde(default = "RenderConfig::default_tab_width")]
    pub tab_width: u8,
    /// Cell size used by the SVG surface, in pixels.
    #[serde(default = "RenderConfig::default_cell_px")]
    pub cell_px: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tab_width: Self::default_tab_width(),
            cell_px: Self::default_cell_px(),
        }
    }
}

impl RenderConfig {
    const fn default_tab_width() -> u8 {
        4
    }
    const fn default_cell_px() -> f32 {
        9.0
    }
}

/// Extra language registration: id plus file extensions (leading dot).
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    pub id: String,
    #[serde(default)]
    pub extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub languages: Vec<LanguageConfig>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>,         // original file string (optional)
    pub file: ConfigFile,            // parsed (or default) data
    pub effective_tab_width: u8,     // clamped
}

/// Best-effort config path: working directory first, then the platform
/// config dir (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from("burnish.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("burnish").join("burnish.toml");
    }
    PathBuf::from("burnish.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    if let Ok(content) = fs::read_to_string(&path) {
        match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => {
                let mut cfg = Config {
                    raw: Some(content),
                    file,
                    effective_tab_width: 0,
                };
                cfg.apply_limits();
                Ok(cfg)
            }
            Err(_e) => {
                // Parse error falls back to defaults rather than blocking.
                let mut cfg = Config::default();
                cfg.apply_limits();
                Ok(cfg)
            }
        }
    } else {
        let mut cfg = Config::default();
        cfg.apply_limits();
        Ok(cfg)
    }
}

impl Config {
    /// Clamp raw values into their supported ranges. Returns the effective
    /// tab width.
    pub fn apply_limits(&mut self) -> u8 {
        let raw = self.file.render.tab_width;
        let clamped = raw.clamp(TAB_WIDTH_MIN, TAB_WIDTH_MAX);
        if clamped != raw {
            info!(
                target: "config",
                raw,
                clamped,
                min = TAB_WIDTH_MIN,
                max = TAB_WIDTH_MAX,
                "tab_width_clamped"
            );
        }
        self.effective_tab_width = clamped;
        clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    #[test]
    fn clamp_logging_uses_config_target() {
        let mut cfg = Config::default();
        cfg.file.render.tab_width = 40;
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        with_default(subscriber, || {
            cfg.apply_limits();
        });

        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("INFO config:"));
        assert!(log_output.contains("tab_width_clamped"));
        assert_eq!(cfg.effective_tab_width, 16);
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.effective_tab_width, 4);
        assert!(cfg.file.theme.file.is_none());
        assert!(cfg.file.languages.is_empty());
    }

    #[test]
    fn parses_theme_render_and_languages() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            concat!(
                "[theme]\nfile = \"mono.json\"\n",
                "[render]\ntab_width = 8\n",
                "[[languages]]\nid = \"c\"\nextensions = [\".c\", \".h\"]\n",
            ),
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.theme.file, Some(PathBuf::from("mono.json")));
        assert_eq!(cfg.effective_tab_width, 8);
        assert_eq!(
            cfg.file.languages,
            vec![LanguageConfig {
                id: "c".into(),
                extensions: vec![".c".into(), ".h".into()],
            }]
        );
    }

    #[test]
    fn tab_width_is_clamped() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[render]\ntab_width = 99\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.effective_tab_width, 16);
        assert_eq!(cfg.file.render.tab_width, 99); // raw value retained
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "theme = [not toml").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.effective_tab_width, 4);
        assert!(cfg.raw.is_none());
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[future_section]\nenabled = true\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.effective_tab_width, 4);
    }
}
