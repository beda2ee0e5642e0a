use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::de::Deserializer;
use serde::Deserialize;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "menudex";

#[derive(Debug, Clone)]
pub struct Config {
    /// Optional catalog file; the embedded catalog is used when absent.
    pub catalog: Option<PathBuf>,
    /// Currency prefix for price display.
    pub currency: String,
    pub search: SearchConfig,
    pub keys: Keys,
    pub ui: UiConfig,
    pub commands: Commands,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: None,
            currency: default_currency(),
            search: SearchConfig::default(),
            keys: Keys::default(),
            ui: UiFile::default().into(),
            commands: Commands { order: None },
        }
    }
}

// =============================================================================
// Search configuration
// =============================================================================

/// When filtering runs relative to user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Recompute results on every keystroke. Empty query shows the whole
    /// catalog. No loading state.
    Immediate,
    /// Filter only on explicit submit. Empty submit is a no-op. A loading
    /// indicator shows while the filter runs.
    Deferred,
}

impl SearchMode {
    fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" => Some(SearchMode::Immediate),
            "deferred" => Some(SearchMode::Deferred),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub mode: SearchMode,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::Immediate,
        }
    }
}

// =============================================================================
// Key bindings - context-aware with multiple bindings per action
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct Keys {
    /// Global keys (work outside the search input)
    pub global: GlobalKeys,
    /// Keys while the search input is focused
    pub search_input: SearchInputKeys,
    /// Keys while the result list is focused
    pub results: ResultsKeys,
    /// Keys for modal dialogs (order confirmation)
    pub modal: ModalKeys,
}

#[derive(Debug, Clone)]
pub struct GlobalKeys {
    pub quit: Vec<String>,
    pub search: Vec<String>,
    pub help: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SearchInputKeys {
    pub cancel: Vec<String>,
    pub confirm: Vec<String>,
    pub next: Vec<String>,
    pub prev: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ResultsKeys {
    pub cancel: Vec<String>,
    pub order: Vec<String>,
    pub next: Vec<String>,
    pub prev: Vec<String>,
    pub page_down: Vec<String>,
    pub page_up: Vec<String>,
    pub top: Vec<String>,
    pub bottom: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ModalKeys {
    pub cancel: Vec<String>,
    pub confirm: Vec<String>,
}

impl Default for GlobalKeys {
    fn default() -> Self {
        Self {
            quit: vec!["q".into()],
            search: vec!["/".into()],
            help: vec!["F1".into(), "?".into()],
        }
    }
}

impl Default for SearchInputKeys {
    fn default() -> Self {
        Self {
            cancel: vec!["Escape".into()],
            confirm: vec!["Enter".into()],
            next: vec!["Down".into(), "Tab".into()],
            prev: vec!["Up".into(), "Backtab".into()],
        }
    }
}

impl Default for ResultsKeys {
    fn default() -> Self {
        Self {
            cancel: vec!["Escape".into()],
            order: vec!["Enter".into(), "o".into()],
            next: vec!["j".into(), "Down".into(), "Tab".into()],
            prev: vec!["k".into(), "Up".into(), "Backtab".into()],
            page_down: vec!["PageDown".into()],
            page_up: vec!["PageUp".into()],
            top: vec!["g".into(), "Home".into()],
            bottom: vec!["G".into(), "End".into()],
        }
    }
}

impl Default for ModalKeys {
    fn default() -> Self {
        Self {
            cancel: vec!["Escape".into(), "n".into()],
            confirm: vec!["Enter".into(), "y".into()],
        }
    }
}

// =============================================================================
// Serde deserialization types (support both single string and array)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum KeyBinding {
    Single(String),
    Multiple(Vec<String>),
}

impl KeyBinding {
    fn into_vec(self) -> Vec<String> {
        match self {
            KeyBinding::Single(s) => vec![s],
            KeyBinding::Multiple(v) => v,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct KeysFile {
    global: GlobalKeysFile,
    search_input: SearchInputKeysFile,
    results: ResultsKeysFile,
    modal: ModalKeysFile,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct GlobalKeysFile {
    quit: KeyBinding,
    search: KeyBinding,
    help: KeyBinding,
}

impl Default for GlobalKeysFile {
    fn default() -> Self {
        let defaults = GlobalKeys::default();
        Self {
            quit: KeyBinding::Multiple(defaults.quit),
            search: KeyBinding::Multiple(defaults.search),
            help: KeyBinding::Multiple(defaults.help),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SearchInputKeysFile {
    cancel: KeyBinding,
    confirm: KeyBinding,
    next: KeyBinding,
    prev: KeyBinding,
}

impl Default for SearchInputKeysFile {
    fn default() -> Self {
        let defaults = SearchInputKeys::default();
        Self {
            cancel: KeyBinding::Multiple(defaults.cancel),
            confirm: KeyBinding::Multiple(defaults.confirm),
            next: KeyBinding::Multiple(defaults.next),
            prev: KeyBinding::Multiple(defaults.prev),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ResultsKeysFile {
    cancel: KeyBinding,
    order: KeyBinding,
    next: KeyBinding,
    prev: KeyBinding,
    page_down: KeyBinding,
    page_up: KeyBinding,
    top: KeyBinding,
    bottom: KeyBinding,
}

impl Default for ResultsKeysFile {
    fn default() -> Self {
        let defaults = ResultsKeys::default();
        Self {
            cancel: KeyBinding::Multiple(defaults.cancel),
            order: KeyBinding::Multiple(defaults.order),
            next: KeyBinding::Multiple(defaults.next),
            prev: KeyBinding::Multiple(defaults.prev),
            page_down: KeyBinding::Multiple(defaults.page_down),
            page_up: KeyBinding::Multiple(defaults.page_up),
            top: KeyBinding::Multiple(defaults.top),
            bottom: KeyBinding::Multiple(defaults.bottom),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ModalKeysFile {
    cancel: KeyBinding,
    confirm: KeyBinding,
}

impl Default for ModalKeysFile {
    fn default() -> Self {
        let defaults = ModalKeys::default();
        Self {
            cancel: KeyBinding::Multiple(defaults.cancel),
            confirm: KeyBinding::Multiple(defaults.confirm),
        }
    }
}

impl From<KeysFile> for Keys {
    fn from(file: KeysFile) -> Self {
        Self {
            global: GlobalKeys {
                quit: file.global.quit.into_vec(),
                search: file.global.search.into_vec(),
                help: file.global.help.into_vec(),
            },
            search_input: SearchInputKeys {
                cancel: file.search_input.cancel.into_vec(),
                confirm: file.search_input.confirm.into_vec(),
                next: file.search_input.next.into_vec(),
                prev: file.search_input.prev.into_vec(),
            },
            results: ResultsKeys {
                cancel: file.results.cancel.into_vec(),
                order: file.results.order.into_vec(),
                next: file.results.next.into_vec(),
                prev: file.results.prev.into_vec(),
                page_down: file.results.page_down.into_vec(),
                page_up: file.results.page_up.into_vec(),
                top: file.results.top.into_vec(),
                bottom: file.results.bottom.into_vec(),
            },
            modal: ModalKeys {
                cancel: file.modal.cancel.into_vec(),
                confirm: file.modal.confirm.into_vec(),
            },
        }
    }
}

// =============================================================================
// Key binding validation
// =============================================================================

/// Normalize a key binding string to a canonical form for collision detection.
/// Single characters preserve case (since 'G' means Shift+g, different from
/// 'g'). Multi-character key names are case-insensitive.
fn normalize_binding(binding: &str) -> String {
    let trimmed = binding.trim();
    if trimmed.len() == 1 {
        trimmed.to_string()
    } else {
        trimmed.to_ascii_lowercase()
    }
}

fn check_context_collisions(bindings: &[(&str, &[String])], context_name: &str) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();

    for (action_name, keys) in bindings {
        for key in *keys {
            let normalized = normalize_binding(key);
            if normalized.is_empty() {
                continue;
            }
            if let Some(existing_action) = seen.get(&normalized) {
                bail!(
                    "key binding collision in [keys.{}]: '{}' is bound to both '{}' and '{}'",
                    context_name,
                    key,
                    existing_action,
                    action_name
                );
            }
            seen.insert(normalized, action_name);
        }
    }

    Ok(())
}

fn validate_key_bindings(keys: &Keys) -> Result<()> {
    check_context_collisions(
        &[
            ("quit", &keys.global.quit),
            ("search", &keys.global.search),
            ("help", &keys.global.help),
        ],
        "global",
    )?;

    check_context_collisions(
        &[
            ("cancel", &keys.search_input.cancel),
            ("confirm", &keys.search_input.confirm),
            ("next", &keys.search_input.next),
            ("prev", &keys.search_input.prev),
        ],
        "search_input",
    )?;

    check_context_collisions(
        &[
            ("cancel", &keys.results.cancel),
            ("order", &keys.results.order),
            ("next", &keys.results.next),
            ("prev", &keys.results.prev),
            ("page_down", &keys.results.page_down),
            ("page_up", &keys.results.page_up),
            ("top", &keys.results.top),
            ("bottom", &keys.results.bottom),
        ],
        "results",
    )?;

    check_context_collisions(
        &[
            ("cancel", &keys.modal.cancel),
            ("confirm", &keys.modal.confirm),
        ],
        "modal",
    )?;

    Ok(())
}

// =============================================================================
// UI config types
// =============================================================================

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub colors: UiColors,
}

#[derive(Debug, Clone)]
pub struct UiColors {
    pub border: RgbColor,
    pub selection_bg: RgbColor,
    pub selection_fg: RgbColor,
    pub rating: RgbColor,
    pub badge: RgbColor,
    pub status_fg: RgbColor,
    pub status_bg: RgbColor,
}

#[derive(Debug, Clone, Copy)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl<'de> serde::Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Array([u8; 3]),
            Map { r: u8, g: u8, b: u8 },
        }

        let helper = Helper::deserialize(deserializer)?;
        let (r, g, b) = match helper {
            Helper::Array(values) => (values[0], values[1], values[2]),
            Helper::Map { r, g, b } => (r, g, b),
        };
        Ok(RgbColor { r, g, b })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct UiFile {
    colors: UiColorsFile,
}

impl Default for UiFile {
    fn default() -> Self {
        Self {
            colors: UiColorsFile::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct UiColorsFile {
    border: RgbColor,
    selection_bg: RgbColor,
    selection_fg: RgbColor,
    rating: RgbColor,
    badge: RgbColor,
    status_fg: RgbColor,
    status_bg: RgbColor,
}

impl Default for UiColorsFile {
    fn default() -> Self {
        Self {
            border: RgbColor::new(255, 165, 0),
            selection_bg: RgbColor::new(255, 165, 0),
            selection_fg: RgbColor::new(0, 0, 0),
            rating: RgbColor::new(255, 215, 0),
            badge: RgbColor::new(135, 175, 255),
            status_fg: RgbColor::new(255, 165, 0),
            status_bg: RgbColor::new(0, 0, 0),
        }
    }
}

impl From<UiFile> for UiConfig {
    fn from(file: UiFile) -> Self {
        Self {
            colors: UiColors {
                border: file.colors.border,
                selection_bg: file.colors.selection_bg,
                selection_fg: file.colors.selection_fg,
                rating: file.colors.rating,
                badge: file.colors.badge,
                status_fg: file.colors.status_fg,
                status_bg: file.colors.status_bg,
            },
        }
    }
}

// =============================================================================
// Commands config
// =============================================================================

#[derive(Debug, Clone)]
pub struct Commands {
    /// External handler for order requests. The request is piped to its
    /// stdin; the core places no meaning on what the command does with it.
    pub order: Option<CommandExec>,
}

#[derive(Debug, Clone)]
pub struct CommandExec {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct CommandsFile {
    order: Option<CommandDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CommandDef {
    Simple(String),
    List(Vec<String>),
}

impl From<CommandsFile> for Commands {
    fn from(file: CommandsFile) -> Self {
        Self {
            order: file.order.and_then(CommandExec::from_def),
        }
    }
}

impl CommandExec {
    fn from_def(def: CommandDef) -> Option<Self> {
        match def {
            CommandDef::Simple(cmd) => {
                let trimmed = cmd.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Self {
                        program: trimmed.to_string(),
                        args: Vec::new(),
                    })
                }
            }
            CommandDef::List(mut parts) => {
                if parts.is_empty() {
                    return None;
                }
                let program = parts.remove(0);
                Some(Self {
                    program,
                    args: parts,
                })
            }
        }
    }
}

// =============================================================================
// Config file structure
// =============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    catalog: Option<PathBuf>,
    currency: Option<String>,
    search: SearchFile,
    keys: KeysFile,
    ui: UiFile,
    commands: CommandsFile,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SearchFile {
    mode: Option<String>,
}

fn default_currency() -> String {
    "$".to_string()
}

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

fn default_config_path() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME).join(CONFIG_FILE_NAME))
}

/// Load configuration. An explicit path must exist; the default location is
/// optional and falls back to built-in defaults when absent.
pub fn load(explicit_path: Option<&Path>) -> Result<Config> {
    let path = match explicit_path {
        Some(path) => {
            if !path.exists() {
                bail!("configuration file not found at {}", path.display());
            }
            path.to_path_buf()
        }
        None => {
            let path = default_config_path()?;
            if !path.exists() {
                return Ok(Config::default());
            }
            path
        }
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;

    let value: toml::Value = toml::from_str(&raw)
        .with_context(|| format!("failed to parse {} as TOML", path.display()))?;

    warn_unknown_keys(&value);

    let cfg_file: ConfigFile = value
        .try_into()
        .with_context(|| format!("failed to deserialize config from {}", path.display()))?;

    let mode = match cfg_file.search.mode.as_deref() {
        Some(raw_mode) => SearchMode::from_str(raw_mode).ok_or_else(|| {
            anyhow::anyhow!(
                "invalid search.mode '{}', expected one of: immediate, deferred",
                raw_mode
            )
        })?,
        None => SearchConfig::default().mode,
    };

    let currency = cfg_file
        .currency
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(default_currency);

    let keys: Keys = cfg_file.keys.into();
    validate_key_bindings(&keys)?;

    Ok(Config {
        catalog: cfg_file.catalog.map(|p| expand_tilde(&p)),
        currency,
        search: SearchConfig { mode },
        keys,
        ui: cfg_file.ui.into(),
        commands: cfg_file.commands.into(),
    })
}

// =============================================================================
// Unknown key warnings
// =============================================================================

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let known = HashSet::from([
        "catalog".to_string(),
        "currency".to_string(),
        "search".to_string(),
        "keys".to_string(),
        "ui".to_string(),
        "commands".to_string(),
    ]);

    for key in table.keys() {
        if !known.contains(key) {
            eprintln!("warning: unknown configuration key `{}`", key);
        }
    }

    if let Some(search_val) = table.get("search") {
        warn_unknown_in_section(search_val, "search", &["mode"]);
    }

    if let Some(keys_val) = table.get("keys") {
        warn_unknown_keys_section(keys_val);
    }

    if let Some(ui_val) = table.get("ui") {
        warn_unknown_ui_keys(ui_val);
    }

    if let Some(commands_val) = table.get("commands") {
        warn_unknown_in_section(commands_val, "commands", &["order"]);
    }
}

fn warn_unknown_keys_section(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let known_contexts = HashSet::from(["global", "search_input", "results", "modal"]);

    for key in table.keys() {
        if !known_contexts.contains(key.as_str()) {
            eprintln!("warning: unknown keys.* context `{}`", key);
        }
    }

    if let Some(v) = table.get("global") {
        warn_unknown_in_section(v, "keys.global", &["quit", "search", "help"]);
    }
    if let Some(v) = table.get("search_input") {
        warn_unknown_in_section(
            v,
            "keys.search_input",
            &["cancel", "confirm", "next", "prev"],
        );
    }
    if let Some(v) = table.get("results") {
        warn_unknown_in_section(
            v,
            "keys.results",
            &[
                "cancel",
                "order",
                "next",
                "prev",
                "page_down",
                "page_up",
                "top",
                "bottom",
            ],
        );
    }
    if let Some(v) = table.get("modal") {
        warn_unknown_in_section(v, "keys.modal", &["cancel", "confirm"]);
    }
}

fn warn_unknown_ui_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    for key in table.keys() {
        if key != "colors" {
            eprintln!("warning: unknown ui.* entry `{}`", key);
        }
    }

    if let Some(colors_val) = table.get("colors") {
        warn_unknown_in_section(
            colors_val,
            "ui.colors",
            &[
                "border",
                "selection_bg",
                "selection_fg",
                "rating",
                "badge",
                "status_fg",
                "status_bg",
            ],
        );
    }
}

fn warn_unknown_in_section(value: &toml::Value, section: &str, known: &[&str]) {
    let Some(table) = value.as_table() else {
        return;
    };
    let known_set: HashSet<&str> = known.iter().copied().collect();
    for key in table.keys() {
        if !known_set.contains(key.as_str()) {
            eprintln!("warning: unknown {} entry `{}`", section, key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ConfigFile {
        toml::from_str(raw).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.currency, "$");
        assert_eq!(config.search.mode, SearchMode::Immediate);
        assert!(config.catalog.is_none());
        assert!(config.commands.order.is_none());
    }

    #[test]
    fn test_search_mode_parsing() {
        assert_eq!(SearchMode::from_str("immediate"), Some(SearchMode::Immediate));
        assert_eq!(SearchMode::from_str("Deferred"), Some(SearchMode::Deferred));
        assert_eq!(SearchMode::from_str("eager"), None);
    }

    #[test]
    fn test_key_binding_single_and_array_forms() {
        let file = parse(
            r#"
            [keys.global]
            quit = "x"
            help = ["F2", "h"]
            "#,
        );
        let keys: Keys = file.keys.into();
        assert_eq!(keys.global.quit, vec!["x"]);
        assert_eq!(keys.global.help, vec!["F2", "h"]);
        // Unspecified actions keep their defaults.
        assert_eq!(keys.global.search, vec!["/"]);
    }

    #[test]
    fn test_collision_detected_within_context() {
        let mut keys = Keys::default();
        keys.results.next = vec!["j".into()];
        keys.results.prev = vec!["j".into()];
        assert!(validate_key_bindings(&keys).is_err());
    }

    #[test]
    fn test_collision_case_sensitive_for_single_chars() {
        let mut keys = Keys::default();
        keys.results.top = vec!["g".into()];
        keys.results.bottom = vec!["G".into()];
        assert!(validate_key_bindings(&keys).is_ok());
    }

    #[test]
    fn test_same_key_allowed_across_contexts() {
        // 'Enter' confirms in search_input and orders in results.
        assert!(validate_key_bindings(&Keys::default()).is_ok());
    }

    #[test]
    fn test_rgb_color_array_and_map_forms() {
        let file = parse(
            r#"
            [ui.colors]
            border = [10, 20, 30]
            rating = { r = 1, g = 2, b = 3 }
            "#,
        );
        let ui: UiConfig = file.ui.into();
        assert_eq!(ui.colors.border.g, 20);
        assert_eq!(ui.colors.rating.b, 3);
    }

    #[test]
    fn test_order_command_forms() {
        let file = parse(r#"commands = { order = "notify-send" }"#);
        let commands: Commands = file.commands.into();
        let order = commands.order.unwrap();
        assert_eq!(order.program, "notify-send");
        assert!(order.args.is_empty());

        let file = parse(r#"commands = { order = ["sh", "-c", "cat"] }"#);
        let commands: Commands = file.commands.into();
        let order = commands.order.unwrap();
        assert_eq!(order.program, "sh");
        assert_eq!(order.args, vec!["-c", "cat"]);

        let file = parse(r#"commands = { order = "  " }"#);
        let commands: Commands = file.commands.into();
        assert!(commands.order.is_none());
    }
}
