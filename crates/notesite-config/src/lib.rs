//! Configuration primitives and loader for the notesite builder.
//!
//! The loader resolves configuration using a precedence stack:
//! override flag → working directory → git root → built-in defaults.
//! Parsed settings are normalised into typed structures so downstream
//! crates can operate without touching raw TOML.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE_NAME: &str = ".notesite.toml";

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub site: SiteSettings,
    pub content: ContentSettings,
    pub sources: ConfigSources,
}

/// Site-level settings controlling identity and output placement.
#[derive(Clone, Debug)]
pub struct SiteSettings {
    pub title: String,
    pub root: PathBuf,
    pub output: PathBuf,
    pub include_drafts: bool,
}

/// Settings that scope which files belong to the content store.
#[derive(Clone, Debug)]
pub struct ContentSettings {
    pub include: PatternList,
    pub exclude: PatternList,
    pub assets: PathBuf,
}

/// Pattern plus compiled matcher helper.
#[derive(Clone, Debug)]
pub struct Pattern {
    original: String,
    glob: Glob,
}

impl Pattern {
    fn new(source: &ConfigSource, value: String) -> Result<Self, ConfigValidationError> {
        match Glob::new(&value) {
            Ok(glob) => Ok(Pattern {
                original: value,
                glob,
            }),
            Err(err) => Err(ConfigValidationError::new(
                Some(source.clone()),
                format!("invalid glob pattern '{value}': {err}"),
            )),
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn glob(&self) -> &Glob {
        &self.glob
    }

    pub fn compile_matcher(&self) -> GlobMatcher {
        self.glob.compile_matcher()
    }
}

/// Ordered list of glob patterns.
#[derive(Clone, Debug, Default)]
pub struct PatternList {
    patterns: Vec<Pattern>,
}

impl PatternList {
    fn new(patterns: Vec<Pattern>) -> Self {
        PatternList { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    /// Return true when any pattern matches `path`.
    pub fn matches(&self, path: &Path) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.compile_matcher().is_match(path))
    }
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/git/local/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
    pub base_dir: PathBuf,
}

impl ConfigSource {
    fn default(base_dir: PathBuf) -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
            base_dir,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        ConfigSource {
            kind,
            path: Some(path),
            base_dir,
        }
    }

    pub fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

/// Single validation failure tied to the layer that produced it.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError { source, message }
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{} ({})", self.message, source.describe()),
            None => f.write_str(&self.message),
        }
    }
}

/// Collected validation failures across all layers.
#[derive(Clone, Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, error) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {error}")?;
        }
        Ok(())
    }
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let default_source = ConfigSource::default(working_dir.clone());
        let mut layers = vec![(RawConfig::default(), default_source.clone())];
        let mut source_layers = vec![default_source];

        let git_root = find_git_root(&working_dir);
        let git_config_path = git_root.as_ref().map(|root| root.join(CONFIG_FILE_NAME));
        let local_config_path = working_dir.join(CONFIG_FILE_NAME);

        if let Some(path) = git_config_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_config_path {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                layers.push((load_layer(path)?, source.clone()));
                source_layers.push(source);
            }
        }

        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            layers.push((load_layer(&local_config_path)?, source.clone()));
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            layers.push((load_layer(&path)?, source.clone()));
            source_layers.push(source);
        }

        let (site, content) = finalize(layers, &working_dir).map_err(ConfigError::Validation)?;
        Ok(Config {
            site,
            content,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_layer(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.into(),
        source,
    })
}

/// Canonicalise `.` and `..` path segments without touching the filesystem.
fn normalize_path(path: PathBuf) -> PathBuf {
    use std::path::Component;
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

/// Merge raw layers in precedence order and compile the typed settings.
fn finalize(
    layers: Vec<(RawConfig, ConfigSource)>,
    working_dir: &Path,
) -> Result<(SiteSettings, ContentSettings), ConfigValidationErrors> {
    let mut errors = Vec::new();

    let mut title: (String, ConfigSource) = (
        "Notes".to_owned(),
        ConfigSource::default(working_dir.to_path_buf()),
    );
    let mut root = (PathBuf::from("."), title.1.clone());
    let mut output = (PathBuf::from("public"), title.1.clone());
    let mut include_drafts = false;
    let mut include = (vec!["**/*.md".to_owned()], title.1.clone());
    let mut exclude = (
        vec!["**/node_modules/**".to_owned(), "**/.git/**".to_owned()],
        title.1.clone(),
    );
    let mut assets = (PathBuf::from("assets"), title.1.clone());

    for (raw, source) in layers {
        if let Some(site) = raw.site {
            if let Some(value) = site.title {
                title = (value, source.clone());
            }
            if let Some(value) = site.root {
                root = (value, source.clone());
            }
            if let Some(value) = site.output {
                output = (value, source.clone());
            }
            if let Some(value) = site.include_drafts {
                include_drafts = value;
            }
        }
        if let Some(content) = raw.content {
            if let Some(value) = content.include {
                include = (value, source.clone());
            }
            if let Some(value) = content.exclude {
                exclude = (value, source.clone());
            }
            if let Some(value) = content.assets {
                assets = (value, source.clone());
            }
        }
    }

    if title.0.trim().is_empty() {
        errors.push(ConfigValidationError::new(
            Some(title.1.clone()),
            "site.title must not be empty".to_owned(),
        ));
    }

    let root_path = normalize_path(make_absolute(&root.0, &root.1.base_dir));
    let output_path = normalize_path(make_absolute(&output.0, &root_path));

    if output_path == root_path {
        errors.push(ConfigValidationError::new(
            Some(output.1.clone()),
            "site.output must differ from site.root".to_owned(),
        ));
    }

    let include_patterns = compile_patterns(include.0, &include.1, &mut errors);
    let exclude_patterns = compile_patterns(exclude.0, &exclude.1, &mut errors);

    if !errors.is_empty() {
        return Err(ConfigValidationErrors(errors));
    }

    Ok((
        SiteSettings {
            title: title.0,
            root: root_path,
            output: output_path,
            include_drafts,
        },
        ContentSettings {
            include: include_patterns,
            exclude: exclude_patterns,
            assets: assets.0,
        },
    ))
}

fn compile_patterns(
    values: Vec<String>,
    source: &ConfigSource,
    errors: &mut Vec<ConfigValidationError>,
) -> PatternList {
    let mut patterns = Vec::with_capacity(values.len());
    for value in values {
        match Pattern::new(source, value) {
            Ok(pattern) => patterns.push(pattern),
            Err(err) => errors.push(err),
        }
    }
    PatternList::new(patterns)
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    site: Option<RawSite>,
    content: Option<RawContent>,
}

#[derive(Debug, Deserialize)]
struct RawSite {
    title: Option<String>,
    root: Option<PathBuf>,
    output: Option<PathBuf>,
    include_drafts: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawContent {
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    assets: Option<PathBuf>,
}
