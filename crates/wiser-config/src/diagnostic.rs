// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config diagnostics rendered through miette.
//!
//! Load failures (unknown keys, wrong types) and validation failures both
//! point at the offending line of the `wiser.toml` that set the value when
//! one can be found, and name the `WISER_*` variable that overrides it.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use std::path::{Path, PathBuf};

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler score for a "did you mean" hint.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// One problem with the loaded configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key that no config section declares.
    #[error("unknown key `{key}` in {section}")]
    #[diagnostic(
        code(wiser::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// `[sync]`, `[remote]`, or `the top level`.
        section: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a {section} key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that does not deserialize into the key's type.
    #[error("`{key}` {detail}")]
    #[diagnostic(
        code(wiser::config::invalid_type),
        help("use {expected}, in wiser.toml or via {}", env_var_name(key))
    )]
    InvalidType {
        /// Dotted key, e.g. `sync.write_timeout_secs`.
        key: String,
        detail: String,
        expected: String,
        #[label("expected {expected}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A well-typed value the sync core cannot run with.
    #[error("`{key}` {reason}")]
    #[diagnostic(code(wiser::config::invalid_value), help("{hint}"))]
    InvalidValue {
        /// Dotted key, e.g. `remote.base_url`.
        key: String,
        reason: String,
        hint: String,
        #[label("set here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A config file that could not be read or parsed at all.
    #[error("could not load configuration: {0}")]
    #[diagnostic(code(wiser::config::load))]
    Load(String),
}

impl ConfigError {
    /// A validation failure for `key`, without a source location yet.
    pub fn invalid_value(key: &str, reason: impl Into<String>, hint: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
            hint: format!("{} (or set {})", hint.into(), env_var_name(key)),
            span: None,
            src: None,
        }
    }

    /// The dotted key this error is about, if it names one.
    pub fn key(&self) -> Option<&str> {
        match self {
            ConfigError::UnknownKey { key, .. }
            | ConfigError::InvalidType { key, .. }
            | ConfigError::InvalidValue { key, .. } => Some(key),
            ConfigError::Load(_) => None,
        }
    }

    /// Points a validation error at the file line that set its key.
    ///
    /// The highest-precedence file that sets the key wins, matching figment's
    /// merge order. Other variants are returned unchanged.
    pub fn located(self, sources: &ConfigSources) -> Self {
        match self {
            ConfigError::InvalidValue {
                key,
                reason,
                hint,
                span: None,
                src: None,
            } => {
                let (span, src) = split_key(&key)
                    .and_then(|(section, field)| sources.locate_effective(section, field))
                    .map_or((None, None), |(file, span)| (Some(span), Some(file.named())));
                ConfigError::InvalidValue {
                    key,
                    reason,
                    hint,
                    span,
                    src,
                }
            }
            other => other,
        }
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Environment variable that overrides a dotted config key.
///
/// `sync.write_timeout_secs` -> `WISER_SYNC_WRITE_TIMEOUT_SECS`.
pub fn env_var_name(key: &str) -> String {
    format!("WISER_{}", key.replace('.', "_").to_ascii_uppercase())
}

fn split_key(key: &str) -> Option<(&str, &str)> {
    key.split_once('.')
}

/// A TOML document that contributed to the configuration.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    /// `None` for inline TOML strings.
    path: Option<PathBuf>,
    content: String,
}

impl SourceFile {
    fn named(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, self.content.clone())
    }

    /// Byte span of `field` inside the `[section]` table, if it is set there.
    fn locate(&self, section: &str, field: &str) -> Option<SourceSpan> {
        find_key_offset(&self.content, section, field).map(|o| SourceSpan::new(o.into(), field.len()))
    }
}

/// The config documents in merge order, lowest precedence first.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    files: Vec<SourceFile>,
}

impl ConfigSources {
    /// Reads every existing file in `paths`; missing files are skipped.
    pub fn read(paths: &[PathBuf]) -> Self {
        let cwd = std::env::current_dir().ok();
        let files = paths
            .iter()
            .filter_map(|path| {
                let content = std::fs::read_to_string(path).ok()?;
                let absolute = match &cwd {
                    Some(cwd) if path.is_relative() => cwd.join(path),
                    _ => path.clone(),
                };
                Some(SourceFile {
                    name: absolute.display().to_string(),
                    path: Some(absolute),
                    content,
                })
            })
            .collect();
        Self { files }
    }

    /// A single inline document.
    pub fn inline(content: &str) -> Self {
        Self {
            files: vec![SourceFile {
                name: "<inline>".to_string(),
                path: None,
                content: content.to_string(),
            }],
        }
    }

    fn by_path(&self, path: &Path) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.path.as_deref() == Some(path))
    }

    fn inline_file(&self) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.path.is_none())
    }

    /// The document a figment error came from. Errors raised by the
    /// environment provider have no document.
    fn origin(&self, error: &figment::Error) -> Option<&SourceFile> {
        let metadata = error.metadata.as_ref()?;
        match &metadata.source {
            Some(figment::Source::File(path)) => self.by_path(path),
            None if metadata.name.ends_with("source string") => self.inline_file(),
            _ => None,
        }
    }

    fn locate_effective(&self, section: &str, field: &str) -> Option<(&SourceFile, SourceSpan)> {
        self.files
            .iter()
            .rev()
            .find_map(|file| file.locate(section, field).map(|span| (file, span)))
    }
}

/// Converts figment's load errors into diagnostics with spans and hints.
pub fn figment_to_config_errors(err: figment::Error, sources: &ConfigSources) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let path: Vec<String> = error.path.iter().map(|s| s.to_string()).collect();
            let origin = sources.origin(&error);

            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    // The path ends with the unknown key itself.
                    let section = match path.as_slice() {
                        [section, _] => section.as_str(),
                        _ => "",
                    };
                    let span = origin.and_then(|f| f.locate(section, field));
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        section: if section.is_empty() {
                            "the top level".to_string()
                        } else {
                            format!("[{section}]")
                        },
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src: span.and(origin).map(SourceFile::named),
                    }
                }
                Kind::InvalidType(actual, expected) => {
                    let span = match path.as_slice() {
                        [section, field] => origin.and_then(|f| f.locate(section, field)),
                        _ => None,
                    };
                    ConfigError::InvalidType {
                        key: path.join("."),
                        detail: format!("is {actual}"),
                        expected: expected.to_string(),
                        span,
                        src: span.and(origin).map(SourceFile::named),
                    }
                }
                _ => ConfigError::Load(error.to_string()),
            }
        })
        .collect()
}

/// Byte offset of `field` as a key line inside the `[section]` table.
///
/// The search stops at the next table header so a key of the same name in a
/// later section is not matched. An empty `section` searches the top level.
pub fn find_key_offset(content: &str, section: &str, field: &str) -> Option<usize> {
    let mut in_section = section.is_empty();
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            if in_section && !section.is_empty() {
                return None;
            }
            in_section = trimmed.trim_end().strip_prefix('[').and_then(|h| h.strip_suffix(']'))
                == Some(section);
        } else if in_section
            && let Some(after) = trimmed.strip_prefix(field)
            && after.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// Closest valid key by Jaro-Winkler similarity, above the threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Renders each error to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
[storage]
database_path = \"q.db\"

[sync]
write_timeout_secs = 0
reconnect_delay_ms = 5

[remote]
base_url = \"ftp://example.com\"
";

    #[test]
    fn suggests_nearby_sync_key() {
        let valid = &["reconnect_delay_ms", "write_timeout_secs", "drain_on_startup"];
        assert_eq!(
            suggest_key("write_timout_secs", valid),
            Some("write_timeout_secs".to_string())
        );
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn env_var_names_follow_loader_mapping() {
        assert_eq!(env_var_name("sync.write_timeout_secs"), "WISER_SYNC_WRITE_TIMEOUT_SECS");
        assert_eq!(env_var_name("remote.base_url"), "WISER_REMOTE_BASE_URL");
    }

    #[test]
    fn key_offset_is_scoped_to_its_section() {
        let o = find_key_offset(SAMPLE, "sync", "write_timeout_secs").unwrap();
        assert!(SAMPLE[o..].starts_with("write_timeout_secs = 0"));

        assert!(find_key_offset(SAMPLE, "storage", "write_timeout_secs").is_none());
        assert!(find_key_offset(SAMPLE, "client", "log_level").is_none());
        // `reconnect_delay_ms` is not a prefix match for `reconnect_delay`.
        assert!(find_key_offset(SAMPLE, "sync", "reconnect_delay").is_none());
    }

    #[test]
    fn validation_error_points_at_base_url() {
        let error = ConfigError::invalid_value("remote.base_url", "must be an http(s) URL", "use https://<project>.supabase.co")
            .located(&ConfigSources::inline(SAMPLE));

        let ConfigError::InvalidValue { span, src, hint, .. } = &error else {
            panic!("unexpected variant: {error:?}");
        };
        let span = span.expect("span for base_url");
        assert!(SAMPLE[span.offset()..].starts_with("base_url"));
        assert!(src.is_some());
        assert!(hint.contains("WISER_REMOTE_BASE_URL"));
    }

    #[test]
    fn later_file_wins_when_locating() {
        let sources = ConfigSources {
            files: vec![
                SourceFile {
                    name: "/etc/wiser/wiser.toml".to_string(),
                    path: Some(PathBuf::from("/etc/wiser/wiser.toml")),
                    content: "[sync]\nwrite_timeout_secs = 5\n".to_string(),
                },
                SourceFile {
                    name: "./wiser.toml".to_string(),
                    path: Some(PathBuf::from("./wiser.toml")),
                    content: "[sync]\nwrite_timeout_secs = 0\n".to_string(),
                },
            ],
        };
        let (file, _) = sources.locate_effective("sync", "write_timeout_secs").unwrap();
        assert_eq!(file.name, "./wiser.toml");
    }

    #[test]
    fn value_only_from_env_has_no_span() {
        let error = ConfigError::invalid_value("sync.write_timeout_secs", "must be greater than 0", "the default is 10")
            .located(&ConfigSources::inline("[client]\nlog_level = \"info\"\n"));
        assert!(matches!(error, ConfigError::InvalidValue { span: None, src: None, .. }));
        assert_eq!(error.key(), Some("sync.write_timeout_secs"));
    }
}
