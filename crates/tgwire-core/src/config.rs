use std::{env, str::FromStr};

use crate::{errors::Error, Result};

/// How the decoder reacts to issues.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DecodeMode {
    /// The first issue of any kind aborts the decode.
    #[default]
    Strict,
    /// Keep going: collect errors, salvage optional fields, downgrade soft issues to warnings.
    BestEffort,
}

impl FromStr for DecodeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(DecodeMode::Strict),
            "best_effort" | "best-effort" | "besteffort" | "lenient" => Ok(DecodeMode::BestEffort),
            other => Err(Error::Config(format!(
                "unknown decode mode {other:?} (expected \"strict\" or \"best_effort\")"
            ))),
        }
    }
}

/// Typed decoder configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeOptions {
    pub mode: DecodeMode,
    /// Best-effort mode stops collecting after this many errors (minimum 1).
    pub max_errors: usize,
    /// Max characters of offending JSON kept in each issue.
    pub preview_len: usize,
}

pub const DEFAULT_MAX_ERRORS: usize = 16;
pub const DEFAULT_PREVIEW_LEN: usize = 64;

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            mode: DecodeMode::Strict,
            max_errors: DEFAULT_MAX_ERRORS,
            preview_len: DEFAULT_PREVIEW_LEN,
        }
    }
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self::default()
    }

    pub fn best_effort() -> Self {
        Self {
            mode: DecodeMode::BestEffort,
            ..Self::default()
        }
    }

    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors.max(1);
        self
    }

    pub fn with_preview_len(mut self, preview_len: usize) -> Self {
        self.preview_len = preview_len;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.mode == DecodeMode::Strict
    }

    /// Load from `TGWIRE_DECODE_MODE`, `TGWIRE_MAX_ERRORS` and `TGWIRE_PREVIEW_LEN`.
    ///
    /// Unset variables keep their defaults; an unknown mode is a config error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mode = match lookup("TGWIRE_DECODE_MODE").and_then(non_empty) {
            Some(raw) => raw.parse()?,
            None => DecodeMode::default(),
        };
        let max_errors = parse_usize(&lookup, "TGWIRE_MAX_ERRORS")?
            .unwrap_or(DEFAULT_MAX_ERRORS)
            .max(1);
        let preview_len =
            parse_usize(&lookup, "TGWIRE_PREVIEW_LEN")?.unwrap_or(DEFAULT_PREVIEW_LEN);

        Ok(Self {
            mode,
            max_errors,
            preview_len,
        })
    }
}

fn parse_usize(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<usize>> {
    let Some(raw) = lookup(key).and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<usize>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {raw:?}")))
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let opts = DecodeOptions::from_lookup(lookup(&[])).unwrap();
        assert_eq!(opts, DecodeOptions::default());
        assert!(opts.is_strict());
    }

    #[test]
    fn reads_all_keys() {
        let opts = DecodeOptions::from_lookup(lookup(&[
            ("TGWIRE_DECODE_MODE", "Best-Effort"),
            ("TGWIRE_MAX_ERRORS", "3"),
            ("TGWIRE_PREVIEW_LEN", " 20 "),
        ]))
        .unwrap();
        assert_eq!(opts.mode, DecodeMode::BestEffort);
        assert_eq!(opts.max_errors, 3);
        assert_eq!(opts.preview_len, 20);
    }

    #[test]
    fn zero_max_errors_is_clamped() {
        let opts = DecodeOptions::from_lookup(lookup(&[("TGWIRE_MAX_ERRORS", "0")])).unwrap();
        assert_eq!(opts.max_errors, 1);
        assert_eq!(DecodeOptions::best_effort().with_max_errors(0).max_errors, 1);
    }

    #[test]
    fn rejects_unknown_mode_and_bad_numbers() {
        let err = DecodeOptions::from_lookup(lookup(&[("TGWIRE_DECODE_MODE", "yolo")]));
        assert!(matches!(err, Err(Error::Config(_))));
        let err = DecodeOptions::from_lookup(lookup(&[("TGWIRE_MAX_ERRORS", "-1")]));
        assert!(matches!(err, Err(Error::Config(_))));
    }
}
