//! Recognising, adding and removing the busy marker on a channel name
//!
//! The marker is a trailing run of a separator character followed by a word, e.g. the
//! `__busy` in `5_help__busy`. Applying the marker always strips an existing one first,
//! so for any name `n`:
//!
//! ```text
//! apply(strip(apply(n))) == apply(n)
//! strip(apply(n)) == strip(n)
//! ```

use anyhow::{Result, anyhow};
use regex::Regex;

/// The canonical busy suffix and the pattern that recognises it
#[derive(Debug, Clone)]
pub struct BusyMarker {
    suffix: String,
    pattern: Regex,
}

impl BusyMarker {
    /// Build a marker from its canonical suffix
    ///
    /// The first character of the suffix is the separator and the remainder, with any
    /// further leading separators removed, is the marker word. `"__busy"` recognises
    /// `_busy`, `__busy`, `___busy` and so on at the end of a name.
    pub fn new(suffix: &str) -> Result<Self> {
        let separator = suffix
            .chars()
            .next()
            .ok_or_else(|| anyhow!("Busy suffix must not be empty"))?;
        let word = suffix.trim_start_matches(separator);

        if word.is_empty() {
            return Err(anyhow!(
                "Busy suffix {:?} needs a word after the separator",
                suffix
            ));
        }

        let pattern = Regex::new(&format!(
            "(?:{})+{}$",
            regex::escape(&separator.to_string()),
            regex::escape(word)
        ))?;

        Ok(BusyMarker {
            suffix: suffix.to_string(),
            pattern,
        })
    }

    /// Byte offset where the marker starts, if the name carries one
    ///
    /// A name made of nothing but the marker is not considered marked, stripping it would
    /// leave an empty name.
    fn marker_start(&self, name: &str) -> Option<usize> {
        self.pattern
            .find(name)
            .map(|found| found.start())
            .filter(|start| *start > 0)
    }

    /// Whether the name currently ends with the busy marker
    pub fn is_marked(&self, name: &str) -> bool {
        self.marker_start(name).is_some()
    }

    /// Remove a trailing busy marker, leaving the rest of the name untouched
    pub fn strip<'a>(&self, name: &'a str) -> &'a str {
        match self.marker_start(name) {
            Some(start) => &name[..start],
            None => name,
        }
    }

    /// Add the canonical busy suffix, replacing any marker already present
    pub fn apply(&self, name: &str) -> String {
        format!("{}{}", self.strip(name), self.suffix)
    }
}
