//! Output file name derivation.
//!
//! Names are a pure function of the original name and the active mode; the
//! payload is never inspected.

use serde::{Deserialize, Serialize};

/// How a mode derives output names from input names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputNaming {
    /// Keep the whole name and put `prefix` in front of it
    Prefix {
        /// Text placed before the original name
        prefix: String,
    },
    /// Strip the extension, then append `suffix` and `.extension`
    Suffix {
        /// Text placed after the stem
        suffix: String,
        /// New extension, without the dot
        extension: String,
    },
}

impl OutputNaming {
    /// `<prefix><name>`
    pub fn prefix(prefix: impl Into<String>) -> Self {
        OutputNaming::Prefix { prefix: prefix.into() }
    }

    /// `<stem>_converted.<extension>`
    pub fn converted(extension: impl Into<String>) -> Self {
        OutputNaming::Suffix {
            suffix: "_converted".to_string(),
            extension: extension.into(),
        }
    }

    /// Derive the output name for `original`
    ///
    /// # Example
    /// ```
    /// use snapimg_batch::OutputNaming;
    ///
    /// let naming = OutputNaming::converted("jpg");
    /// assert_eq!(naming.derive("holiday.png"), "holiday_converted.jpg");
    /// assert_eq!(naming.derive("holiday.png"), naming.derive("holiday.png"));
    /// ```
    pub fn derive(&self, original: &str) -> String {
        match self {
            OutputNaming::Prefix { prefix } => format!("{}{}", prefix, original),
            OutputNaming::Suffix { suffix, extension } => {
                format!("{}{}.{}", strip_extension(original), suffix, extension)
            }
        }
    }
}

/// Remove the last extension: a dot followed by at least one character that
/// is neither a dot nor a slash, at the end of the name.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() && !name[dot + 1..].contains('/') => &name[..dot],
        _ => name,
    }
}

/// Split a name into stem and extension (with its dot), e.g. for
/// disambiguating collisions.
pub fn split_extension(name: &str) -> (&str, &str) {
    let stem = strip_extension(name);
    (stem, &name[stem.len()..])
}
