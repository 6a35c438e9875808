//! Input files, processed results and accepted media types.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A user-selected file. Immutable once created.
#[derive(Clone, PartialEq, Eq)]
pub struct InputFile {
    name: String,
    media_type: String,
    data: Arc<[u8]>,
}

impl InputFile {
    /// Create a file from its name, declared media type and payload
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    /// Original file name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared media type
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// File payload
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Payload size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl fmt::Debug for InputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Output of a successful transform.
#[derive(Clone)]
pub struct ProcessedResult {
    /// Derived output file name
    pub output_name: String,
    /// Media type of the output payload
    pub media_type: String,
    /// Output payload
    pub data: Vec<u8>,
    /// File this result was produced from
    pub source: InputFile,
}

impl ProcessedResult {
    /// Create a result for `source`
    pub fn new(source: &InputFile, output_name: impl Into<String>, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            output_name: output_name.into(),
            media_type: media_type.into(),
            data,
            source: source.clone(),
        }
    }

    /// Output size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl fmt::Debug for ProcessedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessedResult")
            .field("output_name", &self.output_name)
            .field("media_type", &self.media_type)
            .field("size", &self.data.len())
            .field("source", &self.source.name)
            .finish()
    }
}

/// Set of media types a pipeline run accepts.
///
/// Matching ignores case and any parameters after `;`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptList {
    types: BTreeSet<String>,
}

impl AcceptList {
    /// Build from media type strings
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            types: types.into_iter().map(|t| essence(t.as_ref())).collect(),
        }
    }

    /// Raster formats handled by every conversion mode
    pub fn images() -> Self {
        Self::new(["image/png", "image/webp", "image/gif", "image/jpeg"])
    }

    /// Whether `media_type` is accepted
    pub fn accepts(&self, media_type: &str) -> bool {
        self.types.contains(&essence(media_type))
    }

    /// Accepted types in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(String::as_str)
    }

    /// Number of accepted types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing is accepted
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_file_accessors() {
        let file = InputFile::new("a.png", "image/png", vec![1u8, 2, 3]);
        assert_eq!(file.name(), "a.png");
        assert_eq!(file.media_type(), "image/png");
        assert_eq!(file.size(), 3);
        assert_eq!(file.data(), &[1, 2, 3]);
    }

    #[test]
    fn test_result_shares_source_payload() {
        let file = InputFile::new("a.png", "image/png", vec![0u8; 16]);
        let result = ProcessedResult::new(&file, "a_converted.jpg", "image/jpeg", vec![9]);
        assert_eq!(result.source, file);
        assert_eq!(result.size(), 1);
    }

    #[test]
    fn test_accept_list_ignores_case_and_params() {
        let accept = AcceptList::new(["image/png", "IMAGE/JPEG"]);
        assert!(accept.accepts("image/png"));
        assert!(accept.accepts("Image/PNG; charset=binary"));
        assert!(accept.accepts("image/jpeg"));
        assert!(!accept.accepts("text/plain"));
        assert!(!accept.accepts(""));
    }

    #[test]
    fn test_images_accept_list() {
        let accept = AcceptList::images();
        assert_eq!(accept.len(), 4);
        assert!(accept.accepts("image/webp"));
        assert!(accept.accepts("image/gif"));
        assert!(!accept.accepts("image/bmp"));
    }
}
