use url::Url;

/// Settings that influence how documents are decoded and how includes are
/// resolved.
///
/// These are fixed when an [`XIncluder`](crate::XIncluder) is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Decode `ISO-8859-1` and `US-ASCII` the way browsers do, as
    /// `windows-1252`, instead of the strict byte to code point mapping.
    pub legacy_encoding_workarounds: bool,
    /// Add `xml:base` to top-level included elements so their base URI
    /// survives being moved into another document.
    pub fixup_base_uris: bool,
    /// Add `xml:lang` to top-level included elements when their language
    /// differs from the including context.
    pub fixup_language: bool,
    /// Base URI to use for documents that don't carry one themselves.
    pub base_uri: Option<Url>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            legacy_encoding_workarounds: false,
            fixup_base_uris: true,
            fixup_language: true,
            base_uri: None,
        }
    }
}
