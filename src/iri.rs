//! Turning IRI references into URI references.
use std::borrow::Cow;
use std::fmt::Write;

/// Whether an octet may appear unescaped in a URI reference.
///
/// `%` is allowed so that references that are already escaped stay as
/// they are.
fn is_allowed(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || b"!#$%&'()*+,-./:;=?@_~".contains(&byte)
}

/// Percent-encode every octet of the UTF-8 form of `iri` that isn't allowed
/// in a URI reference, as `%HH` with uppercase hex digits.
///
/// ```rust
/// assert_eq!(xtree::iri_to_uri("a b/é.xml"), "a%20b/%C3%A9.xml");
/// ```
pub fn iri_to_uri(iri: &str) -> Cow<str> {
    if iri.bytes().all(is_allowed) {
        return Cow::Borrowed(iri);
    }
    let mut uri = String::with_capacity(iri.len() + 8);
    for byte in iri.bytes() {
        if is_allowed(byte) {
            uri.push(char::from(byte));
        } else {
            // writing to a String can't fail
            let _ = write!(uri, "%{:02X}", byte);
        }
    }
    Cow::Owned(uri)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("simple.xml", "simple.xml")]
    #[case("with space.xml", "with%20space.xml")]
    #[case("http://example.com/a?b=c#d", "http://example.com/a?b=c#d")]
    #[case("<>\"{}|\\^`", "%3C%3E%22%7B%7D%7C%5C%5E%60")]
    #[case("tab\there", "tab%09here")]
    #[case("日本", "%E6%97%A5%E6%9C%AC")]
    #[case("already%20escaped", "already%20escaped")]
    #[case("[::1]", "%5B::1%5D")]
    fn test_iri_to_uri(#[case] iri: &str, #[case] expected: &str) {
        assert_eq!(iri_to_uri(iri), expected);
    }

    proptest! {
        #[test]
        fn test_escaped_is_ascii_and_allowed(iri in "\\PC*") {
            let uri = iri_to_uri(&iri);
            prop_assert!(uri.bytes().all(is_allowed));
        }

        #[test]
        fn test_allowed_iri_unchanged(iri in "[A-Za-z0-9!#$%&'()*+,\\-./:;=?@_~]*") {
            prop_assert_eq!(iri_to_uri(&iri), iri.as_str());
        }

        #[test]
        fn test_escaping_is_idempotent(iri in "\\PC*") {
            let once = iri_to_uri(&iri).into_owned();
            let twice = iri_to_uri(&once);
            prop_assert_eq!(twice, once.as_str());
        }
    }
}
