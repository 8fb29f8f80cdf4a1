use std::borrow::Cow;

use crate::error::Error;

/// Expand the predefined entities and character references in text or an
/// attribute value.
///
/// Borrows the input when there is nothing to expand.
pub(crate) fn parse_references(content: Cow<str>) -> Result<Cow<str>, Error> {
    if !content.contains('&') {
        return Ok(content);
    }
    let mut result = String::with_capacity(content.len());
    let mut rest: &str = &content;
    while let Some(start) = rest.find('&') {
        result.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find(';')
            .ok_or_else(|| Error::UnclosedEntity(after.to_string()))?;
        result.push(resolve_reference(&after[..end])?);
        rest = &after[end + 1..];
    }
    result.push_str(rest);
    Ok(result.into())
}

fn resolve_reference(reference: &str) -> Result<char, Error> {
    let c = match reference {
        "amp" => '&',
        "apos" => '\'',
        "gt" => '>',
        "lt" => '<',
        "quot" => '"',
        _ => {
            let code = if let Some(hex) = reference.strip_prefix("#x") {
                u32::from_str_radix(hex, 16).ok()
            } else if let Some(decimal) = reference.strip_prefix('#') {
                decimal.parse::<u32>().ok()
            } else {
                None
            };
            return code
                .and_then(char::from_u32)
                .filter(|c| *c != '\0')
                .ok_or_else(|| Error::InvalidEntity(reference.to_string()));
        }
    };
    Ok(c)
}

/// Escape text content for output.
pub(crate) fn serialize_text(content: &str) -> Cow<str> {
    escape(content, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        // keep a carriage return from being normalized away on reparse
        '\r' => Some("&#13;"),
        _ => None,
    })
}

/// Escape an attribute value for output between double quotes.
pub(crate) fn serialize_attribute(content: &str) -> Cow<str> {
    escape(content, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '"' => Some("&quot;"),
        '\t' => Some("&#9;"),
        '\n' => Some("&#10;"),
        '\r' => Some("&#13;"),
        _ => None,
    })
}

fn escape(content: &str, replacement: impl Fn(char) -> Option<&'static str>) -> Cow<str> {
    if !content.chars().any(|c| replacement(c).is_some()) {
        return Cow::Borrowed(content);
    }
    let mut result = String::with_capacity(content.len() + 8);
    for c in content.chars() {
        match replacement(c) {
            Some(escaped) => result.push_str(escaped),
            None => result.push(c),
        }
    }
    Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_predefined() {
        let text = "&amp;&apos;&gt;&lt;&quot;";
        assert_eq!(parse_references(text.into()).unwrap(), "&'><\"");
    }

    #[test]
    fn test_parse_character_references() {
        let text = "h&#233;llo &#x263A;";
        assert_eq!(parse_references(text.into()).unwrap(), "héllo ☺");
    }

    #[test]
    fn test_parse_unknown_entity() {
        let err = parse_references("&unknown;".into());
        if let Err(Error::InvalidEntity(entity)) = err {
            assert_eq!(entity, "unknown");
        } else {
            unreachable!();
        }
    }

    #[test]
    fn test_parse_invalid_character_reference() {
        assert!(matches!(
            parse_references("&#xD800;".into()),
            Err(Error::InvalidEntity(_))
        ));
        assert!(matches!(
            parse_references("&#0;".into()),
            Err(Error::InvalidEntity(_))
        ));
    }

    #[test]
    fn test_parse_unfinished_entity() {
        let err = parse_references("&amp".into());
        if let Err(Error::UnclosedEntity(entity)) = err {
            assert_eq!(entity, "amp");
        } else {
            unreachable!();
        }
    }

    #[test]
    fn test_parse_no_entities() {
        let text = "hello";
        let result = parse_references(text.into()).unwrap();
        // this is the same slice
        assert!(std::ptr::eq(text, result.as_ref()));
    }

    #[test]
    fn test_serialize_text() {
        assert_eq!(serialize_text("A & <B> \"q\""), "A &amp; &lt;B&gt; \"q\"");
    }

    #[test]
    fn test_serialize_attribute() {
        assert_eq!(
            serialize_attribute("a<\"b\">\n"),
            "a&lt;&quot;b&quot;>&#10;"
        );
    }

    #[test]
    fn test_serialize_no_entities() {
        let text = "hello";
        let result = serialize_text(text);
        assert!(std::ptr::eq(text, result.as_ref()));
    }
}
