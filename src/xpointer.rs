//! Evaluation of XPointer shorthand pointers and the `element()` scheme.
//!
//! ```rust
//! let mut dom = xtree::Dom::new();
//! let root = dom.parse_str(r#"<r><a xml:id="x"><b/><c/></a></r>"#).unwrap();
//! let found = xtree::resolve_pointer(&dom, root, "element(x/2)").unwrap();
//! assert_eq!(dom.local_name(found[0]), Some("c"));
//! ```
use tracing::trace;

use crate::dom::{Dom, Node};

/// Failure to evaluate a pointer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum XPointerError {
    /// The pointer isn't well formed, or uses no scheme we support.
    #[error("XPointer syntax error: {0}")]
    Syntax(String),
    /// The pointer is well formed but doesn't identify any node.
    #[error("XPointer identifies no node: {0}")]
    Resource(String),
}

/// A parsed `element()` scheme datum.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ElementPointer {
    /// Start at the element with this ID; at the document element if absent.
    id: Option<String>,
    /// 1-based element child positions to walk from the start.
    steps: Vec<i64>,
}

/// Resolve `pointer` against the document rooted at `document`.
///
/// A shorthand pointer selects the first element in document order with an
/// ID-typed attribute equal to it. Otherwise the pointer is a sequence of
/// scheme parts; only `element()` parts are evaluated and the first one that
/// selects a node wins.
pub fn resolve_pointer(
    dom: &Dom,
    document: Node,
    pointer: &str,
) -> Result<Vec<Node>, XPointerError> {
    let decoded = percent_decode(pointer)?;
    trace!(pointer = %decoded, "resolving pointer");

    if is_nc_name(&decoded) {
        return find_by_id(dom, document, &decoded)
            .map(|node| vec![node])
            .ok_or_else(|| XPointerError::Resource(decoded.clone()));
    }

    let element_pointers = parse_scheme_parts(&decoded)?
        .into_iter()
        .filter(|(scheme, _)| scheme == "element")
        .map(|(_, data)| parse_element_data(&data))
        .collect::<Result<Vec<_>, _>>()?;
    if element_pointers.is_empty() {
        return Err(XPointerError::Syntax(format!(
            "no supported scheme in {}",
            decoded
        )));
    }
    element_pointers
        .iter()
        .find_map(|element_pointer| evaluate(dom, document, element_pointer))
        .map(|node| vec![node])
        .ok_or(XPointerError::Resource(decoded))
}

fn evaluate(dom: &Dom, document: Node, pointer: &ElementPointer) -> Option<Node> {
    let start = match &pointer.id {
        Some(id) => find_by_id(dom, document, id)?,
        None => dom.document_element(document).ok()?,
    };
    pointer.steps.iter().try_fold(start, |current, step| {
        let index = usize::try_from(*step).ok()?.checked_sub(1)?;
        dom.element_children(current).nth(index)
    })
}

/// First element in document order carrying an ID-typed attribute whose
/// trimmed value is `id`.
fn find_by_id(dom: &Dom, document: Node, id: &str) -> Option<Node> {
    dom.descendants(document).find(|node| {
        dom.element(*node)
            .map(|element| element.ids().any(|value| value.trim() == id))
            .unwrap_or(false)
    })
}

/// Split a scheme-based pointer into `(scheme name, unescaped data)` parts.
fn parse_scheme_parts(pointer: &str) -> Result<Vec<(String, String)>, XPointerError> {
    let mut parts = Vec::new();
    let mut chars = pointer.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }
        let mut scheme = String::new();
        while let Some(c) = chars.next_if(|c| *c != '(') {
            scheme.push(c);
        }
        if chars.next().is_none() || !is_scheme_name(&scheme) {
            return Err(XPointerError::Syntax(format!(
                "expected scheme(data) in {}",
                pointer
            )));
        }
        let mut data = String::new();
        let mut depth = 1;
        loop {
            match chars.next() {
                Some('^') => match chars.next() {
                    Some(c @ ('^' | '(' | ')')) => data.push(c),
                    _ => {
                        return Err(XPointerError::Syntax(format!(
                            "illegal escape in {}",
                            pointer
                        )))
                    }
                },
                Some('(') => {
                    depth += 1;
                    data.push('(');
                }
                Some(')') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    data.push(')');
                }
                Some(c) => data.push(c),
                None => {
                    return Err(XPointerError::Syntax(format!(
                        "unbalanced parentheses in {}",
                        pointer
                    )))
                }
            }
        }
        parts.push((scheme, data));
    }
    Ok(parts)
}

fn parse_element_data(data: &str) -> Result<ElementPointer, XPointerError> {
    let syntax = || XPointerError::Syntax(format!("illegal element() data: {}", data));
    let (id, tumbler) = match data.find('/') {
        None => (Some(data), None),
        Some(0) => (None, Some(data)),
        Some(slash) => (Some(&data[..slash]), Some(&data[slash..])),
    };
    if let Some(id) = id {
        if !is_nc_name(id) {
            return Err(syntax());
        }
    }
    let steps = match tumbler {
        Some(tumbler) => tumbler[1..]
            .split('/')
            .map(|step| step.parse::<i64>().map_err(|_| syntax()))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };
    Ok(ElementPointer {
        id: id.map(str::to_string),
        steps,
    })
}

/// Decode `%HH` escapes of UTF-8 bytes.
fn percent_decode(pointer: &str) -> Result<String, XPointerError> {
    if !pointer.contains('%') {
        return Ok(pointer.to_string());
    }
    let bytes = pointer.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| {
                    XPointerError::Syntax(format!("malformed escape in {}", pointer))
                })?;
            decoded.push(byte);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded)
        .map_err(|_| XPointerError::Syntax(format!("escapes aren't UTF-8 in {}", pointer)))
}

fn is_scheme_name(name: &str) -> bool {
    match name.split_once(':') {
        Some((prefix, local)) => is_nc_name(prefix) && is_nc_name(local),
        None => is_nc_name(name),
    }
}

pub(crate) fn is_nc_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if is_name_start_char(c) => chars.all(is_name_char),
        _ => false,
    }
}

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        'A'..='Z' | '_' | 'a'..='z' |
        '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}' |
        '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' |
        '\u{200C}'..='\u{200D}' | '\u{2070}'..='\u{218F}' |
        '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' |
        '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' |
        '\u{10000}'..='\u{EFFFF}'
    )
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' |
            '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}
