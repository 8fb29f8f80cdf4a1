//! Guessing the encoding of a resource from its first bytes.
use std::io::{Read, Seek, SeekFrom};

use tracing::trace;

use crate::encoding::CP037;

/// Bytes looked at for an ASCII-compatible encoding declaration.
const DECLARATION_WINDOW: usize = 1024;

/// Bytes read after the `<?xm` signature of an EBCDIC declaration.
const EBCDIC_DECLARATION_TAIL: usize = 1016;

const DEFAULT_ENCODING: &str = "UTF-8";

/// Guess the encoding of the stream, returning the encoding name.
///
/// A byte order mark is consumed: the stream is left positioned just past
/// it. In every other case the stream is rewound to where it started, so
/// that an XML or text declaration is still part of the content.
///
/// This never fails. I/O errors and malformed declarations give `UTF-8`.
pub fn sniff<R: Read + Seek>(reader: &mut R) -> String {
    let Ok(start) = reader.stream_position() else {
        return DEFAULT_ENCODING.to_string();
    };
    let encoding = sniff_from(reader, start).unwrap_or_else(|| {
        rewind(reader, start, 0);
        DEFAULT_ENCODING.to_string()
    });
    trace!(encoding = %encoding, "sniffed encoding");
    encoding
}

fn sniff_from<R: Read + Seek>(reader: &mut R, start: u64) -> Option<String> {
    let mut head = [0u8; 4];
    let len = read_up_to(reader, &mut head).ok()?;
    let head = &head[..len];

    let (encoding, consumed) = match head {
        // UTF-32LE is tested first as its BOM starts with the UTF-16LE one
        [0xFF, 0xFE, 0x00, 0x00] => ("UTF-32LE", 4),
        [0xFE, 0xFF, ..] => ("UTF-16BE", 2),
        [0xFF, 0xFE, ..] => ("UTF-16LE", 2),
        [0xEF, 0xBB, 0xBF, ..] => ("UTF-8", 3),
        [0x00, 0x00, 0xFE, 0xFF] => ("UTF-32BE", 4),
        [0x00, 0x00, 0x00, 0x3C] => ("UTF-32BE", 0),
        [0x3C, 0x00, 0x00, 0x00] => ("UTF-32LE", 0),
        [0x00, 0x3C, 0x00, 0x3F] => ("UTF-16BE", 0),
        [0x3C, 0x00, 0x3F, 0x00] => ("UTF-16LE", 0),
        [b'<', b'?', b'x', b'm'] => {
            let tail = DECLARATION_WINDOW - head.len();
            let declared = read_declared_encoding(reader, head, tail, char::from);
            rewind(reader, start, 0);
            return Some(declared.unwrap_or_else(|| DEFAULT_ENCODING.to_string()));
        }
        // `<?xm` in EBCDIC
        [0x4C, 0x6F, 0xA7, 0x94] => {
            let declared = read_declared_encoding(reader, head, EBCDIC_DECLARATION_TAIL, |b| {
                char::from(CP037[b as usize])
            });
            rewind(reader, start, 0);
            return Some(declared.unwrap_or_else(|| DEFAULT_ENCODING.to_string()));
        }
        _ => (DEFAULT_ENCODING, 0),
    };
    rewind(reader, start, consumed);
    Some(encoding.to_string())
}

/// Read up to `tail` bytes after `head` and look for the encoding
/// pseudo-attribute in them.
fn read_declared_encoding<R: Read>(
    reader: &mut R,
    head: &[u8],
    tail: usize,
    to_char: impl Fn(u8) -> char,
) -> Option<String> {
    let mut window = vec![0u8; tail];
    let len = read_up_to(reader, &mut window).ok()?;
    let text: String = head
        .iter()
        .chain(window[..len].iter())
        .map(|b| to_char(*b))
        .collect();
    find_encoding_declaration(&text)
}

/// Find the value of `encoding="..."` in an XML or text declaration.
pub(crate) fn find_encoding_declaration(text: &str) -> Option<String> {
    let declaration = &text[..text.find("?>").unwrap_or(text.len())];
    let after = &declaration[declaration.find("encoding")? + "encoding".len()..];
    let after = after.trim_start_matches(is_xml_space).strip_prefix('=')?;
    let after = after.trim_start_matches(is_xml_space);
    let quote = after.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &after[1..];
    let end = value.find(quote)?;
    let value = &value[..end];
    (!value.is_empty()).then(|| value.to_string())
}

fn is_xml_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Like `read_exact`, but a short stream isn't an error.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn rewind<R: Seek>(reader: &mut R, start: u64, offset: u64) {
    // a stream that can't seek back breaks the contract of `sniff`; the
    // position is then left wherever the failed seek put it
    let _ = reader.seek(SeekFrom::Start(start + offset));
}
