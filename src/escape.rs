//! JSON string escaping used for every key and value the layout writes.
//!
//! The escaping is stricter than RFC 8259 requires: `/` is escaped, and so
//! are the C1 control block (U+007F..=U+009F) and the whole U+2000..=U+20FF
//! block. Log shippers downstream of this layout expect exactly this output,
//! so the rules here must not be relaxed.

const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

/// Append `value` to `out`, escaped for use inside a JSON string literal.
///
/// Quotes are not written; see [`write_quoted`].
pub fn write_escaped(out: &mut String, value: &str) {
    // Runs of characters that need no escaping are copied in one go.
    let mut start = 0;
    for (idx, ch) in value.char_indices() {
        if !needs_escape(ch) {
            continue;
        }
        if start < idx {
            out.push_str(&value[start..idx]);
        }
        write_escaped_char(out, ch);
        start = idx + ch.len_utf8();
    }
    if start < value.len() {
        out.push_str(&value[start..]);
    }
}

/// Append `"value"` to `out` with `value` escaped.
pub fn write_quoted(out: &mut String, value: &str) {
    out.push('"');
    write_escaped(out, value);
    out.push('"');
}

/// Append a single escaped character.
pub fn write_escaped_char(out: &mut String, ch: char) {
    match ch {
        '"' => out.push_str("\\\""),
        '\\' => out.push_str("\\\\"),
        '/' => out.push_str("\\/"),
        '\u{08}' => out.push_str("\\b"),
        '\u{0C}' => out.push_str("\\f"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        ch if is_unicode_escaped(ch) => {
            let code = ch as u32;
            out.push_str("\\u");
            for shift in [12, 8, 4, 0] {
                out.push(HEX_CHARS[((code >> shift) & 0x0F) as usize] as char);
            }
        }
        ch => out.push(ch),
    }
}

#[inline]
fn needs_escape(ch: char) -> bool {
    matches!(ch, '"' | '\\' | '/') || is_unicode_escaped(ch)
}

#[inline]
fn is_unicode_escaped(ch: char) -> bool {
    matches!(ch, '\u{00}'..='\u{1F}' | '\u{7F}'..='\u{9F}' | '\u{2000}'..='\u{20FF}')
}
