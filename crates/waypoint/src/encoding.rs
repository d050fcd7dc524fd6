//! Percent-encoding for path segments.

const HEX: &[u8; 16] = b"0123456789ABCDEF";

fn is_safe(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~' | b'/')
}

/// Percent-encodes everything except unreserved characters and `/`.
///
/// ```
/// use waypoint::encoding::quote;
///
/// assert_eq!(quote("a b/c"), "a%20b/c");
/// assert_eq!(quote("café"), "caf%C3%A9");
/// ```
pub fn quote(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for &byte in s.as_bytes() {
        if is_safe(byte) {
            result.push(byte as char);
        } else {
            result.push('%');
            result.push(HEX[usize::from(byte >> 4)] as char);
            result.push(HEX[usize::from(byte & 0x0f)] as char);
        }
    }
    result
}

/// Decodes `%XX` escapes. Malformed escapes are kept as they are.
pub fn unquote(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                decoded.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
