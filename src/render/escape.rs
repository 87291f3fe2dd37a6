const SAFE_CHARS: &[u8] = b"!()*,-./:_~";

/// URL-escapes a string for macro substitution. Alphanumerics and the
/// protocol's safe set pass through, a space becomes `+`, every other
/// byte is percent-encoded.
pub fn escape_url(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for &byte in input.as_bytes() {
        if byte.is_ascii_alphanumeric() || SAFE_CHARS.contains(&byte) {
            out.push(byte as char);
        } else if byte == b' ' {
            out.push('+');
        } else {
            out.push('%');
            out.push_str(&format!("{byte:02X}"));
        }
    }
    out
}
