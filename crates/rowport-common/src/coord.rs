//! Column-letter helpers.
//!
//! Columns are 1-based everywhere in rowport (`A` = 1, `Z` = 26, `AA` = 27),
//! matching how the remote grid stores number rows and columns in A1 notation.

/// Largest column index any supported store exposes (`XFD`).
pub const COL_MAX: u32 = 16_384;

/// Render a 1-based column index as A1 letters.
///
/// Returns `None` for column 0, which has no A1 representation.
pub fn column_to_letters(col: u32) -> Option<String> {
    if col == 0 {
        return None;
    }
    let mut rem = col - 1;
    let mut buf = Vec::new();
    loop {
        buf.push(b'A' + (rem % 26) as u8);
        rem /= 26;
        if rem == 0 {
            break;
        }
        rem -= 1;
    }
    buf.reverse();
    String::from_utf8(buf).ok()
}

/// Parse A1 column letters into a 1-based index. Letters must be uppercase.
pub fn letters_to_column(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for ch in s.bytes() {
        if !ch.is_ascii_uppercase() {
            return None;
        }
        col = col.checked_mul(26)?;
        col = col.checked_add((ch - b'A') as u32 + 1)?;
    }
    Some(col)
}
