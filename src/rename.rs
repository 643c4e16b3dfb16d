//! Filename construction. Pure string work; physical moves live in
//! [`fsops`](crate::fsops).

/// Inserts `_<revision>` before the filename extension, unless the stem
/// already ends with exactly that suffix. Names without an extension get the
/// suffix appended. Total and idempotent.
pub fn filename_with_revision(original: &str, revision: &str) -> String {
    let (stem, extension) = split_extension(original);
    let suffix = format!("_{revision}");
    if stem.ends_with(&suffix) {
        return original.to_string();
    }
    match extension {
        Some(ext) => format!("{stem}{suffix}.{ext}"),
        None => format!("{stem}{suffix}"),
    }
}

/// Substitutes the zero-padded 4-digit `sequence` for the `XXXX` placeholder.
/// A pattern without the placeholder is returned unchanged.
pub fn lot_name(pattern: &str, sequence: u32) -> String {
    pattern.replace("XXXX", &format!("{sequence:04}"))
}

/// Splits on the last dot, treating dotfiles ("`.gitignore`") and bare names
/// as extension-less.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}
