//! Stored-filename generation and display-name recovery.
//!
//! Stored files are named `{prefix}_{sanitized original}` so that two uploads
//! of `cube.obj` never collide. Recovering a display name reverses this by
//! dropping everything up to the first `_`.

use uuid::Uuid;

use super::AssetClass;

/// Fallback stem when sanitizing leaves nothing usable.
const FALLBACK_STEM: &str = "asset";

/// Strip any directory components a client may have sent with the filename.
pub fn basename(name: &str) -> &str {
    name.rsplit(&['/', '\\'][..]).next().unwrap_or(name)
}

/// Lower-cased extension of `filename`, without the dot.
///
/// Returns `None` for names without a dot or ending in one, and for dotfiles
/// such as `.obj` whose only dot is the leading one.
pub fn extension_of(filename: &str) -> Option<String> {
    let name = basename(filename);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Filename without its final extension.
pub fn file_stem(filename: &str) -> &str {
    let name = basename(filename);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Reduce a client-supplied filename to a safe ASCII form.
///
/// Keeps ASCII alphanumerics, `.`, `-` and `_`; whitespace becomes `_`;
/// everything else is dropped. Leading dots and underscores are trimmed so the
/// result can never be hidden or escape the asset directory.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = basename(name)
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() => Some(c),
            '.' | '-' | '_' => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();

    cleaned.trim_start_matches(&['.', '_'][..]).to_string()
}

/// Build a collision-proof stored filename for an upload.
///
/// The `prefix` is rendered as 32 hex digits and joined to the sanitized
/// original name with `_`. If sanitizing strips the name down to nothing (or
/// loses the extension), a fallback stem with `ext` is used instead.
pub fn stored_filename(prefix: Uuid, original: &str, ext: &str) -> String {
    let sanitized = sanitize_filename(original);
    let keeps_ext = extension_of(&sanitized).is_some_and(|e| e == ext);
    let name = if keeps_ext {
        sanitized
    } else {
        let stem = file_stem(&sanitized);
        let stem = if stem.is_empty() { FALLBACK_STEM } else { stem };
        format!("{stem}.{ext}")
    };
    format!("{}_{name}", prefix.simple())
}

/// Recover a human-readable label from a stored filename.
///
/// Drops everything up to and including the first `_`, then the extension.
/// Names without a `_` (or with nothing after it) use their whole stem.
pub fn display_name_from_stored(filename: &str) -> String {
    let name = basename(filename);
    let unprefixed = match name.split_once('_') {
        Some((_, rest)) if !file_stem(rest).is_empty() && !rest.starts_with('.') => rest,
        _ => name,
    };
    file_stem(unprefixed).to_string()
}

/// Public URL for a stored file of the given class.
pub fn asset_url(class: AssetClass, stored_filename: &str) -> String {
    format!("{}/{stored_filename}", class.route_prefix())
}

/// Last non-empty path segment of an asset URL.
pub fn filename_from_url(url: &str) -> Option<&str> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
}
