//! Sanitization of raw user and group names.
//!
//! Maps arbitrary input onto the allowed identifier charset: Unicode
//! letters and numbers, combining marks, and `_`, `-`, `.`.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Names ending in one of these look like file paths.
static CONFUSING_EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\.(js|json|css|htm|html|xml|jpg|jpeg|png|gif|bmp|ico|tif|tiff|woff)$")
		.expect("confusing extension pattern is valid")
});

fn is_separator(c: char) -> bool {
	matches!(c, '_' | '-' | '.')
}

fn is_allowed(c: char) -> bool {
	c.is_alphanumeric() || is_combining_mark(c) || is_separator(c)
}

/// Fold a name into the key used for every comparison: NFC, then lowercase.
pub fn fold_key(name: &str) -> String {
	name.nfc().collect::<String>().to_lowercase()
}

/// Drop trailing grapheme clusters that do not start with an alphanumeric,
/// keeping combining marks attached to a trailing letter.
pub fn trim_end_non_alphanumeric(name: &str) -> &str {
	let mut end = name.len();
	for (idx, cluster) in name.grapheme_indices(true).rev() {
		if cluster.chars().next().is_some_and(char::is_alphanumeric) {
			break;
		}
		end = idx;
	}
	&name[..end]
}

/// Replace every disallowed character with `_`.
fn replace_invalid(content: &str) -> String {
	content
		.chars()
		.map(|c| if is_allowed(c) { c } else { '_' })
		.collect()
}

/// Collapse runs of two or more separators into a single `_`.
fn collapse_separators(content: &str) -> String {
	let mut result = String::with_capacity(content.len());
	let mut run = 0usize;

	for c in content.chars() {
		if !is_separator(c) {
			run = 0;
			result.push(c);
			continue;
		}

		run += 1;
		if run == 2 {
			result.pop();
			result.push('_');
		} else if run == 1 {
			result.push(c);
		}
	}

	result
}

/// Sanitize a raw name.
///
/// - NFC-normalizes the input
/// - Replaces disallowed characters with `_`
/// - Defuses trailing file extensions (`avatar.png` → `avatar_png`)
/// - Trims leading characters other than alphanumerics and `_`
/// - Trims trailing non-alphanumerics
/// - Collapses separator runs into a single `_`
///
/// Total over all inputs; the result may be empty.
pub fn sanitize(raw: &str) -> String {
	let normalized: String = raw.nfc().collect();
	let mut name = replace_invalid(&normalized);

	if let Some(m) = CONFUSING_EXTENSION.find(&name) {
		let start = m.start();
		name.replace_range(start..start + 1, "_");
	}

	let trimmed = name.trim_start_matches(|c: char| !(c.is_alphanumeric() || c == '_'));
	collapse_separators(trim_end_non_alphanumeric(trimmed))
}
