//! Grapheme-aware length limits.
//!
//! Lengths are measured in user-perceived characters (extended grapheme
//! clusters), so an emoji sequence or a letter with combining accents
//! counts once and is never split.

use unicode_segmentation::UnicodeSegmentation;

use crate::sanitize::trim_end_non_alphanumeric;

/// Number of grapheme clusters in `name`.
pub fn grapheme_len(name: &str) -> usize {
	name.graphemes(true).count()
}

/// Truncate `name` to at most `max_length` grapheme clusters.
///
/// Clusters are appended while the cumulative length stays within the limit.
pub fn truncate(name: &str, max_length: usize) -> String {
	let mut result = String::with_capacity(name.len());
	let mut length = 0;

	for cluster in name.graphemes(true) {
		if length + 1 > max_length {
			break;
		}
		result.push_str(cluster);
		length += 1;
	}

	result
}

/// Truncate a name for use as a base, dropping any separators left dangling
/// at the cut. Names already within the limit are returned unchanged.
pub fn truncate_name(name: &str, max_length: usize) -> String {
	if grapheme_len(name) <= max_length {
		return name.to_string();
	}

	let truncated = truncate(name, max_length);
	trim_end_non_alphanumeric(&truncated).to_string()
}

/// Shorten a name by `chars` grapheme clusters.
pub fn truncate_by(name: &str, chars: usize) -> String {
	truncate_name(name, grapheme_len(name).saturating_sub(chars))
}
