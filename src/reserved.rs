//! Reserved-name rules.
//!
//! Rules come from two sources: the mention keyword (e.g. `here`) and the
//! administrator's reserved-name list. List entries are either exact names
//! or wildcard patterns where `*` matches any run of characters. All rules
//! are folded (NFC + lowercase) once at construction.

use anyhow::{Context, Result};
use regex::RegexSet;
use std::collections::HashSet;

use crate::sanitize::fold_key;

/// Compiled reserved-name rules.
#[derive(Debug, Clone)]
pub struct ReservedRules {
	exact: HashSet<String>,
	wildcards: RegexSet,
	/// Patterns ending in `*`; appending a suffix never escapes these
	suffix_defeating: RegexSet,
}

/// Translate a folded wildcard pattern into an anchored regex.
fn wildcard_to_regex(pattern: &str) -> String {
	let body = pattern
		.split('*')
		.map(regex::escape)
		.collect::<Vec<_>>()
		.join(".*");
	format!("(?s)^{}$", body)
}

/// Split a `|`-separated reserved-name list into its entries.
pub fn parse_list(list: &str) -> Vec<String> {
	list.split('|')
		.map(|s| s.trim().to_string())
		.filter(|s| !s.is_empty())
		.collect()
}

impl ReservedRules {
	/// Compile the rules. Blank entries and a blank mention are ignored.
	pub fn new<S: AsRef<str>>(here_mention: &str, patterns: &[S]) -> Result<Self> {
		let mut exact = HashSet::new();
		let mut wildcards = Vec::new();
		let mut suffix_defeating = Vec::new();

		let mention = here_mention.trim();
		if !mention.is_empty() {
			exact.insert(fold_key(mention));
		}

		for pattern in patterns {
			let pattern = pattern.as_ref().trim();
			if pattern.is_empty() {
				continue;
			}

			let folded = fold_key(pattern);
			if folded.contains('*') {
				let regex = wildcard_to_regex(&folded);
				if folded.ends_with('*') {
					suffix_defeating.push(regex.clone());
				}
				wildcards.push(regex);
			} else {
				exact.insert(folded);
			}
		}

		Ok(Self {
			exact,
			wildcards: RegexSet::new(&wildcards).context("Failed to compile reserved patterns")?,
			suffix_defeating: RegexSet::new(&suffix_defeating)
				.context("Failed to compile reserved patterns")?,
		})
	}

	/// Whether a folded name is reserved by any rule.
	pub fn is_reserved(&self, name_lower: &str) -> bool {
		self.exact.contains(name_lower) || self.wildcards.is_match(name_lower)
	}

	/// Whether a folded name matches a trailing-wildcard pattern.
	pub fn matches_suffix_defeating(&self, name_lower: &str) -> bool {
		self.suffix_defeating.is_match(name_lower)
	}

	pub fn exact_count(&self) -> usize {
		self.exact.len()
	}

	pub fn wildcard_count(&self) -> usize {
		self.wildcards.len()
	}
}
