//! Unique Name Resolution Library
//!
//! Maps incoming user and group names onto names that are unique across a
//! shared registry, fit a maximum length, contain only allowed characters
//! and avoid reserved names, while staying as close to the original as
//! possible.

pub mod config;
pub mod registry;
pub mod reserved;
pub mod sanitize;
pub mod snapshot;
pub mod suffix;
pub mod truncate;

use anyhow::{bail, Result};
use rayon::prelude::*;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

pub use registry::{InMemoryStore, NameSet, NameStore, UsedNameRegistry};
pub use reserved::ReservedRules;

use sanitize::{fold_key, sanitize};
use suffix::{SuffixCache, TruncationCache};
use truncate::{grapheme_len, truncate_by, truncate_name};

/// Which namespace a name is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
	Username,
	GroupName,
}

impl NameKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			NameKind::Username => "username",
			NameKind::GroupName => "group_name",
		}
	}
}

impl fmt::Display for NameKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Configuration for the resolution engine
#[derive(Debug, Clone)]
pub struct Config {
	/// Maximum name length in grapheme clusters (default: 60)
	pub max_length: usize,
	/// Probes allowed per suffix search (default: 500)
	pub max_attempts: usize,
	/// Base used when a username is unusable (default: user)
	pub fallback_username: String,
	/// Base used when a group name is unusable (default: group)
	pub fallback_group_name: String,
	/// Mention keyword that may never be used as a name (default: here)
	pub here_mention: String,
	/// Exact names and `*` wildcard patterns that are reserved
	pub reserved_names: Vec<String>,
	/// Bases whose last suffix is remembered; 0 disables (default: 1000)
	pub suffix_cache_size: usize,
	/// Bases whose truncation length is remembered; 0 disables (default: 500)
	pub truncation_cache_size: usize,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			max_length: 60,
			max_attempts: 500,
			fallback_username: "user".to_string(),
			fallback_group_name: "group".to_string(),
			here_mention: "here".to_string(),
			reserved_names: Vec::new(),
			suffix_cache_size: 1000,
			truncation_cache_size: 500,
		}
	}
}

/// A single name to resolve
#[derive(Debug, Clone)]
pub struct ResolutionRequest {
	pub kind: NameKind,
	pub raw: String,
	/// Accept reserved names (re-imported administrative accounts)
	pub allow_reserved: bool,
	/// Overrides the configured fallback base for this request
	pub fallback: Option<String>,
	/// Overrides the configured maximum length for this request
	pub max_length: Option<usize>,
}

impl ResolutionRequest {
	pub fn new(kind: NameKind, raw: impl Into<String>) -> Self {
		Self {
			kind,
			raw: raw.into(),
			allow_reserved: false,
			fallback: None,
			max_length: None,
		}
	}

	pub fn username(raw: impl Into<String>) -> Self {
		Self::new(NameKind::Username, raw)
	}

	pub fn group_name(raw: impl Into<String>) -> Self {
		Self::new(NameKind::GroupName, raw)
	}

	pub fn allow_reserved(mut self, allow: bool) -> Self {
		self.allow_reserved = allow;
		self
	}

	pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
		self.fallback = Some(fallback.into());
		self
	}

	pub fn with_max_length(mut self, max_length: usize) -> Self {
		self.max_length = Some(max_length);
		self
	}
}

/// Result of a resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
	/// Display form, keeping the sanitized input's case
	pub name: String,
	/// Folded form, as stored in the registry
	pub name_lower: String,
}

/// Counters describing the resolutions performed by one engine
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
	pub resolved: usize,
	pub unsuffixed: usize,
	pub suffixed: usize,
	pub fallback_used: usize,
	pub truncations: usize,
	pub probes: usize,
	pub exhausted: usize,
	/// Resolutions that could not claim any name; always 0 unless misconfigured
	pub unresolved: usize,
}

impl Stats {
	pub fn suffixed_percent(&self) -> f64 {
		if self.resolved == 0 {
			0.0
		} else {
			(self.suffixed as f64 / self.resolved as f64) * 100.0
		}
	}
}

/// Timing stats for profiling
#[derive(Debug, Default)]
pub struct TimingStats {
	pub sanitize: Duration,
	pub resolve: Duration,
}

/// Main resolution engine
pub struct UniqueNameFinder {
	config: Config,
	registry: UsedNameRegistry,
	reserved: ReservedRules,
	suffixes: SuffixCache,
	truncations: TruncationCache,
	/// Sanitized fallback bases
	fallback_username: String,
	fallback_group_name: String,
	stats: Stats,
	pub timing: TimingStats,
}

/// Number of characters in the decimal form of `n`.
fn digits(n: u64) -> usize {
	n.checked_ilog10().map_or(1, |d| d as usize + 1)
}

impl UniqueNameFinder {
	/// Build an engine over a shared registry, compiling the reserved rules.
	pub fn new(config: Config, registry: UsedNameRegistry) -> Result<Self> {
		let reserved = ReservedRules::new(&config.here_mention, &config.reserved_names)?;

		if config.max_attempts == 0 {
			bail!("max_attempts must be at least 1");
		}

		let fallback_username = sanitize(&config.fallback_username);
		let fallback_group_name = sanitize(&config.fallback_group_name);

		for (label, fallback) in [
			("fallback username", &fallback_username),
			("fallback group name", &fallback_group_name),
		] {
			if fallback.is_empty() {
				bail!("The {} is empty after sanitization", label);
			}

			let lower = fold_key(fallback);
			if reserved.is_reserved(&lower) || reserved.matches_suffix_defeating(&lower) {
				bail!("The {} '{}' is itself reserved", label, fallback);
			}

			// Room for the fallback plus `_1`
			let required = grapheme_len(fallback) + 2;
			if config.max_length < required {
				bail!(
					"max_length {} is too small for the {} '{}' (need at least {})",
					config.max_length,
					label,
					fallback,
					required
				);
			}
		}

		debug!(
			exact = reserved.exact_count(),
			wildcards = reserved.wildcard_count(),
			max_length = config.max_length,
			"name finder ready"
		);

		Ok(Self {
			suffixes: SuffixCache::new(config.suffix_cache_size),
			truncations: TruncationCache::new(config.truncation_cache_size),
			config,
			registry,
			reserved,
			fallback_username,
			fallback_group_name,
			stats: Stats::default(),
			timing: TimingStats::default(),
		})
	}

	/// Build an engine whose registry sets come from `store`.
	pub fn from_store(config: Config, store: &dyn NameStore) -> Result<Self> {
		Self::new(config, UsedNameRegistry::from_store(store))
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn registry(&self) -> &UsedNameRegistry {
		&self.registry
	}

	pub fn reserved(&self) -> &ReservedRules {
		&self.reserved
	}

	pub fn stats(&self) -> &Stats {
		&self.stats
	}

	/// Resolve a username and mark it as used.
	pub fn find_available_username(&mut self, raw: &str, allow_reserved: bool) -> String {
		let request = ResolutionRequest::username(raw).allow_reserved(allow_reserved);
		self.resolve(&request).name
	}

	/// Resolve a group name and mark it as used. Reserved names are never
	/// allowed for groups.
	pub fn find_available_group_name(&mut self, raw: &str) -> String {
		self.resolve(&ResolutionRequest::group_name(raw)).name
	}

	/// Resolve one request. Always returns a name; the folded form has been
	/// added to the registry by the time this returns.
	pub fn resolve(&mut self, request: &ResolutionRequest) -> ResolvedName {
		let t = Instant::now();
		let sanitized = sanitize(&request.raw);
		self.timing.sanitize += t.elapsed();

		self.resolve_sanitized(request, sanitized)
	}

	/// Resolve a batch of raw names of one kind, in input order.
	pub fn resolve_batch(
		&mut self,
		kind: NameKind,
		raws: &[String],
		allow_reserved: bool,
	) -> Vec<ResolvedName> {
		// Parallel: sanitization is pure
		let t = Instant::now();
		let sanitized: Vec<String> = raws.par_iter().map(|raw| sanitize(raw)).collect();
		self.timing.sanitize += t.elapsed();

		// Sequential: resolution order decides who gets the unsuffixed name
		raws.iter()
			.zip(sanitized)
			.map(|(raw, sanitized)| {
				let request = ResolutionRequest::new(kind, raw.as_str()).allow_reserved(allow_reserved);
				self.resolve_sanitized(&request, sanitized)
			})
			.collect()
	}

	/// The request's fallback override if it is usable, else the configured
	/// fallback for the kind. An override must survive sanitization and must
	/// not be reserved, or the last-resort scan could never claim a name.
	fn fallback_for(&self, request: &ResolutionRequest) -> String {
		if let Some(raw) = request.fallback.as_deref() {
			let fallback = sanitize(raw);
			let lower = fold_key(&fallback);
			if fallback.is_empty() {
				warn!(fallback = raw, "fallback override is empty after sanitization, ignoring it");
			} else if self.reserved.is_reserved(&lower) || self.reserved.matches_suffix_defeating(&lower) {
				warn!(%fallback, "fallback override is reserved, ignoring it");
			} else {
				return fallback;
			}
		}

		match request.kind {
			NameKind::Username => self.fallback_username.clone(),
			NameKind::GroupName => self.fallback_group_name.clone(),
		}
	}

	fn max_length_for(&self, request: &ResolutionRequest, fallback: &str) -> usize {
		let requested = request.max_length.unwrap_or(self.config.max_length);
		let required = grapheme_len(fallback) + 2;
		if requested < required {
			warn!(
				requested,
				required, "max_length too small for the fallback name, raising it"
			);
			return required;
		}
		requested
	}

	fn resolve_sanitized(&mut self, request: &ResolutionRequest, sanitized: String) -> ResolvedName {
		let t = Instant::now();
		let kind = request.kind;
		let allow_reserved = request.allow_reserved;
		let fallback = self.fallback_for(request);
		let max_length = self.max_length_for(request, &fallback);

		let mut used_fallback = false;
		let mut name = truncate_name(&sanitized, max_length);
		if name.is_empty() {
			debug!(raw = %request.raw, %fallback, "nothing usable left, using fallback");
			name = fallback.clone();
			used_fallback = true;
		}

		let mut name_lower = fold_key(&name);

		// Common case: the name is free as-is
		if self.try_claim(kind, &name_lower, allow_reserved) {
			self.stats.unsuffixed += 1;
			return self.finish(kind, ResolvedName { name, name_lower }, used_fallback, t);
		}

		// No suffix can escape a trailing wildcard
		if !allow_reserved && self.reserved.matches_suffix_defeating(&name_lower) {
			debug!(%name, %fallback, "name matches a trailing wildcard, using fallback");
			name = fallback.clone();
			name_lower = fold_key(&name);
			used_fallback = true;
		}

		if let Some(resolved) = self.find_name_with_suffix(kind, &name, allow_reserved, max_length) {
			return self.finish(kind, resolved, used_fallback, t);
		}

		self.stats.exhausted += 1;
		warn!(
			%kind,
			%name,
			attempts = self.config.max_attempts,
			"suffix search exhausted, using fallback"
		);

		if name_lower != fold_key(&fallback) {
			if let Some(resolved) =
				self.find_name_with_suffix(kind, &fallback, allow_reserved, max_length)
			{
				return self.finish(kind, resolved, true, t);
			}
			self.stats.exhausted += 1;
		}

		let resolved = self.scan_fallback(kind, &fallback, allow_reserved, max_length);
		self.finish(kind, resolved, true, t)
	}

	/// Reserved check plus atomic claim in the registry.
	fn try_claim(&self, kind: NameKind, name_lower: &str, allow_reserved: bool) -> bool {
		if !allow_reserved && self.reserved.is_reserved(name_lower) {
			return false;
		}
		self.registry.claim(kind, name_lower)
	}

	/// Search `name_1`, `name_2`, ... within the attempt budget, shortening
	/// the base whenever the suffix would not fit.
	fn find_name_with_suffix(
		&mut self,
		kind: NameKind,
		name: &str,
		allow_reserved: bool,
		max_length: usize,
	) -> Option<ResolvedName> {
		let original_lower = fold_key(name);
		let mut name = name.to_string();

		if let Some(length) = self.truncations.get(&original_lower) {
			name = truncate_name(&name, length);
			if name.is_empty() {
				return None;
			}
		}

		let mut name_lower = fold_key(&name);
		let mut suffix = self.suffixes.next_suffix(&name_lower);

		for _ in 0..self.config.max_attempts {
			self.stats.probes += 1;

			let length = grapheme_len(&name) + 1 + digits(suffix);
			if length > max_length {
				name = truncate_by(&name, length - max_length);
				if name.is_empty() {
					debug!(original = %original_lower, "base truncated away");
					return None;
				}

				// Counters are per base, so a shorter base starts its own
				self.stats.truncations += 1;
				name_lower = fold_key(&name);
				suffix = self.suffixes.next_suffix(&name_lower);
				continue;
			}

			let candidate_lower = format!("{}_{}", name_lower, suffix);
			if self.try_claim(kind, &candidate_lower, allow_reserved) {
				if name_lower != original_lower {
					self.truncations
						.record(&original_lower, grapheme_len(&name));
				}
				self.suffixes.record_suffix(&name_lower, suffix);
				self.stats.suffixed += 1;

				return Some(ResolvedName {
					name: format!("{}_{}", name, suffix),
					name_lower: candidate_lower,
				});
			}

			suffix += 1;
		}

		None
	}

	/// Last resort: linear scan over the fallback's suffixes, ignoring the
	/// caches. The registry is finite, so with a non-reserved fallback this
	/// finds a free name within `registry size + max_attempts + 1` probes.
	fn scan_fallback(
		&mut self,
		kind: NameKind,
		fallback: &str,
		allow_reserved: bool,
		max_length: usize,
	) -> ResolvedName {
		let fallback_lower = fold_key(fallback);
		let limit = (self.registry.len() + self.config.max_attempts + 1) as u64;
		let mut last = None;

		for suffix in 1..=limit {
			if grapheme_len(fallback) + 1 + digits(suffix) > max_length {
				break;
			}

			self.stats.probes += 1;
			let candidate = ResolvedName {
				name: format!("{}_{}", fallback, suffix),
				name_lower: format!("{}_{}", fallback_lower, suffix),
			};
			if self.try_claim(kind, &candidate.name_lower, allow_reserved) {
				self.suffixes.record_suffix(&fallback_lower, suffix);
				self.stats.suffixed += 1;
				return candidate;
			}
			last = Some(candidate);
		}

		self.stats.unresolved += 1;
		let resolved = last.unwrap_or_else(|| ResolvedName {
			name: fallback.to_string(),
			name_lower: fallback_lower,
		});
		error!(%kind, name = %resolved.name, "could not find a free name, returning it unclaimed");
		resolved
	}

	fn finish(
		&mut self,
		kind: NameKind,
		resolved: ResolvedName,
		used_fallback: bool,
		started: Instant,
	) -> ResolvedName {
		if used_fallback {
			self.stats.fallback_used += 1;
		}
		self.stats.resolved += 1;
		self.timing.resolve += started.elapsed();
		debug!(%kind, name = %resolved.name, "resolved");
		resolved
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	fn config() -> Config {
		Config {
			reserved_names: reserved::parse_list("admin|moderator|system*|test_*_user"),
			..Config::default()
		}
	}

	fn finder() -> UniqueNameFinder {
		UniqueNameFinder::new(config(), UsedNameRegistry::standalone()).unwrap()
	}

	#[test]
	fn test_digits() {
		assert_eq!(digits(1), 1);
		assert_eq!(digits(9), 1);
		assert_eq!(digits(10), 2);
		assert_eq!(digits(500), 3);
	}

	#[test]
	fn test_returns_available_name() {
		let mut finder = finder();
		assert_eq!(finder.find_available_username("john_doe", false), "john_doe");
		assert_eq!(finder.find_available_group_name("developers"), "developers");
	}

	#[test]
	fn test_sanitizes_input() {
		let mut finder = finder();
		assert_eq!(finder.find_available_username("John Doe!", false), "John_Doe");
		assert_eq!(finder.find_available_group_name("Dev Team!"), "Dev_Team");
	}

	#[test]
	fn test_suffix_sequence() {
		let mut finder = finder();
		assert_eq!(finder.find_available_username("john", false), "john");
		assert_eq!(finder.find_available_username("john", false), "john_1");
		assert_eq!(finder.find_available_username("john", false), "john_2");
		assert_eq!(finder.stats().suffixed, 2);
		assert_eq!(finder.stats().unsuffixed, 1);
	}

	#[test]
	fn test_case_insensitive_collisions_keep_display_case() {
		let mut finder = finder();
		assert_eq!(finder.find_available_username("JohnDoe", false), "JohnDoe");
		assert_eq!(finder.find_available_username("johndoe", false), "johndoe_1");
		assert_eq!(finder.find_available_username("JOHNDOE", false), "JOHNDOE_2");
		assert!(finder.registry().usernames().contains("johndoe_2"));
	}

	#[test]
	fn test_usernames_and_group_names_never_collide() {
		let mut finder = finder();
		assert_eq!(finder.find_available_username("team", false), "team");
		assert_eq!(finder.find_available_group_name("team"), "team_1");
		assert_eq!(finder.find_available_username("team", false), "team_2");
	}

	#[test]
	fn test_blank_input_uses_fallback() {
		let mut finder = finder();
		assert_eq!(finder.find_available_username("", false), "user");
		assert_eq!(finder.find_available_username("!!!", false), "user_1");
		assert_eq!(finder.find_available_group_name(""), "group");
		assert_eq!(finder.stats().fallback_used, 3);
	}

	#[test]
	fn test_reserved_exact_names() {
		let mut finder = finder();
		assert_eq!(finder.find_available_username("admin", false), "admin_1");
		assert_eq!(finder.find_available_username("here", false), "here_1");
		assert_eq!(finder.find_available_group_name("moderator"), "moderator_1");
	}

	#[test]
	fn test_allow_reserved() {
		let mut finder = finder();
		assert_eq!(finder.find_available_username("admin", true), "admin");
		// Still unique even when reserved names are allowed
		assert_eq!(finder.find_available_username("admin", true), "admin_1");
	}

	#[test]
	fn test_allow_reserved_respects_existing_group_names() {
		let registry = UsedNameRegistry::standalone();
		registry.group_names().insert("admin");
		let mut finder = UniqueNameFinder::new(config(), registry).unwrap();

		assert_eq!(finder.find_available_username("admin", true), "admin_1");
	}

	#[test]
	fn test_trailing_wildcard_switches_to_fallback() {
		let mut finder = finder();
		assert_eq!(finder.find_available_username("system_user", false), "user_1");
		assert_eq!(finder.find_available_group_name("System"), "group_1");
		assert_eq!(finder.find_available_username("system_user", true), "system_user");
	}

	#[test]
	fn test_inner_wildcard_is_escaped_by_suffix() {
		let mut finder = finder();
		assert_eq!(
			finder.find_available_username("test_foo_user", false),
			"test_foo_user_1"
		);
		// Anchored at both ends: extra text after the pattern is not reserved
		assert_eq!(
			finder.find_available_username("test_foo_user_x", false),
			"test_foo_user_x"
		);
	}

	#[test]
	fn test_unicode_reserved_names() {
		let config = Config {
			reserved_names: vec!["cafe\u{0301}".to_string()],
			..Config::default()
		};
		let mut finder = UniqueNameFinder::new(config, UsedNameRegistry::standalone()).unwrap();
		assert_eq!(finder.find_available_username("Caf\u{00e9}", false), "Caf\u{00e9}_1");
	}

	#[test]
	fn test_long_names_are_truncated() {
		let mut finder = finder();
		let name = finder.find_available_username(&"a".repeat(70), false);
		assert_eq!(name, "a".repeat(60));
	}

	#[test]
	fn test_truncates_base_to_fit_suffix() {
		let mut finder = finder();
		let long = "a".repeat(60);

		assert_eq!(finder.find_available_username(&long, false), long);

		let second = finder.find_available_username(&long, false);
		assert_eq!(second, format!("{}_1", "a".repeat(58)));
		assert_eq!(grapheme_len(&second), 60);

		// Truncation length is remembered for the next search
		let third = finder.find_available_username(&long, false);
		assert_eq!(third, format!("{}_2", "a".repeat(58)));
		assert_eq!(finder.stats().truncations, 1);
	}

	#[test]
	fn test_truncates_again_when_suffix_grows() {
		let config = Config {
			max_length: 8,
			..config()
		};
		let mut finder = UniqueNameFinder::new(config, UsedNameRegistry::standalone()).unwrap();

		let mut names = Vec::new();
		for _ in 0..12 {
			names.push(finder.find_available_username("abcdefgh", false));
		}

		assert_eq!(names[0], "abcdefgh");
		assert_eq!(names[1], "abcdef_1");
		assert_eq!(names[9], "abcdef_9");
		assert_eq!(names[10], "abcde_1");
		for name in &names {
			assert!(grapheme_len(name) <= 8, "{} is too long", name);
		}
	}

	#[test]
	fn test_truncation_keeps_graphemes_whole() {
		let config = Config {
			max_length: 5,
			..config()
		};
		let mut finder = UniqueNameFinder::new(config, UsedNameRegistry::standalone()).unwrap();

		assert_eq!(finder.find_available_username("abcdq\u{0301}x", false), "abcdq\u{0301}");
		assert_eq!(finder.find_available_username("abcdq\u{0301}", false), "abc_1");
	}

	#[test]
	fn test_exhausted_search_falls_back() {
		let registry = UsedNameRegistry::standalone();
		for name in ["john", "john_1", "john_2", "john_3"] {
			registry.usernames().insert(name);
		}

		let config = Config {
			max_attempts: 3,
			..config()
		};
		let mut finder = UniqueNameFinder::new(config, registry).unwrap();

		assert_eq!(finder.find_available_username("john", false), "user_1");
		assert_eq!(finder.stats().exhausted, 1);
		assert_eq!(finder.stats().unresolved, 0);
	}

	#[test]
	fn test_exhausted_fallback_scans_linearly() {
		let registry = UsedNameRegistry::standalone();
		for i in 1..=5 {
			registry.usernames().insert(format!("user_{}", i));
		}
		registry.usernames().insert("user");

		let config = Config {
			max_attempts: 2,
			..config()
		};
		let mut finder = UniqueNameFinder::new(config, registry).unwrap();

		assert_eq!(finder.find_available_username("", false), "user_6");
		assert_eq!(finder.stats().unresolved, 0);
		assert_eq!(finder.stats().fallback_used, 1);

		// A trailing-wildcard switch is counted once as well
		assert_eq!(finder.find_available_username("system_user", false), "user_7");
		assert_eq!(finder.stats().fallback_used, 2);
		assert_eq!(finder.stats().resolved, 2);
	}

	#[test]
	fn test_exhausted_primary_counts_fallback_once() {
		let registry = UsedNameRegistry::standalone();
		for name in ["john", "john_1", "john_2", "user_1", "user_2"] {
			registry.usernames().insert(name);
		}

		let config = Config {
			max_attempts: 2,
			..config()
		};
		let mut finder = UniqueNameFinder::new(config, registry).unwrap();

		assert_eq!(finder.find_available_username("john", false), "user_3");
		assert_eq!(finder.stats().exhausted, 2);
		assert_eq!(finder.stats().fallback_used, 1);
	}

	#[test]
	fn test_reserved_fallback_override_is_ignored() {
		let mut finder = finder();

		let request = ResolutionRequest::username("").with_fallback("system");
		let first = finder.resolve(&request);
		let second = finder.resolve(&request);

		assert_eq!(first.name, "user");
		assert_eq!(second.name, "user_1");
		assert!(!finder.reserved().is_reserved(&first.name_lower));
		assert!(!finder.reserved().is_reserved(&second.name_lower));
		assert!(finder.registry().usernames().contains("user_1"));
		assert_eq!(finder.stats().unresolved, 0);

		let request = ResolutionRequest::group_name("").with_fallback("Admin");
		assert_eq!(finder.resolve(&request).name, "group");

		let request = ResolutionRequest::username("").with_fallback("!!!");
		assert_eq!(finder.resolve(&request).name, "user_2");
	}

	#[test]
	fn test_failed_scan_returns_last_candidate() {
		let registry = UsedNameRegistry::standalone();
		for i in 1..=9 {
			registry.usernames().insert(format!("user_{}", i));
		}
		let mut finder = UniqueNameFinder::new(config(), registry).unwrap();

		// Only single-digit suffixes fit in six characters
		let resolved = finder.scan_fallback(NameKind::Username, "user", false, 6);
		assert_eq!(resolved.name, "user_9");
		assert_eq!(finder.stats().unresolved, 1);
		assert_eq!(finder.registry().len(), 9);
	}

	#[test]
	fn test_request_overrides() {
		let mut finder = finder();

		let request = ResolutionRequest::username("")
			.with_fallback("imported")
			.with_max_length(12);
		assert_eq!(finder.resolve(&request).name, "imported");

		let request = ResolutionRequest::username("abcdefghijklmnop").with_max_length(12);
		let resolved = finder.resolve(&request);
		assert_eq!(resolved.name, "abcdefghijkl");
		assert_eq!(resolved.name_lower, "abcdefghijkl");
	}

	#[test]
	fn test_resolve_batch_is_ordered() {
		let mut finder = finder();
		let raws: Vec<String> = ["Bob", "bob", "", "Bob!"]
			.iter()
			.map(|s| s.to_string())
			.collect();

		let names: Vec<String> = finder
			.resolve_batch(NameKind::Username, &raws, false)
			.into_iter()
			.map(|r| r.name)
			.collect();
		assert_eq!(names, vec!["Bob", "bob_1", "user", "Bob_2"]);
	}

	#[test]
	fn test_disabled_cache_gives_same_names() {
		let inputs = ["john", "john", "John", "x", "john", "admin", ""];

		let run = |suffix_cache_size: usize| {
			let config = Config {
				suffix_cache_size,
				truncation_cache_size: suffix_cache_size,
				..config()
			};
			let mut finder =
				UniqueNameFinder::new(config, UsedNameRegistry::standalone()).unwrap();
			for input in inputs {
				finder.find_available_username(input, false);
			}
			finder.registry().usernames().to_sorted_vec()
		};

		assert_eq!(run(1000), run(0));
	}

	#[test]
	fn test_invalid_configs_are_rejected() {
		let registry = UsedNameRegistry::standalone;

		let reserved_fallback = Config {
			reserved_names: vec!["user*".to_string()],
			..Config::default()
		};
		assert!(UniqueNameFinder::new(reserved_fallback, registry()).is_err());

		let blank_fallback = Config {
			fallback_group_name: "!!".to_string(),
			..Config::default()
		};
		assert!(UniqueNameFinder::new(blank_fallback, registry()).is_err());

		let too_short = Config {
			max_length: 5,
			..Config::default()
		};
		assert!(UniqueNameFinder::new(too_short, registry()).is_err());

		let no_attempts = Config {
			max_attempts: 0,
			..Config::default()
		};
		assert!(UniqueNameFinder::new(no_attempts, registry()).is_err());
	}

	#[test]
	fn test_suffixed_percent() {
		let mut stats = Stats::default();
		assert_eq!(stats.suffixed_percent(), 0.0);
		stats.resolved = 4;
		stats.suffixed = 1;
		assert_eq!(stats.suffixed_percent(), 25.0);
	}
}
