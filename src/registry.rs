//! Shared registry of names already in use.
//!
//! Names live in two folded sets, one for usernames and one for group
//! names, loaded from a [`NameStore`] under the keys `"usernames"` and
//! `"group_names"`. Every engine built from the same store sees the same
//! sets, and the union of both is the collision domain for either kind.

use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::NameKind;

pub const USERNAMES_KEY: &str = "usernames";
pub const GROUP_NAMES_KEY: &str = "group_names";

/// A thread-safe set of folded names.
#[derive(Debug, Default)]
pub struct NameSet {
	names: RwLock<HashSet<String>>,
}

impl NameSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn contains(&self, name_lower: &str) -> bool {
		self.names.read().contains(name_lower)
	}

	/// Insert a name, returning `false` if it was already present.
	pub fn insert(&self, name_lower: impl Into<String>) -> bool {
		self.names.write().insert(name_lower.into())
	}

	pub fn len(&self) -> usize {
		self.names.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.names.read().is_empty()
	}

	/// Sorted copy of the current contents.
	pub fn to_sorted_vec(&self) -> Vec<String> {
		let mut names: Vec<String> = self.names.read().iter().cloned().collect();
		names.sort();
		names
	}
}

impl<S: Into<String>> FromIterator<S> for NameSet {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self {
			names: RwLock::new(iter.into_iter().map(Into::into).collect()),
		}
	}
}

/// Backing store for shared name sets.
///
/// `load` must return the same set (by identity) for the same key, so that
/// every engine using the store shares one collision domain.
pub trait NameStore: Send + Sync {
	fn load(&self, key: &str) -> Arc<NameSet>;
}

/// Process-local store; sets are created empty on first load.
#[derive(Debug, Default)]
pub struct InMemoryStore {
	sets: Mutex<HashMap<String, Arc<NameSet>>>,
}

impl InMemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replace the set stored under `key`.
	pub fn insert_set(&self, key: &str, set: NameSet) {
		self.sets.lock().insert(key.to_string(), Arc::new(set));
	}
}

impl NameStore for InMemoryStore {
	fn load(&self, key: &str) -> Arc<NameSet> {
		self.sets
			.lock()
			.entry(key.to_string())
			.or_insert_with(|| Arc::new(NameSet::new()))
			.clone()
	}
}

/// Handle onto the username and group-name sets.
#[derive(Debug, Clone)]
pub struct UsedNameRegistry {
	usernames: Arc<NameSet>,
	group_names: Arc<NameSet>,
}

impl UsedNameRegistry {
	pub fn from_store(store: &dyn NameStore) -> Self {
		Self {
			usernames: store.load(USERNAMES_KEY),
			group_names: store.load(GROUP_NAMES_KEY),
		}
	}

	/// A registry backed by fresh, unshared sets.
	pub fn standalone() -> Self {
		Self {
			usernames: Arc::new(NameSet::new()),
			group_names: Arc::new(NameSet::new()),
		}
	}

	pub fn usernames(&self) -> &Arc<NameSet> {
		&self.usernames
	}

	pub fn group_names(&self) -> &Arc<NameSet> {
		&self.group_names
	}

	/// Atomically check both sets and, if the name is free, add it to the
	/// set for `kind`. Returns whether the name was claimed.
	pub fn claim(&self, kind: NameKind, name_lower: &str) -> bool {
		// Fixed lock order: usernames, then group names
		let mut usernames = self.usernames.names.write();
		if Arc::ptr_eq(&self.usernames, &self.group_names) {
			// Both kinds share one set; a second write lock would deadlock
			return usernames.insert(name_lower.to_string());
		}
		let mut group_names = self.group_names.names.write();

		if usernames.contains(name_lower) || group_names.contains(name_lower) {
			return false;
		}

		match kind {
			NameKind::Username => usernames.insert(name_lower.to_string()),
			NameKind::GroupName => group_names.insert(name_lower.to_string()),
		}
	}

	/// Total number of names in use across both sets.
	pub fn len(&self) -> usize {
		self.usernames.len() + self.group_names.len()
	}

	pub fn is_empty(&self) -> bool {
		self.usernames.is_empty() && self.group_names.is_empty()
	}
}
