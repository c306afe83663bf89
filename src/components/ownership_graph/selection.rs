use std::collections::{HashMap, HashSet};

/// Selected element ids in the order they were selected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionSet {
	order: Vec<String>,
	members: HashSet<String>,
}

impl SelectionSet {
	/// Whether `id` is selected.
	pub fn contains(&self, id: &str) -> bool {
		self.members.contains(id)
	}

	/// Number of selected elements.
	pub fn len(&self) -> usize {
		self.order.len()
	}

	/// Whether nothing is selected.
	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	/// Selected ids in the order they were added.
	pub fn ids(&self) -> &[String] {
		&self.order
	}

	/// Adds `id`; false if it was already there.
	pub fn insert(&mut self, id: &str) -> bool {
		if self.members.insert(id.to_string()) {
			self.order.push(id.to_string());
			true
		} else {
			false
		}
	}

	/// Removes `id`; false if it was not selected.
	pub fn remove(&mut self, id: &str) -> bool {
		if self.members.remove(id) {
			self.order.retain(|x| x != id);
			true
		} else {
			false
		}
	}

	/// Empties the selection, returning the ids that were selected.
	pub fn clear(&mut self) -> Vec<String> {
		self.members.clear();
		std::mem::take(&mut self.order)
	}

	/// Replaces the selection; returns every id whose membership changed.
	pub fn replace<I>(&mut self, ids: I) -> Vec<String>
	where
		I: IntoIterator<Item = String>,
	{
		let previous = self.clear();
		for id in ids {
			self.insert(&id);
		}
		let mut changed: Vec<String> = previous
			.into_iter()
			.filter(|id| !self.members.contains(id))
			.collect();
		changed.extend(self.order.iter().cloned());
		changed
	}

	/// Primary click on `id`. Without the multi-select modifier every other
	/// element is dropped and `id` becomes the sole selection, unless it
	/// already was, in which case the selection empties. With the modifier
	/// only `id` toggles. Returns every id whose membership changed.
	pub fn click(&mut self, id: &str, multi_select: bool) -> Vec<String> {
		if multi_select {
			if !self.remove(id) {
				self.insert(id);
			}
			return vec![id.to_string()];
		}
		let was_sole = self.order.len() == 1 && self.contains(id);
		let mut changed: Vec<String> = self.order.iter().filter(|x| *x != id).cloned().collect();
		self.order.retain(|x| x == id);
		self.members.retain(|x| x == id);
		if was_sole {
			self.remove(id);
			changed.push(id.to_string());
		} else if self.insert(id) {
			changed.push(id.to_string());
		}
		changed
	}
}

/// Time-bounded click emphasis, keyed by element id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Highlights {
	until: HashMap<String, u64>,
}

impl Highlights {
	/// Starts (or restarts) the highlight on `id`.
	pub fn start(&mut self, id: &str, now: u64, duration_ms: u64) {
		self.until.insert(id.to_string(), now + duration_ms);
	}

	/// Whether `id` is still highlighted at `now`.
	pub fn is_active(&self, id: &str, now: u64) -> bool {
		self.until.get(id).is_some_and(|&t| now < t)
	}

	/// Drops highlights whose deadline has passed and returns their ids.
	pub fn expire(&mut self, now: u64) -> Vec<String> {
		let mut expired: Vec<String> = self
			.until
			.iter()
			.filter(|&(_, &t)| now >= t)
			.map(|(id, _)| id.clone())
			.collect();
		expired.sort();
		for id in &expired {
			self.until.remove(id);
		}
		expired
	}

	/// Drops every highlight and returns the affected ids.
	pub fn clear(&mut self) -> Vec<String> {
		self.until.drain().map(|(id, _)| id).collect()
	}

	/// Number of live highlights.
	pub fn len(&self) -> usize {
		self.until.len()
	}

	/// Whether nothing is highlighted.
	pub fn is_empty(&self) -> bool {
		self.until.is_empty()
	}

	/// Earliest revert deadline.
	pub fn next_deadline(&self) -> Option<u64> {
		self.until.values().copied().min()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn plain_click_makes_sole_selection() {
		let mut sel = SelectionSet::default();
		sel.click("a", false);
		sel.click("b", true);
		assert_eq!(sel.ids(), ["a", "b"]);
		let changed = sel.click("c", false);
		assert_eq!(sel.ids(), ["c"]);
		assert_eq!(changed, vec!["a", "b", "c"]);
	}

	#[test]
	fn plain_click_on_sole_selection_clears() {
		let mut sel = SelectionSet::default();
		sel.click("a", false);
		sel.click("a", false);
		assert!(sel.is_empty());
	}

	#[test]
	fn plain_click_on_one_of_many_keeps_it() {
		let mut sel = SelectionSet::default();
		sel.click("a", false);
		sel.click("b", true);
		let changed = sel.click("a", false);
		assert_eq!(sel.ids(), ["a"]);
		assert_eq!(changed, vec!["b"]);
	}

	#[test]
	fn modifier_click_toggles_only_target() {
		let mut sel = SelectionSet::default();
		sel.click("a", true);
		sel.click("b", true);
		sel.click("a", true);
		assert_eq!(sel.ids(), ["b"]);
	}

	#[test]
	fn replace_reports_symmetric_difference_and_kept() {
		let mut sel = SelectionSet::default();
		sel.click("a", true);
		sel.click("b", true);
		let changed = sel.replace(vec!["b".to_string(), "c".to_string()]);
		assert_eq!(sel.ids(), ["b", "c"]);
		assert!(changed.contains(&"a".to_string()));
		assert!(changed.contains(&"c".to_string()));
	}

	#[test]
	fn highlight_expires_at_deadline() {
		let mut hl = Highlights::default();
		hl.start("a", 1_000, 800);
		assert!(hl.is_active("a", 1_799));
		assert!(hl.expire(1_799).is_empty());
		assert_eq!(hl.expire(1_800), vec!["a"]);
		assert!(!hl.is_active("a", 1_800));
		assert!(hl.is_empty());
	}

	#[test]
	fn restarting_highlight_extends_deadline() {
		let mut hl = Highlights::default();
		hl.start("a", 0, 800);
		hl.start("a", 500, 800);
		assert!(hl.expire(900).is_empty());
		assert_eq!(hl.next_deadline(), Some(1_300));
	}
}
