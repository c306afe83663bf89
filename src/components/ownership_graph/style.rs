use std::collections::BTreeSet;

/// The style an element is painted with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ElementStyle {
	/// No emphasis.
	#[default]
	Default,
	/// Under the pointer.
	Hover,
	/// Part of the selection.
	Selected,
	/// Short emphasis after a click.
	Highlighted,
	/// Not drawn and not hit-testable.
	Hidden,
}

/// Every independent fact that influences how an element is painted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VisualState {
	/// Hidden by a menu action.
	pub hidden: bool,
	/// Inside its post-click highlight window.
	pub highlighted: bool,
	/// Under the pointer.
	pub hovered: bool,
	/// Part of the selection.
	pub selected: bool,
}

/// Precedence: hidden, highlight, hover, selected, default. Leaving hover on
/// a selected element therefore falls back to the selected style.
pub fn resolve_style(state: VisualState) -> ElementStyle {
	if state.hidden {
		ElementStyle::Hidden
	} else if state.highlighted {
		ElementStyle::Highlighted
	} else if state.hovered {
		ElementStyle::Hover
	} else if state.selected {
		ElementStyle::Selected
	} else {
		ElementStyle::Default
	}
}

/// Ids hidden by the user. A view overlay only; validated data is untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HiddenLedger {
	ids: BTreeSet<String>,
}

impl HiddenLedger {
	/// Whether `id` is hidden.
	pub fn contains(&self, id: &str) -> bool {
		self.ids.contains(id)
	}

	/// Whether nothing is hidden.
	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}

	/// Number of hidden ids.
	pub fn len(&self) -> usize {
		self.ids.len()
	}

	/// Returns the ids that were not hidden before.
	pub fn hide<I, S>(&mut self, ids: I) -> Vec<String>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		ids.into_iter()
			.map(Into::into)
			.filter(|id| self.ids.insert(id.clone()))
			.collect()
	}

	/// Empties the ledger, returning what it held.
	pub fn show_all(&mut self) -> Vec<String> {
		std::mem::take(&mut self.ids).into_iter().collect()
	}

	/// Hidden ids in sorted order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.ids.iter().map(String::as_str)
	}
}
