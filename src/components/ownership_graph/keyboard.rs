use bitflags::bitflags;

bitflags! {
	/// Modifier keys held during a pointer or key event.
	#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct Modifiers: u8 {
		/// Shift.
		const SHIFT = 0b0001;
		/// Alt / Option.
		const ALT   = 0b0010;
		/// Control.
		const CTRL  = 0b0100;
		/// Cmd on macOS, Windows key elsewhere.
		const META  = 0b1000;
	}
}

impl Modifiers {
	/// Builds the set from the four DOM event booleans.
	pub fn from_flags(shift: bool, alt: bool, ctrl: bool, meta: bool) -> Self {
		let mut mods = Modifiers::empty();
		mods.set(Modifiers::SHIFT, shift);
		mods.set(Modifiers::ALT, alt);
		mods.set(Modifiers::CTRL, ctrl);
		mods.set(Modifiers::META, meta);
		mods
	}

	/// Ctrl or Meta: the additive/subtractive selection modifier.
	pub fn is_multi_select(self) -> bool {
		self.intersects(Modifiers::CTRL | Modifiers::META)
	}
}

/// What currently holds keyboard focus in the host page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FocusTarget {
	/// Anything that does not take text, or nothing.
	#[default]
	Other,
	/// An `<input>`.
	TextInput,
	/// A `<textarea>`.
	TextArea,
	/// A content-editable region.
	ContentEditable,
}

impl FocusTarget {
	/// Classifies the focused element from its tag name.
	pub fn from_element(tag_name: &str, content_editable: bool) -> Self {
		if content_editable {
			return FocusTarget::ContentEditable;
		}
		match tag_name.to_ascii_uppercase().as_str() {
			"INPUT" => FocusTarget::TextInput,
			"TEXTAREA" => FocusTarget::TextArea,
			_ => FocusTarget::Other,
		}
	}

	/// Whether key presses belong to the focused element.
	pub fn accepts_text(self) -> bool {
		!matches!(self, FocusTarget::Other)
	}
}

/// One key press, with the state needed to route it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyInput {
	/// DOM `KeyboardEvent.key`.
	pub key: String,
	/// Modifier keys held.
	pub modifiers: Modifiers,
	/// Where focus was when the key went down.
	pub focus: FocusTarget,
}

impl KeyInput {
	/// A key press with focus outside any text field.
	pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
		Self {
			key: key.into(),
			modifiers,
			focus: FocusTarget::Other,
		}
	}

	/// Records where focus was.
	pub fn focused(mut self, focus: FocusTarget) -> Self {
		self.focus = focus;
		self
	}
}

/// Arrow key direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
	/// Towards the top of the screen.
	Up,
	/// Towards the bottom.
	Down,
	/// Leftward.
	Left,
	/// Rightward.
	Right,
}

impl Direction {
	/// Unit pan vector in screen space.
	pub fn delta(self) -> (f64, f64) {
		match self {
			Direction::Up => (0.0, -1.0),
			Direction::Down => (0.0, 1.0),
			Direction::Left => (-1.0, 0.0),
			Direction::Right => (1.0, 0.0),
		}
	}
}

/// Action bound to a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shortcut {
	/// Move the content in the arrow's direction.
	Pan(Direction),
	/// One zoom step in.
	ZoomIn,
	/// One zoom step out.
	ZoomOut,
	/// Back to zoom 1.
	ResetZoom,
	/// Fit every visible element.
	FitAll,
	/// Empty the selection.
	ClearSelection,
	/// Select every visible element.
	SelectAll,
}

impl Shortcut {
	/// Action name used in the feedback toast.
	pub fn description(self) -> &'static str {
		match self {
			Shortcut::Pan(Direction::Up) => "Pan up",
			Shortcut::Pan(Direction::Down) => "Pan down",
			Shortcut::Pan(Direction::Left) => "Pan left",
			Shortcut::Pan(Direction::Right) => "Pan right",
			Shortcut::ZoomIn => "Zoom in",
			Shortcut::ZoomOut => "Zoom out",
			Shortcut::ResetZoom => "Reset zoom",
			Shortcut::FitAll => "Fit to screen",
			Shortcut::ClearSelection => "Clear selection",
			Shortcut::SelectAll => "Select all",
		}
	}
}

fn key_caption(input: &KeyInput) -> String {
	let key = match input.key.as_str() {
		" " => "Space",
		"ArrowUp" => "↑",
		"ArrowDown" => "↓",
		"ArrowLeft" => "←",
		"ArrowRight" => "→",
		"Escape" => "Esc",
		other => other,
	};
	if input.modifiers.contains(Modifiers::META) {
		format!("Meta+{}", key.to_ascii_uppercase())
	} else if input.modifiers.contains(Modifiers::CTRL) {
		format!("Ctrl+{}", key.to_ascii_uppercase())
	} else {
		key.to_string()
	}
}

/// Toast text naming the action and the key that triggered it.
pub fn feedback_message(shortcut: Shortcut, input: &KeyInput) -> String {
	format!("{} ({})", shortcut.description(), key_caption(input))
}

/// Maps a key press to a shortcut. Nothing fires while a text field,
/// text area or content-editable region has focus. Apart from select-all,
/// shortcuts ignore chords with Ctrl, Meta or Alt so browser bindings
/// keep working.
pub fn route(input: &KeyInput) -> Option<Shortcut> {
	if input.focus.accepts_text() {
		return None;
	}
	let key = input.key.as_str();
	if input.modifiers.is_multi_select() {
		return matches!(key, "a" | "A").then_some(Shortcut::SelectAll);
	}
	if input.modifiers.contains(Modifiers::ALT) {
		return None;
	}
	let shortcut = match key {
		"ArrowUp" => Shortcut::Pan(Direction::Up),
		"ArrowDown" => Shortcut::Pan(Direction::Down),
		"ArrowLeft" => Shortcut::Pan(Direction::Left),
		"ArrowRight" => Shortcut::Pan(Direction::Right),
		"+" | "=" | "PageUp" => Shortcut::ZoomIn,
		"-" | "PageDown" => Shortcut::ZoomOut,
		" " | "Home" => Shortcut::ResetZoom,
		"f" | "F" | "0" => Shortcut::FitAll,
		"Escape" => Shortcut::ClearSelection,
		_ => return None,
	};
	Some(shortcut)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn key(k: &str) -> KeyInput {
		KeyInput::new(k, Modifiers::empty())
	}

	#[test]
	fn maps_every_documented_key() {
		let cases = [
			("ArrowUp", Shortcut::Pan(Direction::Up)),
			("ArrowDown", Shortcut::Pan(Direction::Down)),
			("ArrowLeft", Shortcut::Pan(Direction::Left)),
			("ArrowRight", Shortcut::Pan(Direction::Right)),
			("+", Shortcut::ZoomIn),
			("=", Shortcut::ZoomIn),
			("PageUp", Shortcut::ZoomIn),
			("-", Shortcut::ZoomOut),
			("PageDown", Shortcut::ZoomOut),
			(" ", Shortcut::ResetZoom),
			("Home", Shortcut::ResetZoom),
			("f", Shortcut::FitAll),
			("F", Shortcut::FitAll),
			("0", Shortcut::FitAll),
			("Escape", Shortcut::ClearSelection),
		];
		for (k, expected) in cases {
			assert_eq!(route(&key(k)), Some(expected), "key {k:?}");
		}
		assert_eq!(route(&key("x")), None);
		assert_eq!(route(&key("a")), None);
	}

	#[test]
	fn select_all_needs_ctrl_or_meta() {
		assert_eq!(
			route(&KeyInput::new("a", Modifiers::CTRL)),
			Some(Shortcut::SelectAll)
		);
		assert_eq!(
			route(&KeyInput::new("A", Modifiers::META | Modifiers::SHIFT)),
			Some(Shortcut::SelectAll)
		);
		assert_eq!(route(&KeyInput::new("f", Modifiers::CTRL)), None);
	}

	#[test]
	fn text_focus_blocks_everything() {
		for focus in [
			FocusTarget::TextInput,
			FocusTarget::TextArea,
			FocusTarget::ContentEditable,
		] {
			assert_eq!(route(&key("Escape").focused(focus)), None);
			assert_eq!(
				route(&KeyInput::new("a", Modifiers::CTRL).focused(focus)),
				None
			);
		}
	}

	#[test]
	fn focus_from_element() {
		assert_eq!(FocusTarget::from_element("input", false), FocusTarget::TextInput);
		assert_eq!(FocusTarget::from_element("TEXTAREA", false), FocusTarget::TextArea);
		assert_eq!(FocusTarget::from_element("DIV", true), FocusTarget::ContentEditable);
		assert_eq!(FocusTarget::from_element("BUTTON", false), FocusTarget::Other);
	}

	#[test]
	fn feedback_names_action_and_key() {
		assert_eq!(feedback_message(Shortcut::ZoomIn, &key("+")), "Zoom in (+)");
		assert_eq!(feedback_message(Shortcut::ResetZoom, &key(" ")), "Reset zoom (Space)");
		assert_eq!(
			feedback_message(Shortcut::SelectAll, &KeyInput::new("a", Modifiers::CTRL)),
			"Select all (Ctrl+A)"
		);
	}

	#[test]
	fn multi_select_predicate() {
		assert!(Modifiers::CTRL.is_multi_select());
		assert!(Modifiers::META.is_multi_select());
		assert!(!Modifiers::SHIFT.is_multi_select());
		assert!(!Modifiers::empty().is_multi_select());
	}
}
