use std::fmt;

/// Which half of the input a record came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
	/// From the `nodes` list.
	Node,
	/// From the `edges` list.
	Edge,
}

impl fmt::Display for RecordKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RecordKind::Node => f.write_str("node"),
			RecordKind::Edge => f.write_str("edge"),
		}
	}
}

/// A record filtered out (or replaced) during validation. Never fatal.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ValidationError {
	/// A required field is missing or blank.
	#[error("invalid {kind} {id:?}: {reason}")]
	DataValidation {
		/// Which list the record came from.
		kind: RecordKind,
		/// The record's id, possibly empty.
		id: String,
		/// Which check failed.
		reason: &'static str,
	},
	/// An edge endpoint names no surviving node.
	#[error("edge {edge:?} references missing node {missing:?}")]
	ReferentialIntegrity {
		/// The dropped edge.
		edge: String,
		/// The endpoint that was not found.
		missing: String,
	},
	/// The id was already taken. Within one list the later record wins; an
	/// edge reusing a node id is dropped.
	#[error("duplicate {kind} id {id:?}")]
	DuplicateId {
		/// The list of the record that lost.
		kind: RecordKind,
		/// The contested id.
		id: String,
	},
}

/// The rendering engine could not be constructed.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RenderEngineInitError {
	/// The host could not provide a drawing context.
	#[error("rendering surface unavailable: {0}")]
	Unavailable(String),
	/// The engine rejected the element set or its setup failed.
	#[error("rendering engine failed to initialise: {0}")]
	Failed(String),
	/// Construction panicked; carries the panic message.
	#[error("rendering engine panicked during construction: {0}")]
	Panicked(String),
}

/// No host surface is attached to draw overlay panels into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("no overlay surface attached")]
pub struct OverlaySurfaceUnavailable;

/// Why a surface operation was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
	/// A deferred callback outlived the element set it was scheduled for.
	#[error("stale surface callback: generation {found}, current {expected}")]
	Stale {
		/// Current generation.
		expected: u64,
		/// Generation the callback was scheduled for.
		found: u64,
	},
	/// No engine is alive.
	#[error("no rendering engine is mounted")]
	NotMounted,
}
