use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A 2D coordinate supplied with a node record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

/// Raw node record as delivered by the data-fetch layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
	/// Unique id; blank ids are rejected.
	#[serde(default)]
	pub id: String,
	/// organization, repository, user, team, topic, ...
	#[serde(default, rename = "type")]
	pub kind: String,
	/// Explicit label, may be empty.
	#[serde(default)]
	pub label: String,
	/// Opaque payload shown in the info panels.
	#[serde(default)]
	pub data: BTreeMap<String, Value>,
	/// Optional starting coordinate for the layout.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub position: Option<Position>,
}

/// Raw edge record as delivered by the data-fetch layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
	/// Unique id; blank ids are rejected.
	#[serde(default)]
	pub id: String,
	/// Source node id.
	#[serde(default)]
	pub source: String,
	/// Target node id.
	#[serde(default)]
	pub target: String,
	/// Relationship type, e.g. `owns` or `member_of`.
	#[serde(default, rename = "type")]
	pub kind: String,
	/// Explicit label, may be empty.
	#[serde(default)]
	pub label: String,
}

/// The two input sequences the graph is built from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
	/// Node records, in any order.
	#[serde(default)]
	pub nodes: Vec<GraphNode>,
	/// Edge records, in any order.
	#[serde(default)]
	pub edges: Vec<GraphEdge>,
}

impl GraphData {
	/// Turns validated elements back into input records.
	pub fn from_elements(elements: &[RenderableElement]) -> Self {
		let mut data = GraphData::default();
		for element in elements {
			match element {
				RenderableElement::Node(node) => data.nodes.push(GraphNode {
					id: node.id.clone(),
					kind: node.kind.clone(),
					label: node.label.clone(),
					data: node.data.clone(),
					position: node.position,
				}),
				RenderableElement::Edge(edge) => data.edges.push(GraphEdge {
					id: edge.id.clone(),
					source: edge.source.clone(),
					target: edge.target.clone(),
					kind: edge.kind.clone(),
					label: edge.label.clone(),
				}),
			}
		}
		data
	}
}

/// A node that passed validation.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderableNode {
	/// Unique id.
	pub id: String,
	/// Node type.
	pub kind: String,
	/// Label as supplied.
	pub label: String,
	/// Payload as supplied.
	pub data: BTreeMap<String, Value>,
	/// Starting coordinate, if supplied.
	pub position: Option<Position>,
	/// Resolved label used everywhere on screen.
	pub display_label: String,
}

/// An edge that passed validation.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderableEdge {
	/// Unique id.
	pub id: String,
	/// Source node id, known to exist.
	pub source: String,
	/// Target node id, known to exist.
	pub target: String,
	/// Relationship type.
	pub kind: String,
	/// Label as supplied.
	pub label: String,
	/// Label, falling back to the type.
	pub display_label: String,
}

/// A validated, display-ready node or edge.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderableElement {
	/// A validated node.
	Node(RenderableNode),
	/// A validated edge whose endpoints are both present.
	Edge(RenderableEdge),
}

impl RenderableElement {
	/// The element id.
	pub fn id(&self) -> &str {
		match self {
			RenderableElement::Node(node) => &node.id,
			RenderableElement::Edge(edge) => &edge.id,
		}
	}

	/// Label used on screen.
	pub fn display_label(&self) -> &str {
		match self {
			RenderableElement::Node(node) => &node.display_label,
			RenderableElement::Edge(edge) => &edge.display_label,
		}
	}

	/// Whether this is a node.
	pub fn is_node(&self) -> bool {
		matches!(self, RenderableElement::Node(_))
	}
}

/// What a pointer event landed on.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Target {
	/// A node, by id.
	Node(String),
	/// An edge, by id.
	Edge(String),
	/// The surface itself.
	Background,
}

impl Target {
	/// Id of the node or edge, `None` for the background.
	pub fn element_id(&self) -> Option<&str> {
		match self {
			Target::Node(id) | Target::Edge(id) => Some(id),
			Target::Background => None,
		}
	}
}

/// Screen-space point in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal offset from the left edge.
	pub x: f64,
	/// Vertical offset from the top edge.
	pub y: f64,
}

impl Point {
	/// Point at `(x, y)`.
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// Width and height in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
	/// Horizontal extent.
	pub width: f64,
	/// Vertical extent.
	pub height: f64,
}

impl Size {
	/// Size of `width` by `height`.
	pub fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}
}
