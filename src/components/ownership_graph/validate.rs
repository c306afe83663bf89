use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde_json::Value;

use super::error::{RecordKind, ValidationError};
use super::types::{GraphEdge, GraphNode, RenderableEdge, RenderableElement, RenderableNode};

const LABEL_ID_CHARS: usize = 8;

/// Validated elements plus everything that was filtered on the way.
#[derive(Clone, Debug, Default)]
pub struct ValidationReport {
	/// Surviving elements, nodes first.
	pub elements: Vec<RenderableElement>,
	/// Everything dropped or replaced, in input order.
	pub rejected: Vec<ValidationError>,
}

impl ValidationReport {
	/// Number of surviving nodes.
	pub fn node_count(&self) -> usize {
		self.elements.iter().filter(|e| e.is_node()).count()
	}

	/// Number of surviving edges.
	pub fn edge_count(&self) -> usize {
		self.elements.len() - self.node_count()
	}
}

fn is_blank(s: &str) -> bool {
	s.trim().is_empty()
}

fn data_string<'a>(data: &'a std::collections::BTreeMap<String, Value>, key: &str) -> Option<&'a str> {
	data.get(key)
		.and_then(Value::as_str)
		.filter(|s| !is_blank(s))
}

/// Label shown for a node: explicit label, then `data.name`, then
/// `data.login`, then the type with a shortened id.
pub fn node_display_label(node: &GraphNode) -> String {
	if !is_blank(&node.label) {
		return node.label.clone();
	}
	if let Some(name) = data_string(&node.data, "name") {
		return name.to_string();
	}
	if let Some(login) = data_string(&node.data, "login") {
		return login.to_string();
	}
	let short: String = node.id.chars().take(LABEL_ID_CHARS).collect();
	if node.id.chars().count() > LABEL_ID_CHARS {
		format!("{} {}…", node.kind, short)
	} else {
		format!("{} {}", node.kind, short)
	}
}

/// Label shown for an edge: its label, else its type.
pub fn edge_display_label(edge: &GraphEdge) -> String {
	if is_blank(&edge.label) {
		edge.kind.clone()
	} else {
		edge.label.clone()
	}
}

fn check_node(node: &GraphNode) -> Result<(), &'static str> {
	if is_blank(&node.id) {
		return Err("id is empty");
	}
	if is_blank(&node.kind) {
		return Err("type is empty");
	}
	Ok(())
}

fn check_edge(edge: &GraphEdge) -> Result<(), &'static str> {
	if is_blank(&edge.id) {
		return Err("id is empty");
	}
	if is_blank(&edge.source) {
		return Err("source is empty");
	}
	if is_blank(&edge.target) {
		return Err("target is empty");
	}
	if is_blank(&edge.kind) {
		return Err("type is missing");
	}
	Ok(())
}

/// Keeps the last record for every id, at the position of that last record.
fn last_wins<T>(
	items: Vec<(String, T)>,
	kind: RecordKind,
	rejected: &mut Vec<ValidationError>,
) -> Vec<T> {
	let mut slots: Vec<Option<T>> = Vec::with_capacity(items.len());
	let mut seen: HashMap<String, usize> = HashMap::new();
	for (id, item) in items {
		if let Some(prev) = seen.insert(id.clone(), slots.len()) {
			warn!("duplicate {} id {:?}, keeping the later record", kind, id);
			slots[prev] = None;
			rejected.push(ValidationError::DuplicateId { kind, id });
		}
		slots.push(Some(item));
	}
	slots.into_iter().flatten().collect()
}

/// Filters raw records into a referentially consistent element sequence:
/// all valid nodes first, then all valid edges.
pub fn validate_graph(nodes: &[GraphNode], edges: &[GraphEdge]) -> ValidationReport {
	let mut rejected = Vec::new();

	let mut valid_nodes = Vec::with_capacity(nodes.len());
	for node in nodes {
		match check_node(node) {
			Ok(()) => valid_nodes.push((
				node.id.clone(),
				RenderableNode {
					id: node.id.clone(),
					kind: node.kind.clone(),
					label: node.label.clone(),
					data: node.data.clone(),
					position: node.position,
					display_label: node_display_label(node),
				},
			)),
			Err(reason) => {
				warn!("dropping node {:?}: {}", node.id, reason);
				rejected.push(ValidationError::DataValidation {
					kind: RecordKind::Node,
					id: node.id.clone(),
					reason,
				});
			}
		}
	}
	let valid_nodes = last_wins(valid_nodes, RecordKind::Node, &mut rejected);

	if valid_nodes.is_empty() {
		if !edges.is_empty() {
			warn!("no valid nodes, dropping all {} edges", edges.len());
		}
		return ValidationReport {
			elements: Vec::new(),
			rejected,
		};
	}

	let node_ids: HashSet<&str> = valid_nodes.iter().map(|n| n.id.as_str()).collect();
	let mut valid_edges = Vec::with_capacity(edges.len());
	for edge in edges {
		if let Err(reason) = check_edge(edge) {
			warn!("dropping edge {:?}: {}", edge.id, reason);
			rejected.push(ValidationError::DataValidation {
				kind: RecordKind::Edge,
				id: edge.id.clone(),
				reason,
			});
			continue;
		}
		// nodes and edges share one id namespace; the node keeps it
		if node_ids.contains(edge.id.as_str()) {
			warn!("dropping edge {:?}: id already names a node", edge.id);
			rejected.push(ValidationError::DuplicateId {
				kind: RecordKind::Edge,
				id: edge.id.clone(),
			});
			continue;
		}
		let missing = [&edge.source, &edge.target]
			.into_iter()
			.find(|end| !node_ids.contains(end.as_str()));
		if let Some(missing) = missing {
			warn!("dropping edge {:?}: endpoint {:?} not found", edge.id, missing);
			rejected.push(ValidationError::ReferentialIntegrity {
				edge: edge.id.clone(),
				missing: missing.clone(),
			});
			continue;
		}
		valid_edges.push((
			edge.id.clone(),
			RenderableEdge {
				id: edge.id.clone(),
				source: edge.source.clone(),
				target: edge.target.clone(),
				kind: edge.kind.clone(),
				label: edge.label.clone(),
				display_label: edge_display_label(edge),
			},
		));
	}
	let valid_edges = last_wins(valid_edges, RecordKind::Edge, &mut rejected);

	debug!(
		"validated {} nodes, {} edges ({} records filtered)",
		valid_nodes.len(),
		valid_edges.len(),
		rejected.len()
	);

	let elements = valid_nodes
		.into_iter()
		.map(RenderableElement::Node)
		.chain(valid_edges.into_iter().map(RenderableElement::Edge))
		.collect();
	ValidationReport { elements, rejected }
}

/// Lookup tables over a validated element set.
#[derive(Clone, Debug, Default)]
pub struct GraphIndex {
	elements: Vec<RenderableElement>,
	positions: HashMap<String, usize>,
	incoming: HashMap<String, Vec<String>>,
	outgoing: HashMap<String, Vec<String>>,
}

impl GraphIndex {
	/// Indexes an already validated element sequence.
	pub fn new(elements: Vec<RenderableElement>) -> Self {
		let mut index = GraphIndex::default();
		for (i, element) in elements.iter().enumerate() {
			index.positions.insert(element.id().to_string(), i);
			if let RenderableElement::Edge(edge) = element {
				index
					.outgoing
					.entry(edge.source.clone())
					.or_default()
					.push(edge.id.clone());
				index
					.incoming
					.entry(edge.target.clone())
					.or_default()
					.push(edge.id.clone());
			}
		}
		index.elements = elements;
		index
	}

	/// Elements in validation order.
	pub fn elements(&self) -> &[RenderableElement] {
		&self.elements
	}

	/// Whether the set has no elements.
	pub fn is_empty(&self) -> bool {
		self.elements.is_empty()
	}

	/// Element with `id`, of either kind.
	pub fn get(&self, id: &str) -> Option<&RenderableElement> {
		self.positions.get(id).map(|&i| &self.elements[i])
	}

	/// Node with `id`.
	pub fn node(&self, id: &str) -> Option<&RenderableNode> {
		match self.get(id) {
			Some(RenderableElement::Node(node)) => Some(node),
			_ => None,
		}
	}

	/// Edge with `id`.
	pub fn edge(&self, id: &str) -> Option<&RenderableEdge> {
		match self.get(id) {
			Some(RenderableElement::Edge(edge)) => Some(edge),
			_ => None,
		}
	}

	/// Every element id in order.
	pub fn ids(&self) -> impl Iterator<Item = &str> {
		self.elements.iter().map(RenderableElement::id)
	}

	/// Edges whose target is `node`.
	pub fn incoming(&self, node: &str) -> &[String] {
		self.incoming.get(node).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Edges whose source is `node`.
	pub fn outgoing(&self, node: &str) -> &[String] {
		self.outgoing.get(node).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Edges touching `node`, self-loops reported once.
	pub fn connected_edges(&self, node: &str) -> Vec<String> {
		let mut seen = HashSet::new();
		self.outgoing(node)
			.iter()
			.chain(self.incoming(node))
			.filter(|id| seen.insert(id.as_str()))
			.cloned()
			.collect()
	}

	/// The node, every edge touching it, and every node one edge away.
	pub fn neighborhood(&self, node: &str) -> Vec<String> {
		if self.node(node).is_none() {
			return Vec::new();
		}
		let edges = self.connected_edges(node);
		let mut out = vec![node.to_string()];
		let mut seen: HashSet<String> = out.iter().cloned().collect();
		for edge_id in &edges {
			if let Some(edge) = self.edge(edge_id) {
				let other = if edge.source == node {
					&edge.target
				} else {
					&edge.source
				};
				if seen.insert(other.clone()) {
					out.push(other.clone());
				}
			}
		}
		out.extend(edges);
		out
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn node(id: &str, kind: &str, label: &str) -> GraphNode {
		GraphNode {
			id: id.into(),
			kind: kind.into(),
			label: label.into(),
			..Default::default()
		}
	}

	fn edge(id: &str, source: &str, target: &str) -> GraphEdge {
		GraphEdge {
			id: id.into(),
			source: source.into(),
			target: target.into(),
			kind: "owns".into(),
			label: "owns".into(),
		}
	}

	#[test]
	fn single_valid_node_yields_one_element() {
		let report = validate_graph(&[node("org-1", "organization", "Acme")], &[]);
		assert_eq!(report.elements.len(), 1);
		assert_eq!(report.elements[0].display_label(), "Acme");
		assert!(report.rejected.is_empty());
	}

	#[test]
	fn blank_id_is_filtered_not_fatal() {
		let report = validate_graph(&[node("", "user", "")], &[]);
		assert!(report.elements.is_empty());
		assert_eq!(report.rejected.len(), 1);
		assert!(matches!(
			report.rejected[0],
			ValidationError::DataValidation { kind: RecordKind::Node, .. }
		));
	}

	#[test]
	fn whitespace_only_type_is_rejected() {
		let report = validate_graph(&[node("a", "  ", "A")], &[]);
		assert!(report.elements.is_empty());
	}

	#[test]
	fn dangling_edge_is_dropped_and_node_kept() {
		let report = validate_graph(
			&[node("org-1", "organization", "Acme")],
			&[edge("e1", "missing", "org-1")],
		);
		assert_eq!(report.elements.len(), 1);
		assert_eq!(report.elements[0].id(), "org-1");
		assert_eq!(
			report.rejected,
			vec![ValidationError::ReferentialIntegrity {
				edge: "e1".into(),
				missing: "missing".into()
			}]
		);
	}

	#[test]
	fn edges_without_any_valid_nodes_produce_nothing() {
		let report = validate_graph(&[node("", "user", "")], &[edge("e1", "a", "b")]);
		assert!(report.elements.is_empty());
	}

	#[test]
	fn edge_requires_type() {
		let mut e = edge("e1", "a", "b");
		e.kind.clear();
		let report = validate_graph(&[node("a", "user", ""), node("b", "user", "")], &[e]);
		assert_eq!(report.edge_count(), 0);
		assert_eq!(report.node_count(), 2);
	}

	#[test]
	fn nodes_come_before_edges() {
		let report = validate_graph(
			&[node("a", "user", "A"), node("b", "team", "B")],
			&[edge("e1", "a", "b")],
		);
		let ids: Vec<&str> = report.elements.iter().map(|e| e.id()).collect();
		assert_eq!(ids, vec!["a", "b", "e1"]);
	}

	#[test]
	fn label_fallback_chain() {
		let mut n = node("1234567890", "repository", "");
		n.data.insert("login".into(), json!("octocat"));
		assert_eq!(node_display_label(&n), "octocat");

		n.data.insert("name".into(), json!("hello-world"));
		assert_eq!(node_display_label(&n), "hello-world");

		n.data.clear();
		assert_eq!(node_display_label(&n), "repository 12345678…");

		let short = node("abc", "topic", "");
		assert_eq!(node_display_label(&short), "topic abc");

		let exact = node("12345678", "team", "");
		assert_eq!(node_display_label(&exact), "team 12345678");
	}

	#[test]
	fn non_string_name_is_skipped() {
		let mut n = node("u1", "user", "");
		n.data.insert("name".into(), json!(42));
		assert_eq!(node_display_label(&n), "user u1");
	}

	#[test]
	fn edge_label_falls_back_to_type() {
		let mut e = edge("e1", "a", "b");
		e.label.clear();
		assert_eq!(edge_display_label(&e), "owns");
	}

	#[test]
	fn duplicate_ids_keep_the_later_record() {
		let report = validate_graph(
			&[
				node("a", "user", "first"),
				node("b", "team", "B"),
				node("a", "user", "second"),
			],
			&[],
		);
		let labels: Vec<&str> = report.elements.iter().map(|e| e.display_label()).collect();
		assert_eq!(labels, vec!["B", "second"]);
		assert!(report.rejected.iter().any(|r| matches!(
			r,
			ValidationError::DuplicateId { kind: RecordKind::Node, .. }
		)));
	}

	#[test]
	fn edge_reusing_a_node_id_is_rejected() {
		let report = validate_graph(
			&[node("a", "user", "A"), node("x", "team", "X")],
			&[edge("x", "a", "x"), edge("e2", "x", "a")],
		);
		let ids: Vec<&str> = report.elements.iter().map(|e| e.id()).collect();
		assert_eq!(ids, vec!["a", "x", "e2"]);
		assert_eq!(
			report.rejected,
			vec![ValidationError::DuplicateId {
				kind: RecordKind::Edge,
				id: "x".into()
			}]
		);

		let index = GraphIndex::new(report.elements);
		assert_eq!(index.node("x").map(|n| n.display_label.as_str()), Some("X"));
		let mut hood = index.neighborhood("x");
		hood.sort();
		assert_eq!(hood, vec!["a", "e2", "x"]);
	}

	#[test]
	fn index_partitions_incoming_and_outgoing() {
		let report = validate_graph(
			&[
				node("org", "organization", "Org"),
				node("repo", "repository", "Repo"),
				node("team", "team", "Team"),
			],
			&[edge("e1", "org", "repo"), edge("e2", "team", "org")],
		);
		let index = GraphIndex::new(report.elements);
		assert_eq!(index.outgoing("org"), ["e1".to_string()]);
		assert_eq!(index.incoming("org"), ["e2".to_string()]);
		assert!(index.incoming("repo").contains(&"e1".to_string()));
		assert!(index.outgoing("repo").is_empty());
	}

	#[test]
	fn neighborhood_is_one_hop() {
		let report = validate_graph(
			&[
				node("a", "user", "A"),
				node("b", "user", "B"),
				node("c", "user", "C"),
				node("d", "user", "D"),
			],
			&[edge("ab", "a", "b"), edge("ca", "c", "a"), edge("cd", "c", "d"), edge("aa", "a", "a")],
		);
		let index = GraphIndex::new(report.elements);
		let mut hood = index.neighborhood("a");
		hood.sort();
		assert_eq!(hood, vec!["a", "aa", "ab", "b", "c", "ca"]);
		assert!(index.neighborhood("ab").is_empty());
	}
}
