//! Mind-map tree node.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use termtree::Tree;

/// One node of the mind-map. Built bottom-up and never mutated afterwards.
///
/// Serializes to the widget contract `{"data": {"text", "expand"}, "children"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    label: String,
    expanded: bool,
    children: Vec<Node>,
}

impl Node {
    /// Childless node.
    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            expanded: false,
            children: Vec::new(),
        }
    }

    pub fn branch(label: impl Into<String>, expanded: bool, children: Vec<Node>) -> Self {
        Self {
            label: label.into(),
            expanded,
            children,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// First direct child with exactly this label.
    pub fn child(&self, label: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.label == label)
    }

    /// Labels of the direct children, in order.
    pub fn child_labels(&self) -> Vec<&str> {
        self.children.iter().map(|c| c.label.as_str()).collect()
    }

    /// Number of nodes in this subtree, self included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
    }
}

#[derive(Serialize)]
struct NodeData<'a> {
    text: &'a str,
    expand: bool,
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Node", 2)?;
        state.serialize_field(
            "data",
            &NodeData {
                text: &self.label,
                expand: self.expanded,
            },
        )?;
        state.serialize_field("children", &self.children)?;
        state.end()
    }
}

/// Conversion into a printable terminal tree.
pub trait TreeNodeConvert {
    /// Full tree.
    fn to_tree_string(&self) -> Tree<String>;

    /// Tree as the widget first shows it: children of collapsed nodes hidden.
    fn to_collapsed_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for Node {
    fn to_tree_string(&self) -> Tree<String> {
        let leaves: Vec<_> = self.children.iter().map(|c| c.to_tree_string()).collect();
        Tree::new(self.label.clone()).with_leaves(leaves)
    }

    fn to_collapsed_tree_string(&self) -> Tree<String> {
        if !self.expanded && !self.children.is_empty() {
            return Tree::new(format!("{} [+{}]", self.label, self.children.len()));
        }
        let leaves: Vec<_> = self
            .children
            .iter()
            .map(|c| c.to_collapsed_tree_string())
            .collect();
        Tree::new(self.label.clone()).with_leaves(leaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Node {
        Node::branch(
            "root",
            true,
            vec![
                Node::leaf("a"),
                Node::branch("b", false, vec![Node::leaf("b1"), Node::leaf("b2")]),
            ],
        )
    }

    #[test]
    fn given_tree_when_serializing_then_matches_widget_shape() {
        let value = serde_json::to_value(sample()).unwrap();

        assert_eq!(
            value,
            json!({
                "data": {"text": "root", "expand": true},
                "children": [
                    {"data": {"text": "a", "expand": false}, "children": []},
                    {"data": {"text": "b", "expand": false}, "children": [
                        {"data": {"text": "b1", "expand": false}, "children": []},
                        {"data": {"text": "b2", "expand": false}, "children": []}
                    ]}
                ]
            })
        );
    }

    #[test]
    fn given_tree_when_counting_then_includes_all_nodes() {
        let node = sample();
        assert_eq!(node.count(), 5);
        assert_eq!(node.child_labels(), vec!["a", "b"]);
    }

    #[test]
    fn given_collapsed_branch_when_rendering_collapsed_then_hides_children() {
        let rendered = sample().to_collapsed_tree_string().to_string();

        assert!(rendered.contains("b [+2]"));
        assert!(!rendered.contains("b1"));
    }

    #[test]
    fn given_tree_when_rendering_full_then_shows_every_label() {
        let rendered = sample().to_tree_string().to_string();

        for label in ["root", "a", "b", "b1", "b2"] {
            assert!(rendered.contains(label), "missing {}", label);
        }
    }
}
