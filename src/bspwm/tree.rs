//! Minimal serde structs for the JSON bspwm prints, and the tree walk over
//! them.
//!
//! bspwm lays out every desktop as a binary tree: internal nodes split
//! space between exactly two children, leaves hold windows.  The walk here
//! is pure and knows nothing about classification; the
//! [`BindingEngine`](crate::binding::BindingEngine) classifies whatever it
//! returns.

use crate::command::{DesktopId, DesktopInfo, NodeId};
use serde::Deserialize;

/// Subset of the document printed by `bspc wm -d`.
#[derive(Debug, Deserialize)]
pub struct WmState {
    #[serde(default)]
    pub monitors: Vec<MonitorJson>,
}

#[derive(Debug, Deserialize)]
pub struct MonitorJson {
    #[serde(default)]
    pub desktops: Vec<DesktopJson>,
}

#[derive(Debug, Deserialize)]
pub struct DesktopJson {
    pub id: DesktopId,
    pub name: String,
    /// `null` for an empty desktop.
    pub root: Option<Node>,
}

/// One node of a desktop's layout tree, as printed by `bspc wm -d` and
/// `bspc query -T -n <id>`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub first_child: Option<Box<Node>>,
    pub second_child: Option<Box<Node>>,
    /// `null` for internal nodes and receptacles.
    pub client: Option<ClientJson>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientJson {
    pub class_name: String,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.first_child.is_none() && self.second_child.is_none()
    }

    /// Ids of every leaf below (and including) this node, in pre-order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        let mut stack: Vec<&Node> = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                leaves.push(node.id);
                continue;
            }
            // Push second first so the first child is visited first.
            if let Some(second) = &node.second_child {
                stack.push(second);
            }
            if let Some(first) = &node.first_child {
                stack.push(first);
            }
        }
        leaves
    }

    pub fn class_name(&self) -> Option<&str> {
        self.client.as_ref().map(|c| c.class_name.as_str())
    }
}

impl WmState {
    /// Flatten every monitor's desktops, with their windows enumerated.
    pub fn desktops(&self) -> Vec<DesktopInfo> {
        self.monitors
            .iter()
            .flat_map(|m| m.desktops.iter())
            .map(|d| DesktopInfo {
                id: d.id,
                name: d.name.clone(),
                windows: d.root.as_ref().map(Node::leaves).unwrap_or_default(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trimmed-down `bspc wm -d` output: desktop "term" holds a split with a
    // nested split on the right, desktop "2" is empty.
    const STATE: &str = r#"{
        "focusedMonitorId": 1,
        "monitors": [{
            "name": "eDP1",
            "id": 1,
            "desktops": [
                {
                    "name": "term",
                    "id": 2097154,
                    "layout": "tiled",
                    "root": {
                        "id": 100,
                        "splitType": "vertical",
                        "client": null,
                        "firstChild": {
                            "id": 101, "firstChild": null, "secondChild": null,
                            "client": { "className": "XTerm", "instanceName": "xterm" }
                        },
                        "secondChild": {
                            "id": 102,
                            "client": null,
                            "firstChild": {
                                "id": 103, "firstChild": null, "secondChild": null,
                                "client": { "className": "XTerm", "instanceName": "xterm" }
                            },
                            "secondChild": {
                                "id": 104, "firstChild": null, "secondChild": null,
                                "client": { "className": "Firefox", "instanceName": "Navigator" }
                            }
                        }
                    }
                },
                { "name": "2", "id": 2097155, "root": null }
            ]
        }]
    }"#;

    #[test]
    fn desktops_are_flattened_with_pre_order_windows() {
        let state: WmState = serde_json::from_str(STATE).unwrap();
        let desktops = state.desktops();
        assert_eq!(desktops.len(), 2);
        assert_eq!(desktops[0].name, "term");
        assert_eq!(desktops[0].id, DesktopId(2097154));
        assert_eq!(
            desktops[0].windows,
            vec![NodeId(101), NodeId(103), NodeId(104)]
        );
        assert_eq!(desktops[1].name, "2");
        assert!(desktops[1].windows.is_empty());
    }

    #[test]
    fn single_window_root_is_its_own_leaf() {
        let json = r#"{ "id": 7, "firstChild": null, "secondChild": null,
                        "client": { "className": "XTerm" } }"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert!(node.is_leaf());
        assert_eq!(node.leaves(), vec![NodeId(7)]);
        assert_eq!(node.class_name(), Some("XTerm"));
    }

    #[test]
    fn internal_node_has_no_class() {
        let state: WmState = serde_json::from_str(STATE).unwrap();
        let root = state.monitors[0].desktops[0].root.as_ref().unwrap();
        assert!(!root.is_leaf());
        assert_eq!(root.class_name(), None);
    }

    #[test]
    fn multiple_monitors_are_concatenated_in_order() {
        let json = r#"{ "monitors": [
            { "name": "A", "desktops": [ { "name": "a1", "id": 1, "root": null } ] },
            { "name": "B", "desktops": [ { "name": "b1", "id": 2, "root": null } ] }
        ] }"#;
        let state: WmState = serde_json::from_str(json).unwrap();
        let names: Vec<String> = state.desktops().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["a1", "b1"]);
    }

    #[test]
    fn monitor_name_is_not_required() {
        let json = r#"{"monitors":[{"desktops":[{"name":"1","id":7,"root":null}]}]}"#;
        let state: WmState = serde_json::from_str(json).unwrap();
        let names: Vec<String> = state.desktops().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["1"]);
    }
}
