//! # Attribute Accessors
//!
//! Nine operations (get one, get all, has, set, update one, remove, replace,
//! merge, update all) over three families of attribute maps:
//!
//! - node maps, addressed through a [`NodeRef`] (the node itself, an edge's
//!   source or target, or the opposite endpoint of an edge);
//! - edge maps, addressed through an [`EdgeRef`] under a type filter;
//! - the graph's own map.
//!
//! Mutations are described once by [`AttributeMutation`]; the named methods
//! are thin wrappers generated by `node_attribute_accessors!` and
//! `edge_attribute_accessors!`.

use crate::arena::{EdgeIndex, NodeIndex};
use crate::events::{AttributeUpdate, GraphEvent};
use crate::graph::Graph;
use crate::types::{
    Attributes, EdgeRef, GraphError, GraphType, NodeRef, UpdateHints, Value, object_from,
};
use std::fmt;

// =============================================================================
// MUTATIONS
// =============================================================================

type ValueUpdater<'f> = Box<dyn FnOnce(Option<&Value>) -> Value + 'f>;
type MapUpdater<'f> = Box<dyn FnOnce(Attributes) -> Attributes + 'f>;

/// One write applied to an attribute map.
pub(crate) enum AttributeMutation<'f> {
    Set(String, Value),
    Update(String, ValueUpdater<'f>),
    Remove(String),
    Replace(Attributes),
    Merge(Attributes),
    UpdateAll(MapUpdater<'f>),
}

/// What an applied mutation reports to listeners.
pub(crate) struct Applied {
    pub kind: AttributeUpdate,
    pub name: Option<String>,
    pub data: Option<Attributes>,
}

impl AttributeMutation<'_> {
    pub(crate) fn apply(self, attributes: &mut Attributes) -> Applied {
        let (kind, name, data) = match self {
            Self::Set(name, value) => {
                attributes.insert(name.clone(), value);
                (AttributeUpdate::Set, Some(name), None)
            }
            Self::Update(name, updater) => {
                let next = updater(attributes.get(&name));
                attributes.insert(name.clone(), next);
                (AttributeUpdate::Set, Some(name), None)
            }
            Self::Remove(name) => {
                attributes.shift_remove(&name);
                (AttributeUpdate::Remove, Some(name), None)
            }
            Self::Replace(replacement) => {
                *attributes = replacement;
                (AttributeUpdate::Replace, None, None)
            }
            Self::Merge(data) => {
                attributes.extend(data.clone());
                (AttributeUpdate::Merge, None, Some(data))
            }
            Self::UpdateAll(updater) => {
                *attributes = updater(std::mem::take(attributes));
                (AttributeUpdate::Update, None, None)
            }
        };
        Applied { kind, name, data }
    }
}

/// Endpoint context handed to `update_each_edge_attributes` updaters.
#[derive(Debug, Clone, Copy)]
pub struct EdgeContext<'a> {
    pub key: &'a str,
    pub source: &'a str,
    pub target: &'a str,
    pub source_attributes: &'a Attributes,
    pub target_attributes: &'a Attributes,
    pub undirected: bool,
}

// =============================================================================
// RESOLUTION & APPLICATION
// =============================================================================

impl Graph {
    pub(crate) fn resolve_node(
        &self,
        method: &str,
        target: &NodeRef,
    ) -> Result<NodeIndex, GraphError> {
        match target {
            NodeRef::Node(key) => self.require_node(method, key),
            NodeRef::Source(edge) => Ok(self.edges[self.require_edge(method, edge)?].source),
            NodeRef::Target(edge) => Ok(self.edges[self.require_edge(method, edge)?].target),
            NodeRef::Opposite { node, edge } => {
                let index = self.require_node(method, node)?;
                self.edges[self.require_edge(method, edge)?]
                    .opposite(index)
                    .ok_or_else(|| {
                        GraphError::not_found(
                            method,
                            format!("the \"{node}\" node is not attached to the \"{edge}\" edge"),
                        )
                    })
            }
        }
    }

    pub(crate) fn mutate_node_attributes(
        &mut self,
        method: &str,
        target: &NodeRef,
        mutation: AttributeMutation<'_>,
    ) -> Result<(), GraphError> {
        let node = self.resolve_node(method, target)?;
        let record = &mut self.nodes[node];
        let applied = mutation.apply(&mut record.attributes);
        self.events.emit(&GraphEvent::NodeAttributesUpdated {
            key: &record.key,
            kind: applied.kind,
            attributes: &record.attributes,
            name: applied.name.as_deref(),
            data: applied.data.as_ref(),
        });
        Ok(())
    }

    pub(crate) fn mutate_edge_attributes(
        &mut self,
        method: &str,
        filter: GraphType,
        edge: &EdgeRef,
        mutation: AttributeMutation<'_>,
    ) -> Result<(), GraphError> {
        let edge: EdgeIndex = self.resolve_edge(method, filter, edge)?;
        let record = &mut self.edges[edge];
        let applied = mutation.apply(&mut record.attributes);
        self.events.emit(&GraphEvent::EdgeAttributesUpdated {
            key: &record.key,
            kind: applied.kind,
            attributes: &record.attributes,
            name: applied.name.as_deref(),
            data: applied.data.as_ref(),
        });
        Ok(())
    }

    fn mutate_graph_attributes(&mut self, mutation: AttributeMutation<'_>) {
        let applied = mutation.apply(&mut self.attributes);
        self.events.emit(&GraphEvent::AttributesUpdated {
            kind: applied.kind,
            attributes: &self.attributes,
            name: applied.name.as_deref(),
            data: applied.data.as_ref(),
        });
    }

    // =========================================================================
    // GRAPH ATTRIBUTES
    // =========================================================================

    pub fn get_attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn get_attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<Value>) {
        self.mutate_graph_attributes(AttributeMutation::Set(name.to_string(), value.into()));
    }

    pub fn update_attribute(&mut self, name: &str, updater: impl FnOnce(Option<&Value>) -> Value) {
        self.mutate_graph_attributes(AttributeMutation::Update(
            name.to_string(),
            Box::new(updater),
        ));
    }

    pub fn remove_attribute(&mut self, name: &str) {
        self.mutate_graph_attributes(AttributeMutation::Remove(name.to_string()));
    }

    pub fn replace_attributes(&mut self, attributes: impl Into<Value>) -> Result<(), GraphError> {
        let attributes = object_from("replace_attributes", attributes.into())?;
        self.mutate_graph_attributes(AttributeMutation::Replace(attributes));
        Ok(())
    }

    pub fn merge_attributes(&mut self, attributes: impl Into<Value>) -> Result<(), GraphError> {
        let attributes = object_from("merge_attributes", attributes.into())?;
        self.mutate_graph_attributes(AttributeMutation::Merge(attributes));
        Ok(())
    }

    pub fn update_attributes(&mut self, updater: impl FnOnce(Attributes) -> Attributes) {
        self.mutate_graph_attributes(AttributeMutation::UpdateAll(Box::new(updater)));
    }

    // =========================================================================
    // BULK UPDATES
    // =========================================================================

    /// Pass every node's attributes through `updater(key, attributes)`.
    pub fn update_each_node_attributes(
        &mut self,
        mut updater: impl FnMut(&str, Attributes) -> Attributes,
        hints: Option<UpdateHints>,
    ) {
        for &node in self.node_keys.values() {
            let record = &mut self.nodes[node];
            record.attributes = updater(&record.key, std::mem::take(&mut record.attributes));
        }
        self.events.emit(&GraphEvent::EachNodeAttributesUpdated {
            hints: hints.as_ref(),
        });
    }

    /// Pass every edge's attributes through `updater(context, attributes)`.
    pub fn update_each_edge_attributes(
        &mut self,
        mut updater: impl FnMut(EdgeContext<'_>, Attributes) -> Attributes,
        hints: Option<UpdateHints>,
    ) {
        for &edge in self.edge_keys.values() {
            let record = &mut self.edges[edge];
            let source = &self.nodes[record.source];
            let target = &self.nodes[record.target];
            let context = EdgeContext {
                key: &record.key,
                source: &source.key,
                target: &target.key,
                source_attributes: &source.attributes,
                target_attributes: &target.attributes,
                undirected: record.undirected,
            };
            record.attributes = updater(context, std::mem::take(&mut record.attributes));
        }
        self.events.emit(&GraphEvent::EachEdgeAttributesUpdated {
            hints: hints.as_ref(),
        });
    }
}

// =============================================================================
// GENERATED ACCESSORS
// =============================================================================

macro_rules! node_attribute_accessors {
    ($(
        ($($arg:ident),+) => $target:expr;
        $get:ident, $get_all:ident, $has:ident,
        $set:ident, $update:ident, $remove:ident,
        $replace:ident, $merge:ident, $update_all:ident;
    )*) => {
        impl Graph {
            $(
                pub fn $get(
                    &self,
                    $($arg: impl fmt::Display,)+
                    name: &str,
                ) -> Result<Option<&Value>, GraphError> {
                    let node = self.resolve_node(stringify!($get), &$target)?;
                    Ok(self.nodes[node].attributes.get(name))
                }

                pub fn $get_all(
                    &self,
                    $($arg: impl fmt::Display,)+
                ) -> Result<&Attributes, GraphError> {
                    let node = self.resolve_node(stringify!($get_all), &$target)?;
                    Ok(&self.nodes[node].attributes)
                }

                pub fn $has(
                    &self,
                    $($arg: impl fmt::Display,)+
                    name: &str,
                ) -> Result<bool, GraphError> {
                    let node = self.resolve_node(stringify!($has), &$target)?;
                    Ok(self.nodes[node].attributes.contains_key(name))
                }

                pub fn $set(
                    &mut self,
                    $($arg: impl fmt::Display,)+
                    name: &str,
                    value: impl Into<Value>,
                ) -> Result<(), GraphError> {
                    self.mutate_node_attributes(
                        stringify!($set),
                        &$target,
                        AttributeMutation::Set(name.to_string(), value.into()),
                    )
                }

                pub fn $update(
                    &mut self,
                    $($arg: impl fmt::Display,)+
                    name: &str,
                    updater: impl FnOnce(Option<&Value>) -> Value,
                ) -> Result<(), GraphError> {
                    self.mutate_node_attributes(
                        stringify!($update),
                        &$target,
                        AttributeMutation::Update(name.to_string(), Box::new(updater)),
                    )
                }

                pub fn $remove(
                    &mut self,
                    $($arg: impl fmt::Display,)+
                    name: &str,
                ) -> Result<(), GraphError> {
                    self.mutate_node_attributes(
                        stringify!($remove),
                        &$target,
                        AttributeMutation::Remove(name.to_string()),
                    )
                }

                pub fn $replace(
                    &mut self,
                    $($arg: impl fmt::Display,)+
                    attributes: impl Into<Value>,
                ) -> Result<(), GraphError> {
                    let attributes = object_from(stringify!($replace), attributes.into())?;
                    self.mutate_node_attributes(
                        stringify!($replace),
                        &$target,
                        AttributeMutation::Replace(attributes),
                    )
                }

                pub fn $merge(
                    &mut self,
                    $($arg: impl fmt::Display,)+
                    attributes: impl Into<Value>,
                ) -> Result<(), GraphError> {
                    let attributes = object_from(stringify!($merge), attributes.into())?;
                    self.mutate_node_attributes(
                        stringify!($merge),
                        &$target,
                        AttributeMutation::Merge(attributes),
                    )
                }

                pub fn $update_all(
                    &mut self,
                    $($arg: impl fmt::Display,)+
                    updater: impl FnOnce(Attributes) -> Attributes,
                ) -> Result<(), GraphError> {
                    self.mutate_node_attributes(
                        stringify!($update_all),
                        &$target,
                        AttributeMutation::UpdateAll(Box::new(updater)),
                    )
                }
            )*
        }
    };
}

node_attribute_accessors! {
    (node) => NodeRef::node(node);
        get_node_attribute, get_node_attributes, has_node_attribute,
        set_node_attribute, update_node_attribute, remove_node_attribute,
        replace_node_attributes, merge_node_attributes, update_node_attributes;
    (edge) => NodeRef::source(edge);
        get_source_attribute, get_source_attributes, has_source_attribute,
        set_source_attribute, update_source_attribute, remove_source_attribute,
        replace_source_attributes, merge_source_attributes, update_source_attributes;
    (edge) => NodeRef::target(edge);
        get_target_attribute, get_target_attributes, has_target_attribute,
        set_target_attribute, update_target_attribute, remove_target_attribute,
        replace_target_attributes, merge_target_attributes, update_target_attributes;
    (node, edge) => NodeRef::opposite(node, edge);
        get_opposite_attribute, get_opposite_attributes, has_opposite_attribute,
        set_opposite_attribute, update_opposite_attribute, remove_opposite_attribute,
        replace_opposite_attributes, merge_opposite_attributes, update_opposite_attributes;
}

macro_rules! edge_attribute_accessors {
    ($(
        $filter:ident;
        $get:ident, $get_all:ident, $has:ident,
        $set:ident, $update:ident, $remove:ident,
        $replace:ident, $merge:ident, $update_all:ident;
    )*) => {
        impl Graph {
            $(
                pub fn $get(
                    &self,
                    edge: impl Into<EdgeRef>,
                    name: &str,
                ) -> Result<Option<&Value>, GraphError> {
                    let edge = self.resolve_edge(stringify!($get), GraphType::$filter, &edge.into())?;
                    Ok(self.edges[edge].attributes.get(name))
                }

                pub fn $get_all(&self, edge: impl Into<EdgeRef>) -> Result<&Attributes, GraphError> {
                    let edge =
                        self.resolve_edge(stringify!($get_all), GraphType::$filter, &edge.into())?;
                    Ok(&self.edges[edge].attributes)
                }

                pub fn $has(&self, edge: impl Into<EdgeRef>, name: &str) -> Result<bool, GraphError> {
                    let edge = self.resolve_edge(stringify!($has), GraphType::$filter, &edge.into())?;
                    Ok(self.edges[edge].attributes.contains_key(name))
                }

                pub fn $set(
                    &mut self,
                    edge: impl Into<EdgeRef>,
                    name: &str,
                    value: impl Into<Value>,
                ) -> Result<(), GraphError> {
                    self.mutate_edge_attributes(
                        stringify!($set),
                        GraphType::$filter,
                        &edge.into(),
                        AttributeMutation::Set(name.to_string(), value.into()),
                    )
                }

                pub fn $update(
                    &mut self,
                    edge: impl Into<EdgeRef>,
                    name: &str,
                    updater: impl FnOnce(Option<&Value>) -> Value,
                ) -> Result<(), GraphError> {
                    self.mutate_edge_attributes(
                        stringify!($update),
                        GraphType::$filter,
                        &edge.into(),
                        AttributeMutation::Update(name.to_string(), Box::new(updater)),
                    )
                }

                pub fn $remove(&mut self, edge: impl Into<EdgeRef>, name: &str) -> Result<(), GraphError> {
                    self.mutate_edge_attributes(
                        stringify!($remove),
                        GraphType::$filter,
                        &edge.into(),
                        AttributeMutation::Remove(name.to_string()),
                    )
                }

                pub fn $replace(
                    &mut self,
                    edge: impl Into<EdgeRef>,
                    attributes: impl Into<Value>,
                ) -> Result<(), GraphError> {
                    let attributes = object_from(stringify!($replace), attributes.into())?;
                    self.mutate_edge_attributes(
                        stringify!($replace),
                        GraphType::$filter,
                        &edge.into(),
                        AttributeMutation::Replace(attributes),
                    )
                }

                pub fn $merge(
                    &mut self,
                    edge: impl Into<EdgeRef>,
                    attributes: impl Into<Value>,
                ) -> Result<(), GraphError> {
                    let attributes = object_from(stringify!($merge), attributes.into())?;
                    self.mutate_edge_attributes(
                        stringify!($merge),
                        GraphType::$filter,
                        &edge.into(),
                        AttributeMutation::Merge(attributes),
                    )
                }

                pub fn $update_all(
                    &mut self,
                    edge: impl Into<EdgeRef>,
                    updater: impl FnOnce(Attributes) -> Attributes,
                ) -> Result<(), GraphError> {
                    self.mutate_edge_attributes(
                        stringify!($update_all),
                        GraphType::$filter,
                        &edge.into(),
                        AttributeMutation::UpdateAll(Box::new(updater)),
                    )
                }
            )*
        }
    };
}

edge_attribute_accessors! {
    Mixed;
        get_edge_attribute, get_edge_attributes, has_edge_attribute,
        set_edge_attribute, update_edge_attribute, remove_edge_attribute,
        replace_edge_attributes, merge_edge_attributes, update_edge_attributes;
    Directed;
        get_directed_edge_attribute, get_directed_edge_attributes, has_directed_edge_attribute,
        set_directed_edge_attribute, update_directed_edge_attribute, remove_directed_edge_attribute,
        replace_directed_edge_attributes, merge_directed_edge_attributes,
        update_directed_edge_attributes;
    Undirected;
        get_undirected_edge_attribute, get_undirected_edge_attributes,
        has_undirected_edge_attribute, set_undirected_edge_attribute,
        update_undirected_edge_attribute, remove_undirected_edge_attribute,
        replace_undirected_edge_attributes, merge_undirected_edge_attributes,
        update_undirected_edge_attributes;
}

// =============================================================================
// TESTS
// =============================================================================
