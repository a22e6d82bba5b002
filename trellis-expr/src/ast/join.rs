use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a node in a [`JoinForest`].
///
/// Ids are only meaningful for the forest that issued them; indexing a forest
/// with a foreign id is a caller contract violation and panics like any other
/// out-of-range access.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct JoinNodeId(usize);

impl fmt::Display for JoinNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// One node of a join tree: the entity it ranges over, its alias, and the
/// link to its parent.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct JoinNode {
    pub entity: String,
    pub alias: String,
    /// The parent node and the name of the attribute on the parent's entity
    /// that relates the two; `None` for a root.
    pub parent: Option<(JoinNodeId, String)>,
}

impl JoinNode {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Append-only arena of join nodes.
///
/// A child's parent must already be in the forest when the child is added, so
/// every chain of parent links terminates at a root; cycles cannot be
/// constructed.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct JoinForest {
    nodes: Vec<JoinNode>,
}

impl JoinForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a root node ranging over `entity`.
    pub fn add_root(
        &mut self,
        entity: impl Into<String>,
        alias: impl Into<String>,
    ) -> JoinNodeId {
        self.push(JoinNode {
            entity: entity.into(),
            alias: alias.into(),
            parent: None,
        })
    }

    /// Adds a node joined to `parent` through the named attribute of the
    /// parent's entity.
    pub fn add_child(
        &mut self,
        parent: JoinNodeId,
        attribute: impl Into<String>,
        entity: impl Into<String>,
        alias: impl Into<String>,
    ) -> JoinNodeId {
        assert!(
            parent.0 < self.nodes.len(),
            "parent {parent} is not part of this forest"
        );
        self.push(JoinNode {
            entity: entity.into(),
            alias: alias.into(),
            parent: Some((parent, attribute.into())),
        })
    }

    fn push(&mut self, node: JoinNode) -> JoinNodeId {
        let id = JoinNodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: JoinNodeId) -> &JoinNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates the hops from `id` up to its root. Each item pairs the parent
    /// node with the name of the attribute connecting the child to it; a root
    /// yields nothing.
    pub fn hops_to_root(&self, id: JoinNodeId) -> Hops<'_> {
        Hops {
            forest: self,
            current: Some(id),
        }
    }
}

/// Iterator returned by [`JoinForest::hops_to_root`].
pub struct Hops<'a> {
    forest: &'a JoinForest,
    current: Option<JoinNodeId>,
}

impl<'a> Iterator for Hops<'a> {
    type Item = (&'a JoinNode, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        match &self.forest.node(id).parent {
            Some((parent_id, attribute)) => {
                self.current = Some(*parent_id);
                Some((self.forest.node(*parent_id), attribute.as_str()))
            }
            None => {
                self.current = None;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hops_walk_to_the_root() {
        let mut forest = JoinForest::new();
        let doc = forest.add_root("Document", "d");
        let owner = forest.add_child(doc, "owner", "Person", "owner_1");
        let friend = forest.add_child(owner, "friend", "Person", "friend_1");

        let hops: Vec<_> = forest
            .hops_to_root(friend)
            .map(|(node, attribute)| (node.alias.as_str(), attribute))
            .collect();
        assert_eq!(hops, vec![("owner_1", "friend"), ("d", "owner")]);

        assert_eq!(forest.hops_to_root(doc).count(), 0);
        assert!(forest.node(doc).is_root());
        assert!(!forest.node(friend).is_root());
        assert_eq!(forest.len(), 3);
    }
}
