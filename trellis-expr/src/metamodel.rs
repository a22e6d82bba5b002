//! Static facts about the persistent domain model.
//!
//! The semantic analyses never introspect live objects. They consult a
//! [`Metamodel`]: an oracle answering, for an entity and attribute name,
//! whether that attribute is a collection, an identifier, or optional. The
//! in-memory implementation here is assembled by [`MetamodelBuilder`] and
//! validated once, up front, so the analyses can trust every attribute they
//! are handed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use trellis_errors::{TrellisError, TrellisResult};

/// How an attribute relates its owner to its target.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    /// A plain column holding a basic value.
    Basic,
    /// A reference to a single related entity.
    ToOne,
    /// A collection of related entities.
    ToMany,
    /// A value type flattened into its owner.
    Embedded,
    /// A collection of basic or embedded values.
    ElementCollection,
}

/// The program member an attribute is read through.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Member {
    /// A stored field.
    Field(String),
    /// A property accessor method.
    Accessor(String),
}

impl Member {
    fn is_well_formed(&self) -> bool {
        match self {
            Member::Field(name) | Member::Accessor(name) => !name.is_empty(),
        }
    }
}

/// Whether an association is loaded together with its owner or on demand.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum FetchStyle {
    Eager,
    Lazy,
}

/// Facts about one attribute of an entity.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub kind: RelationshipKind,
    pub is_id: bool,
    pub is_optional: bool,
    pub fetch_style: FetchStyle,
    /// The backing member. `None` only while under construction; rejected by
    /// [`MetamodelBuilder::build`].
    pub member: Option<Member>,
}

impl Attribute {
    pub fn is_collection(&self) -> bool {
        matches!(
            self.kind,
            RelationshipKind::ToMany | RelationshipKind::ElementCollection
        )
    }

    /// True for attributes that reference other entities.
    pub fn is_association(&self) -> bool {
        matches!(self.kind, RelationshipKind::ToOne | RelationshipKind::ToMany)
    }
}

/// An entity and its attributes.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EntityType {
    name: String,
    attributes: HashMap<String, Attribute>,
}

impl EntityType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> TrellisResult<&Attribute> {
        self.attributes
            .get(name)
            .ok_or_else(|| TrellisError::UnknownAttribute {
                entity: self.name.clone(),
                attribute: name.to_owned(),
            })
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }
}

/// Read-only oracle answering the questions the semantic analyses ask about
/// entities and their attributes. Implementations must be cheap to query;
/// the analyses call in from every path hop.
pub trait Metamodel {
    fn entity(&self, name: &str) -> TrellisResult<&EntityType>;

    fn attribute(&self, entity: &str, attribute: &str) -> TrellisResult<&Attribute> {
        self.entity(entity)?.attribute(attribute)
    }
}

/// In-memory [`Metamodel`] produced by [`MetamodelBuilder::build`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StaticMetamodel {
    entities: HashMap<String, EntityType>,
}

impl Metamodel for StaticMetamodel {
    fn entity(&self, name: &str) -> TrellisResult<&EntityType> {
        self.entities
            .get(name)
            .ok_or_else(|| TrellisError::UnknownEntity {
                entity: name.to_owned(),
            })
    }
}

/// Collects entity declarations and validates them into a [`StaticMetamodel`].
#[derive(Debug, Default)]
pub struct MetamodelBuilder {
    entities: HashMap<String, EntityType>,
}

impl MetamodelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts declaring an entity; attributes are added on the returned
    /// builder.
    pub fn entity(self, name: impl Into<String>) -> EntityBuilder {
        EntityBuilder {
            parent: self,
            entity: EntityType {
                name: name.into(),
                attributes: HashMap::new(),
            },
        }
    }

    /// Validates every declared attribute and produces the metamodel.
    ///
    /// An attribute whose backing member is missing or unnamed is rejected
    /// with [`TrellisError::MalformedAttributeMember`].
    pub fn build(self) -> TrellisResult<StaticMetamodel> {
        for entity in self.entities.values() {
            for attribute in entity.attributes() {
                let well_formed = attribute
                    .member
                    .as_ref()
                    .is_some_and(Member::is_well_formed);
                if !well_formed {
                    return Err(TrellisError::MalformedAttributeMember {
                        entity: entity.name().to_owned(),
                        attribute: attribute.name.clone(),
                    });
                }
            }
        }
        Ok(StaticMetamodel {
            entities: self.entities,
        })
    }
}

/// Declares the attributes of one entity; created by
/// [`MetamodelBuilder::entity`].
#[derive(Debug)]
pub struct EntityBuilder {
    parent: MetamodelBuilder,
    entity: EntityType,
}

impl EntityBuilder {
    /// The entity's singular identifier.
    pub fn id(self, name: impl Into<String>) -> Self {
        let mut attribute = field_backed(name.into(), RelationshipKind::Basic);
        attribute.is_id = true;
        self.push(attribute)
    }

    /// A basic, non-optional column.
    pub fn basic(self, name: impl Into<String>) -> Self {
        self.push(field_backed(name.into(), RelationshipKind::Basic))
    }

    /// A basic column that may hold NULL.
    pub fn optional(self, name: impl Into<String>) -> Self {
        let mut attribute = field_backed(name.into(), RelationshipKind::Basic);
        attribute.is_optional = true;
        self.push(attribute)
    }

    /// A to-one association. Optional associations may resolve to no row.
    pub fn to_one(self, name: impl Into<String>, optional: bool) -> Self {
        let mut attribute = field_backed(name.into(), RelationshipKind::ToOne);
        attribute.is_optional = optional;
        self.push(attribute)
    }

    /// A to-many association; loaded on demand.
    pub fn to_many(self, name: impl Into<String>) -> Self {
        let mut attribute = field_backed(name.into(), RelationshipKind::ToMany);
        attribute.fetch_style = FetchStyle::Lazy;
        self.push(attribute)
    }

    /// A collection of basic or embedded values; loaded on demand.
    pub fn element_collection(self, name: impl Into<String>) -> Self {
        let mut attribute = field_backed(name.into(), RelationshipKind::ElementCollection);
        attribute.fetch_style = FetchStyle::Lazy;
        self.push(attribute)
    }

    /// A value type flattened into this entity.
    pub fn embedded(self, name: impl Into<String>) -> Self {
        self.push(field_backed(name.into(), RelationshipKind::Embedded))
    }

    /// Adds a fully spelled-out attribute; the escape hatch for shapes the
    /// shorthands do not cover.
    pub fn attribute(self, attribute: Attribute) -> Self {
        self.push(attribute)
    }

    /// Finishes this entity and returns to the metamodel builder.
    pub fn finish(mut self) -> MetamodelBuilder {
        self.parent
            .entities
            .insert(self.entity.name.clone(), self.entity);
        self.parent
    }

    fn push(mut self, attribute: Attribute) -> Self {
        self.entity
            .attributes
            .insert(attribute.name.clone(), attribute);
        self
    }
}

fn field_backed(name: String, kind: RelationshipKind) -> Attribute {
    Attribute {
        member: Some(Member::Field(name.clone())),
        name,
        kind,
        is_id: false,
        is_optional: false,
        fetch_style: FetchStyle::Eager,
    }
}
