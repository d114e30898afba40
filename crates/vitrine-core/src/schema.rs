//! Schema registry.
//!
//! The registry names every resource a query may target, the columns each one
//! carries, and the relationships that may be expanded inline. Queries are
//! validated against it at execution time, so an unknown name turns into one
//! well-defined error instead of an empty result.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Column every resource carries implicitly.
pub const ID_COLUMN: &str = "id";

/// Cardinality of a declared relationship, seen from the declaring resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipKind {
    /// One row here, many rows there (`products` → `product_variants`)
    OneToMany,
    /// One row here, at most one row there (`profiles` → `vip_memberships`)
    OneToOne,
    /// Many rows here point at one row there (`products` → `categories`)
    ManyToOne,
}

/// A foreign-key relationship from one resource to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Name used in select specs and dotted filter paths
    pub name: String,
    /// Related resource
    pub target: String,
    /// Cardinality
    pub kind: RelationshipKind,
    /// Column on the declaring resource
    pub local_column: String,
    /// Column on the target resource that must equal `local_column`
    pub foreign_column: String,
}

impl Relationship {
    /// Whether an expansion of this relationship yields a sequence.
    pub fn is_to_many(&self) -> bool {
        self.kind == RelationshipKind::OneToMany
    }
}

/// Column declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Whether two rows may not share a non-null value in this column
    pub unique: bool,
}

/// Declaration of one resource (table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDef {
    name: String,
    columns: Vec<ColumnDef>,
    relationships: Vec<Relationship>,
}

impl ResourceDef {
    /// Declares a resource with its implicit unique `id` column.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: vec![ColumnDef {
                name: ID_COLUMN.to_string(),
                unique: true,
            }],
            relationships: Vec::new(),
        }
    }

    /// Adds a plain column.
    pub fn column(self, name: impl Into<String>) -> Self {
        self.push_column(name.into(), false)
    }

    /// Adds a column whose non-null values must be unique.
    pub fn unique(self, name: impl Into<String>) -> Self {
        self.push_column(name.into(), true)
    }

    fn push_column(mut self, name: String, unique: bool) -> Self {
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.unique |= unique,
            None => self.columns.push(ColumnDef { name, unique }),
        }
        self
    }

    /// Rows of `target` whose `foreign_key` equals this row's `id`.
    pub fn has_many(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relate(
            name.into(),
            target.into(),
            RelationshipKind::OneToMany,
            ID_COLUMN.to_string(),
            foreign_key.into(),
        )
    }

    /// The row of `target` whose `foreign_key` equals this row's `id`.
    pub fn has_one(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relate(
            name.into(),
            target.into(),
            RelationshipKind::OneToOne,
            ID_COLUMN.to_string(),
            foreign_key.into(),
        )
    }

    /// The row of `target` whose `id` equals this row's `local_key`.
    pub fn belongs_to(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        self.relate(
            name.into(),
            target.into(),
            RelationshipKind::ManyToOne,
            local_key.into(),
            ID_COLUMN.to_string(),
        )
    }

    fn relate(
        mut self,
        name: String,
        target: String,
        kind: RelationshipKind,
        local_column: String,
        foreign_column: String,
    ) -> Self {
        self.relationships.retain(|r| r.name != name);
        self.relationships.push(Relationship {
            name,
            target,
            kind,
            local_column,
            foreign_column,
        });
        self
    }

    /// Resource name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared columns, `id` first.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Declared relationships.
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Whether `column` is declared on this resource.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.name == column)
    }

    /// Fails with `BadRequest` unless `column` is declared.
    pub fn require_column(&self, column: &str) -> Result<()> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(Error::BadRequest(format!(
                "column '{}' does not exist on resource '{}'",
                column, self.name
            )))
        }
    }

    /// Resolves a relationship reference.
    ///
    /// A reference matches a relationship by its name first, then by its
    /// target resource name. A target name shared by several relationships is
    /// ambiguous and rejected.
    pub fn relationship(&self, reference: &str) -> Result<&Relationship> {
        if let Some(rel) = self.relationships.iter().find(|r| r.name == reference) {
            return Ok(rel);
        }

        let mut by_target = self.relationships.iter().filter(|r| r.target == reference);
        match (by_target.next(), by_target.next()) {
            (Some(rel), None) => Ok(rel),
            (Some(_), Some(_)) => Err(Error::BadRequest(format!(
                "relationship '{}' on resource '{}' is ambiguous; reference it by name",
                reference, self.name
            ))),
            (None, _) => Err(Error::BadRequest(format!(
                "resource '{}' has no relationship '{}'",
                self.name, reference
            ))),
        }
    }
}

impl fmt::Display for ResourceDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", col.name)?;
            if col.unique {
                write!(f, " UNIQUE")?;
            }
        }
        write!(f, ")")
    }
}

/// Registry of every resource a store serves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    resources: BTreeMap<String, ResourceDef>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration. A later definition replaces an earlier one
    /// with the same name.
    pub fn with_resource(mut self, resource: ResourceDef) -> Self {
        self.add_resource(resource);
        self
    }

    /// Registers a resource.
    pub fn add_resource(&mut self, resource: ResourceDef) {
        self.resources.insert(resource.name.clone(), resource);
    }

    /// Looks a resource up, failing with `NotFound` when it is not declared.
    pub fn resource(&self, name: &str) -> Result<&ResourceDef> {
        self.resources
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("resource '{}' does not exist", name)))
    }

    /// All declared resources, ordered by name.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceDef> {
        self.resources.values()
    }

    /// Checks that every relationship points at a declared resource and at
    /// declared columns on both ends.
    pub fn validate(&self) -> Result<()> {
        for resource in self.resources.values() {
            for rel in &resource.relationships {
                let target = self.resource(&rel.target).map_err(|_| {
                    Error::BadRequest(format!(
                        "relationship '{}.{}' targets unknown resource '{}'",
                        resource.name, rel.name, rel.target
                    ))
                })?;
                resource.require_column(&rel.local_column)?;
                target.require_column(&rel.foreign_column)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Schema {
        Schema::new()
            .with_resource(
                ResourceDef::new("products")
                    .column("name")
                    .unique("slug")
                    .column("category_id")
                    .has_many("variants", "product_variants", "product_id")
                    .belongs_to("category", "categories", "category_id"),
            )
            .with_resource(
                ResourceDef::new("product_variants")
                    .column("product_id")
                    .column("size"),
            )
            .with_resource(ResourceDef::new("categories").unique("slug"))
    }

    #[test]
    fn test_implicit_id() {
        let schema = catalog();
        let products = schema.resource("products").unwrap();
        assert_eq!(products.columns()[0].name, "id");
        assert!(products.columns()[0].unique);
    }

    #[test]
    fn test_unknown_resource() {
        let err = catalog().resource("unknownTable").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::NotFound);
    }

    #[test]
    fn test_relationship_by_name_or_target() {
        let schema = catalog();
        let products = schema.resource("products").unwrap();
        assert_eq!(products.relationship("variants").unwrap().target, "product_variants");
        assert_eq!(products.relationship("product_variants").unwrap().name, "variants");
        assert!(products.relationship("orders").is_err());
    }

    #[test]
    fn test_ambiguous_target() {
        let def = ResourceDef::new("order_items")
            .column("product_id")
            .column("gift_product_id")
            .belongs_to("product", "products", "product_id")
            .belongs_to("gift", "products", "gift_product_id");
        let err = def.relationship("products").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::BadRequest);
        assert!(def.relationship("gift").is_ok());
    }

    #[test]
    fn test_validate() {
        assert!(catalog().validate().is_ok());

        let broken = Schema::new()
            .with_resource(ResourceDef::new("orders").has_many("items", "order_items", "order_id"));
        assert!(broken.validate().is_err());
    }
}
