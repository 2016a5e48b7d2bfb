//! Shared fixtures: an invoicing domain bound to the mapper.

#![allow(dead_code)]

use std::sync::Arc;

use nodebuilder_core::{AssociationKind, Data, EntityBinding, EntityRegistry, Visibility};
use nodebuilder_schema::{EntityDefinition, InMemorySchema};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Customer {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct LineItem {
    pub line_id: i64,
    pub sku: String,
    pub qty: u32,
}

#[derive(Debug, Default)]
pub struct Invoice {
    pub id: i64,
    pub total: f64,
    pub note: String,
    pub customer: Option<Customer>,
    pub lines: Vec<LineItem>,
    /// Setter calls, in order, to observe instruction ordering.
    pub calls: Vec<&'static str>,
}

#[derive(Debug, Default)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub parent: Option<Box<Category>>,
}

pub fn registry() -> EntityRegistry {
    let mut registry = EntityRegistry::new();

    registry.register(
        EntityBinding::builder::<Customer>("Customer")
            .default_constructor()
            .method("setId", |c: &mut Customer, v: i64| c.id = v)
            .method("setName", |c: &mut Customer, v: String| c.name = v)
            .field("id", Visibility::Private, |c: &mut Customer, v: i64| c.id = v)
            .field("name", Visibility::Public, |c: &mut Customer, v: String| c.name = v)
            .build(),
    );

    registry.register(
        EntityBinding::builder::<LineItem>("LineItem")
            .default_constructor()
            .method("setLineId", |l: &mut LineItem, v: i64| l.line_id = v)
            .method("setSku", |l: &mut LineItem, v: String| l.sku = v)
            .method("setQty", |l: &mut LineItem, v: u32| l.qty = v)
            .field("line_id", Visibility::Private, |l: &mut LineItem, v: i64| l.line_id = v)
            .field("sku", Visibility::Public, |l: &mut LineItem, v: String| l.sku = v)
            .field("qty", Visibility::Public, |l: &mut LineItem, v: u32| l.qty = v)
            .build(),
    );

    // No setNote method: `note` is reachable only as a public field.
    registry.register(
        EntityBinding::builder::<Invoice>("Invoice")
            .default_constructor()
            .method("setId", |i: &mut Invoice, v: i64| {
                i.id = v;
                i.calls.push("setId");
            })
            .method("setTotal", |i: &mut Invoice, v: f64| {
                i.total = v;
                i.calls.push("setTotal");
            })
            .method("applyTotal", |i: &mut Invoice, v: f64| {
                i.total = v * 100.0;
                i.calls.push("applyTotal");
            })
            .method_to_one("setCustomer", |i: &mut Invoice, v: Option<Customer>| {
                i.customer = v;
                i.calls.push("setCustomer");
            })
            .method_to_many("setLines", |i: &mut Invoice, v: Vec<LineItem>| {
                i.lines = v;
                i.calls.push("setLines");
            })
            .field("id", Visibility::Private, |i: &mut Invoice, v: i64| i.id = v)
            .field("total", Visibility::Public, |i: &mut Invoice, v: f64| i.total = v)
            .field("note", Visibility::Public, |i: &mut Invoice, v: String| i.note = v)
            .field_to_one("customer", Visibility::Public, |i: &mut Invoice, v: Option<Customer>| {
                i.customer = v
            })
            .field_to_many("lines", Visibility::Private, |i: &mut Invoice, v: Vec<LineItem>| {
                i.lines = v
            })
            .build(),
    );

    registry.register(
        EntityBinding::builder::<Category>("Category")
            .default_constructor()
            .method("setName", |c: &mut Category, v: String| c.name = v)
            .method_to_one("setParent", |c: &mut Category, v: Option<Category>| {
                c.parent = v.map(Box::new)
            })
            .field("id", Visibility::Private, |c: &mut Category, v: i64| c.id = v)
            .field("name", Visibility::Public, |c: &mut Category, v: String| c.name = v)
            .build(),
    );

    registry
}

pub fn schema(registry: Arc<EntityRegistry>) -> InMemorySchema {
    let schema = InMemorySchema::new(registry)
        .with_definition(
            EntityDefinition::new("Customer")
                .fields(["id", "name"])
                .primary_key(["id"]),
        )
        .with_definition(
            EntityDefinition::new("LineItem")
                .fields(["line_id", "sku", "qty"])
                .primary_key(["line_id"]),
        )
        .with_definition(
            EntityDefinition::new("Invoice")
                .fields(["id", "total", "note"])
                .primary_key(["id"])
                .association("customer", "Customer", AssociationKind::ManyToOne)
                .association("lines", "LineItem", AssociationKind::OneToMany),
        )
        .with_definition(
            EntityDefinition::new("Category")
                .fields(["id", "name"])
                .primary_key(["id"])
                .association("parent", "Category", AssociationKind::ManyToOne),
        );

    schema
        .insert_row("Customer", data(serde_json::json!({"id": 1, "name": "Ada"})))
        .unwrap();
    schema
        .insert_row("Invoice", data(serde_json::json!({"id": 7, "total": 10.0})))
        .unwrap();
    schema
}

pub fn data(value: serde_json::Value) -> Data {
    value.as_object().cloned().expect("fixture data must be an object")
}
