use anyhow::Result;
use comfy_table::{Cell, Table};
use pbschema::{CollectionOrder, CollectionSchema, order_collections_by_dependency};
use serde::Serialize;

use super::{initialized_context, load_project_state};
use crate::examples::ExampleGroup;
use crate::output::{OutputManager, TableDisplay};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Creation Order",
    commands: &[
        "pbschema order                         # Collections in relation dependency order",
        "pbschema order --output json           # Order plus any cycle, as JSON",
    ],
}];

#[derive(Serialize)]
pub struct OrderEntry {
    pub name: String,
    pub depends_on: Vec<String>,
}

#[derive(Serialize)]
pub struct OrderReport {
    pub ordered: bool,
    pub collections: Vec<OrderEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cycle: Vec<String>,
}

impl OrderReport {
    pub fn from_order(order: CollectionOrder) -> Self {
        let ordered = order.is_ordered();
        let cycle = match &order {
            CollectionOrder::Unresolved { cycle, .. } => cycle.clone(),
            CollectionOrder::Ordered(_) => Vec::new(),
        };
        let collections = order.into_collections().iter().map(make_entry).collect();
        Self {
            ordered,
            collections,
            cycle,
        }
    }
}

fn make_entry(collection: &CollectionSchema) -> OrderEntry {
    let mut depends_on: Vec<String> = collection
        .relation_targets()
        .filter(|target| !target.eq_ignore_ascii_case(&collection.name))
        .map(str::to_string)
        .collect();
    depends_on.dedup();
    OrderEntry {
        name: collection.name.clone(),
        depends_on,
    }
}

pub fn handle_order(output: &OutputManager) -> Result<()> {
    let ctx = initialized_context(output)?;
    let (definition, _) = load_project_state(&ctx, output)?;

    let collections: Vec<CollectionSchema> = definition.iter().cloned().collect();
    let report = OrderReport::from_order(order_collections_by_dependency(&collections));

    output.heading("Collection Order");
    if !report.ordered {
        output.warning(&format!(
            "Circular relation dependency between: {}",
            report.cycle.join(", ")
        ));
        output.info("Falling back to name order; create the cycle's relations in a second step.");
    }

    output.display(&report)
}

impl TableDisplay for OrderReport {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        output.add_table_header(&mut table, &["#", "Collection", "Depends on"]);
        for (position, entry) in self.collections.iter().enumerate() {
            table.add_row(vec![
                Cell::new(position + 1),
                Cell::new(&entry.name),
                Cell::new(entry.depends_on.join(", ")),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        let names: Vec<&str> = self.collections.iter().map(|e| e.name.as_str()).collect();
        names.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbschema::FieldDefinition;

    #[test]
    fn test_report_from_ordered_collections() {
        let collections = vec![
            CollectionSchema::new("posts")
                .with_field(FieldDefinition::relation("author", "users"))
                .with_field(FieldDefinition::relation("parent", "posts")),
            CollectionSchema::new("users"),
        ];
        let report = OrderReport::from_order(order_collections_by_dependency(&collections));
        assert!(report.ordered);
        assert_eq!(report.to_compact(), "users posts");
        assert_eq!(report.collections[1].depends_on, vec!["users".to_string()]);
    }

    #[test]
    fn test_report_from_cycle() {
        let collections = vec![
            CollectionSchema::new("a").with_field(FieldDefinition::relation("b", "b")),
            CollectionSchema::new("b").with_field(FieldDefinition::relation("a", "a")),
        ];
        let report = OrderReport::from_order(order_collections_by_dependency(&collections));
        assert!(!report.ordered);
        assert_eq!(report.cycle, vec!["a".to_string(), "b".to_string()]);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["cycle"][0], "a");
    }
}
