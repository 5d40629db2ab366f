//! The full registered schema catalog must pass the hygiene checks and every
//! descriptor's own examples (spec §8 invariants 1–2).

use invoice_mcp_server::core::schema::check_hygiene;
use invoice_mcp_server::tools;

#[test]
fn full_catalog_has_no_hygiene_violations() {
    let registry = tools::build_registry().expect("catalog must build");
    let violations = check_hygiene(&registry.schema_catalog());
    assert!(
        violations.is_empty(),
        "hygiene violations: {violations:?}"
    );
}

#[test]
fn every_descriptor_carries_at_least_one_example() {
    let descriptors = tools::all_descriptors();
    for descriptor in &descriptors {
        assert!(!descriptor.examples.is_empty(), "{} has no examples", descriptor.name);
    }
}

#[test]
fn category_set_is_closed_to_the_five_documented_categories() {
    let descriptors = tools::all_descriptors();
    let mut categories: Vec<&str> = descriptors.iter().map(|d| d.category.as_str()).collect();
    categories.sort();
    categories.dedup();
    assert_eq!(
        categories,
        vec![
            "client-management",
            "configuration",
            "generation",
            "import-export",
            "invoice-management",
        ]
    );
}
