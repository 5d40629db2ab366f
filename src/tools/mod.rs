//! The fixed catalog of invoice-toolchain tools, grouped by category (spec §3).

pub mod client;
pub mod configuration;
pub mod generation;
pub mod import_export;
pub mod invoice;

use crate::core::registry::{RegisterError, ToolDescriptor, ToolRegistry};
use crate::core::schema::SchemaCatalog;

/// Every tool descriptor this server exposes, in no particular order —
/// `ToolRegistry::build` establishes the canonical ordering.
pub fn all_descriptors() -> Vec<ToolDescriptor> {
    let mut out = Vec::new();
    out.extend(invoice::descriptors());
    out.extend(client::descriptors());
    out.extend(import_export::descriptors());
    out.extend(generation::descriptors());
    out.extend(configuration::descriptors());
    out
}

/// Build the full registry. Fatal at startup on any descriptor defect
/// (spec §4.3).
pub fn build_registry() -> Result<ToolRegistry, RegisterError> {
    ToolRegistry::build(all_descriptors())
}

/// Convenience used where only the schemas are needed (the Input
/// Validator's own tests; `ToolRegistry` builds one internally too).
pub fn build_schema_catalog() -> SchemaCatalog {
    SchemaCatalog::from_entries(
        all_descriptors()
            .into_iter()
            .map(|d| (d.name, d.input_schema)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_descriptors_have_unique_names() {
        let descriptors = all_descriptors();
        let mut names: Vec<&str> = descriptors.iter().map(|d| d.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), descriptors.len());
    }

    #[test]
    fn catalog_has_twenty_one_tools() {
        assert_eq!(all_descriptors().len(), 21);
    }

    #[test]
    fn registry_builds_without_defects() {
        let registry = build_registry().expect("descriptor catalog must be internally consistent");
        assert_eq!(registry.len(), 21);
    }
}
