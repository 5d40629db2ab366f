//! Tool Registry & Discovery (C3): register, look up, list, and search the
//! fixed catalog of invoice-toolchain tools (spec §4.3).

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use crate::core::schema::SchemaCatalog;
use crate::core::validator::InputValidator;
use crate::errors::ValidationError;

/// The fixed, closed set of tool categories (spec §3). Declared here in
/// ascending sort order so `#[derive(Ord)]` matches the spec's
/// "category ascending" list ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    ClientManagement,
    Configuration,
    Generation,
    ImportExport,
    InvoiceManagement,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ClientManagement => "client-management",
            Category::Configuration => "configuration",
            Category::Generation => "generation",
            Category::ImportExport => "import-export",
            Category::InvoiceManagement => "invoice-management",
        }
    }
}

/// One `{description, input}` pair attached to a descriptor. Every `input`
/// must validate against the descriptor's own schema (spec §8 invariant 1).
#[derive(Debug, Clone, Serialize)]
pub struct ToolExample {
    pub description: String,
    pub input: Value,
}

/// Ordered mapping from validated schema fields to CLI flags, plus fixed
/// positional tokens, used by the Executor to build `ExecutionRequest::args`
/// (spec §3 "cli_args_template").
#[derive(Debug, Clone, Default)]
pub struct CliArgsTemplate {
    /// Fixed tokens emitted first, e.g. `["invoice", "create"]`.
    pub positional: Vec<String>,
    /// `(schema_field, flag)` pairs, emitted in declaration order whenever
    /// the field is present in validated input.
    pub flags: Vec<(String, String)>,
}

impl CliArgsTemplate {
    pub fn new(positional: &[&str]) -> Self {
        Self {
            positional: positional.iter().map(|s| s.to_string()).collect(),
            flags: Vec::new(),
        }
    }

    pub fn flag(mut self, field: &str, flag: &str) -> Self {
        self.flags.push((field.to_string(), flag.to_string()));
        self
    }
}

/// Immutable metadata defining one tool (spec §3 "Tool descriptor").
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub input_schema: Value,
    pub examples: Vec<ToolExample>,
    pub cli_command: String,
    pub cli_args_template: CliArgsTemplate,
}

/// Failure returned by [`ToolRegistry::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    DuplicateName(String),
    InvalidSchema { name: String, reason: String },
    ExampleFailsSchema { name: String, example_index: usize, reason: String },
}

/// Per-tool invocation counters, updated with lock-free atomics so
/// concurrent `tools/list`/`tools/call` never contend on a lock (spec §5).
#[derive(Debug, Default)]
pub struct ToolCounters {
    invocations: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    /// Unix epoch millis of the last invocation; `0` means never invoked.
    last_used_millis: AtomicI64,
    /// Sum of every recorded call's wall-clock duration, in milliseconds;
    /// divided by `invocations` to report an average latency (spec §6.3).
    total_duration_millis: AtomicU64,
}

impl ToolCounters {
    pub fn snapshot(&self) -> ToolCountersSnapshot {
        let invocations = self.invocations.load(Ordering::Relaxed);
        let total_duration_millis = self.total_duration_millis.load(Ordering::Relaxed);
        let avg_latency_ms = if invocations == 0 {
            0.0
        } else {
            total_duration_millis as f64 / invocations as f64
        };
        ToolCountersSnapshot {
            invocations,
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            last_used_millis: self.last_used_millis.load(Ordering::Relaxed),
            avg_latency_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ToolCountersSnapshot {
    pub invocations: u64,
    pub successes: u64,
    pub failures: u64,
    pub last_used_millis: i64,
    pub avg_latency_ms: f64,
}

/// Search parameters for [`ToolRegistry::search`] (spec §4.3).
#[derive(Debug, Clone, Default)]
pub struct SearchCriteria {
    pub query: Option<String>,
    pub category: Option<Category>,
    pub max_results: Option<usize>,
}

#[derive(Debug)]
struct SearchEntry {
    name: String,
    haystack: String,
}

/// The searchable catalog of ~21 invoice-toolchain tools.
#[derive(Debug)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolDescriptor>,
    category_index: HashMap<Category, Vec<String>>,
    counters: HashMap<String, ToolCounters>,
    search_index: Vec<SearchEntry>,
    validator: InputValidator,
}

impl ToolRegistry {
    /// Register every descriptor, build the search index and schema
    /// catalog, and construct the validator. Duplicate registration is a
    /// fatal startup error (spec §4.3).
    pub fn build(descriptors: Vec<ToolDescriptor>) -> Result<Self, RegisterError> {
        let mut tools = HashMap::new();
        let mut category_index: HashMap<Category, Vec<String>> = HashMap::new();
        let mut counters = HashMap::new();
        let mut search_index = Vec::new();
        let mut schema_entries = Vec::new();

        for descriptor in descriptors {
            if tools.contains_key(&descriptor.name) {
                return Err(RegisterError::DuplicateName(descriptor.name));
            }
            validate_descriptor_schema(&descriptor)?;

            let haystack = format!(
                "{} {} {}",
                descriptor.name.to_lowercase(),
                descriptor.description.to_lowercase(),
                descriptor.category.as_str()
            );
            search_index.push(SearchEntry {
                name: descriptor.name.clone(),
                haystack,
            });

            category_index
                .entry(descriptor.category)
                .or_default()
                .push(descriptor.name.clone());
            counters.insert(descriptor.name.clone(), ToolCounters::default());
            schema_entries.push((descriptor.name.clone(), descriptor.input_schema.clone()));
            tools.insert(descriptor.name.clone(), descriptor);
        }

        for names in category_index.values_mut() {
            names.sort();
        }

        let catalog = SchemaCatalog::from_entries(schema_entries);
        let validator = InputValidator::new(catalog);

        Ok(Self {
            tools,
            category_index,
            counters,
            search_index,
            validator,
        })
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn validator(&self) -> &InputValidator {
        &self.validator
    }

    pub fn schema_catalog(&self) -> SchemaCatalog {
        SchemaCatalog::from_entries(
            self.tools
                .values()
                .map(|d| (d.name.clone(), d.input_schema.clone())),
        )
    }

    pub fn validate_input(
        &self,
        token: &crate::core::cancel::CancellationToken,
        name: &str,
        input: &Value,
    ) -> Result<(), ValidationError> {
        self.validator.validate(token, name, input)
    }

    /// List descriptors, optionally restricted to one category, ordered by
    /// category ascending then name ascending (spec §4.3).
    pub fn list(&self, category: Option<Category>) -> Vec<&ToolDescriptor> {
        let mut out: Vec<&ToolDescriptor> = match category {
            Some(c) => self
                .category_index
                .get(&c)
                .into_iter()
                .flatten()
                .filter_map(|name| self.tools.get(name))
                .collect(),
            None => self.tools.values().collect(),
        };
        out.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
        out
    }

    /// Ranked search: exact name match, then name prefix, then fuzzy
    /// (edit-distance <= 2) on name tokens, then description substring
    /// (spec §4.3).
    pub fn search(&self, criteria: &SearchCriteria) -> Vec<&ToolDescriptor> {
        let max_results = criteria.max_results.unwrap_or(10);
        let query = criteria.query.as_deref().map(str::to_lowercase);

        let mut candidates: Vec<&SearchEntry> = self
            .search_index
            .iter()
            .filter(|entry| {
                criteria
                    .category
                    .map(|c| self.tools.get(&entry.name).is_some_and(|d| d.category == c))
                    .unwrap_or(true)
            })
            .collect();

        let Some(query) = query else {
            candidates.sort_by(|a, b| a.name.cmp(&b.name));
            return candidates
                .into_iter()
                .take(max_results)
                .filter_map(|e| self.tools.get(&e.name))
                .collect();
        };

        let mut scored: Vec<(u8, &SearchEntry)> = candidates
            .into_iter()
            .filter_map(|entry| rank(&query, entry).map(|rank| (rank, entry)))
            .collect();

        scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));

        scored
            .into_iter()
            .take(max_results)
            .filter_map(|(_, e)| self.tools.get(&e.name))
            .collect()
    }

    pub fn record_invocation(&self, name: &str, success: bool, duration: Duration) {
        let Some(counters) = self.counters.get(name) else {
            return;
        };
        counters.invocations.fetch_add(1, Ordering::Relaxed);
        counters.total_duration_millis.fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
        if success {
            counters.successes.fetch_add(1, Ordering::Relaxed);
        } else {
            counters.failures.fetch_add(1, Ordering::Relaxed);
        }
        let now_millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        counters.last_used_millis.store(now_millis, Ordering::Relaxed);
    }

    pub fn counters(&self, name: &str) -> Option<ToolCountersSnapshot> {
        self.counters.get(name).map(ToolCounters::snapshot)
    }

    pub fn all_counters(&self) -> HashMap<String, ToolCountersSnapshot> {
        self.counters
            .iter()
            .map(|(name, c)| (name.clone(), c.snapshot()))
            .collect()
    }
}

fn validate_descriptor_schema(descriptor: &ToolDescriptor) -> Result<(), RegisterError> {
    let schema = &descriptor.input_schema;
    if schema.get("type").and_then(Value::as_str) != Some("object") {
        return Err(RegisterError::InvalidSchema {
            name: descriptor.name.clone(),
            reason: "input_schema must declare type:object".to_string(),
        });
    }
    if schema.get("additionalProperties") != Some(&Value::Bool(false)) {
        return Err(RegisterError::InvalidSchema {
            name: descriptor.name.clone(),
            reason: "input_schema must set additionalProperties:false".to_string(),
        });
    }
    let validator = jsonschema::validator_for(schema).map_err(|e| RegisterError::InvalidSchema {
        name: descriptor.name.clone(),
        reason: format!("schema does not compile: {e}"),
    })?;

    for (i, example) in descriptor.examples.iter().enumerate() {
        if !validator.is_valid(&example.input) {
            return Err(RegisterError::ExampleFailsSchema {
                name: descriptor.name.clone(),
                example_index: i,
                reason: "example input does not satisfy input_schema".to_string(),
            });
        }
    }

    Ok(())
}

/// Lower is better; `None` means no match at all.
fn rank(query: &str, entry: &SearchEntry) -> Option<u8> {
    if entry.name == query {
        return Some(0);
    }
    if entry.name.starts_with(query) {
        return Some(1);
    }
    if entry
        .name
        .split(['_', '-'])
        .any(|token| levenshtein(token, query) <= 2)
    {
        return Some(2);
    }
    if entry.haystack.contains(query) {
        return Some(3);
    }
    None
}

/// Classic Wagner-Fischer edit distance over bytes; tool names and search
/// queries are ASCII so byte-wise is equivalent to char-wise here.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<u8> = a.bytes().collect();
    let b: Vec<u8> = b.bytes().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
