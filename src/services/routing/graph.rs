//! Capability Graph
//!
//! Built in two passes: declare every capability, then wire delegation
//! edges between declared names. The finished graph is immutable.

use std::collections::HashMap;

use crate::models::{ColumnSelection, DateCandidate};
use crate::utils::error::{AppError, AppResult};

use super::capability::{
    Capability, CONTENT, DATA_ANALYST, IDENTIFY_COLUMNS, IDENTIFY_DATE, QUERY_DATA, TRIAGE,
};
use super::prompts;

// ============================================================================
// Builder
// ============================================================================

#[derive(Debug, Default)]
pub struct CapabilityGraphBuilder {
    nodes: HashMap<String, Capability>,
    order: Vec<String>,
}

impl CapabilityGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a capability. Names must be unique.
    pub fn declare(&mut self, capability: Capability) -> AppResult<&mut Self> {
        let name = capability.name().to_string();
        if self.nodes.contains_key(&name) {
            return Err(AppError::config(format!(
                "capability '{}' declared twice",
                name
            )));
        }
        self.order.push(name.clone());
        self.nodes.insert(name, capability);
        Ok(self)
    }

    /// Allow `from` to hand control to `to`. Both must already be declared.
    pub fn wire(&mut self, from: &str, to: &str) -> AppResult<&mut Self> {
        if from == to {
            return Err(AppError::config(format!(
                "capability '{}' cannot delegate to itself",
                from
            )));
        }
        if !self.nodes.contains_key(to) {
            return Err(AppError::config(format!(
                "cannot wire {} -> {}: '{}' is not declared",
                from, to, to
            )));
        }
        let source = self.nodes.get_mut(from).ok_or_else(|| {
            AppError::config(format!(
                "cannot wire {} -> {}: '{}' is not declared",
                from, to, from
            ))
        })?;
        source.add_delegate(to);
        Ok(self)
    }

    pub fn build(self) -> CapabilityGraph {
        CapabilityGraph {
            nodes: self.nodes,
            order: self.order,
        }
    }
}

// ============================================================================
// CapabilityGraph
// ============================================================================

#[derive(Debug, Clone)]
pub struct CapabilityGraph {
    nodes: HashMap<String, Capability>,
    order: Vec<String>,
}

impl CapabilityGraph {
    pub fn get(&self, name: &str) -> Option<&Capability> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Capabilities in declaration order.
    pub fn capabilities(&self) -> impl Iterator<Item = &Capability> {
        self.order.iter().filter_map(|name| self.nodes.get(name))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// The six capabilities the pipeline talks to, with their delegation edges.
pub fn default_graph() -> AppResult<CapabilityGraph> {
    let mut builder = CapabilityGraphBuilder::new();
    builder
        .declare(
            Capability::new(
                DATA_ANALYST,
                "Analyses website metrics and proposes improvements",
            )
            .with_instructions(prompts::DATA_ANALYST_INSTRUCTIONS),
        )?
        .declare(
            Capability::new(CONTENT, "Plans SEO content and keyword strategy")
                .with_instructions(prompts::CONTENT_INSTRUCTIONS),
        )?
        .declare(
            Capability::new(QUERY_DATA, "Extracts access metrics for a date range")
                .with_instructions(prompts::query_data_instructions())
                .with_tools([QUERY_DATA]),
        )?
        .declare(
            Capability::new(TRIAGE, "Routes requests and answers service lookups")
                .with_instructions(prompts::TRIAGE_INSTRUCTIONS)
                .with_tools(["query_service"]),
        )?
        .declare(
            Capability::new(IDENTIFY_DATE, "Identifies the query period")
                .with_instructions(prompts::IDENTIFY_DATE_INSTRUCTIONS)
                .with_output_schema("date_candidate", DateCandidate::schema()),
        )?
        .declare(
            Capability::new(IDENTIFY_COLUMNS, "Identifies requested data columns")
                .with_instructions(prompts::identify_columns_instructions())
                .with_output_schema("column_selection", ColumnSelection::schema()),
        )?;

    builder
        .wire(TRIAGE, DATA_ANALYST)?
        .wire(TRIAGE, CONTENT)?
        .wire(TRIAGE, QUERY_DATA)?
        .wire(QUERY_DATA, DATA_ANALYST)?
        .wire(QUERY_DATA, CONTENT)?;

    Ok(builder.build())
}
