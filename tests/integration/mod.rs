//! Integration Tests Module
//!
//! End-to-end tests for the siteline workspace: the query tools over CSV
//! fixtures, the agent router over the default capability graph, and full
//! pipeline sessions driven by scripted collaborators.

// Shared fixtures and test doubles
mod support;

// Query tools over CSV datasets
mod tools_test;

// Router + default graph + real tools with a mock provider
mod router_test;

// Four-phase sessions
mod pipeline_test;
