//! Whole-schema SQL builders

pub mod create;
pub mod dependency;
pub mod drop;

pub use create::CreateSchemaObjectsSqlBuilder;
pub use dependency::DependencyOrderCalculator;
pub use drop::DropSchemaObjectsSqlBuilder;
