//! Route modules, one router per resource.

pub mod batches;
pub mod documents;
pub mod principals;
pub mod reconciliation;
