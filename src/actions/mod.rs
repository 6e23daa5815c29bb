//! File actions module.
//!
//! # Deletion
//!
//! The delete module turns a user's selection into filesystem changes:
//! - Validation against the scan's duplicate groups (fail-closed)
//! - Move to system trash (default, recoverable)
//! - Permanent deletion (requires explicit configuration)
//! - Detection of files modified since the scan
//!
//! ```no_run
//! use arcdupe::actions::{execute, plan, DeleteConfig};
//! use arcdupe::scanner::Address;
//! use std::path::Path;
//!
//! let session = arcdupe::scan(Path::new(".")).unwrap();
//! let request = plan([Address::parse("./copy.txt")], session.groups()).unwrap();
//! let report = execute(&request, &DeleteConfig::trash());
//! ```

pub mod delete;

pub use delete::{
    delete_target, delete_to_trash, execute, permanent_delete, plan, DeleteConfig, DeleteError,
    DeleteOutcome, DeletionReport, DeletionRequest, DeletionTarget, PlanError,
};
