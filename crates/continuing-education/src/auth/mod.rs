//! Role-based permissions.
//!
//! Permissions are rule trees evaluated by a single interpreter
//! ([`Rule::evaluate`]) against the requesting user and the target record.
//! The [`RoleRegistry`] binds each role group to its permission map.

pub mod identity;
pub mod roles;
pub mod rules;

pub use identity::{CurrentUser, Group, MissingIdentity, User};
pub use roles::{Permission, PermissionError, Role, RoleDefinition, RoleRegistry};
pub use rules::{Rule, RuleContext, Target};
