/// Shared types for the SkillBank ledger service.
///
/// `models` holds the domain vocabulary (roles, statuses, the acting principal),
/// `api` the HTTP request/response payloads, and `notifications` the kinds of
/// messages the workflows emit.
pub mod api;
pub mod models;
pub mod notifications;
pub mod time;
