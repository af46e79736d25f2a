//! Common imports used across the workspace.

pub use crate::error::{DlResult, Error};
pub use crate::types::{
	EmailLogId, FollowUpId, InvoiceId, ScheduleId, TemplateId, Timestamp, UserId,
};
pub use tracing::{debug, error, info, trace, warn};

// vim: ts=4
