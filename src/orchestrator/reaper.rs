//! Sub-resource reaping: close inactive resources and detach closed ones.
//!
//! Both passes are idempotent; re-running them with no newly inactive or
//! closing resources is a no-op. Processing order within the set carries
//! no guarantee.

use std::sync::Arc;

use tracing::debug;

use crate::clock::ActivityBound;
use crate::config::TimeoutPolicy;
use crate::models::session::Session;
use crate::Result;

/// Request a close for every attached sub-resource that is no longer
/// active. The close itself runs serialized through the session's gateway.
///
/// # Errors
///
/// Returns `AppError::Gateway` if a close could not be submitted because
/// the session's gateway has already shut down.
pub fn close_inactive(
    session: &Arc<Session>,
    policy: &TimeoutPolicy,
    now_millis: i64,
) -> Result<()> {
    for resource in session.sub_resources() {
        if !resource.is_active(policy, now_millis) && !resource.is_closing() {
            let session_id = session.id().to_owned();
            session.access(move || {
                debug!(
                    resource_id = %resource.id(),
                    session_id,
                    "closing inactive sub-resource"
                );
                resource.close();
            })?;
        }
    }
    Ok(())
}

/// Detach every sub-resource whose close has been requested.
///
/// Works on a snapshot of the session's current set so that detaching
/// never mutates the set being iterated.
///
/// # Errors
///
/// Returns `AppError::Gateway` if a detach could not be submitted because
/// the session's gateway has already shut down.
pub fn remove_closed(session: &Arc<Session>) -> Result<()> {
    let snapshot = session.sub_resources();
    for resource in snapshot {
        if resource.is_closing() {
            let owner = Arc::clone(session);
            session.access(move || {
                debug!(resource_id = %resource.id(), "removing closed sub-resource");
                owner.detach(resource.id());
            })?;
        }
    }
    Ok(())
}
