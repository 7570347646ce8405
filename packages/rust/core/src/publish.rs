//! Replace the release under a tag.

use tracing::{info, instrument, warn};

use bookrelease_shared::{DeleteOutcome, Result};
use bookrelease_tools::{ReleasePublisher, ReleaseRequest};

/// What happened to the previous release and tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub release: DeleteOutcome,
    pub tag: DeleteOutcome,
}

fn log_delete(what: &str, tag: &str, outcome: &DeleteOutcome) {
    match outcome {
        DeleteOutcome::Deleted => info!(tag, "deleted previous {what}"),
        DeleteOutcome::NotFound => info!(tag, "no previous {what}"),
        DeleteOutcome::Failed(reason) => {
            warn!(tag, reason = %reason, "could not delete previous {what}, continuing")
        }
    }
}

/// Delete the old release, then the old tag, then create the new release.
///
/// Deletion outcomes never abort; only a failed creation does.
#[instrument(skip_all, fields(tag = %request.tag, assets = request.assets.len()))]
pub async fn publish<P: ReleasePublisher>(
    publisher: &P,
    request: &ReleaseRequest,
) -> Result<PublishReport> {
    let release = publisher.delete_release(&request.tag).await;
    log_delete("release", &request.tag, &release);

    let tag = publisher.delete_tag(&request.tag).await;
    log_delete("tag", &request.tag, &tag);

    publisher.create_release(request).await?;
    info!("release created");
    Ok(PublishReport { release, tag })
}
