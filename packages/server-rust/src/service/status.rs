use permcheck_core::ReplyStatus;

/// Maps an oracle status to the status sent back to the caller.
///
/// An oracle that cannot resolve the checked target reports `UNKNOWN_API`;
/// callers see that as `NOT_AVAILABLE`. Every other status passes through.
#[must_use]
pub fn normalize(status: ReplyStatus) -> ReplyStatus {
    if status == ReplyStatus::UNKNOWN_API {
        ReplyStatus::NOT_AVAILABLE
    } else {
        status
    }
}
