//! Update payload check.

use crate::error::PayloadError;
use crate::types::Record;

/// Require an update payload to carry a column besides the id.
///
/// ```
/// use crud_filter::{Record, ensure_update_fields};
///
/// let only_id = Record::new().with("id", 7);
/// assert!(ensure_update_fields(&only_id).is_err());
///
/// let rename = Record::new().with("id", 7).with("name", "Al");
/// assert!(ensure_update_fields(&rename).is_ok());
/// ```
pub fn ensure_update_fields(data: &Record) -> Result<(), PayloadError> {
    if data.len() < 2 {
        tracing::debug!(fields = data.len(), "update payload has nothing to update");
        return Err(PayloadError::NothingToUpdate);
    }
    Ok(())
}
