//! Existence check keyed by the LMS external id.

use std::fmt::Display;

use tracing::{debug, warn};

use crate::contract::{NoteStore, PageId};
use crate::errors::StoreError;

/// Looks up a page in `database_id` whose `unique_field` holds `value` as text.
///
/// This is a point-in-time check: nothing stops another writer from creating
/// the same record between this query and a following create.
pub async fn find_existing<S, V>(
    store: &S,
    database_id: &str,
    unique_field: &str,
    value: V,
) -> Result<Option<PageId>, StoreError>
where
    S: NoteStore + ?Sized,
    V: Display,
{
    let value = value.to_string();
    match store.query_by_text(database_id, unique_field, &value).await {
        Ok(found) => {
            debug!(
                database_id,
                property = unique_field,
                value = %value,
                found = found.is_some(),
                "Existence query finished"
            );
            Ok(found)
        }
        Err(e) => {
            warn!(
                database_id,
                property = unique_field,
                value = %value,
                error = %e,
                "Existence query failed"
            );
            Err(e)
        }
    }
}
