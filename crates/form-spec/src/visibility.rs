use std::collections::BTreeSet;

use crate::field_state::VisibilityMap;
use crate::spec::field::Field;

/// Ids of the fields that take part in validation and submission.
pub type VisibleFields = BTreeSet<String>;

/// Projects the visibility map onto declared fields. Fields with no entry are
/// visible; dangling map entries are ignored.
pub fn visible_fields<'a>(
    fields: impl IntoIterator<Item = &'a Field>,
    visibility: &VisibilityMap,
) -> VisibleFields {
    fields
        .into_iter()
        .filter(|field| visibility.get(&field.id).copied() != Some(false))
        .map(|field| field.id.clone())
        .collect()
}
