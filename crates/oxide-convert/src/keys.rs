//! Key conversion, shared by primary keys and secondary indexes.

use crate::ddl::IndexKey;
use crate::schema::Key;

impl From<&Key> for IndexKey {
    fn from(key: &Key) -> Self {
        Self {
            col_id: key.col_id.clone(),
            desc: key.desc,
            order: key.order,
        }
    }
}

/// Converts source key references to target keys.
///
/// Order, column ids, sort direction and ordinal positions are kept as they
/// are; the input is not re-sorted.
#[must_use]
pub fn convert_keys(keys: &[Key]) -> Vec<IndexKey> {
    keys.iter().map(IndexKey::from).collect()
}
