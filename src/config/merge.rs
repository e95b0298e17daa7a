//! Recursive merge of user options over defaults.
use toml::{Table, Value};

/// Merge `overlay` into `base` and return the result.
///
/// Tables merge key by key, recursively. Arrays and scalars from `overlay`
/// replace whatever `base` holds under the same key.
#[must_use]
pub fn deep_merge(mut base: Table, overlay: Table) -> Table {
    for (key, value) in overlay {
        if let Value::Table(src) = value {
            if let Some(Value::Table(dst)) = base.get_mut(&key) {
                let merged = deep_merge(std::mem::take(dst), src);
                *dst = merged;
                continue;
            }
            base.insert(key, Value::Table(src));
        } else {
            base.insert(key, value);
        }
    }
    base
}
