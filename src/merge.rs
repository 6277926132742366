use toml::{Table, Value};

/// Deep-merge `overlay` on top of `base`.
/// If both sides have a Table for the same key, recurse.
/// Otherwise, `overlay`'s value wins.
pub fn deep_merge(mut base: Table, overlay: Table) -> Table {
    for (key, overlay_val) in overlay {
        match (base.remove(&key), overlay_val) {
            (Some(Value::Table(base_tbl)), Value::Table(overlay_tbl)) => {
                base.insert(key, Value::Table(deep_merge(base_tbl, overlay_tbl)));
            }
            (_, overlay_val) => {
                base.insert(key, overlay_val);
            }
        }
    }
    base
}

/// Look up a dotted key (`"database.url"`) in a nested table.
pub fn lookup<'t>(table: &'t Table, dotted_key: &str) -> Option<&'t Value> {
    let mut segments = dotted_key.split('.');
    let mut current = table.get(segments.next()?)?;
    for segment in segments {
        current = current.as_table()?.get(segment)?;
    }
    Some(current)
}

/// Insert `value` at a dotted key, creating intermediate tables.
///
/// A scalar sitting where an intermediate table is needed gets replaced.
pub fn insert_path(table: &mut Table, dotted_key: &str, value: Value) {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    let (leaf, parents) = match segments.split_last() {
        Some(split) => split,
        None => return,
    };

    let mut current = table;
    for segment in parents {
        let entry = current
            .entry(*segment)
            .or_insert_with(|| Value::Table(Table::new()));
        if !entry.is_table() {
            *entry = Value::Table(Table::new());
        }
        let Value::Table(next) = entry else {
            unreachable!("entry was just made a table");
        };
        current = next;
    }
    current.insert(leaf.to_string(), value);
}
