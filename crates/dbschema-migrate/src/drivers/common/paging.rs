//! `ROWNUM` paging shared by Oracle and DM.

/// Label of the helper column a ROWNUM window adds to each row.
pub const ROWNUM_COLUMN: &str = "rownum__";

/// Wrap `select` in a `ROWNUM` window. Works on every Oracle and DM release,
/// unlike `OFFSET ... FETCH`.
pub fn rownum_paginate(select: &str, offset: i64, limit: i64) -> String {
    format!(
        "SELECT * FROM (SELECT t__.*, ROWNUM AS {col} FROM ({select}) t__ \
         WHERE ROWNUM <= {end}) WHERE {col} > {offset}",
        col = ROWNUM_COLUMN,
        select = select,
        end = offset + limit,
        offset = offset
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bounds() {
        let sql = rownum_paginate("SELECT * FROM \"HR\".\"EMP\"", 20, 10);
        assert!(sql.contains("FROM (SELECT * FROM \"HR\".\"EMP\") t__"));
        assert!(sql.contains("WHERE ROWNUM <= 30"));
        assert!(sql.ends_with("WHERE rownum__ > 20"));
    }
}
