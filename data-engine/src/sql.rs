//! SQL statements shared by every dataset variant

/// Extensions loaded on every fresh instance
pub const LOAD_EXTENSIONS: &str = "
INSTALL parquet;
LOAD parquet;
INSTALL json;
LOAD json;
";

/// Existence probe; yields one row with a boolean `exists_flag`
pub fn table_exists(table: &str) -> String {
    format!(
        "SELECT EXISTS (
  SELECT 1
  FROM information_schema.tables
  WHERE table_name = '{table}'
) AS exists_flag;"
    )
}

/// Row count; yields one row with `cnt`
pub fn count_rows(table: &str) -> String {
    format!("SELECT COUNT(*) AS cnt FROM {table};")
}

/// 1% Bernoulli sample of `select`'s source
pub const BERNOULLI_ONE_PERCENT: &str = "USING SAMPLE 1 PERCENT (bernoulli)";

/// Writes `select` as a zstd-compressed Parquet file into the virtual file space
pub fn copy_to_parquet(select: &str, file_name: &str) -> String {
    format!("COPY ({select}) TO '{file_name}' (FORMAT 'parquet', COMPRESSION 'zstd');")
}

/// `LIKE` pattern matching `term` anywhere.
///
/// The term is spliced in as-is: quotes are not escaped, so a term containing
/// `'` changes the statement. Search input comes from the same page that can
/// already run arbitrary SQL in the editor.
pub fn contains_pattern(term: &str) -> String {
    format!("'%{term}%'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exists_probe_targets_table() {
        let sql = table_exists("rtc_stats");
        assert!(sql.contains("information_schema.tables"));
        assert!(sql.contains("table_name = 'rtc_stats'"));
        assert!(sql.contains("AS exists_flag"));
    }

    #[test]
    fn copy_statement_shape() {
        assert_eq!(
            copy_to_parquet("SELECT * FROM t", "samples.parquet"),
            "COPY (SELECT * FROM t) TO 'samples.parquet' (FORMAT 'parquet', COMPRESSION 'zstd');"
        );
    }

    #[test]
    fn pattern_is_not_escaped() {
        assert_eq!(contains_pattern("abc"), "'%abc%'");
        assert_eq!(contains_pattern("o'neil"), "'%o'neil%'");
    }
}
