//! The RTC diff report executed by a native DuckDB

#![cfg(not(target_arch = "wasm32"))]

use data_engine::rtc::{DEFAULT_QUERY, TABLE};
use duckdb::{params, Connection};
use std::collections::BTreeMap;

#[derive(Debug, PartialEq)]
struct Diff {
    bytes_sent: i64,
    bytes_received: i64,
    packets_sent: i64,
    packets_received: i64,
}

fn counters(i: i64) -> [i64; 4] {
    [100 * i * i, 50 * i + 7, 3 * i, 2 * i + i * i]
}

fn stats_table() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE {TABLE} (
            timestamp VARCHAR,
            channel_id VARCHAR,
            session_id VARCHAR,
            connection_id VARCHAR,
            rtc_type VARCHAR,
            rtc_data JSON
        );"
    ))
    .unwrap();
    conn
}

/// One `transport` record per 15 second bucket, counters growing with `i`
fn insert_transport(conn: &Connection, connection_id: &str, records: i64) {
    for i in 0..records {
        let [sent, received, packets_sent, packets_received] = counters(i);
        let seconds = 15 * i;
        let timestamp = format!("2024-05-01T10:{:02}:{:02}.250Z", seconds / 60, seconds % 60);
        let data = format!(
            r#"{{"bytesSent": {sent}, "bytesReceived": {received}, "packetsSent": {packets_sent}, "packetsReceived": {packets_received}}}"#
        );
        conn.execute(
            &format!("INSERT INTO {TABLE} VALUES (?, ?, ?, ?, ?, ?)"),
            params![timestamp, "ch-1", "s-1", connection_id, "transport", data],
        )
        .unwrap();
    }
}

fn report(conn: &Connection) -> BTreeMap<String, Vec<(String, Diff)>> {
    let mut stmt = conn.prepare(DEFAULT_QUERY).unwrap();
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(3)?,
                row.get::<_, String>(0)?,
                Diff {
                    bytes_sent: row.get(4)?,
                    bytes_received: row.get(5)?,
                    packets_sent: row.get(6)?,
                    packets_received: row.get(7)?,
                },
            ))
        })
        .unwrap();

    let mut by_connection: BTreeMap<String, Vec<(String, Diff)>> = BTreeMap::new();
    for row in rows {
        let (connection_id, bucket, diff) = row.unwrap();
        by_connection.entry(connection_id).or_default().push((bucket, diff));
    }
    by_connection
}

#[test]
fn n_records_give_n_minus_one_consecutive_diffs() {
    let conn = stats_table();
    insert_transport(&conn, "conn-a", 6);

    let report = report(&conn);
    let rows = &report["conn-a"];
    assert_eq!(rows.len(), 5);
    for (k, (_, diff)) in rows.iter().enumerate() {
        let i = k as i64 + 1;
        let (now, before) = (counters(i), counters(i - 1));
        assert_eq!(
            diff,
            &Diff {
                bytes_sent: now[0] - before[0],
                bytes_received: now[1] - before[1],
                packets_sent: now[2] - before[2],
                packets_received: now[3] - before[3],
            }
        );
    }
    let buckets: Vec<&str> = rows.iter().map(|(bucket, _)| bucket.as_str()).collect();
    assert_eq!(buckets.first(), Some(&"2024-05-01 10:00:15"));
    assert!(buckets.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn each_connection_loses_its_own_first_bucket() {
    let conn = stats_table();
    insert_transport(&conn, "conn-a", 4);
    insert_transport(&conn, "conn-b", 3);
    conn.execute(
        &format!("INSERT INTO {TABLE} VALUES (?, ?, ?, ?, ?, ?)"),
        params!["2024-05-01T10:00:20.000Z", "ch-1", "s-1", "conn-a", "inbound-rtp", r#"{"bytesSent": 1}"#],
    )
    .unwrap();

    let report = report(&conn);
    assert_eq!(report["conn-a"].len(), 3);
    assert_eq!(report["conn-b"].len(), 2);
}

#[test]
fn single_record_gives_no_rows() {
    let conn = stats_table();
    insert_transport(&conn, "conn-a", 1);
    assert!(report(&conn).is_empty());
}
