//! Result table and status panel rendering

use explorer_types::{DatasetKind, QueryResult, SessionStatus};
use serde_json::Value;
use wasm_bindgen::JsValue;
use web_sys::{Document, Element};

pub const NO_RESULTS: &str = "No results.";
const NOT_AVAILABLE: &str = "N/A";

/// Text shown for one cell
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Cell texts per row, in header order; missing keys render empty
pub fn table_cells(result: &QueryResult) -> Vec<Vec<String>> {
    result
        .rows
        .iter()
        .map(|row| {
            result
                .headers
                .iter()
                .map(|header| cell_text(row.get(header)))
                .collect()
        })
        .collect()
}

pub fn status_lines(status: &SessionStatus) -> Vec<String> {
    let or_na = |s: &str| {
        if s.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            s.to_string()
        }
    };
    vec![
        format!("DuckDB: {}", or_na(&status.engine_version)),
        format!("DuckDB-Wasm: {}", or_na(&status.runtime_version)),
        format!("OPFS: {}", status.opfs),
        format!("Counted: {}", status.record_count),
    ]
}

/// Replaces the children of `container` with the result table
pub fn render_result(document: &Document, container: &Element, result: &QueryResult) -> Result<(), JsValue> {
    container.set_inner_html("");

    if !result.is_renderable() {
        let empty = document.create_element("div")?;
        empty.set_class_name("no-result");
        empty.set_text_content(Some(NO_RESULTS));
        container.append_child(&empty)?;
        return Ok(());
    }

    let table = document.create_element("table")?;
    table.set_class_name("result-table");

    let thead = document.create_element("thead")?;
    let head_row = document.create_element("tr")?;
    for header in &result.headers {
        let th = document.create_element("th")?;
        th.set_text_content(Some(header.as_str()));
        head_row.append_child(&th)?;
    }
    thead.append_child(&head_row)?;
    table.append_child(&thead)?;

    let tbody = document.create_element("tbody")?;
    for cells in table_cells(result) {
        let tr = document.create_element("tr")?;
        for text in cells {
            let td = document.create_element("td")?;
            td.set_text_content(Some(text.as_str()));
            tr.append_child(&td)?;
        }
        tbody.append_child(&tr)?;
    }
    table.append_child(&tbody)?;
    container.append_child(&table)?;
    Ok(())
}

pub fn render_status(document: &Document, container: &Element, status: &SessionStatus) -> Result<(), JsValue> {
    container.set_inner_html("");
    for line in status_lines(status) {
        let p = document.create_element("p")?;
        p.set_text_content(Some(line.as_str()));
        container.append_child(&p)?;
    }
    Ok(())
}

/// Header nav linking every dataset page; the current one is marked `active`
pub fn header(document: &Document, current: DatasetKind) -> Result<Element, JsValue> {
    let header = document.create_element("header")?;
    let nav = document.create_element("nav")?;
    for kind in DatasetKind::all() {
        let link = document.create_element("a")?;
        link.set_attribute("href", kind.route())?;
        link.set_text_content(Some(kind.label()));
        if kind == current {
            link.set_class_name("active");
        }
        nav.append_child(&link)?;
    }
    header.append_child(&nav)?;
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(rows: Vec<Value>) -> QueryResult {
        QueryResult::from_rows(rows.into_iter().filter_map(|v| v.as_object().cloned()).collect())
    }

    #[test]
    fn cells_follow_header_order() {
        let result = result(vec![
            json!({"b": "x", "a": 1}),
            json!({"a": 2.5, "b": null}),
            json!({"a": true}),
        ]);
        assert_eq!(result.headers, vec!["b", "a"]);
        assert_eq!(
            table_cells(&result),
            vec![
                vec!["x".to_string(), "1".to_string()],
                vec![String::new(), "2.5".to_string()],
                vec![String::new(), "true".to_string()],
            ]
        );
    }

    #[test]
    fn nested_values_render_as_json() {
        assert_eq!(cell_text(Some(&json!({"k": [1, 2]}))), r#"{"k":[1,2]}"#);
        assert_eq!(cell_text(Some(&json!("plain"))), "plain");
        assert_eq!(cell_text(None), "");
    }

    #[test]
    fn status_without_version_shows_na() {
        assert_eq!(
            status_lines(&SessionStatus::default()),
            vec!["DuckDB: N/A", "DuckDB-Wasm: N/A", "OPFS: false", "Counted: 0"]
        );
    }

    #[test]
    fn ready_status_lines() {
        let status = SessionStatus {
            engine_version: "v1.1.3".into(),
            runtime_version: "1.29.0".into(),
            opfs: true,
            record_count: 8640,
        };
        assert_eq!(
            status_lines(&status),
            vec!["DuckDB: v1.1.3", "DuckDB-Wasm: 1.29.0", "OPFS: true", "Counted: 8640"]
        );
    }
}
