use histplot::table::render_table;

#[test]
fn render_table_aligns_columns() {
    let headers = vec!["left".to_string(), "count".to_string()];
    let rows = vec![
        vec!["0.0".to_string(), "2.0".to_string()],
        vec!["10.0".to_string(), "3.0".to_string()],
    ];

    let rendered = render_table(&headers, &rows);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines, vec!["left  count", "----  -----", "0.0   2.0", "10.0  3.0"]);
}

#[test]
fn render_table_flattens_control_characters() {
    let headers = vec!["note".to_string()];
    let rows = vec![vec!["line1\nline2\tvalue".to_string()]];

    let rendered = render_table(&headers, &rows);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2], "line1 line2 value");
}
