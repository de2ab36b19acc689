use super::*;

#[test]
fn renders_header_and_rows_aligned() {
    let mut table = Table::plain(vec![Column::left("ID"), Column::left("STATUS")]);
    table.row(vec!["1".into(), "pending".into()]);
    table.row(vec!["12".into(), "in_progress".into()]);

    let mut out = Vec::new();
    table.render(&mut out);
    let text = String::from_utf8(out).unwrap();

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "ID  STATUS");
    assert_eq!(lines[1], "1   pending");
    assert_eq!(lines[2], "12  in_progress");
}

#[test]
fn empty_table_renders_nothing() {
    let table = Table::plain(vec![Column::left("ID")]);
    let mut out = Vec::new();
    table.render(&mut out);
    assert!(out.is_empty());
}

#[test]
fn truncates_to_max_width() {
    let mut table = Table::plain(vec![Column::left("DESC").with_max(5)]);
    table.row(vec!["a very long description".into()]);
    let mut out = Vec::new();
    table.render(&mut out);
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().nth(1).unwrap(), "a ver");
}

#[test]
fn colored_status_column_wraps_escape_codes() {
    let mut table = Table::colored(vec![Column::status("STATUS")]);
    table.row(vec!["completed".into()]);
    let mut out = Vec::new();
    table.render(&mut out);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("\x1b[32m"));
}

#[test]
fn should_show_project_detects_diverse_namespaces() {
    assert!(should_show_project(["alpha", "beta"].into_iter()));
    assert!(should_show_project(["alpha"].into_iter()));
    assert!(!should_show_project([""].into_iter()));
}

#[test]
fn project_cell_labels_empty_namespace() {
    assert_eq!(project_cell(""), "(no project)");
    assert_eq!(project_cell("alpha"), "alpha");
}
