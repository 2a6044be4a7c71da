use super::*;

fn actions(records: &[Record]) -> Vec<&str> {
    records
        .iter()
        .filter_map(|r| r.get("action").and_then(|v| v.as_str()))
        .collect()
}

#[test]
fn direct_parse_rejects_fenced_text() {
    let text = "```json\n[{\"action\":\"Pitch editors\",\"source\":\"wired.com\"}]\n```";
    assert!(direct_parse(text).is_err());
    assert_eq!(
        actions(&strip_fences_and_parse(text).unwrap()),
        ["Pitch editors"]
    );
}

#[test]
fn delimited_ignores_surrounding_prose() {
    let text = "Sure! Here are the recommendations:\n\
        [{\"action\":\"Pitch editors\",\"source\":\"wired.com\"}]\n\
        Let me know if you need more.";
    assert_eq!(actions(&parse_delimited(text).unwrap()), ["Pitch editors"]);
}

#[test]
fn delimited_prefers_object_when_it_comes_first() {
    let text = "Result: {\"recommendations\": [{\"action\":\"Pitch editors\",\"source\":\"wired.com\"}]} done";
    assert_eq!(actions(&parse_delimited(text).unwrap()), ["Pitch editors"]);
}

#[test]
fn delimited_without_delimiters_fails() {
    assert!(matches!(
        parse_delimited("nothing here"),
        Err(RecoveryError::NoDelimiters)
    ));
}

#[test]
fn trailing_commas_are_removed() {
    let text = r#"[
        {"action": "Pitch editors", "source": "wired.com",},
        {"action": "Answer threads", "source": "reddit.com"},
    ]"#;
    assert_eq!(
        actions(&repair_structure(text).unwrap()),
        ["Pitch editors", "Answer threads"]
    );
}

#[test]
fn doubled_closing_braces_are_collapsed() {
    let text = r#"[{"action": "Pitch editors", "source": "wired.com"},
        {"action": "Answer threads", "source": "reddit.com"}}
    ]"#;
    assert!(parse_delimited(text).is_err());
    assert_eq!(
        actions(&repair_structure(text).unwrap()),
        ["Pitch editors", "Answer threads"]
    );
}

#[test]
fn nested_objects_survive_structural_repair() {
    let text = r#"[{"action": "Pitch editors", "source": "wired.com", "meta": {"k": 1}},]"#;
    assert_eq!(actions(&repair_structure(text).unwrap()), ["Pitch editors"]);
}

#[test]
fn balance_appends_missing_closers() {
    let text = r#"[{"action": "Pitch editors", "source": "wired.com"},
        {"action": "Answer threads", "source": "reddit.com", "tags": ["a", "b""#;
    assert_eq!(
        actions(&balance_brackets(text).unwrap()),
        ["Pitch editors", "Answer threads"]
    );
}

#[test]
fn balance_closes_an_open_string() {
    let text = r#"[{"action": "Pitch editors", "source": "wired.com", "reason": "Editors cite"#;
    let records = balance_brackets(text).unwrap();
    assert_eq!(records[0]["reason"], "Editors cite");
}

#[test]
fn balance_drops_a_dangling_comma() {
    let text = r#"[{"action": "Pitch editors", "source": "wired.com"},"#;
    assert_eq!(actions(&balance_brackets(text).unwrap()), ["Pitch editors"]);
}

#[test]
fn brackets_inside_strings_are_not_counted() {
    let text = r#"[{"action": "Use [brackets] and {braces}", "source": "wired.com""#;
    assert_eq!(
        actions(&balance_brackets(text).unwrap()),
        ["Use [brackets] and {braces}"]
    );
}
