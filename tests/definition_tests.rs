use std::io::Write;

use form_binder::{
    BindingError, Cardinality, FormDefinitions, FormKey, NodeDefinition,
    definition::definition_model::CardinalityViolation,
};

// =========================================================================
// Loading
// =========================================================================

const LOGIN_YAML: &str = r##"
forms:
  - id: login
    nodes:
      - kind: element
        id: username
        lookup: "input[name='username']"
      - kind: element
        id: password
        lookup: "input[name='password']"
        cardinality: optional
      - kind: element
        id: links
        lookup: a
        cardinality: optional_multiple
        nodes:
          - kind: attribute
            id: target
            lookup: href
  - group: admin
    id: login
    attributes:
      frame: admin-frame
    nodes:
      - kind: element
        id: token
        lookup: "#token"
"##;

#[test]
fn yaml_definitions_load_with_defaults() {
    let definitions = FormDefinitions::from_yaml_str(LOGIN_YAML).expect("load yaml");
    assert_eq!(definitions.len(), 2);

    let login = definitions.form("login").unwrap();
    assert_eq!(login.group, "");
    assert_eq!(login.nodes.len(), 3);
    assert_eq!(login.frame(), None);

    match &login.nodes[0] {
        NodeDefinition::Element(element) => {
            assert_eq!(element.id, "username");
            assert_eq!(element.cardinality, Cardinality::Required);
        }
        other => panic!("expected element, got {:?}", other),
    }

    match &login.nodes[2] {
        NodeDefinition::Element(element) => {
            assert_eq!(element.cardinality, Cardinality::OptionalMultiple);
            assert!(matches!(element.nodes[0], NodeDefinition::Attribute(_)));
        }
        other => panic!("expected element, got {:?}", other),
    }
}

#[test]
fn forms_are_looked_up_by_group_and_id() {
    let definitions = FormDefinitions::from_yaml_str(LOGIN_YAML).unwrap();

    let admin = definitions.form_in_group("admin", "login").unwrap();
    assert_eq!(admin.frame(), Some("admin-frame"));
    assert_eq!(admin.key(), FormKey::in_group("admin", "login"));

    let default = definitions.get(&FormKey::new("login")).unwrap();
    assert_eq!(default.group, "");
}

#[test]
fn unknown_form_is_not_found() {
    let definitions = FormDefinitions::from_yaml_str(LOGIN_YAML).unwrap();

    let err = definitions.form("checkout").unwrap_err();
    assert!(matches!(err, BindingError::FormNotFound { .. }));
    assert!(!err.is_recoverable());

    let err = definitions.form_in_group("other", "login").unwrap_err();
    assert!(err.to_string().contains("group 'other'"));
}

#[test]
fn json_definitions_load() {
    let json = r#"{
        "forms": [
            {
                "id": "search",
                "nodes": [
                    { "kind": "element", "id": "query", "lookup": "input[type=search]" },
                    { "kind": "form_reference", "id": "login", "attributes": { "frame": "1" } }
                ]
            },
            { "id": "login" }
        ]
    }"#;

    let definitions = FormDefinitions::from_json_str(json).expect("load json");
    let search = definitions.form("search").unwrap();
    match &search.nodes[1] {
        NodeDefinition::FormReference(reference) => {
            assert_eq!(reference.frame(), Some("1"));
            assert_eq!(reference.target(""), FormKey::new("login"));
        }
        other => panic!("expected form reference, got {:?}", other),
    }
}

#[test]
fn yaml_file_loads() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(LOGIN_YAML.as_bytes()).unwrap();

    let definitions = FormDefinitions::load_yaml_file(file.path()).unwrap();
    assert_eq!(definitions.len(), 2);
}

#[test]
fn missing_file_is_io_error() {
    let err = FormDefinitions::load_yaml_file("/nonexistent/forms.yaml").unwrap_err();
    assert!(matches!(err, BindingError::Io(_)));
}

#[test]
fn malformed_yaml_is_rejected() {
    let err = FormDefinitions::from_yaml_str("forms: [ { nodes: 3 } ]").unwrap_err();
    assert!(matches!(err, BindingError::Yaml(_)));
}

// =========================================================================
// Structural validation
// =========================================================================

fn invalid(yaml: &str) -> String {
    match FormDefinitions::from_yaml_str(yaml) {
        Err(BindingError::InvalidDefinition(message)) => message,
        other => panic!("expected invalid definition, got {:?}", other.map(|d| d.len())),
    }
}

#[test]
fn duplicate_forms_are_rejected() {
    let message = invalid(
        r#"
forms:
  - id: login
  - id: login
"#,
    );
    assert!(message.contains("more than once"));
}

#[test]
fn same_id_in_different_groups_is_allowed() {
    let definitions = FormDefinitions::from_yaml_str(
        r#"
forms:
  - id: login
  - group: admin
    id: login
"#,
    )
    .unwrap();
    assert_eq!(definitions.len(), 2);
}

#[test]
fn attribute_without_parent_element_is_rejected() {
    let message = invalid(
        r#"
forms:
  - id: login
    nodes:
      - kind: attribute
        id: action
        lookup: action
"#,
    );
    assert!(message.contains("no parent element"));
}

#[test]
fn multiple_attribute_is_rejected() {
    let message = invalid(
        r#"
forms:
  - id: login
    nodes:
      - kind: element
        id: form
        lookup: form
        nodes:
          - kind: attribute
            id: action
            lookup: action
            cardinality: required_multiple
"#,
    );
    assert!(message.contains("cardinality"));
}

#[test]
fn empty_lookup_is_rejected() {
    let message = invalid(
        r#"
forms:
  - id: login
    nodes:
      - kind: element
        id: user
        lookup: "  "
"#,
    );
    assert!(message.contains("empty lookup"));
}

#[test]
fn empty_form_frame_is_rejected() {
    let message = invalid(
        r#"
forms:
  - id: login
    attributes:
      frame: ""
"#,
    );
    assert!(message.contains("empty frame"));
}

#[test]
fn empty_reference_frame_is_rejected() {
    let message = invalid(
        r#"
forms:
  - id: shell
    nodes:
      - kind: form_reference
        id: login
        attributes:
          frame: "  "
  - id: login
"#,
    );
    assert!(message.contains("empty frame"));
    assert!(message.contains("'shell'"));
}

#[test]
fn reference_to_undefined_form_is_rejected() {
    let message = invalid(
        r#"
forms:
  - id: page
    nodes:
      - kind: form_reference
        id: missing
"#,
    );
    assert!(message.contains("undefined form"));
}

#[test]
fn reference_uses_referencing_group_by_default() {
    let message = invalid(
        r#"
forms:
  - group: admin
    id: page
    nodes:
      - kind: form_reference
        id: login
  - id: login
"#,
    );
    assert!(message.contains("'login' (group 'admin')"));
}

#[test]
fn cyclic_references_are_rejected() {
    let message = invalid(
        r#"
forms:
  - id: a
    nodes:
      - kind: element
        id: wrapper
        lookup: div
        nodes:
          - kind: form_reference
            id: b
  - id: b
    nodes:
      - kind: form_reference
        id: c
  - id: c
    nodes:
      - kind: form_reference
        id: a
"#,
    );
    assert!(message.contains("cyclic"));
    assert!(message.contains("'a'"));
}

#[test]
fn self_reference_is_rejected() {
    let message = invalid(
        r#"
forms:
  - id: a
    nodes:
      - kind: form_reference
        id: a
"#,
    );
    assert!(message.contains("cyclic"));
}

#[test]
fn shared_reference_is_not_a_cycle() {
    let definitions = FormDefinitions::from_yaml_str(
        r#"
forms:
  - id: page
    nodes:
      - kind: form_reference
        id: header
      - kind: form_reference
        id: footer
  - id: footer
    nodes:
      - kind: form_reference
        id: header
  - id: header
"#,
    )
    .unwrap();
    assert_eq!(definitions.len(), 3);
}

// =========================================================================
// Cardinality
// =========================================================================

#[test]
fn cardinality_checks_match_counts() {
    assert_eq!(Cardinality::Required.check(1), Ok(()));
    assert_eq!(Cardinality::Required.check(0), Err(CardinalityViolation::Absent));
    assert_eq!(Cardinality::Required.check(2), Err(CardinalityViolation::TooMany(2)));

    assert_eq!(Cardinality::Optional.check(0), Ok(()));
    assert_eq!(Cardinality::Optional.check(3), Err(CardinalityViolation::TooMany(3)));

    assert_eq!(Cardinality::Prohibited.check(0), Ok(()));
    assert_eq!(Cardinality::Prohibited.check(1), Err(CardinalityViolation::Prohibited));

    assert_eq!(Cardinality::RequiredMultiple.check(0), Err(CardinalityViolation::Absent));
    assert_eq!(Cardinality::RequiredMultiple.check(5), Ok(()));

    assert_eq!(Cardinality::OptionalMultiple.check(0), Ok(()));
    assert_eq!(Cardinality::OptionalMultiple.check(9), Ok(()));
}
