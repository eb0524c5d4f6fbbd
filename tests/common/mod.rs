#![allow(dead_code)]

pub mod navigator;

use form_binder::FormDefinitions;

pub fn definitions(yaml: &str) -> FormDefinitions {
    FormDefinitions::from_yaml_str(yaml).expect("valid form definitions")
}

/// Minimal page wrapper so fixtures stay short.
pub fn page(body: &str) -> String {
    format!("<html><head><title>Test</title></head><body>{}</body></html>", body)
}
