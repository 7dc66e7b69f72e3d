use std::collections::BTreeMap;

use serde_json::Value;

use crate::hints::{FieldHintSchema, HintField};
use crate::json_path::{resolve_present, scalar_text};
use crate::parse::text::collapse_whitespace;

#[derive(Debug, Clone, Default)]
pub struct ResolvedFields<'a> {
    values: BTreeMap<HintField, &'a Value>,
    matched_alias: BTreeMap<HintField, String>,
    /// Address built from city/district/neighborhood when no full address resolved.
    composed_address: Option<String>,
}

impl<'a> ResolvedFields<'a> {
    pub fn get(&self, field: HintField) -> Option<&'a Value> {
        self.values.get(&field).copied()
    }

    pub fn text(&self, field: HintField) -> Option<String> {
        self.get(field).and_then(scalar_text)
    }

    pub fn matched_alias(&self, field: HintField) -> Option<&str> {
        self.matched_alias.get(&field).map(String::as_str)
    }

    pub fn address_text(&self) -> Option<String> {
        self.text(HintField::Address)
            .map(|a| collapse_whitespace(&a))
            .filter(|a| !a.is_empty())
            .or_else(|| self.composed_address.clone())
    }

    pub fn is_address_composed(&self) -> bool {
        self.text(HintField::Address).is_none() && self.composed_address.is_some()
    }

    /// Whether any listing signal resolved at all. Image presence is judged by the caller.
    pub fn has_signal(&self) -> bool {
        HintField::SIGNAL
            .iter()
            .any(|field| self.values.contains_key(field))
    }
}

/// Try each field's aliases in order; the first present value wins.
pub fn resolve_fields<'a>(candidate: &'a Value, schema: &FieldHintSchema) -> ResolvedFields<'a> {
    let mut out = ResolvedFields::default();
    for field in HintField::ALL {
        for alias in schema.aliases(field) {
            if let Some(value) = resolve_present(candidate, alias) {
                // address aliases that point at an object (e.g. schema.org PostalAddress)
                // are left to the dotted aliases and to composition
                if field == HintField::Address && !is_textual(value) {
                    continue;
                }
                out.values.insert(field, value);
                out.matched_alias.insert(field, alias.clone());
                break;
            }
        }
    }

    if out.text(HintField::Address).is_none() {
        let parts: Vec<String> = [HintField::City, HintField::District, HintField::Neighborhood]
            .into_iter()
            .filter_map(|field| out.text(field))
            .collect();
        if !parts.is_empty() {
            out.composed_address = Some(collapse_whitespace(&parts.join(" ")));
        }
    }

    out
}

fn is_textual(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_))
}
