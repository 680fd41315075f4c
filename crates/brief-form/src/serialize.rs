//! Reading a `UiState` into a `BriefRecord` and writing one back.

use brief_core::{BriefRecord, Field, FieldValue};

use crate::ui::{UiState, Widget};

/// Snapshot the controls. Fields without a control keep their blank value.
pub fn serialize(ui: &UiState) -> BriefRecord {
    let mut record = BriefRecord::new();
    for control in ui.controls() {
        let Some(field) = Field::from_name(&control.name) else {
            continue;
        };
        let value = match &control.widget {
            Widget::Input { value } => FieldValue::Scalar(value.clone()),
            Widget::CheckboxGroup { options } => {
                FieldValue::list(options.iter().filter(|o| o.checked).map(|o| o.value.as_str()))
            }
            Widget::RadioGroup { options } => FieldValue::Scalar(
                options
                    .iter()
                    .find(|o| o.checked)
                    .map(|o| o.value.clone())
                    .unwrap_or_default(),
            ),
            Widget::Checkbox { value, checked } => {
                FieldValue::Scalar(if *checked { value.clone() } else { String::new() })
            }
        };
        record.set(field, value);
    }
    record
}

/// Push a record's values into the controls.
///
/// Checkbox groups only accept list values; a scalar stored for a group field
/// is ignored. Radios with no matching option are left untouched.
pub fn deserialize(record: &BriefRecord, ui: &mut UiState) {
    for control in ui.controls_mut() {
        let Some(field) = Field::from_name(&control.name) else {
            continue;
        };
        let value = record.get(field);
        match &mut control.widget {
            Widget::CheckboxGroup { options } => {
                if let FieldValue::List(items) = value {
                    for choice in options.iter_mut() {
                        choice.checked = items.contains(&choice.value);
                    }
                }
            }
            Widget::RadioGroup { options } => {
                let FieldValue::Scalar(selected) = value else {
                    continue;
                };
                if options.iter().any(|o| o.value == *selected) {
                    for choice in options.iter_mut() {
                        choice.checked = choice.value == *selected;
                    }
                }
            }
            Widget::Checkbox { value: own, checked } => {
                let text = record.text(field);
                *checked = record.is_truthy(field) || (!text.is_empty() && text == own.as_str());
            }
            Widget::Input { value: current } => *current = value.join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> UiState {
        let mut ui = UiState::standard();
        ui.set_value("clienteNombre", "Acme Co");
        ui.set_value("contactoEmail", "jane@acme.com");
        ui.set_checked("objetivos", "Branding", true);
        ui.set_checked("objetivos", "Leads", true);
        ui.set_checked("hosting", "No sé", true);
        ui.set_checked("consentCorreo", "true", true);
        ui
    }

    #[test]
    fn groups_follow_declaration_order() {
        let record = serialize(&filled());
        assert_eq!(record.items(Field::Objetivos), ["Leads", "Branding"]);
        assert_eq!(record.text(Field::Hosting), "No sé");
        assert_eq!(record.text(Field::ConsentCorreo), "true");
        assert_eq!(record.text(Field::Flexibilidad), "");
        assert!(record.items(Field::Estilo).is_empty());
    }

    #[test]
    fn missing_controls_are_backfilled() {
        let ui = UiState::new().input("clienteNombre").input("notARegistryField");
        let record = serialize(&ui);
        assert_eq!(record, BriefRecord::new());
    }

    #[test]
    fn round_trip_into_blank_form() {
        let original = filled();
        let mut blank = UiState::standard();
        deserialize(&serialize(&original), &mut blank);
        assert_eq!(blank, original);
    }

    #[test]
    fn scalar_value_for_group_is_ignored() {
        let mut ui = UiState::new().checkboxes("idiomas", &["es", "en"]);
        ui.set_checked("idiomas", "en", true);
        let before = ui.clone();
        deserialize(&BriefRecord::new().with(Field::Idiomas, "es"), &mut ui);
        assert_eq!(ui, before);
    }

    #[test]
    fn unmatched_radio_is_left_alone() {
        let mut ui = filled();
        let record = BriefRecord::new().with(Field::Hosting, "Servidor propio");
        deserialize(&record, &mut ui);
        assert_eq!(serialize(&ui).text(Field::Hosting), "No sé");
    }
}
