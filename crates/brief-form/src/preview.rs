//! Confirmation summary shown before sending.

use brief_core::{BriefRecord, Field};

/// Shown in place of an empty value. Display only; exports never use it.
pub const PLACEHOLDER: &str = "—";

const ROWS: &[(&str, Field)] = &[
    ("Cliente", Field::ClienteNombre),
    ("Contacto", Field::ContactoNombre),
    ("Email", Field::ContactoEmail),
    ("Teléfono", Field::ContactoTel),
    ("Descripción", Field::DescripcionProyecto),
    ("Objetivos", Field::Objetivos),
    ("Público", Field::Audiencia),
    ("Secciones", Field::SeccionesNecesarias),
    ("Funciones", Field::Funciones),
    ("Presupuesto", Field::Presupuesto),
    ("Fecha deseada", Field::FechaDeseada),
    ("Comentarios", Field::Comentarios),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRow {
    pub label: &'static str,
    pub value: String,
}

pub fn preview_rows(record: &BriefRecord) -> Vec<PreviewRow> {
    ROWS.iter()
        .map(|&(label, field)| {
            let value = record.get(field).join(", ");
            PreviewRow {
                label,
                value: if value.is_empty() { PLACEHOLDER.to_string() } else { value },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_values_show_placeholder() {
        let record = BriefRecord::new()
            .with(Field::ClienteNombre, "Acme")
            .with(Field::Funciones, vec!["Blog", "Tienda"]);
        let rows = preview_rows(&record);
        assert_eq!(rows[0].value, "Acme");
        assert_eq!(rows[3].label, "Teléfono");
        assert_eq!(rows[3].value, PLACEHOLDER);
        assert_eq!(rows[8].value, "Blog, Tienda");
    }
}
