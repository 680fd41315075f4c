//! Explicit model of the live form controls.
//!
//! A `UiState` is what a toolkit binding reads from and writes to. It knows
//! nothing about validation or persistence.

use brief_core::Field;

/// One option of a checkbox or radio group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub checked: bool,
}

impl Choice {
    fn unchecked(value: &str) -> Self {
        Self {
            value: value.to_string(),
            checked: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Widget {
    /// Text, textarea, select, date or file-name input: a raw value.
    Input { value: String },
    CheckboxGroup { options: Vec<Choice> },
    /// At most one option checked.
    RadioGroup { options: Vec<Choice> },
    /// A lone checkbox acting as a flag.
    Checkbox { value: String, checked: bool },
}

impl Widget {
    fn reset(&mut self) {
        match self {
            Widget::Input { value } => value.clear(),
            Widget::CheckboxGroup { options } | Widget::RadioGroup { options } => {
                options.iter_mut().for_each(|o| o.checked = false)
            }
            Widget::Checkbox { checked, .. } => *checked = false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub name: String,
    pub widget: Widget,
}

/// Controls in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    controls: Vec<Control>,
}

const OBJETIVOS: &[&str] = &["Leads", "Ventas", "Branding", "Informar", "Comunidad"];
const ESTILO: &[&str] = &["Minimalista", "Corporativo", "Moderno", "Colorido", "Elegante"];
const FUNCIONES: &[&str] = &[
    "Formulario",
    "Blog",
    "Galería",
    "Tienda",
    "Reservas",
    "Chat",
    "Newsletter",
];
const HOSTING: &[&str] = &["Tengo hosting", "Necesito hosting", "No sé"];
const FLEXIBILIDAD: &[&str] = &["Fija", "Flexible"];
const ACTUALIZACIONES: &[&str] = &["Yo mismo", "La agencia", "Ambos"];

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The agency's intake form: one control per registry field.
    pub fn standard() -> Self {
        let mut ui = Self::new();
        for field in Field::ALL {
            let name = field.name();
            ui = match field {
                Field::Objetivos => ui.checkboxes(name, OBJETIVOS),
                Field::Estilo => ui.checkboxes(name, ESTILO),
                Field::Funciones => ui.checkboxes(name, FUNCIONES),
                Field::Hosting => ui.radios(name, HOSTING),
                Field::Flexibilidad => ui.radios(name, FLEXIBILIDAD),
                Field::Actualizaciones => ui.radios(name, ACTUALIZACIONES),
                Field::ConsentCorreo => ui.checkbox(name, "true"),
                _ => ui.input(name),
            };
        }
        ui
    }

    pub fn input(mut self, name: &str) -> Self {
        self.push(name, Widget::Input { value: String::new() });
        self
    }

    pub fn checkboxes(mut self, name: &str, options: &[&str]) -> Self {
        let options = options.iter().map(|o| Choice::unchecked(o)).collect();
        self.push(name, Widget::CheckboxGroup { options });
        self
    }

    pub fn radios(mut self, name: &str, options: &[&str]) -> Self {
        let options = options.iter().map(|o| Choice::unchecked(o)).collect();
        self.push(name, Widget::RadioGroup { options });
        self
    }

    pub fn checkbox(mut self, name: &str, value: &str) -> Self {
        self.push(
            name,
            Widget::Checkbox {
                value: value.to_string(),
                checked: false,
            },
        );
        self
    }

    fn push(&mut self, name: &str, widget: Widget) {
        self.controls.push(Control {
            name: name.to_string(),
            widget,
        });
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut [Control] {
        &mut self.controls
    }

    pub fn control(&self, name: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.name == name)
    }

    fn widget_mut(&mut self, name: &str) -> Option<&mut Widget> {
        self.controls
            .iter_mut()
            .find(|c| c.name == name)
            .map(|c| &mut c.widget)
    }

    /// Type into an input. Returns false if `name` is not an input.
    pub fn set_value(&mut self, name: &str, text: &str) -> bool {
        match self.widget_mut(name) {
            Some(Widget::Input { value }) => {
                *value = text.to_string();
                true
            }
            _ => false,
        }
    }

    /// Click an option of a group or a lone checkbox. Radios uncheck their siblings.
    pub fn set_checked(&mut self, name: &str, option: &str, on: bool) -> bool {
        match self.widget_mut(name) {
            Some(Widget::CheckboxGroup { options }) => match options.iter_mut().find(|o| o.value == option) {
                Some(choice) => {
                    choice.checked = on;
                    true
                }
                None => false,
            },
            Some(Widget::RadioGroup { options }) => {
                if !options.iter().any(|o| o.value == option) {
                    return false;
                }
                for choice in options.iter_mut() {
                    choice.checked = on && choice.value == option;
                }
                true
            }
            Some(Widget::Checkbox { value, checked }) if *value == option => {
                *checked = on;
                true
            }
            _ => false,
        }
    }

    /// Blank every control, as a form reset does.
    pub fn reset(&mut self) {
        self.controls.iter_mut().for_each(|c| c.widget.reset());
    }
}
