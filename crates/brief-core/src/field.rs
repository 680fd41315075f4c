//! The field registry: every field a brief can carry, in form order.
//!
//! The registry is the only place a field is declared. Its cardinality decides
//! whether the field holds a scalar string or an ordered list of strings, and
//! its position decides column order for exports and the backend sheet.

use std::fmt;

/// Whether a field holds one value or an ordered sequence of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Scalar,
    Multi,
}

macro_rules! registry {
    ($($variant:ident => $name:literal, $card:ident;)+) => {
        /// A recognized form field.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Field {
            $($variant,)+
        }

        impl Field {
            /// Every field, in declaration order.
            pub const ALL: &'static [Field] = &[$(Field::$variant,)+];

            /// Wire name, shared by the client and every backend.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Field::$variant => $name,)+
                }
            }

            pub const fn cardinality(self) -> Cardinality {
                match self {
                    $(Field::$variant => Cardinality::$card,)+
                }
            }

            pub fn from_name(name: &str) -> Option<Field> {
                match name {
                    $($name => Some(Field::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

registry! {
    ClienteNombre => "clienteNombre", Scalar;
    ContactoNombre => "contactoNombre", Scalar;
    ContactoEmail => "contactoEmail", Scalar;
    ContactoTel => "contactoTel", Scalar;
    SitioActual => "sitioActual", Scalar;
    DescripcionProyecto => "descripcionProyecto", Scalar;
    Historia => "historia", Scalar;
    Objetivos => "objetivos", Multi;
    Kpi => "kpi", Scalar;
    Audiencia => "audiencia", Scalar;
    Personas => "personas", Scalar;
    ContenidoIncluido => "contenidoIncluido", Scalar;
    SeccionesNecesarias => "seccionesNecesarias", Scalar;
    Idiomas => "idiomas", Scalar;
    Estilo => "estilo", Multi;
    Referencias => "referencias", Scalar;
    LogoUpload => "logoUpload", Scalar;
    Funciones => "funciones", Multi;
    PrioridadFunc => "prioridadFunc", Scalar;
    Hosting => "hosting", Scalar;
    PlataformaPref => "plataformaPref", Scalar;
    Seguridad => "seguridad", Scalar;
    FechaDeseada => "fechaDeseada", Scalar;
    Presupuesto => "presupuesto", Scalar;
    Flexibilidad => "flexibilidad", Scalar;
    SoporteNecesario => "soporteNecesario", Scalar;
    Actualizaciones => "actualizaciones", Scalar;
    Comentarios => "comentarios", Scalar;
    ConsentCorreo => "consentCorreo", Scalar;
    EmailCopia => "emailCopia", Scalar;
}

impl Field {
    /// Position in the registry, used to index record storage.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_multi(self) -> bool {
        self.cardinality() == Cardinality::Multi
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered list of every field name.
pub fn all_fields() -> Vec<&'static str> {
    Field::ALL.iter().map(|f| f.name()).collect()
}
