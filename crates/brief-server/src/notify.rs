//! Notification emails: templates and delivery.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use brief_core::{BriefRecord, Field, is_valid_email};
use chrono::{DateTime, Local, Utc};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("invalid recipient address: {0}")]
    InvalidRecipient(String),
    #[error("failed to write {path}: {source}")]
    Outbox {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), NotifyError>;
}

/// Logs messages instead of delivering them.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        info!(to = %email.to, subject = %email.subject, bytes = email.html.len(), "mail (log only)");
        Ok(())
    }
}

/// Writes each message as an `.html` file for a relay to pick up.
///
/// Envelope headers go in a leading HTML comment.
pub struct OutboxMailer {
    dir: PathBuf,
    seq: AtomicU64,
}

impl OutboxMailer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            seq: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        let name = format!("{}-{n:04}.html", Utc::now().format("%Y%m%dT%H%M%S%.3f"));
        let path = self.dir.join(name);
        let message = format!(
            "<!--\nTo: {}\nSubject: {}\n-->\n{}",
            email.to, email.subject, email.html
        );
        fs::create_dir_all(&self.dir)
            .and_then(|()| fs::write(&path, message))
            .map_err(|source| NotifyError::Outbox {
                path: path.clone(),
                source,
            })?;
        info!(to = %email.to, path = %path.display(), "mail queued in outbox");
        Ok(())
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Human label for a field in email bodies.
pub fn label(field: Field) -> &'static str {
    match field {
        Field::ClienteNombre => "Cliente",
        Field::ContactoNombre => "Contacto",
        Field::ContactoEmail => "Email",
        Field::ContactoTel => "Teléfono",
        Field::SitioActual => "Sitio actual",
        Field::DescripcionProyecto => "Descripción",
        Field::Historia => "Historia",
        Field::Objetivos => "Objetivos",
        Field::Kpi => "KPI",
        Field::Audiencia => "Audiencia",
        Field::Personas => "Personas",
        Field::ContenidoIncluido => "Contenido incluido",
        Field::SeccionesNecesarias => "Secciones",
        Field::Idiomas => "Idiomas",
        Field::Estilo => "Estilo",
        Field::Referencias => "Referencias",
        Field::LogoUpload => "Logo",
        Field::Funciones => "Funcionalidades",
        Field::PrioridadFunc => "Prioridad de funciones",
        Field::Hosting => "Hosting",
        Field::PlataformaPref => "Plataforma preferida",
        Field::Seguridad => "Seguridad",
        Field::FechaDeseada => "Fecha deseada",
        Field::Presupuesto => "Presupuesto",
        Field::Flexibilidad => "Flexibilidad",
        Field::SoporteNecesario => "Soporte necesario",
        Field::Actualizaciones => "Actualizaciones",
        Field::Comentarios => "Comentarios",
        Field::ConsentCorreo => "Acepta copia por correo",
        Field::EmailCopia => "Email para copia",
    }
}

fn value(record: &BriefRecord, field: Field) -> String {
    escape_html(&record.get(field).join(", "))
}

fn line(record: &BriefRecord, field: Field) -> String {
    format!(
        "<p><strong>{}:</strong> {}</p>\n",
        label(field),
        value(record, field)
    )
}

fn block(record: &BriefRecord, field: Field) -> String {
    format!(
        "<p><strong>{}:</strong><br>{}</p>\n",
        label(field),
        value(record, field)
    )
}

/// One line per non-empty field, in registry order.
pub fn summary_html(record: &BriefRecord) -> String {
    record
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(field, _)| line(record, field))
        .collect()
}

/// The agency's copy of a brief.
pub fn internal_email(
    record: &BriefRecord,
    recipient: &str,
    received_at: DateTime<Local>,
) -> Result<Email, NotifyError> {
    if !is_valid_email(recipient) {
        return Err(NotifyError::InvalidRecipient(recipient.to_string()));
    }

    let client = record.text(Field::ClienteNombre);
    let subject = format!(
        "Nuevo Brief: {}",
        if client.is_empty() { "Sin nombre" } else { client }
    );

    let mut html = String::from("<h2>Nuevo Brief Recibido</h2>\n<hr>\n<h3>Datos del Cliente</h3>\n");
    for field in [
        Field::ClienteNombre,
        Field::ContactoNombre,
        Field::ContactoEmail,
        Field::ContactoTel,
        Field::SitioActual,
    ] {
        html.push_str(&line(record, field));
    }
    html.push_str("<h3>Detalles del Proyecto</h3>\n");
    for field in [
        Field::DescripcionProyecto,
        Field::Historia,
        Field::Objetivos,
        Field::Kpi,
        Field::Audiencia,
        Field::Personas,
    ] {
        html.push_str(&block(record, field));
    }
    html.push_str("<h3>Contenido y Diseño</h3>\n");
    for field in [
        Field::ContenidoIncluido,
        Field::SeccionesNecesarias,
        Field::Idiomas,
        Field::Estilo,
        Field::Referencias,
        Field::LogoUpload,
    ] {
        html.push_str(&block(record, field));
    }
    html.push_str("<h3>Requerimientos Técnicos</h3>\n");
    for field in [
        Field::Funciones,
        Field::PrioridadFunc,
        Field::Hosting,
        Field::PlataformaPref,
        Field::Seguridad,
    ] {
        html.push_str(&block(record, field));
    }
    html.push_str("<h3>Presupuesto y Tiempos</h3>\n");
    for field in [
        Field::Presupuesto,
        Field::FechaDeseada,
        Field::Flexibilidad,
        Field::SoporteNecesario,
        Field::Actualizaciones,
    ] {
        html.push_str(&line(record, field));
    }
    html.push_str("<h3>Comentarios Adicionales</h3>\n");
    let comments = record.text(Field::Comentarios);
    html.push_str(&format!(
        "<p>{}</p>\n",
        escape_html(if comments.is_empty() { "Sin comentarios" } else { comments })
    ));
    for field in [Field::ConsentCorreo, Field::EmailCopia] {
        html.push_str(&line(record, field));
    }
    html.push_str(&format!(
        "<hr>\n<p><small>Brief recibido el {}</small></p>\n",
        received_at.format("%d/%m/%Y %H:%M:%S")
    ));

    Ok(Email {
        to: recipient.to_string(),
        subject,
        html,
    })
}

/// The client's copy, if they consented and gave a usable address.
pub fn client_copy(record: &BriefRecord) -> Option<Email> {
    let to = record.text(Field::EmailCopia).trim();
    if !record.is_truthy(Field::ConsentCorreo) || to.is_empty() {
        return None;
    }
    if !is_valid_email(to) {
        warn!(to = %to, "skipping client copy: invalid address");
        return None;
    }

    let html = format!(
        "<p>Hola {},</p>\n<p>Gracias por enviarnos tu brief. Esta es una copia de la información proporcionada:</p>\n<hr>\n{}<hr>\n<p>Nos pondremos en contacto contigo pronto.</p>\n",
        escape_html(record.text(Field::ContactoNombre)),
        summary_html(record)
    );
    Some(Email {
        to: to.to_string(),
        subject: format!("Copia de tu Brief - {}", record.text(Field::ClienteNombre)),
        html,
    })
}
