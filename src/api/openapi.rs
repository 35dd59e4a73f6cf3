use super::error::ErrorResponse;
use super::handlers::{
    auth::{self, LoginRequest},
    health::{self, Health},
    me,
};
use utoipa::{
    OpenApi,
    openapi::{Contact, License},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::session::login,
        auth::session::logout,
        me::me,
        health::health,
    ),
    components(schemas(LoginRequest, ErrorResponse, Health)),
    tags(
        (name = "auth", description = "Cookie session exchange and identity"),
        (name = "health", description = "Liveness")
    )
)]
struct ApiDoc;

/// `OpenAPI` document for the HTTP surface, with info taken from Cargo metadata.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = env!("CARGO_PKG_NAME").to_string();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    doc.info.description = non_empty(env!("CARGO_PKG_DESCRIPTION")).map(str::to_string);
    doc.info.contact = cargo_contact(env!("CARGO_PKG_AUTHORS"));
    doc.info.license = non_empty(env!("CARGO_PKG_LICENSE")).map(|identifier| {
        let mut license = License::new(identifier);
        license.identifier = Some(identifier.to_string());
        license
    });
    doc
}

// Cargo authors are `:` separated when read through `CARGO_PKG_AUTHORS`.
fn cargo_contact(authors: &str) -> Option<Contact> {
    let primary = authors.split(':').next().map(str::trim)?;
    let (name, email) = match primary.split_once('<') {
        Some((name, email)) => (non_empty(name), non_empty(email.trim_end_matches('>'))),
        None => (non_empty(primary), None),
    };
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
