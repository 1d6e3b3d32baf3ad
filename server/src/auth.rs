pub mod login;
pub mod logout;
pub mod register;

use askama::DynTemplate;
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors};

/// A form that can be shown again, together with its validation errors.
pub trait ToTemplate {
    fn to_template(self, errors: ValidationErrors) -> Box<dyn DynTemplate>;
}

// https://github.com/tokio-rs/axum/blob/main/examples/validator/src/main.rs
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedForm<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedForm<T>
where
    T: DeserializeOwned + Validate + ToTemplate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match value.validate() {
            Ok(()) => Ok(ValidatedForm(value)),
            Err(errors) => Err(render_form(value.to_template(errors), StatusCode::BAD_REQUEST)),
        }
    }
}

pub fn form_error<T: ToTemplate>(
    form: T,
    code: &'static str,
    field: &'static str,
    message: &'static str,
) -> Response {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());

    let mut errors = ValidationErrors::new();
    errors.add(field, error);

    render_form(form.to_template(errors), StatusCode::OK)
}

pub fn field_errors(errors: &ValidationErrors, field: &str) -> Vec<String> {
    errors
        .field_errors()
        .get(field)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|error| error.message.as_ref().map(|msg| msg.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

/// Only local absolute paths are followed after logging in.
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') => {
            next.to_string()
        }
        _ => String::from("/"),
    }
}

fn render_form(template: Box<dyn DynTemplate>, status: StatusCode) -> Response {
    match template.dyn_render() {
        Ok(body) => (status, Html(body)).into_response(),
        Err(err) => {
            tracing::error!("failed to render form: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
