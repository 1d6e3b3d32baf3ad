use crate::{ServerError, USER_ID_KEY};
use askama::{DynTemplate, Template};
use askama_axum::Response;
use axum::{
    response::{IntoResponse, Redirect},
    Extension,
};
use bcrypt::hash;
use serde::Deserialize;
use shared::UserId;
use sqlx::SqlitePool;
use tower_sessions::Session;
use validator::{Validate, ValidationError, ValidationErrors};

use super::{field_errors, form_error, ToTemplate, ValidatedForm};

#[cfg(not(debug_assertions))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(debug_assertions)]
const HASH_COST: u32 = 4;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(
        length(min = 1, max = 64, message = "The username must have 1 to 64 characters"),
        custom(function = "validate_username")
    )]
    username: String,
    #[validate(length(min = 8, message = "Password must contain at least 8 characters"))]
    password: String,
    #[validate(must_match(other = "password", message = "The passwords must match"))]
    password_repeat: String,
}

// Usernames end up as git commit authors.
fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        Ok(())
    } else {
        let mut error = ValidationError::new("charset");
        error.message = Some("Use only letters, digits, '.', '_' and '-'".into());
        Err(error)
    }
}

impl ToTemplate for RegisterForm {
    fn to_template(self, errors: ValidationErrors) -> Box<dyn DynTemplate> {
        Box::new(RegisterTemplate {
            username: self.username,
            username_error: field_errors(&errors, "username"),
            password_error: field_errors(&errors, "password"),
            password_repeat_error: field_errors(&errors, "password_repeat"),
        })
    }
}

#[derive(Template, Default)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    username: String,
    username_error: Vec<String>,
    password_error: Vec<String>,
    password_repeat_error: Vec<String>,
}

pub async fn get_register() -> RegisterTemplate {
    RegisterTemplate::default()
}

pub async fn post_register(
    session: Session,
    Extension(pool): Extension<SqlitePool>,
    ValidatedForm(register): ValidatedForm<RegisterForm>,
) -> Result<Response, ServerError> {
    let password = register.password.clone();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, HASH_COST)).await??;

    let result: Result<(UserId,), _> = sqlx::query_as(
        r#"
            INSERT INTO users (username, password)
            VALUES ($1, $2)
            RETURNING user_id
        "#,
    )
    .bind(&register.username)
    .bind(&hashed)
    .fetch_one(&pool)
    .await;

    match result {
        Ok((user_id,)) => {
            session.cycle_id().await?;
            session.insert(USER_ID_KEY, user_id).await?;

            tracing::info!("registered {}", register.username);

            Ok(Redirect::to("/").into_response())
        }
        Err(_err) => Ok(form_error(
            register,
            "unique",
            "username",
            "This username is already taken",
        )),
    }
}
