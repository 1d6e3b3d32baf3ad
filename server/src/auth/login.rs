use crate::{ServerError, USER_ID_KEY};
use askama::{DynTemplate, Template};
use askama_axum::Response;
use axum::{
    extract::Query,
    response::{IntoResponse, Redirect},
    Extension,
};
use bcrypt::verify;
use serde::Deserialize;
use shared::UserId;
use sqlx::SqlitePool;
use tower_sessions::Session;
use validator::{Validate, ValidationErrors};

use super::{field_errors, form_error, safe_next, ToTemplate, ValidatedForm};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "The username must not be empty"))]
    username: String,
    #[validate(length(min = 1, message = "The password must not be empty"))]
    password: String,
    #[serde(default)]
    next: Option<String>,
}

impl ToTemplate for LoginForm {
    fn to_template(self, errors: ValidationErrors) -> Box<dyn DynTemplate> {
        Box::new(LoginTemplate {
            username_error: field_errors(&errors, "username"),
            password_error: field_errors(&errors, "password"),
            username: self.username,
            next: safe_next(self.next.as_deref()),
        })
    }
}

#[derive(Template, Default)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    username: String,
    next: String,
    username_error: Vec<String>,
    password_error: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    next: Option<String>,
}

pub async fn get_login(Query(query): Query<NextQuery>) -> LoginTemplate {
    LoginTemplate {
        next: safe_next(query.next.as_deref()),
        ..LoginTemplate::default()
    }
}

pub async fn post_login(
    session: Session,
    Extension(pool): Extension<SqlitePool>,
    ValidatedForm(login): ValidatedForm<LoginForm>,
) -> Result<Response, ServerError> {
    let result: Option<(String, UserId)> = sqlx::query_as(
        r#"
            SELECT password, user_id
            FROM users
            WHERE username = $1
        "#,
    )
    .bind(&login.username)
    .fetch_optional(&pool)
    .await?;

    let Some((hash, user_id)) = result else {
        return Ok(form_error(
            login,
            "inexistent",
            "username",
            "This username does not exist",
        ));
    };

    let password = login.password.clone();
    let verified = tokio::task::spawn_blocking(move || verify(&password, &hash)).await??;

    if verified {
        session.cycle_id().await?;
        session.insert(USER_ID_KEY, user_id).await?;

        tracing::info!("{} logged in", login.username);

        Ok(Redirect::to(&safe_next(login.next.as_deref())).into_response())
    } else {
        Ok(form_error(
            login,
            "verify",
            "password",
            "The password is incorrect",
        ))
    }
}
