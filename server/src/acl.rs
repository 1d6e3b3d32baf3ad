use crate::{config::WikiConfig, model::User, ServerError, USER_ID_KEY};
use shared::Permission;
use sqlx::SqlitePool;
use strum::IntoEnumIterator;
use tower_sessions::Session;

/// Looks up the logged in user, dropping stale sessions whose user is gone.
pub async fn current_user(session: &Session, pool: &SqlitePool) -> Result<Option<User>, ServerError> {
    let Some(user_id) = session.get::<i64>(USER_ID_KEY).await? else {
        return Ok(None);
    };

    let user = User::by_id(pool, user_id).await?;
    if user.is_none() {
        session.remove::<i64>(USER_ID_KEY).await?;
    }

    Ok(user)
}

pub async fn permissions_of(
    user: Option<&User>,
    pool: &SqlitePool,
    config: &WikiConfig,
) -> Result<Vec<Permission>, ServerError> {
    match user {
        None => Ok(config.anonymous_permissions.clone()),
        Some(user) if user.admin => Ok(Permission::iter().collect()),
        Some(user) => {
            let mut permissions = config.logged_permissions.clone();
            for permission in user.granted_permissions(pool).await? {
                if !permissions.contains(&permission) {
                    permissions.push(permission);
                }
            }
            Ok(permissions)
        }
    }
}

/// Fails with a login redirect for anonymous visitors and with a 403 for
/// logged in users lacking `permission`. `path` is where to return after
/// logging in.
pub async fn require(
    session: &Session,
    pool: &SqlitePool,
    config: &WikiConfig,
    permission: Permission,
    path: &str,
) -> Result<Option<User>, ServerError> {
    let user = current_user(session, pool).await?;

    if permissions_of(user.as_ref(), pool, config)
        .await?
        .contains(&permission)
    {
        return Ok(user);
    }

    match user {
        None => {
            tracing::debug!("anonymous access to {} needs {}", path, permission);
            Err(ServerError::LoginRequired {
                next: path.to_string(),
            })
        }
        Some(user) => {
            tracing::warn!("{} lacks {} for {}", user.username, permission, path);
            Err(ServerError::PermissionDenied)
        }
    }
}
