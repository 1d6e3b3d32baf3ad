use crate::ServerError;
use shared::Permission;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct WikiConfig {
    pub server_address: String,
    pub database_url: String,
    pub data_dir: PathBuf,
    pub public_dir: PathBuf,
    pub paginate_by: u64,
    pub git_branch: String,
    pub home_slug: String,
    pub anonymous_permissions: Vec<Permission>,
    pub logged_permissions: Vec<Permission>,
}

impl WikiConfig {
    pub fn from_env() -> Result<WikiConfig, ServerError> {
        let paginate_by = match dotenv::var("WIKI_PAGINATE_BY") {
            Ok(value) => value
                .parse::<u64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ServerError::Config(format!("invalid WIKI_PAGINATE_BY {value:?}")))?,
            Err(_) => shared::DEFAULT_PAGINATE_BY,
        };

        Ok(WikiConfig {
            server_address: var_or("SERVER_ADDRESS", "127.0.0.1:8000"),
            database_url: var_or("DATABASE_URL", "sqlite:wiki.db"),
            data_dir: PathBuf::from(var_or("WIKI_DATA_DIR", "./content")),
            public_dir: PathBuf::from(var_or("PUBLIC_DIR", "./public")),
            paginate_by,
            git_branch: var_or("WIKI_GIT_BRANCH", "master"),
            home_slug: var_or("WIKI_HOME_SLUG", "home"),
            anonymous_permissions: Permission::parse_list(&var_or(
                "WIKI_ANONYMOUS_USER_PERMISSIONS",
                "view_page",
            )),
            logged_permissions: Permission::parse_list(&var_or(
                "WIKI_LOGGED_USER_PERMISSIONS",
                "view_page,add_page,change_page",
            )),
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    dotenv::var(key).unwrap_or_else(|_| default.into())
}
