use std::collections::BTreeSet;

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

/// Role for authorization.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

fn parse_roles(s: &str) -> BTreeSet<Role> {
    s.split(',').filter_map(Role::parse).collect()
}

fn format_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

/// A principal record as held by the directory.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: i64,
    /// Unique login identifier
    pub email: String,
    pub password_hash: String,
    pub roles: BTreeSet<Role>,
    pub active: bool,
}

impl Principal {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

#[derive(sqlx::FromRow)]
struct PrincipalRow {
    id: i64,
    email: String,
    password_hash: String,
    roles: String,
    active: i32,
}

impl From<PrincipalRow> for Principal {
    fn from(row: PrincipalRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            roles: parse_roles(&row.roles),
            active: row.active != 0,
        }
    }
}

/// Public user summary. Does not expose hashes, tokens or internal IDs.
#[derive(Debug, Clone, serde::Serialize)]
pub struct UserSummary {
    pub email: String,
    pub roles: BTreeSet<Role>,
    pub active: bool,
    pub created_at: String,
}

#[derive(sqlx::FromRow)]
struct UserSummaryRow {
    email: String,
    roles: String,
    active: i32,
    created_at: String,
}

impl From<UserSummaryRow> for UserSummary {
    fn from(row: UserSummaryRow) -> Self {
        Self {
            email: row.email,
            roles: parse_roles(&row.roles),
            active: row.active != 0,
            created_at: row.created_at,
        }
    }
}

const PRINCIPAL_COLUMNS: &str = "id, email, password_hash, roles, active";

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a principal. Returns the user ID.
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        roles: &[Role],
        active: bool,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, roles, active) VALUES (?, ?, ?, ?)",
        )
        .bind(email)
        .bind(password_hash)
        .bind(format_roles(roles))
        .bind(active as i32)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a principal by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<Principal>, sqlx::Error> {
        let row: Option<PrincipalRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE email = ?",
            PRINCIPAL_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Principal::from))
    }

    /// Get the principal currently holding the given refresh token.
    pub async fn get_by_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<Principal>, sqlx::Error> {
        let row: Option<PrincipalRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE refresh_token = ?",
            PRINCIPAL_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Principal::from))
    }

    /// Replace (or clear) the stored refresh token. Last writer wins.
    pub async fn set_refresh_token(
        &self,
        email: &str,
        token: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET refresh_token = ? WHERE email = ?")
            .bind(token)
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear the refresh token only if it still holds `token`.
    pub async fn clear_refresh_token_if(&self, id: i64, token: &str) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET refresh_token = NULL WHERE id = ? AND refresh_token = ?")
                .bind(id)
                .bind(token)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List (id, refresh_token) for every principal holding a refresh token.
    pub async fn list_refresh_tokens(&self) -> Result<Vec<(i64, String)>, sqlx::Error> {
        sqlx::query_as("SELECT id, refresh_token FROM users WHERE refresh_token IS NOT NULL")
            .fetch_all(&self.pool)
            .await
    }

    /// Enable or disable a principal.
    pub async fn set_active(&self, email: &str, active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET active = ? WHERE email = ?")
            .bind(active as i32)
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List all principals ordered by creation.
    pub async fn list(&self) -> Result<Vec<UserSummary>, sqlx::Error> {
        let rows: Vec<UserSummaryRow> = sqlx::query_as(
            "SELECT email, roles, active, created_at FROM users ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(UserSummary::from).collect())
    }
}
