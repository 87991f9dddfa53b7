use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database::{DatabaseError, DatabaseResult};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, FromQueryResult, Statement};

use crate::models::{NewUser, User, UserId};
use crate::repository::{UserLookup, UserStore};

const USER_COLUMNS: &str = "id, name, email, password_digest, created_at, updated_at";

/// PostgreSQL implementation of UserStore using SeaORM
#[derive(Clone)]
pub struct PostgresUserStore {
    db: DatabaseConnection,
}

impl PostgresUserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Helper struct for deserializing user rows from the database
#[derive(Debug, FromQueryResult)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password_digest: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_digest: row.password_digest,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl PostgresUserStore {
    async fn fetch_one(&self, stmt: Statement, what: impl FnOnce() -> String) -> DatabaseResult<User> {
        UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await?
            .map(User::from)
            .ok_or_else(|| DatabaseError::NotFound(what()))
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn create(&self, user: NewUser) -> DatabaseResult<User> {
        let sql = format!(
            "INSERT INTO users (name, email, password_digest) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        );
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                user.name.into(),
                user.email.into(),
                user.password_digest.into(),
            ],
        );

        self.fetch_one(stmt, || "inserted user row".to_string()).await
    }

    async fn find_one(&self, lookup: UserLookup) -> DatabaseResult<User> {
        let stmt = match &lookup {
            UserLookup::Id(id) => Statement::from_sql_and_values(
                DbBackend::Postgres,
                format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"),
                [(*id).into()],
            ),
            UserLookup::Email(email) => Statement::from_sql_and_values(
                DbBackend::Postgres,
                format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"),
                [email.clone().into()],
            ),
        };

        self.fetch_one(stmt, || format!("user {lookup}")).await
    }

    async fn save(&self, user: User) -> DatabaseResult<User> {
        let id = user.id;
        let sql = format!(
            r#"
            UPDATE users
            SET name = $2, email = $3, password_digest = $4, updated_at = GREATEST(now(), updated_at)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                id.into(),
                user.name.into(),
                user.email.into(),
                user.password_digest.into(),
            ],
        );

        self.fetch_one(stmt, || format!("user id={id}")).await
    }

    async fn delete_by_id(&self, id: UserId) -> DatabaseResult<()> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "DELETE FROM users WHERE id = $1",
            [id.into()],
        );

        let result = self.db.execute_raw(stmt).await?;
        tracing::debug!(user_id = id, rows = result.rows_affected(), "Deleted user");
        Ok(())
    }

    async fn find_all(&self) -> DatabaseResult<Vec<User>> {
        let stmt = Statement::from_string(
            DbBackend::Postgres,
            format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"),
        );

        let rows = UserRow::find_by_statement(stmt).all(&self.db).await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn ping(&self) -> DatabaseResult<()> {
        database::postgres::check_health(&self.db).await
    }
}
