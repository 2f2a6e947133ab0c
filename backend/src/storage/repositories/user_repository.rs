use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use shared::User;

use crate::storage::connection::{is_unique_violation, DbConnection};
use crate::storage::traits::{CreateUserOutcome, NewUser, UserCredentials, UserStorage};

/// Repository for registered users
#[derive(Clone)]
pub struct UserRepository {
    db: DbConnection,
}

impl UserRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn user_from_row(row: &SqliteRow) -> Result<User> {
        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            date_of_birth: row.try_get("date_of_birth")?,
            phone: row.try_get("phone")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl UserStorage for UserRepository {
    async fn create_user(&self, user: &NewUser) -> Result<CreateUserOutcome> {
        let created_at = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, date_of_birth, phone, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.date_of_birth)
        .bind(&user.phone)
        .bind(&created_at)
        .execute(self.db.pool())
        .await;

        match result {
            Ok(done) => Ok(CreateUserOutcome::Created(User {
                id: done.last_insert_rowid(),
                name: user.name.clone(),
                email: user.email.clone(),
                date_of_birth: user.date_of_birth.clone(),
                phone: user.phone.clone(),
                created_at,
            })),
            Err(e) if is_unique_violation(&e) => {
                debug!("Duplicate user rejected by unique constraint: {}", e);
                Ok(CreateUserOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_credentials(&self, identifier: &str) -> Result<Option<UserCredentials>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, date_of_birth, phone, created_at
            FROM users
            WHERE name = ? OR email = ?
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(identifier)
        .bind(identifier)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(r) => Ok(Some(UserCredentials {
                user: Self::user_from_row(&r)?,
                password_hash: r.try_get("password_hash")?,
            })),
            None => Ok(None),
        }
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, date_of_birth, phone, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::user_from_row).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str, phone: Option<&str>) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: "sha256$salt$hash".to_string(),
            date_of_birth: None,
            phone: phone.map(str::to_string),
        }
    }

    async fn repo() -> UserRepository {
        UserRepository::new(DbConnection::init_test().await.unwrap())
    }

    #[tokio::test]
    async fn test_create_and_find_by_name_or_email() {
        let repo = repo().await;
        let outcome = repo.create_user(&new_user("ann", "ann@example.com", None)).await.unwrap();
        let CreateUserOutcome::Created(user) = outcome else {
            panic!("expected a new user");
        };

        let by_name = repo.find_credentials("ann").await.unwrap().unwrap();
        assert_eq!(by_name.user, user);
        assert_eq!(by_name.password_hash, "sha256$salt$hash");
        let by_email = repo.find_credentials("ann@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.user.id, user.id);
        assert!(repo.find_credentials("bob").await.unwrap().is_none());
        assert_eq!(repo.get_user(user.id).await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn test_duplicates_are_reported_as_outcome() {
        let repo = repo().await;
        repo.create_user(&new_user("ann", "ann@example.com", Some("01712345678"))).await.unwrap();

        for dup in [
            new_user("ann", "other@example.com", None),
            new_user("other", "ann@example.com", None),
            new_user("other", "other@example.com", Some("01712345678")),
        ] {
            assert_eq!(repo.create_user(&dup).await.unwrap(), CreateUserOutcome::Duplicate);
        }

        // Several users may leave the phone empty
        let outcome = repo.create_user(&new_user("bob", "bob@example.com", None)).await.unwrap();
        assert!(matches!(outcome, CreateUserOutcome::Created(_)));
        let outcome = repo.create_user(&new_user("cat", "cat@example.com", None)).await.unwrap();
        assert!(matches!(outcome, CreateUserOutcome::Created(_)));
    }
}
