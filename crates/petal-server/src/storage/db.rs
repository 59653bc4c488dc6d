//! SQLite database layer (embedded, no external dependencies)

use async_trait::async_trait;
use petal_core::ports::{PageStore, SettingStore, ThemeStore};
use petal_core::{CmsError, Page, Result, Setting, Theme, CMS_NAME, DEFAULT_CMS_NAME};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

pub struct SqliteStore {
    pool: SqlitePool,
}

fn db_err(e: sqlx::Error) -> CmsError {
    CmsError::Database(e.to_string())
}

impl SqliteStore {
    pub async fn open(database_path: &str) -> Result<Self> {
        tracing::info!("Opening SQLite database at: {}", database_path);

        // Create parent directory if needed
        if let Some(parent) = std::path::Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // Use SqliteConnectOptions for better control
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_err)?;

        let store = Self { pool };
        store.init_schema().await?;

        tracing::info!("Database initialization complete");
        Ok(store)
    }

    /// Create the entity tables when absent. Safe to call repeatedly.
    pub async fn init_schema(&self) -> Result<()> {
        // Pages table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                path TEXT UNIQUE NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        // Themes table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS themes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL,
                active INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        // Settings table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    /// Seed the `cms_name` setting when missing, leaving an existing
    /// value untouched.
    pub async fn seed_defaults(&self) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO settings (name, value) VALUES (?1, ?2)
            "#,
        )
        .bind(CMS_NAME)
        .bind(DEFAULT_CMS_NAME)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    /// Seed the content of a fresh install: a home page, an about page,
    /// and a `default` theme. Each piece is created only when absent,
    /// and the `default` theme is activated only when no theme is.
    pub async fn seed_demo_content(&self) -> Result<()> {
        if self.get_page_by_path("/").await?.is_none() {
            self.create_page("/", "Home", "<h1>Welcome to the CMS!</h1>")
                .await?;
        }
        if self.get_page_by_path("/about").await?.is_none() {
            self.create_page("/about", "About Us", "<h1>About Us</h1><p>More info here...</p>")
                .await?;
        }

        if self.get_theme_by_name("default").await?.is_none() {
            self.create_theme("default").await?;
        }
        if self.get_active_theme().await?.is_none() {
            self.activate_theme("default").await?;
        }

        Ok(())
    }
}

#[async_trait]
impl PageStore for SqliteStore {
    async fn create_page(&self, path: &str, title: &str, content: &str) -> Result<Page> {
        let result = sqlx::query(
            r#"
            INSERT INTO pages (path, title, content) VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(path)
        .bind(title)
        .bind(content)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(Page {
                id: done.last_insert_rowid(),
                path: path.to_string(),
                title: title.to_string(),
                content: content.to_string(),
            }),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(CmsError::Conflict(
                "A page with this path already exists!".to_string(),
            )),
            Err(e) => Err(db_err(e)),
        }
    }

    async fn get_page_by_path(&self, path: &str) -> Result<Option<Page>> {
        let row: Option<(i64, String, String, String)> = sqlx::query_as(
            r#"
            SELECT id, path, title, content FROM pages WHERE path = ?1
            "#,
        )
        .bind(path)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|(id, path, title, content)| Page {
            id,
            path,
            title,
            content,
        }))
    }

    async fn list_pages(&self) -> Result<Vec<Page>> {
        let rows: Vec<(i64, String, String, String)> = sqlx::query_as(
            r#"
            SELECT id, path, title, content FROM pages ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|(id, path, title, content)| Page {
                id,
                path,
                title,
                content,
            })
            .collect())
    }

    async fn delete_page(&self, id: i64) -> Result<()> {
        let done = sqlx::query(
            r#"
            DELETE FROM pages WHERE id = ?1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if done.rows_affected() == 0 {
            return Err(CmsError::PageNotFound(id.to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl ThemeStore for SqliteStore {
    async fn create_theme(&self, name: &str) -> Result<Theme> {
        let result = sqlx::query(
            r#"
            INSERT INTO themes (name, active) VALUES (?1, 0)
            "#,
        )
        .bind(name)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(Theme {
                id: done.last_insert_rowid(),
                name: name.to_string(),
                active: false,
            }),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(CmsError::Conflict(
                format!("A theme named \"{name}\" already exists."),
            )),
            Err(e) => Err(db_err(e)),
        }
    }

    async fn get_theme_by_name(&self, name: &str) -> Result<Option<Theme>> {
        let row: Option<(i64, String, bool)> = sqlx::query_as(
            r#"
            SELECT id, name, active FROM themes WHERE name = ?1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|(id, name, active)| Theme { id, name, active }))
    }

    async fn get_active_theme(&self) -> Result<Option<Theme>> {
        let row: Option<(i64, String, bool)> = sqlx::query_as(
            r#"
            SELECT id, name, active FROM themes WHERE active = 1 LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|(id, name, active)| Theme { id, name, active }))
    }

    async fn list_themes(&self) -> Result<Vec<Theme>> {
        let rows: Vec<(i64, String, bool)> = sqlx::query_as(
            r#"
            SELECT id, name, active FROM themes ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|(id, name, active)| Theme { id, name, active })
            .collect())
    }

    async fn activate_theme(&self, name: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("UPDATE themes SET active = 0")
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        let done = sqlx::query("UPDATE themes SET active = 1 WHERE name = ?1")
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        if done.rows_affected() == 0 {
            // Dropping the transaction rolls back the deactivation, so
            // the previously active theme stays active.
            return Err(CmsError::ThemeNotFound(name.to_string()));
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn delete_theme(&self, name: &str) -> Result<()> {
        let done = sqlx::query(
            r#"
            DELETE FROM themes WHERE name = ?1
            "#,
        )
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if done.rows_affected() == 0 {
            return Err(CmsError::ThemeNotFound(name.to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl SettingStore for SqliteStore {
    async fn get_setting(&self, name: &str) -> Result<Option<Setting>> {
        let row: Option<(i64, String, String)> = sqlx::query_as(
            r#"
            SELECT id, name, value FROM settings WHERE name = ?1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|(id, name, value)| Setting { id, name, value }))
    }

    async fn update_setting(&self, name: &str, value: &str) -> Result<()> {
        let done = sqlx::query(
            r#"
            UPDATE settings SET value = ?1 WHERE name = ?2
            "#,
        )
        .bind(value)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if done.rows_affected() == 0 {
            return Err(CmsError::SettingNotFound(name.to_string()));
        }

        Ok(())
    }
}
