use async_trait::async_trait;
use sqlx::Row;

use crate::db::DatabasePool;
use crate::error::{AppError, AppResult};
use crate::models::{name_key, Color, ColorChanges, ColorQuery, NewColor};

/// Storage contract the catalog is written against.
///
/// Name lookups compare case-insensitively through the `name_key` column,
/// hex lookups compare exactly (callers pass normalized hex). `exclude_id`
/// skips the record being updated.
#[async_trait]
pub trait ColorRepository: Send + Sync {
    async fn insert(&self, color: &NewColor) -> AppResult<Color>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Color>>;

    async fn find_by_name(&self, name: &str, exclude_id: Option<i64>) -> AppResult<Option<Color>>;

    async fn find_by_hex(&self, hex: &str, exclude_id: Option<i64>) -> AppResult<Option<Color>>;

    async fn find_all(&self) -> AppResult<Vec<Color>>;

    /// One page ordered by id, plus the number of rows matching the filter.
    async fn find_page(&self, query: &ColorQuery) -> AppResult<(Vec<Color>, i64)>;

    async fn update(&self, id: i64, changes: &ColorChanges) -> AppResult<()>;

    /// Returns the number of deleted rows.
    async fn delete(&self, id: i64) -> AppResult<u64>;
}

pub struct SqlColorRepository {
    db: DatabasePool,
}

impl SqlColorRepository {
    pub fn new(db: DatabasePool) -> Self {
        Self { db }
    }

    fn row_to_color(&self, row: sqlx::sqlite::SqliteRow) -> Result<Color, sqlx::Error> {
        Ok(Color {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            hex: row.try_get("hex")?,
            rgb: row.try_get("rgb")?,
        })
    }

    fn row_to_color_postgres(&self, row: sqlx::postgres::PgRow) -> Result<Color, sqlx::Error> {
        Ok(Color {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            hex: row.try_get("hex")?,
            rgb: row.try_get("rgb")?,
        })
    }
}

/// `LIKE` pattern matched against `name_key` for a case-insensitive
/// substring search with the wildcard characters of `term` taken literally.
/// Pair with `ESCAPE '\'`.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in name_key(term).chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Maps a unique index violation to the matching conflict error.
fn write_error(err: sqlx::Error, name: Option<&str>, hex: Option<&str>) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            // Postgres reports the index name, SQLite only the message.
            let target = db_err
                .constraint()
                .map(str::to_owned)
                .unwrap_or_else(|| db_err.message().to_owned());
            if target.contains("hex") {
                return AppError::HexConflict(hex.unwrap_or_default().to_string());
            }
            return AppError::NameConflict(name.unwrap_or_default().to_string());
        }
    }
    AppError::DatabaseError(err)
}

#[async_trait]
impl ColorRepository for SqlColorRepository {
    async fn insert(&self, color: &NewColor) -> AppResult<Color> {
        let id: i64 = match &self.db {
            DatabasePool::Postgres(pool) => {
                let row = sqlx::query(
                    r#"
                    INSERT INTO colors (name, name_key, hex, rgb)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id
                    "#,
                )
                .bind(&color.name)
                .bind(name_key(&color.name))
                .bind(&color.hex)
                .bind(&color.rgb)
                .fetch_one(pool)
                .await
                .map_err(|e| write_error(e, Some(&color.name), Some(&color.hex)))?;

                row.try_get("id")?
            }
            DatabasePool::Sqlite(pool) => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO colors (name, name_key, hex, rgb)
                    VALUES (?1, ?2, ?3, ?4)
                    "#,
                )
                .bind(&color.name)
                .bind(name_key(&color.name))
                .bind(&color.hex)
                .bind(&color.rgb)
                .execute(pool)
                .await
                .map_err(|e| write_error(e, Some(&color.name), Some(&color.hex)))?;

                result.last_insert_rowid()
            }
        };

        Ok(Color {
            id,
            name: color.name.clone(),
            hex: color.hex.clone(),
            rgb: color.rgb.clone(),
        })
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Color>> {
        match &self.db {
            DatabasePool::Postgres(pool) => {
                let row = sqlx::query("SELECT id, name, hex, rgb FROM colors WHERE id = $1")
                    .bind(id)
                    .fetch_optional(pool)
                    .await?;

                Ok(row.map(|r| self.row_to_color_postgres(r)).transpose()?)
            }
            DatabasePool::Sqlite(pool) => {
                let row = sqlx::query("SELECT id, name, hex, rgb FROM colors WHERE id = ?1")
                    .bind(id)
                    .fetch_optional(pool)
                    .await?;

                Ok(row.map(|r| self.row_to_color(r)).transpose()?)
            }
        }
    }

    async fn find_by_name(&self, name: &str, exclude_id: Option<i64>) -> AppResult<Option<Color>> {
        match &self.db {
            DatabasePool::Postgres(pool) => {
                let row = sqlx::query(
                    r#"
                    SELECT id, name, hex, rgb
                    FROM colors
                    WHERE name_key = $1 AND ($2::BIGINT IS NULL OR id <> $2)
                    ORDER BY id ASC
                    LIMIT 1
                    "#,
                )
                .bind(name_key(name))
                .bind(exclude_id)
                .fetch_optional(pool)
                .await?;

                Ok(row.map(|r| self.row_to_color_postgres(r)).transpose()?)
            }
            DatabasePool::Sqlite(pool) => {
                let row = sqlx::query(
                    r#"
                    SELECT id, name, hex, rgb
                    FROM colors
                    WHERE name_key = ?1 AND (?2 IS NULL OR id <> ?2)
                    ORDER BY id ASC
                    LIMIT 1
                    "#,
                )
                .bind(name_key(name))
                .bind(exclude_id)
                .fetch_optional(pool)
                .await?;

                Ok(row.map(|r| self.row_to_color(r)).transpose()?)
            }
        }
    }

    async fn find_by_hex(&self, hex: &str, exclude_id: Option<i64>) -> AppResult<Option<Color>> {
        match &self.db {
            DatabasePool::Postgres(pool) => {
                let row = sqlx::query(
                    r#"
                    SELECT id, name, hex, rgb
                    FROM colors
                    WHERE hex = $1 AND ($2::BIGINT IS NULL OR id <> $2)
                    LIMIT 1
                    "#,
                )
                .bind(hex)
                .bind(exclude_id)
                .fetch_optional(pool)
                .await?;

                Ok(row.map(|r| self.row_to_color_postgres(r)).transpose()?)
            }
            DatabasePool::Sqlite(pool) => {
                let row = sqlx::query(
                    r#"
                    SELECT id, name, hex, rgb
                    FROM colors
                    WHERE hex = ?1 AND (?2 IS NULL OR id <> ?2)
                    LIMIT 1
                    "#,
                )
                .bind(hex)
                .bind(exclude_id)
                .fetch_optional(pool)
                .await?;

                Ok(row.map(|r| self.row_to_color(r)).transpose()?)
            }
        }
    }

    async fn find_all(&self) -> AppResult<Vec<Color>> {
        match &self.db {
            DatabasePool::Postgres(pool) => {
                let rows = sqlx::query("SELECT id, name, hex, rgb FROM colors ORDER BY id ASC")
                    .fetch_all(pool)
                    .await?;

                Ok(rows
                    .into_iter()
                    .map(|row| self.row_to_color_postgres(row))
                    .collect::<Result<Vec<_>, _>>()?)
            }
            DatabasePool::Sqlite(pool) => {
                let rows = sqlx::query("SELECT id, name, hex, rgb FROM colors ORDER BY id ASC")
                    .fetch_all(pool)
                    .await?;

                Ok(rows
                    .into_iter()
                    .map(|row| self.row_to_color(row))
                    .collect::<Result<Vec<_>, _>>()?)
            }
        }
    }

    async fn find_page(&self, query: &ColorQuery) -> AppResult<(Vec<Color>, i64)> {
        let pattern = query.search.as_deref().map(contains_pattern);

        match &self.db {
            DatabasePool::Postgres(pool) => {
                let rows = sqlx::query(
                    r#"
                    SELECT id, name, hex, rgb
                    FROM colors
                    WHERE ($1::TEXT IS NULL OR name_key LIKE $1 ESCAPE '\')
                    ORDER BY id ASC
                    LIMIT $2 OFFSET $3
                    "#,
                )
                .bind(&pattern)
                .bind(query.limit)
                .bind(query.offset)
                .fetch_all(pool)
                .await?;

                let colors = rows
                    .into_iter()
                    .map(|row| self.row_to_color_postgres(row))
                    .collect::<Result<Vec<_>, _>>()?;

                let count_row = sqlx::query(
                    r#"
                    SELECT COUNT(*) AS count
                    FROM colors
                    WHERE ($1::TEXT IS NULL OR name_key LIKE $1 ESCAPE '\')
                    "#,
                )
                .bind(&pattern)
                .fetch_one(pool)
                .await?;
                let total: i64 = count_row.try_get("count")?;

                Ok((colors, total))
            }
            DatabasePool::Sqlite(pool) => {
                let rows = sqlx::query(
                    r#"
                    SELECT id, name, hex, rgb
                    FROM colors
                    WHERE (?1 IS NULL OR name_key LIKE ?1 ESCAPE '\')
                    ORDER BY id ASC
                    LIMIT ?2 OFFSET ?3
                    "#,
                )
                .bind(&pattern)
                .bind(query.limit)
                .bind(query.offset)
                .fetch_all(pool)
                .await?;

                let colors = rows
                    .into_iter()
                    .map(|row| self.row_to_color(row))
                    .collect::<Result<Vec<_>, _>>()?;

                let count_row = sqlx::query(
                    r#"
                    SELECT COUNT(*) AS count
                    FROM colors
                    WHERE (?1 IS NULL OR name_key LIKE ?1 ESCAPE '\')
                    "#,
                )
                .bind(&pattern)
                .fetch_one(pool)
                .await?;
                let total: i64 = count_row.try_get("count")?;

                Ok((colors, total))
            }
        }
    }

    async fn update(&self, id: i64, changes: &ColorChanges) -> AppResult<()> {
        let new_key = changes.name.as_deref().map(name_key);

        let result = match &self.db {
            DatabasePool::Postgres(pool) => {
                sqlx::query(
                    r#"
                    UPDATE colors SET
                        name = COALESCE($2, name),
                        name_key = COALESCE($3, name_key),
                        hex = COALESCE($4, hex),
                        rgb = COALESCE($5, rgb)
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .bind(&changes.name)
                .bind(&new_key)
                .bind(&changes.hex)
                .bind(&changes.rgb)
                .execute(pool)
                .await
                .map_err(|e| write_error(e, changes.name.as_deref(), changes.hex.as_deref()))?
                .rows_affected()
            }
            DatabasePool::Sqlite(pool) => {
                sqlx::query(
                    r#"
                    UPDATE colors SET
                        name = COALESCE(?2, name),
                        name_key = COALESCE(?3, name_key),
                        hex = COALESCE(?4, hex),
                        rgb = COALESCE(?5, rgb)
                    WHERE id = ?1
                    "#,
                )
                .bind(id)
                .bind(&changes.name)
                .bind(&new_key)
                .bind(&changes.hex)
                .bind(&changes.rgb)
                .execute(pool)
                .await
                .map_err(|e| write_error(e, changes.name.as_deref(), changes.hex.as_deref()))?
                .rows_affected()
            }
        };

        if result == 0 {
            return Err(AppError::NotFound(format!("Color with id {} not found", id)));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> AppResult<u64> {
        let result = match &self.db {
            DatabasePool::Postgres(pool) => {
                sqlx::query("DELETE FROM colors WHERE id = $1")
                    .bind(id)
                    .execute(pool)
                    .await?
                    .rows_affected()
            }
            DatabasePool::Sqlite(pool) => {
                sqlx::query("DELETE FROM colors WHERE id = ?1")
                    .bind(id)
                    .execute(pool)
                    .await?
                    .rows_affected()
            }
        };

        Ok(result)
    }
}
