use diesel::{
    r2d2::{ConnectionManager, Pool, PooledConnection},
    PgConnection,
};

use crate::core::config::DatabaseConfig;
use crate::security::error_sanitizer::ApiError;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<PgConnection>>;

pub fn create_conn(config: &DatabaseConfig) -> Result<DbPool, diesel::r2d2::PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(&config.url);
    Pool::builder().max_size(config.pool_size).build(manager)
}

/// Pool that opens connections on first use; lets the router run without a
/// reachable database.
pub fn create_lazy_conn(config: &DatabaseConfig) -> DbPool {
    let manager = ConnectionManager::<PgConnection>::new(&config.url);
    Pool::builder()
        .max_size(config.pool_size)
        .min_idle(Some(0))
        .build_unchecked(manager)
}

pub fn get_conn(pool: &DbPool) -> Result<DbConn, ApiError> {
    pool.get().map_err(|e| ApiError::Database(e.to_string()))
}

/// Runs `work` on the blocking pool with a checked-out connection.
pub async fn with_conn<T, F>(pool: &DbPool, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> Result<T, ApiError> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = get_conn(&pool)?;
        work(&mut conn)
    })
    .await
    .map_err(|e: tokio::task::JoinError| ApiError::Internal(e.to_string()))?
}

/// Run database migrations
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS).map_err(
        |e| -> Box<dyn std::error::Error + Send + Sync> {
            Box::new(std::io::Error::other(format!("Migration error: {}", e)))
        },
    )?;
    for version in applied {
        log::info!("Applied migration {}", version);
    }
    Ok(())
}

/// `earned / total * 100`, rounded to two decimals. Zero when `total` is zero.
pub fn percentage(earned: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    round2(earned as f64 / total as f64 * 100.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One decimal place, trailing `.0` dropped: `85.5%`, `100%`.
pub fn format_percentage(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}%", rounded as i64)
    } else {
        format!("{:.1}%", rounded)
    }
}

pub fn format_ratio(part: i64, whole: i64) -> String {
    format!("{}/{}", part, whole)
}

pub fn format_minutes(total_seconds: i64) -> String {
    let minutes = total_seconds.max(0) / 60;
    if minutes < 60 {
        format!("{} phút", minutes)
    } else {
        format!("{} giờ {} phút", minutes / 60, minutes % 60)
    }
}

/// `%term%` for `ILIKE`, with the wildcard characters in `term` matched literally.
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.trim().chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(17, 20), 85.0);
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(5, 0), 0.0);
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(85.5), "85.5%");
        assert_eq!(format_percentage(100.0), "100%");
        assert_eq!(format_percentage(33.33), "33.3%");
        assert_eq!(format_percentage(0.0), "0%");
        assert_eq!(format_percentage(66.67), "66.7%");
    }

    #[test]
    fn test_format_ratio_and_minutes() {
        assert_eq!(format_ratio(17, 20), "17/20");
        assert_eq!(format_minutes(59), "0 phút");
        assert_eq!(format_minutes(1500), "25 phút");
        assert_eq!(format_minutes(3900), "1 giờ 5 phút");
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("  Part 5 "), "%Part 5%");
        assert_eq!(contains_pattern("%"), "%\\%%");
        assert_eq!(contains_pattern("100%_done"), "%100\\%\\_done%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
