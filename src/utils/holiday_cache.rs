use crate::error::AppError;
use crate::model::holiday::Holiday;
use anyhow::Result;
use chrono::NaiveDate;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::Arc;
use std::time::Duration;

/// Year-keyed holiday listings. Only the read path goes through here; the
/// conflict checker always queries the database directly.
pub static HOLIDAY_CACHE: Lazy<Cache<i32, Arc<Vec<Holiday>>>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(16) // a handful of years in practice
        .time_to_live(Duration::from_secs(3600))
        .build()
});

async fn fetch_year(pool: &MySqlPool, year: i32) -> Result<Vec<Holiday>, sqlx::Error> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1).expect("valid year");
    let last = NaiveDate::from_ymd_opt(year, 12, 31).expect("valid year");

    sqlx::query_as::<_, Holiday>(
        "SELECT id, name, date, type, description, is_recurring, created_by, created_at \
         FROM holidays WHERE date BETWEEN ? AND ? ORDER BY date ASC",
    )
    .bind(first)
    .bind(last)
    .fetch_all(pool)
    .await
}

/// Cached year listing; loads through on miss.
pub async fn holidays_for_year(pool: &MySqlPool, year: i32) -> Result<Arc<Vec<Holiday>>, AppError> {
    if let Some(cached) = HOLIDAY_CACHE.get(&year).await {
        return Ok(cached);
    }

    let holidays = Arc::new(fetch_year(pool, year).await?);
    HOLIDAY_CACHE.insert(year, holidays.clone()).await;

    Ok(holidays)
}

/// Called after any holiday mutation touching `year`.
pub async fn invalidate_year(year: i32) {
    HOLIDAY_CACHE.invalidate(&year).await;
}

/// Preload the given year at boot so the first listing request is warm.
pub async fn warmup_holiday_cache(pool: &MySqlPool, year: i32) -> Result<()> {
    let holidays = fetch_year(pool, year).await?;
    let count = holidays.len();
    HOLIDAY_CACHE.insert(year, Arc::new(holidays)).await;

    log::info!(
        "Holiday cache warmup complete: {} holidays for {}",
        count,
        year
    );

    Ok(())
}
