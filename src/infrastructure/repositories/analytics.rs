use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::{AnalyticsEvent, EventType, PageViews};
use crate::infrastructure::traits::{AnalyticsRepository, DateRange, RepoResult};
use async_trait::async_trait;
use di::{Ref, injectable};

const IN_RANGE: &str = "(? IS NULL OR occurred_at >= ?) AND (? IS NULL OR occurred_at < ?)";

#[injectable(AnalyticsRepository)]
pub struct DbAnalyticsRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbAnalyticsRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        DbAnalyticsRepository { connection }
    }
}

#[async_trait]
impl AnalyticsRepository for DbAnalyticsRepository {
    async fn insert_events(&self, events: Vec<AnalyticsEvent>) -> RepoResult<u64> {
        let mut tx = self.connection.begin().await?;
        let mut inserted = 0;

        for event in events {
            inserted += sqlx::query(
                "INSERT INTO analytics_events (id, event_type, path, session_id, label, value, device_type, occurred_at, received_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(event.id)
            .bind(event.event_type)
            .bind(event.path)
            .bind(event.session_id)
            .bind(event.label)
            .bind(event.value)
            .bind(event.device_type)
            .bind(event.occurred_at)
            .bind(event.received_at)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn count_events(&self, event_type: EventType, range: DateRange) -> RepoResult<i64> {
        let until = range.until();
        sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM analytics_events WHERE event_type = ? AND {IN_RANGE}"
        ))
        .bind(event_type)
        .bind(range.from)
        .bind(range.from)
        .bind(until)
        .bind(until)
        .fetch_one(&**self.connection)
        .await
    }

    async fn average_value(&self, event_type: EventType, range: DateRange) -> RepoResult<Option<f64>> {
        let until = range.until();
        sqlx::query_scalar(&format!(
            "SELECT AVG(value) FROM analytics_events WHERE event_type = ? AND value IS NOT NULL AND {IN_RANGE}"
        ))
        .bind(event_type)
        .bind(range.from)
        .bind(range.from)
        .bind(until)
        .bind(until)
        .fetch_one(&**self.connection)
        .await
    }

    async fn top_pages(&self, range: DateRange, limit: i64) -> RepoResult<Vec<PageViews>> {
        let until = range.until();
        sqlx::query_as(&format!(
            "SELECT path, COUNT(*) AS views FROM analytics_events WHERE event_type = 'PAGE_VIEW' AND {IN_RANGE} GROUP BY path ORDER BY views DESC, path ASC LIMIT ?"
        ))
        .bind(range.from)
        .bind(range.from)
        .bind(until)
        .bind(until)
        .bind(limit)
        .fetch_all(&**self.connection)
        .await
    }
}
