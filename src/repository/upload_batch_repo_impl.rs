// ==========================================
// 履约有效率系统 - 上传批次 Repository 实现
// ==========================================
// 职责: 实现批次与订单记录数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{
    BatchSummary, CanonicalRecord, Country, CountryFilter, NewUploadBatch, UploadBatch,
    MAX_CHUNK_SIZE,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::upload_batch_repo::UploadBatchRepository;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// order_record 写入列（不含自增主键）
const RECORD_COLUMNS: &[&str] = &[
    "batch_id",
    "order_number",
    "shipping_number",
    "completed_date",
    "customer",
    "payment",
    "sku",
    "product_name",
    "total_revenues",
    "quantity",
    "product_cost",
    "order_status",
    "last_tracking",
    "last_tracking_date",
    "platform",
    "zip_code",
    "province_code",
    "pais",
];

const BATCH_SELECT: &str = r#"
    SELECT batch_id, name, period_start, period_end, record_count, created_at
    FROM upload_batch
"#;

// ==========================================
// 行映射辅助
// ==========================================

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn parse_date_column(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    row.get::<_, Option<String>>(idx)?
        .map(|s| {
            NaiveDate::parse_from_str(&s, DATE_FORMAT)
                .map_err(|e| conversion_error(idx, format!("日期格式错误 {}: {}", s, e)))
        })
        .transpose()
}

fn parse_datetime_column(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    row.get::<_, Option<String>>(idx)?
        .map(|s| {
            NaiveDateTime::parse_from_str(&s, DATETIME_FORMAT)
                .map_err(|e| conversion_error(idx, format!("时间格式错误 {}: {}", s, e)))
        })
        .transpose()
}

fn parse_country_column(row: &Row, idx: usize) -> rusqlite::Result<Country> {
    let raw: String = row.get(idx)?;
    raw.parse::<Country>().map_err(|e| conversion_error(idx, e))
}

fn map_batch(row: &Row) -> rusqlite::Result<UploadBatch> {
    let created_raw: String = row.get(5)?;
    let created_at = DateTime::parse_from_rfc3339(&created_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(5, format!("created_at 格式错误 {}: {}", created_raw, e)))?;

    Ok(UploadBatch {
        batch_id: row.get(0)?,
        name: row.get(1)?,
        period_start: parse_date_column(row, 2)?,
        period_end: parse_date_column(row, 3)?,
        record_count: row.get(4)?,
        created_at,
    })
}

fn map_record(row: &Row) -> rusqlite::Result<CanonicalRecord> {
    Ok(CanonicalRecord {
        order_number: row.get(0)?,
        shipping_number: row.get(1)?,
        completed_date: parse_datetime_column(row, 2)?,
        customer: row.get(3)?,
        payment: row.get(4)?,
        sku: row.get(5)?,
        product_name: row.get(6)?,
        total_revenues: row.get(7)?,
        quantity: row.get(8)?,
        product_cost: row.get(9)?,
        order_status: row.get(10)?,
        last_tracking: row.get(11)?,
        last_tracking_date: parse_date_column(row, 12)?,
        platform: row.get(13)?,
        zip_code: row.get(14)?,
        province_code: row.get(15)?,
        pais: parse_country_column(row, 16)?,
    })
}

/// 单条记录的绑定参数（顺序与 RECORD_COLUMNS 一致）
fn record_params(batch_id: &str, record: &CanonicalRecord) -> Vec<Box<dyn ToSql>> {
    vec![
        Box::new(batch_id.to_string()),
        Box::new(record.order_number.clone()),
        Box::new(record.shipping_number.clone()),
        Box::new(
            record
                .completed_date
                .map(|d| d.format(DATETIME_FORMAT).to_string()),
        ),
        Box::new(record.customer.clone()),
        Box::new(record.payment.clone()),
        Box::new(record.sku.clone()),
        Box::new(record.product_name.clone()),
        Box::new(record.total_revenues),
        Box::new(record.quantity),
        Box::new(record.product_cost),
        Box::new(record.order_status.clone()),
        Box::new(record.last_tracking.clone()),
        Box::new(
            record
                .last_tracking_date
                .map(|d| d.format(DATE_FORMAT).to_string()),
        ),
        Box::new(record.platform.clone()),
        Box::new(record.zip_code.clone()),
        Box::new(record.province_code.clone()),
        Box::new(record.pais.as_str()),
    ]
}

/// 构造多行 INSERT 语句: VALUES (?, ...), (?, ...), ...
fn multi_row_insert_sql(rows: usize) -> String {
    let placeholders = format!("({})", vec!["?"; RECORD_COLUMNS.len()].join(", "));
    format!(
        "INSERT INTO order_record ({}) VALUES {}",
        RECORD_COLUMNS.join(", "),
        vec![placeholders; rows].join(", ")
    )
}

// ==========================================
// UploadBatchRepositoryImpl
// ==========================================
pub struct UploadBatchRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl UploadBatchRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在事务中分块写入记录
    fn insert_records_chunked_tx(
        tx: &Transaction,
        batch_id: &str,
        records: &[CanonicalRecord],
        chunk_size: usize,
    ) -> RepositoryResult<usize> {
        // 超过绑定参数上限的分块会被 SQLite 拒绝
        let chunk_size = chunk_size.clamp(1, MAX_CHUNK_SIZE);
        let total_chunks = records.len().div_ceil(chunk_size);
        let mut written = 0;

        for (idx, chunk) in records.chunks(chunk_size).enumerate() {
            let sql = multi_row_insert_sql(chunk.len());
            let values: Vec<Box<dyn ToSql>> = chunk
                .iter()
                .flat_map(|record| record_params(batch_id, record))
                .collect();

            tx.execute(&sql, params_from_iter(values.iter()))?;
            written += chunk.len();

            info!(
                batch_id = %batch_id,
                chunk = idx + 1,
                total_chunks = total_chunks,
                written = written,
                "分块写入完成"
            );
        }

        Ok(written)
    }
}

#[async_trait]
impl UploadBatchRepository for UploadBatchRepositoryImpl {
    async fn insert_batch_with_records(
        &self,
        batch: NewUploadBatch,
        records: &[CanonicalRecord],
        chunk_size: usize,
    ) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        // 出错时 tx 被 drop，自动回滚
        let tx = conn.transaction()?;

        let batch_id = Uuid::new_v4().to_string();
        tx.execute(
            r#"
            INSERT INTO upload_batch (
                batch_id, name, period_start, period_end, record_count, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                batch_id,
                batch.name,
                batch.period.map(|p| p.start.format(DATE_FORMAT).to_string()),
                batch.period.map(|p| p.end.format(DATE_FORMAT).to_string()),
                batch.record_count as i64,
                Utc::now().to_rfc3339(),
            ],
        )?;

        let written = Self::insert_records_chunked_tx(&tx, &batch_id, records, chunk_size)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        info!(batch_id = %batch_id, records = written, "批次写入提交");
        Ok(batch_id)
    }

    async fn list_batches(&self) -> RepositoryResult<Vec<UploadBatch>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY created_at DESC, rowid DESC", BATCH_SELECT);
        let mut stmt = conn.prepare(&sql)?;
        let batches = stmt
            .query_map([], map_batch)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(batches)
    }

    async fn list_batch_summaries(
        &self,
        filter: CountryFilter,
    ) -> RepositoryResult<Vec<BatchSummary>> {
        let conn = self.get_conn()?;

        match filter.country() {
            None => {
                let sql = format!("{} ORDER BY created_at DESC, rowid DESC", BATCH_SELECT);
                let mut stmt = conn.prepare(&sql)?;
                let summaries = stmt
                    .query_map([], |row| {
                        let batch = map_batch(row)?;
                        let scoped_record_count = batch.record_count;
                        Ok(BatchSummary {
                            batch,
                            country: None,
                            scoped_record_count,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(summaries)
            }
            Some(country) => {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT b.batch_id, b.name, b.period_start, b.period_end,
                           b.record_count, b.created_at, COUNT(r.record_id) AS scoped
                    FROM upload_batch b
                    JOIN order_record r ON r.batch_id = b.batch_id AND r.pais = ?1
                    GROUP BY b.batch_id
                    ORDER BY b.created_at DESC, b.rowid DESC
                    "#,
                )?;
                let summaries = stmt
                    .query_map([country.as_str()], |row| {
                        Ok(BatchSummary {
                            batch: map_batch(row)?,
                            country: Some(country),
                            scoped_record_count: row.get(6)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(summaries)
            }
        }
    }

    async fn find_batch(&self, batch_id: &str) -> RepositoryResult<Option<UploadBatch>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE batch_id = ?1", BATCH_SELECT);
        let batch = conn
            .query_row(&sql, [batch_id], map_batch)
            .optional()?;
        Ok(batch)
    }

    async fn load_records(
        &self,
        batch_id: &str,
        filter: CountryFilter,
    ) -> RepositoryResult<Vec<CanonicalRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT order_number, shipping_number, completed_date, customer, payment,
                   sku, product_name, total_revenues, quantity, product_cost,
                   order_status, last_tracking, last_tracking_date, platform,
                   zip_code, province_code, pais
            FROM order_record
            WHERE batch_id = ?1 AND (?2 IS NULL OR pais = ?2)
            ORDER BY record_id ASC
            "#,
        )?;

        let country = filter.country().map(|c| c.as_str());
        let records = stmt
            .query_map(params![batch_id, country], map_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    async fn count_records(&self, batch_id: &str, filter: CountryFilter) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let country = filter.country().map(|c| c.as_str());
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM order_record WHERE batch_id = ?1 AND (?2 IS NULL OR pais = ?2)",
            params![batch_id, country],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    async fn delete_batch(&self, batch_id: &str) -> RepositoryResult<bool> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let affected = tx.execute("DELETE FROM upload_batch WHERE batch_id = ?1", [batch_id])?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        if affected > 0 {
            info!(batch_id = %batch_id, "批次已删除（记录级联删除）");
        } else {
            debug!(batch_id = %batch_id, "批次不存在，无需删除");
        }
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};
    use crate::domain::BatchPeriod;

    fn repo() -> UploadBatchRepositoryImpl {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        UploadBatchRepositoryImpl::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn record(order: &str, pais: Country) -> CanonicalRecord {
        let mut r = CanonicalRecord::with_order_number(order);
        r.product_name = "Widget".to_string();
        r.pais = pais;
        r
    }

    fn new_batch(name: &str, n: usize) -> NewUploadBatch {
        NewUploadBatch {
            name: name.to_string(),
            period: None,
            record_count: n,
        }
    }

    #[test]
    fn test_multi_row_insert_sql() {
        let sql = multi_row_insert_sql(2);
        assert_eq!(sql.matches('?').count(), RECORD_COLUMNS.len() * 2);
        assert!(sql.starts_with("INSERT INTO order_record (batch_id, order_number"));

        let widest = multi_row_insert_sql(MAX_CHUNK_SIZE);
        assert!(widest.matches('?').count() <= 32766);
    }

    #[tokio::test]
    async fn test_insert_and_load_preserves_fields() {
        let repo = repo();
        let mut r = record("#ITA1", Country::Italia);
        r.completed_date = NaiveDate::from_ymd_opt(2025, 4, 2)
            .and_then(|d| d.and_hms_opt(9, 15, 0));
        r.total_revenues = Some(19.9);
        r.quantity = Some(2);
        r.last_tracking_date = NaiveDate::from_ymd_opt(2025, 4, 5);

        let period = BatchPeriod {
            start: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
        };
        let batch_id = repo
            .insert_batch_with_records(
                NewUploadBatch {
                    name: "April".to_string(),
                    period: Some(period),
                    record_count: 1,
                },
                &[r.clone()],
                500,
            )
            .await
            .unwrap();

        let loaded = repo.load_records(&batch_id, CountryFilter::All).await.unwrap();
        assert_eq!(loaded, vec![r]);

        let batch = repo.find_batch(&batch_id).await.unwrap().unwrap();
        assert_eq!(batch.period(), Some(period));
        assert_eq!(batch.record_count, 1);
    }

    #[tokio::test]
    async fn test_country_scoped_queries() {
        let repo = repo();
        let records = vec![
            record("#ITA1", Country::Italia),
            record("LL2", Country::Espanha),
            record("LL3", Country::Espanha),
        ];
        let batch_id = repo
            .insert_batch_with_records(new_batch("mixed", 3), &records, 2)
            .await
            .unwrap();
        repo.insert_batch_with_records(new_batch("italy only", 1), &records[..1], 2)
            .await
            .unwrap();

        let es = CountryFilter::Only(Country::Espanha);
        assert_eq!(repo.count_records(&batch_id, es).await.unwrap(), 2);
        assert_eq!(repo.load_records(&batch_id, es).await.unwrap().len(), 2);

        let summaries = repo.list_batch_summaries(es).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].scoped_record_count, 2);
        assert_eq!(summaries[0].batch.record_count, 3);

        let all = repo.list_batch_summaries(CountryFilter::All).await.unwrap();
        assert_eq!(all.len(), 2);
        // 创建时间倒序
        assert_eq!(all[0].batch.name, "italy only");
    }

    #[tokio::test]
    async fn test_oversized_chunk_is_split_within_bind_limit() {
        let repo = repo();
        let records: Vec<CanonicalRecord> = (0..1900)
            .map(|i| record(&format!("#ITA{}", i), Country::Italia))
            .collect();

        let batch_id = repo
            .insert_batch_with_records(new_batch("large", records.len()), &records, 2000)
            .await
            .unwrap();
        assert_eq!(
            repo.count_records(&batch_id, CountryFilter::All).await.unwrap(),
            1900
        );
    }

    #[tokio::test]
    async fn test_unknown_batch_is_empty_not_error() {
        let repo = repo();
        assert!(repo.load_records("nope", CountryFilter::All).await.unwrap().is_empty());
        assert_eq!(repo.count_records("nope", CountryFilter::All).await.unwrap(), 0);
        assert!(repo.find_batch("nope").await.unwrap().is_none());
        assert!(!repo.delete_batch("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_chunk_rolls_back_everything() {
        let repo = repo();
        let mut records: Vec<CanonicalRecord> = (0..6)
            .map(|i| record(&format!("#ITA{}", i), Country::Italia))
            .collect();
        // 第 2 个分块中的记录违反 CHECK 约束
        records[3].order_number = String::new();

        let result = repo
            .insert_batch_with_records(new_batch("broken", 6), &records, 2)
            .await;
        assert!(matches!(
            result,
            Err(RepositoryError::CheckConstraintViolation(_))
        ));

        assert!(repo.list_batches().await.unwrap().is_empty());
        let conn = repo.get_conn().unwrap();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM order_record", [], |row| row.get(0))
            .unwrap();
        assert_eq!(n, 0);
    }
}
