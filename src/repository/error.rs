// ==========================================
// 履约有效率系统 - 仓储层错误类型
// ==========================================
// rusqlite 错误按 SQLite 扩展错误码归类，
// 约束类失败单独成型，便于上层区分“数据问题”与“存储故障”
// ==========================================

use rusqlite::ffi;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("数据库打开失败: {0}")]
    DatabaseOpenError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 约束 =====
    #[error("外键约束违反（批次不存在）: {0}")]
    ForeignKeyViolation(String),

    #[error("检查约束违反: {0}")]
    CheckConstraintViolation(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    // ===== 读回数据 =====
    #[error("存储值无法解析 (column={column}): {message}")]
    StoredValueCorrupt { column: usize, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    /// 是否为约束类失败（输入数据问题，而非存储故障）
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            RepositoryError::ForeignKeyViolation(_)
                | RepositoryError::CheckConstraintViolation(_)
                | RepositoryError::UniqueConstraintViolation(_)
        )
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg) => {
                let msg = msg.unwrap_or_else(|| code.to_string());
                match code.extended_code {
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => RepositoryError::ForeignKeyViolation(msg),
                    ffi::SQLITE_CONSTRAINT_CHECK | ffi::SQLITE_CONSTRAINT_NOTNULL => {
                        RepositoryError::CheckConstraintViolation(msg)
                    }
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        RepositoryError::UniqueConstraintViolation(msg)
                    }
                    ffi::SQLITE_CANTOPEN => RepositoryError::DatabaseOpenError(msg),
                    _ => RepositoryError::DatabaseQueryError(msg),
                }
            }
            rusqlite::Error::FromSqlConversionFailure(column, _, source) => {
                RepositoryError::StoredValueCorrupt {
                    column,
                    message: source.to_string(),
                }
            }
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE parent (id TEXT PRIMARY KEY);
             CREATE TABLE child (
                 parent_id TEXT NOT NULL REFERENCES parent(id),
                 code TEXT NOT NULL CHECK(length(code) > 0)
             );",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_constraint_failures_are_classified() {
        let conn = conn();
        conn.execute("INSERT INTO parent (id) VALUES ('b1')", []).unwrap();

        let fk: RepositoryError = conn
            .execute("INSERT INTO child VALUES ('missing', 'x')", [])
            .unwrap_err()
            .into();
        assert!(matches!(fk, RepositoryError::ForeignKeyViolation(_)));

        let check: RepositoryError = conn
            .execute("INSERT INTO child VALUES ('b1', '')", [])
            .unwrap_err()
            .into();
        assert!(matches!(check, RepositoryError::CheckConstraintViolation(_)));

        let unique: RepositoryError = conn
            .execute("INSERT INTO parent (id) VALUES ('b1')", [])
            .unwrap_err()
            .into();
        assert!(matches!(unique, RepositoryError::UniqueConstraintViolation(_)));
        assert!(unique.is_constraint_violation());
    }

    #[test]
    fn test_syntax_error_is_query_error() {
        let err: RepositoryError = conn()
            .execute("INSERT INTO nowhere VALUES (1)", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, RepositoryError::DatabaseQueryError(_)));
        assert!(!err.is_constraint_violation());
    }
}
