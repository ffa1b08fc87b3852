// sqlx::Error -> AppError mapping
// (orphan rules prevent `impl From<sqlx::Error> for AppError` here)

use crm_jobs_core::error::AppError;

pub fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            // SQLite result codes: https://www.sqlite.org/rescode.html
            Some(code) => match code.as_ref() {
                "2067" | "1555" => AppError::Repository(format!(
                    "Unique constraint violation: {} ({})",
                    db_err.message(),
                    code
                )),
                "787" | "3850" => AppError::Repository(format!(
                    "Foreign key constraint violation: {} ({})",
                    db_err.message(),
                    code
                )),
                "5" => AppError::Repository(format!(
                    "Database locked (SQLITE_BUSY): {}",
                    db_err.message()
                )),
                other => AppError::Repository(format!(
                    "Database error [{}]: {}",
                    other,
                    db_err.message()
                )),
            },
            None => AppError::Repository(format!("Database error: {}", db_err.message())),
        },
        sqlx::Error::RowNotFound => AppError::Repository("Row not found".to_string()),
        sqlx::Error::PoolTimedOut => {
            AppError::Repository("Timed out waiting for a database connection".to_string())
        }
        _ => AppError::Repository(err.to_string()),
    }
}
