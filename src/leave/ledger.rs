use crate::error::AppError;
use crate::model::leave_request::LeaveType;
use sqlx::{MySqlConnection, MySqlPool};

/// Column backing each leave type. Balances live as three unsigned columns
/// on the user row, so one conditional UPDATE can check and debit together.
fn balance_column(leave_type: LeaveType) -> &'static str {
    match leave_type {
        LeaveType::Annual => "balance_annual",
        LeaveType::Sick => "balance_sick",
        LeaveType::Casual => "balance_casual",
    }
}

/// Informational read for submission-time sufficiency checks and error
/// messages. The authoritative check is [`debit_if_sufficient`].
pub async fn remaining(
    pool: &MySqlPool,
    employee_id: u64,
    leave_type: LeaveType,
) -> Result<u32, AppError> {
    let column = balance_column(leave_type);

    sqlx::query_scalar::<_, u32>(&format!("SELECT {column} FROM users WHERE id = ?"))
        .bind(employee_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))
}

/// Check-and-debit in a single statement. Returns false without touching the
/// row when the balance is short; the caller decides whether that aborts a
/// transaction. There is no corresponding credit operation.
pub async fn debit_if_sufficient(
    conn: &mut MySqlConnection,
    employee_id: u64,
    leave_type: LeaveType,
    days: u32,
) -> Result<bool, AppError> {
    let column = balance_column(leave_type);

    let result = sqlx::query(&format!(
        "UPDATE users SET {column} = {column} - ? WHERE id = ? AND {column} >= ?"
    ))
    .bind(days)
    .bind(employee_id)
    .bind(days)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_leave_type_has_its_own_column() {
        assert_eq!(balance_column(LeaveType::Annual), "balance_annual");
        assert_eq!(balance_column(LeaveType::Sick), "balance_sick");
        assert_eq!(balance_column(LeaveType::Casual), "balance_casual");
    }
}
