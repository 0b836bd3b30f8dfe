// Treasurer endpoints: transactions, payments, expenses, vendors, employees

use super::{fail_open, segment, ApiClient, ApiError, ApiResult};
use crate::entities::{
    Employee, Expense, ExpenseDraft, GlCategory, PaymentDraft, Transaction, TransactionQuery, Vendor,
};
use crate::validation::{self, parse_amount};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

/// Wire body of a form: the draft with its typed amount replaced by the number
fn with_amount<T: Serialize>(draft: &T, amount: f64) -> ApiResult<Value> {
    let mut body = serde_json::to_value(draft).map_err(|e| ApiError::Decode(e.to_string()))?;
    if let Some(map) = body.as_object_mut() {
        map.insert("amount".to_string(), json!(amount));
    }
    Ok(body)
}

impl ApiClient {
    pub async fn list_transactions(&self, query: &TransactionQuery) -> ApiResult<Vec<Transaction>> {
        self.get("/api/transactions", &query.to_pairs(), Some("transactions"))
            .await
    }

    /// One member's transactions for a calendar year
    pub async fn member_transactions(&self, member_id: &str, year: i32) -> ApiResult<Vec<Transaction>> {
        let query = TransactionQuery {
            member_id: Some(member_id.to_string()),
            start_date: NaiveDate::from_ymd_opt(year, 1, 1),
            end_date: NaiveDate::from_ymd_opt(year, 12, 31),
            ..Default::default()
        };
        self.list_transactions(&query).await
    }

    /// Validate, then record a manual (cash/check/...) payment
    pub async fn record_payment(&self, draft: &PaymentDraft, today: NaiveDate) -> ApiResult<Transaction> {
        validation::validate_payment(draft, today)?;
        let amount = parse_amount(&draft.amount).map_err(|e| vec![e])?;

        let body = with_amount(draft, amount)?;
        let tx: Transaction = self
            .post("/api/payments/manual", &body, Some("transaction"))
            .await?;
        info!(transaction_id = %tx.id, amount, kind = tx.payment_type.as_str(), "payment recorded");
        Ok(tx)
    }

    pub async fn list_expenses(&self) -> ApiResult<Vec<Expense>> {
        self.get("/api/expenses", &[], Some("expenses")).await
    }

    pub async fn record_expense(&self, draft: &ExpenseDraft, today: NaiveDate) -> ApiResult<Expense> {
        validation::validate_expense(draft, today)?;
        let amount = parse_amount(&draft.amount).map_err(|e| vec![e])?;

        let body = with_amount(draft, amount)?;
        let expense: Expense = self.post("/api/expenses", &body, Some("expense")).await?;
        info!(expense_id = %expense.id, amount, gl_code = %expense.gl_code, "expense recorded");
        Ok(expense)
    }

    pub async fn expense_categories(&self) -> ApiResult<Vec<GlCategory>> {
        self.get("/api/expenses/categories", &[], Some("categories"))
            .await
    }

    pub async fn get_expense(&self, expense_id: &str) -> ApiResult<Expense> {
        self.get(&format!("/api/expenses/{}", segment(expense_id)), &[], Some("expense"))
            .await
    }

    pub async fn list_vendors(&self) -> ApiResult<Vec<Vendor>> {
        self.get("/api/vendors", &[], Some("vendors")).await
    }

    pub async fn list_employees(&self) -> ApiResult<Vec<Employee>> {
        self.get("/api/employees", &[], Some("employees")).await
    }

    /// Payee pickers: a failed lookup leaves the list empty, the form still works
    pub async fn vendors_or_empty(&self) -> Vec<Vendor> {
        fail_open("vendors", self.list_vendors().await)
    }

    pub async fn employees_or_empty(&self) -> Vec<Employee> {
        fail_open("employees", self.list_employees().await)
    }
}
