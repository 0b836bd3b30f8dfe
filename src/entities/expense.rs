// 🧾 Expense Entity - money going out, classified by GL code
//
// An expense is paid to exactly one payee: an employee, a vendor, or a
// free-text name for one-off payees.

use crate::entities::transaction::PaymentMethod;
use crate::entities::wire;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// GL CATEGORY
// ============================================================================

/// General-ledger category used to classify income and expenses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlCategory {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,

    #[serde(alias = "gl_code")]
    pub gl_code: String,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default = "default_active", alias = "is_active", alias = "isActive")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl GlCategory {
    pub fn label(&self) -> String {
        format!("{} - {}", self.gl_code, self.name)
    }
}

// ============================================================================
// PAYEE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payee {
    Employee(String),
    Vendor(String),
    Named(String),
}

impl Payee {
    pub fn kind(&self) -> &'static str {
        match self {
            Payee::Employee(_) => "employee",
            Payee::Vendor(_) => "vendor",
            Payee::Named(_) => "other",
        }
    }
}

// ============================================================================
// EXPENSE
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(default, deserialize_with = "wire::id")]
    pub id: String,

    #[serde(deserialize_with = "wire::amount")]
    pub amount: f64,

    #[serde(alias = "expense_date", deserialize_with = "wire::date")]
    pub expense_date: NaiveDate,

    #[serde(alias = "gl_code")]
    pub gl_code: String,

    #[serde(default, alias = "category_name")]
    pub category_name: Option<String>,

    #[serde(default, alias = "employee_id", deserialize_with = "wire::opt_id")]
    pub employee_id: Option<String>,

    #[serde(default, alias = "vendor_id", deserialize_with = "wire::opt_id")]
    pub vendor_id: Option<String>,

    #[serde(default, alias = "payee_name")]
    pub payee_name: Option<String>,

    #[serde(alias = "payment_method")]
    pub payment_method: PaymentMethod,

    #[serde(default, alias = "receipt_number")]
    pub receipt_number: Option<String>,

    #[serde(default, alias = "check_number")]
    pub check_number: Option<String>,

    #[serde(default)]
    pub memo: Option<String>,
}

impl Expense {
    pub fn payee(&self) -> Option<Payee> {
        if let Some(id) = &self.employee_id {
            return Some(Payee::Employee(id.clone()));
        }
        if let Some(id) = &self.vendor_id {
            return Some(Payee::Vendor(id.clone()));
        }
        self.payee_name
            .as_ref()
            .filter(|n| !n.trim().is_empty())
            .map(|n| Payee::Named(n.clone()))
    }
}

/// Body of `POST /api/expenses`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDraft {
    pub amount: String,
    pub expense_date: Option<NaiveDate>,
    pub gl_code: Option<String>,
    pub employee_id: Option<String>,
    pub vendor_id: Option<String>,
    pub payee_name: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub receipt_number: Option<String>,
    pub check_number: Option<String>,
    pub memo: Option<String>,
}

impl ExpenseDraft {
    /// Payee fields that carry a value
    pub fn payee_fields_set(&self) -> Vec<&'static str> {
        let mut set = Vec::new();
        if self.employee_id.as_deref().is_some_and(|v| !v.trim().is_empty()) {
            set.push("employeeId");
        }
        if self.vendor_id.as_deref().is_some_and(|v| !v.trim().is_empty()) {
            set.push("vendorId");
        }
        if self.payee_name.as_deref().is_some_and(|v| !v.trim().is_empty()) {
            set.push("payeeName");
        }
        set
    }
}

// ============================================================================
// VENDOR / EMPLOYEE
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,

    pub name: String,

    #[serde(default, alias = "vendor_type", alias = "type")]
    pub vendor_type: Option<String>,

    #[serde(default, alias = "contact_person")]
    pub contact_person: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default = "default_active", alias = "is_active", alias = "isActive")]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,

    #[serde(alias = "first_name")]
    pub first_name: String,

    #[serde(alias = "last_name")]
    pub last_name: String,

    #[serde(default)]
    pub position: Option<String>,

    #[serde(default, alias = "employment_type")]
    pub employment_type: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default = "default_active", alias = "is_active", alias = "isActive")]
    pub active: bool,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}
