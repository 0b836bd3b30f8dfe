// 💵 Transaction Entity - payments recorded by the treasurer
//
// A transaction is any money received: membership dues, tithes, donations,
// offerings, pledge payments. Payments without a member carry donor fields.

use crate::entities::wire;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// ============================================================================
// TRANSACTION TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    MembershipDue,
    Tithe,
    Donation,
    Offering,
    PledgePayment,
    Event,
    #[serde(other)]
    Other,
}

impl TransactionType {
    pub const ALL: [TransactionType; 7] = [
        TransactionType::MembershipDue,
        TransactionType::Tithe,
        TransactionType::Donation,
        TransactionType::Offering,
        TransactionType::PledgePayment,
        TransactionType::Event,
        TransactionType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::MembershipDue => "membership_due",
            TransactionType::Tithe => "tithe",
            TransactionType::Donation => "donation",
            TransactionType::Offering => "offering",
            TransactionType::PledgePayment => "pledge_payment",
            TransactionType::Event => "event",
            TransactionType::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransactionType::MembershipDue => "Membership Due",
            TransactionType::Tithe => "Tithe",
            TransactionType::Donation => "Donation",
            TransactionType::Offering => "Offering",
            TransactionType::PledgePayment => "Pledge Payment",
            TransactionType::Event => "Event",
            TransactionType::Other => "Other",
        }
    }

    pub fn parse(raw: &str) -> Option<TransactionType> {
        TransactionType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

// ============================================================================
// PAYMENT METHOD
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Check,
    CreditCard,
    DebitCard,
    Ach,
    Zelle,
    #[serde(other)]
    Other,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 7] = [
        PaymentMethod::Cash,
        PaymentMethod::Check,
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::Ach,
        PaymentMethod::Zelle,
        PaymentMethod::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Check => "check",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Ach => "ach",
            PaymentMethod::Zelle => "zelle",
            PaymentMethod::Other => "other",
        }
    }

    pub fn parse(raw: &str) -> Option<PaymentMethod> {
        PaymentMethod::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(raw.trim()))
    }

    /// Cash and check payments need a paper receipt number
    pub fn requires_receipt(&self) -> bool {
        matches!(self, PaymentMethod::Cash | PaymentMethod::Check)
    }
}

// ============================================================================
// TRANSACTION
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default, deserialize_with = "wire::id")]
    pub id: String,

    #[serde(default, alias = "member_id", deserialize_with = "wire::opt_id")]
    pub member_id: Option<String>,

    /// Display name resolved by the backend (member or donor)
    #[serde(default, alias = "member_name", alias = "memberName")]
    pub payer_name: Option<String>,

    #[serde(deserialize_with = "wire::amount")]
    pub amount: f64,

    #[serde(alias = "payment_date", deserialize_with = "wire::date")]
    pub payment_date: NaiveDate,

    #[serde(rename = "paymentType", alias = "payment_type", alias = "type")]
    pub payment_type: TransactionType,

    #[serde(alias = "payment_method")]
    pub payment_method: PaymentMethod,

    #[serde(default, alias = "receipt_number")]
    pub receipt_number: Option<String>,

    #[serde(default)]
    pub note: Option<String>,

    #[serde(default, alias = "income_category_id", deserialize_with = "wire::opt_id")]
    pub income_category_id: Option<String>,

    #[serde(default, alias = "donor_first_name")]
    pub donor_first_name: Option<String>,

    #[serde(default, alias = "donor_last_name")]
    pub donor_last_name: Option<String>,

    #[serde(default, alias = "donor_email")]
    pub donor_email: Option<String>,

    #[serde(default, alias = "donor_phone")]
    pub donor_phone: Option<String>,

    #[serde(default)]
    pub status: Option<String>,
}

impl Transaction {
    pub fn year(&self) -> i32 {
        self.payment_date.year()
    }

    /// Month number 1-12
    pub fn month(&self) -> u32 {
        self.payment_date.month()
    }

    pub fn is_dues(&self) -> bool {
        self.payment_type == TransactionType::MembershipDue
    }

    pub fn is_anonymous(&self) -> bool {
        self.member_id.is_none()
    }

    /// Name to show in lists: backend-resolved payer, donor name, or "Anonymous"
    pub fn display_name(&self) -> String {
        if let Some(name) = self.payer_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.trim().to_string();
        }
        let donor = format!(
            "{} {}",
            self.donor_first_name.as_deref().unwrap_or(""),
            self.donor_last_name.as_deref().unwrap_or("")
        );
        let donor = donor.trim();
        if donor.is_empty() {
            "Anonymous".to_string()
        } else {
            donor.to_string()
        }
    }
}

/// Body of `POST /api/payments/manual`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDraft {
    pub member_id: Option<String>,
    /// Raw amount text as typed; validated by `validation::parse_amount`
    pub amount: String,
    pub payment_date: NaiveDate,
    pub payment_type: TransactionType,
    pub payment_method: PaymentMethod,
    pub receipt_number: Option<String>,
    pub note: Option<String>,
    pub income_category_id: Option<String>,
    /// Explicitly anonymous donation; donor fields not required
    #[serde(default)]
    pub anonymous: bool,
    pub donor_first_name: Option<String>,
    pub donor_last_name: Option<String>,
    pub donor_email: Option<String>,
    pub donor_phone: Option<String>,
}

/// Server-side query parameters for `GET /api/transactions`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<TransactionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl TransactionQuery {
    /// Query-string pairs in the backend's naming
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(t) = self.payment_type {
            pairs.push(("paymentType", t.as_str().to_string()));
        }
        if let Some(m) = self.payment_method {
            pairs.push(("paymentMethod", m.as_str().to_string()));
        }
        if let Some(id) = &self.member_id {
            pairs.push(("memberId", id.clone()));
        }
        if let Some(d) = self.start_date {
            pairs.push(("startDate", d.format("%Y-%m-%d").to_string()));
        }
        if let Some(d) = self.end_date {
            pairs.push(("endDate", d.format("%Y-%m-%d").to_string()));
        }
        pairs
    }

    /// The same filter applied locally, for transactions loaded from CSV
    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(search) = self.search.as_deref() {
            if !crate::listing::matches_search(tx, search) {
                return false;
            }
        }
        self.payment_type.map_or(true, |t| tx.payment_type == t)
            && self.payment_method.map_or(true, |m| tx.payment_method == m)
            && self
                .member_id
                .as_deref()
                .map_or(true, |id| tx.member_id.as_deref() == Some(id))
            && self.start_date.map_or(true, |d| tx.payment_date >= d)
            && self.end_date.map_or(true, |d| tx.payment_date <= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_snake_case_transaction() {
        let json = r#"{
            "id": 101,
            "member_id": 7,
            "amount": "50.00",
            "payment_date": "2024-01-10T00:00:00.000Z",
            "payment_type": "membership_due",
            "payment_method": "check",
            "receipt_number": "R-100"
        }"#;

        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.id, "101");
        assert_eq!(tx.member_id.as_deref(), Some("7"));
        assert_eq!(tx.amount, 50.0);
        assert_eq!(tx.month(), 1);
        assert!(tx.is_dues());
        assert_eq!(tx.payment_method, PaymentMethod::Check);
    }

    #[test]
    fn test_unknown_type_decodes_as_other() {
        let json = r#"{
            "amount": 20,
            "paymentDate": "2024-03-01",
            "paymentType": "building_fund",
            "paymentMethod": "venmo"
        }"#;

        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.payment_type, TransactionType::Other);
        assert_eq!(tx.payment_method, PaymentMethod::Other);
        assert!(tx.is_anonymous());
        assert_eq!(tx.display_name(), "Anonymous");
    }

    #[test]
    fn test_display_name_prefers_donor_fields() {
        let json = r#"{
            "amount": 20,
            "paymentDate": "2024-03-01",
            "paymentType": "donation",
            "paymentMethod": "cash",
            "donorFirstName": "Marta",
            "donorLastName": "Alemu"
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.display_name(), "Marta Alemu");
    }

    #[test]
    fn test_requires_receipt() {
        assert!(PaymentMethod::Cash.requires_receipt());
        assert!(PaymentMethod::Check.requires_receipt());
        assert!(!PaymentMethod::CreditCard.requires_receipt());
        assert!(!PaymentMethod::Ach.requires_receipt());
    }

    #[test]
    fn test_query_pairs() {
        let q = TransactionQuery {
            search: Some("kebede".to_string()),
            payment_type: Some(TransactionType::Tithe),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };
        let pairs = q.to_pairs();
        assert_eq!(pairs[0], ("search", "kebede".to_string()));
        assert_eq!(pairs[1], ("paymentType", "tithe".to_string()));
        assert_eq!(pairs[2], ("startDate", "2024-01-01".to_string()));
    }

    #[test]
    fn test_query_matches_locally() {
        let json = r#"{
            "id": 5,
            "memberId": 7,
            "memberName": "Abebe Kebede",
            "amount": 50,
            "paymentDate": "2024-02-10",
            "paymentType": "tithe",
            "paymentMethod": "cash"
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();

        assert!(TransactionQuery::default().matches(&tx));
        let year = TransactionQuery {
            member_id: Some("7".to_string()),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31),
            ..Default::default()
        };
        assert!(year.matches(&tx));
        let wrong_type = TransactionQuery {
            payment_type: Some(TransactionType::Donation),
            ..Default::default()
        };
        assert!(!wrong_type.matches(&tx));
        let search = TransactionQuery {
            search: Some("kebede".to_string()),
            ..Default::default()
        };
        assert!(search.matches(&tx));
    }
}
