// 📄 CSV import / export
//
// Treasurers export the member registry and transaction lists for
// spreadsheets, and the dues/transaction commands can work offline from an
// exported transaction file.

use crate::entities::{Member, PaymentMethod, Transaction, TransactionType};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

// ============================================================================
// RECORDS (flat CSV rows)
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Member_Id")]
    pub member_id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Amount")]
    pub amount: f64,
    #[serde(rename = "Type")]
    pub payment_type: String,
    #[serde(rename = "Method")]
    pub payment_method: String,
    #[serde(rename = "Receipt_Number")]
    pub receipt_number: String,
    #[serde(rename = "Note")]
    pub note: String,
}

impl From<&Transaction> for TransactionRecord {
    fn from(tx: &Transaction) -> Self {
        TransactionRecord {
            id: tx.id.clone(),
            date: tx.payment_date.format("%Y-%m-%d").to_string(),
            member_id: tx.member_id.clone().unwrap_or_default(),
            name: tx.display_name(),
            amount: tx.amount,
            payment_type: tx.payment_type.as_str().to_string(),
            payment_method: tx.payment_method.as_str().to_string(),
            receipt_number: tx.receipt_number.clone().unwrap_or_default(),
            note: tx.note.clone().unwrap_or_default(),
        }
    }
}

impl TransactionRecord {
    fn into_transaction(self, line: usize) -> Result<Transaction> {
        let payment_date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .with_context(|| format!("line {line}: invalid date {:?}", self.date))?;
        let payment_type = TransactionType::parse(&self.payment_type)
            .ok_or_else(|| anyhow!("line {line}: unknown type {:?}", self.payment_type))?;
        let payment_method = PaymentMethod::parse(&self.payment_method).unwrap_or(PaymentMethod::Other);

        let non_empty = |s: String| if s.trim().is_empty() { None } else { Some(s) };
        Ok(Transaction {
            id: self.id,
            member_id: non_empty(self.member_id),
            payer_name: non_empty(self.name),
            amount: self.amount,
            payment_date,
            payment_type,
            payment_method,
            receipt_number: non_empty(self.receipt_number),
            note: non_empty(self.note),
            income_category_id: None,
            donor_first_name: None,
            donor_last_name: None,
            donor_email: None,
            donor_phone: None,
            status: None,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct MemberRecord {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "First_Name")]
    pub first_name: String,
    #[serde(rename = "Last_Name")]
    pub last_name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Family_Id")]
    pub family_id: String,
    #[serde(rename = "Roles")]
    pub roles: String,
    #[serde(rename = "Pledge")]
    pub pledge: f64,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Dependents")]
    pub dependents: usize,
}

impl From<&Member> for MemberRecord {
    fn from(m: &Member) -> Self {
        MemberRecord {
            id: m.id.clone(),
            first_name: m.first_name.clone(),
            last_name: m.last_name.clone(),
            email: m.email.clone().unwrap_or_default(),
            phone: m
                .phone
                .as_deref()
                .map(|p| crate::phone::format_display(p).unwrap_or_else(|| p.to_string()))
                .unwrap_or_default(),
            family_id: m.family_id.clone().unwrap_or_default(),
            roles: m
                .roles
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(";"),
            pledge: m.pledge_amount,
            status: m.status.as_str().to_string(),
            dependents: m.dependents.len(),
        }
    }
}

// ============================================================================
// WRITE
// ============================================================================

pub fn write_transactions<W: Write>(writer: W, transactions: &[Transaction]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    for tx in transactions {
        wtr.serialize(TransactionRecord::from(tx))
            .context("Failed to write transaction row")?;
    }
    wtr.flush().context("Failed to flush CSV")?;
    Ok(transactions.len())
}

pub fn write_members<W: Write>(writer: W, members: &[Member]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    for m in members {
        wtr.serialize(MemberRecord::from(m))
            .context("Failed to write member row")?;
    }
    wtr.flush().context("Failed to flush CSV")?;
    Ok(members.len())
}

pub fn export_transactions(path: &Path, transactions: &[Transaction]) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let count = write_transactions(file, transactions)?;
    info!(path = %path.display(), count, "transactions exported");
    Ok(count)
}

pub fn export_members(path: &Path, members: &[Member]) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let count = write_members(file, members)?;
    info!(path = %path.display(), count, "members exported");
    Ok(count)
}

// ============================================================================
// READ
// ============================================================================

pub fn read_transactions<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut transactions = Vec::new();

    for (i, result) in rdr.deserialize::<TransactionRecord>().enumerate() {
        // Header is line 1
        let line = i + 2;
        let record = result.with_context(|| format!("Failed to read transaction on line {line}"))?;
        transactions.push(record.into_transaction(line)?);
    }

    Ok(transactions)
}

pub fn load_transactions(path: &Path) -> Result<Vec<Transaction>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let transactions = read_transactions(file)?;
    info!(path = %path.display(), count = transactions.len(), "transactions loaded from CSV");
    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Role;
    use crate::entities::MemberStatus;
    use std::collections::BTreeSet;

    const SAMPLE: &str = "\
Id,Date,Member_Id,Name,Amount,Type,Method,Receipt_Number,Note
1,2024-01-05,7,Abebe Kebede,100.00,membership_due,check,R-1,
2,2024-01-07,,,25.50,donation,cash,R-2,building fund
";

    #[test]
    fn test_read_transactions() {
        let txs = read_transactions(SAMPLE.as_bytes()).unwrap();
        assert_eq!(txs.len(), 2);
        assert!(txs[0].is_dues());
        assert_eq!(txs[0].member_id.as_deref(), Some("7"));
        assert_eq!(txs[1].member_id, None);
        assert_eq!(txs[1].note.as_deref(), Some("building fund"));
        assert_eq!(txs[1].display_name(), "Anonymous");
    }

    #[test]
    fn test_bad_row_reports_line() {
        let bad = "Id,Date,Member_Id,Name,Amount,Type,Method,Receipt_Number,Note\n1,2024-13-01,,,5,tithe,cash,,\n";
        let err = read_transactions(bad.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_write_transactions_header_and_rows() {
        let txs = read_transactions(SAMPLE.as_bytes()).unwrap();
        let mut out = Vec::new();
        assert_eq!(write_transactions(&mut out, &txs).unwrap(), 2);
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Id,Date,Member_Id,Name,Amount,Type,Method,Receipt_Number,Note")
        );
        assert_eq!(lines.next(), Some("1,2024-01-05,7,Abebe Kebede,100.0,membership_due,check,R-1,"));
    }

    #[test]
    fn test_write_members() {
        let member = Member {
            id: "3".to_string(),
            first_name: "Liya".to_string(),
            last_name: "Haile".to_string(),
            email: None,
            phone: Some("5551234567".to_string()),
            family_id: Some("F1".to_string()),
            roles: [Role::Member, Role::Secretary].into_iter().collect::<BTreeSet<_>>(),
            pledge_amount: 600.0,
            membership_start_date: None,
            status: MemberStatus::Active,
            dependents: vec![],
        };
        let mut out = Vec::new();
        write_members(&mut out, &[member]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("3,Liya,Haile,,(555) 123-4567,F1,member;secretary,600.0,active,0"));
    }
}
