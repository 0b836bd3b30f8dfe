// 🖼️ Views - what each admin screen shows
//
// Fetched DTOs + a ListQuery in, display rows out. Shared by the CLI tables,
// the TUI and the JSON view server so all three agree.

use crate::access::Role;
use crate::dues::{self, DuesSummary};
use crate::entities::{Employee, Household, Member, Transaction, TransactionType, Vendor, Voicemail};
use crate::listing::{self, ListQuery, Listable, Paged, SortDirection};
use chrono::NaiveDate;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;

// ============================================================================
// MEMBER LISTS
// ============================================================================

/// Member registry. Deleted members stay hidden unless asked for by status.
pub fn member_rows(members: &[Member], query: &ListQuery) -> Paged<Member> {
    let wants_deleted = query
        .filters
        .get("status")
        .is_some_and(|s| s.eq_ignore_ascii_case("deleted"));
    let visible: Vec<Member> = members
        .iter()
        .filter(|m| wants_deleted || !m.is_deleted())
        .cloned()
        .collect();
    listing::apply(&visible, query)
}

/// Row of the role-management screen
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRow {
    pub member_id: String,
    pub name: String,
    pub email: Option<String>,
    pub roles: Vec<Role>,
}

impl Listable for RoleRow {
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "email"];

    fn field(&self, key: &str) -> Option<Cow<'_, str>> {
        match key {
            "memberId" => Some(Cow::Borrowed(&self.member_id)),
            "name" => Some(Cow::Borrowed(&self.name)),
            "email" => self.email.as_deref().map(Cow::Borrowed),
            "roles" => Some(Cow::Owned(
                self.roles.iter().map(|r| r.label()).collect::<Vec<_>>().join(", "),
            )),
            _ => None,
        }
    }

    fn matches_filter(&self, key: &str, value: &str) -> bool {
        match key {
            "role" => Role::parse(value).is_some_and(|role| self.roles.contains(&role)),
            _ => self
                .field(key)
                .map(|v| v.eq_ignore_ascii_case(value))
                .unwrap_or(false),
        }
    }
}

pub fn role_rows(members: &[Member], query: &ListQuery) -> Paged<RoleRow> {
    let rows: Vec<RoleRow> = members
        .iter()
        .filter(|m| !m.is_deleted())
        .map(|m| RoleRow {
            member_id: m.id.clone(),
            name: m.full_name(),
            email: m.email.clone(),
            roles: m.roles.iter().copied().collect(),
        })
        .collect();
    listing::apply(&rows, query)
}

// ============================================================================
// TREASURY LISTS
// ============================================================================

/// Transactions, newest first unless the query sorts otherwise
pub fn transaction_rows(transactions: &[Transaction], query: &ListQuery) -> Paged<Transaction> {
    listing::apply(transactions, &default_sort(query, "paymentDate", SortDirection::Desc))
}

pub fn vendor_rows(vendors: &[Vendor], query: &ListQuery) -> Paged<Vendor> {
    listing::apply(vendors, &default_sort(query, "name", SortDirection::Asc))
}

pub fn employee_rows(employees: &[Employee], query: &ListQuery) -> Paged<Employee> {
    listing::apply(employees, &default_sort(query, "lastName", SortDirection::Asc))
}

pub fn voicemail_rows(voicemails: &[Voicemail], query: &ListQuery) -> Paged<Voicemail> {
    listing::apply(voicemails, &default_sort(query, "createdAt", SortDirection::Desc))
}

fn default_sort(query: &ListQuery, key: &str, direction: SortDirection) -> ListQuery {
    if query.sort.is_some() {
        return query.clone();
    }
    query.clone().with_sort(key, direction)
}

/// Header totals for a transaction list
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionTotals {
    pub count: usize,
    pub total: f64,
    pub by_type: BTreeMap<&'static str, f64>,
}

pub fn transaction_totals(transactions: &[Transaction]) -> TransactionTotals {
    let mut totals = TransactionTotals::default();
    for tx in transactions {
        totals.count += 1;
        totals.total += tx.amount;
        *totals.by_type.entry(tx.payment_type.as_str()).or_insert(0.0) += tx.amount;
    }
    totals.total = dues::round_cents(totals.total);
    for value in totals.by_type.values_mut() {
        *value = dues::round_cents(*value);
    }
    totals
}

/// Count of unheard voicemails, for the menu badge
pub fn unheard_count(voicemails: &[Voicemail]) -> usize {
    voicemails.iter().filter(|v| !v.listened).count()
}

// ============================================================================
// DUES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuesView {
    /// Member id, or family id for households
    pub subject_id: String,
    pub name: String,
    pub household_size: usize,
    pub summary: DuesSummary,
}

/// Dues for one member. `roster` is the member list used to size the
/// member's household; an empty roster counts only the member and dependents.
pub fn member_dues_view(
    member: &Member,
    roster: &[Member],
    transactions: &[Transaction],
    year: i32,
    today: NaiveDate,
    prorate_one_time: bool,
) -> DuesView {
    DuesView {
        subject_id: member.id.clone(),
        name: member.full_name(),
        household_size: Household::of(member, roster).size(),
        summary: dues::member_dues(member, transactions, year, today, prorate_one_time),
    }
}

pub fn household_dues_view(
    household: &Household,
    transactions: &[Transaction],
    year: i32,
    today: NaiveDate,
    prorate_one_time: bool,
) -> DuesView {
    let name = household
        .head()
        .map(|m| format!("{} household", m.last_name.trim()))
        .unwrap_or_else(|| format!("Household {}", household.family_id));
    DuesView {
        subject_id: household.family_id.clone(),
        name,
        household_size: household.size(),
        summary: dues::household_dues(household, transactions, year, today, prorate_one_time),
    }
}

/// Dues-type transactions only, for the payment history table under the calendar
pub fn dues_history(transactions: &[Transaction], year: i32) -> Vec<&Transaction> {
    let mut history: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| tx.payment_type == TransactionType::MembershipDue && tx.year() == year)
        .collect();
    history.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
    history
}
