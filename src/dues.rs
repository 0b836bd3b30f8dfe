// 📅 Household Dues Aggregator
//
// Given an annual pledge and one year of transactions, computes the dues
// calendar shown on a member's (or household's) dues page:
// - 12 monthly rows with expected / paid / due amounts and a status
// - collected total and progress percentage against the pledge
// - non-dues contributions summed per category
//
// Only `membership_due` transactions count toward the calendar.

use crate::entities::{Household, Member, Transaction, TransactionType};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Amounts below half a cent are treated as settled
const CENT_EPSILON: f64 = 0.005;

/// Round a money amount to cents
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// MONTH STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthStatus {
    Paid,
    Due,
    Upcoming,
    PreMembership,
}

impl MonthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonthStatus::Paid => "paid",
            MonthStatus::Due => "due",
            MonthStatus::Upcoming => "upcoming",
            MonthStatus::PreMembership => "pre-membership",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyDues {
    /// 1-12
    pub month: u32,
    pub label: &'static str,
    pub expected: f64,
    pub paid: f64,
    pub due: f64,
    pub status: MonthStatus,
}

// ============================================================================
// CONTRIBUTIONS
// ============================================================================

/// Non-dues giving for the year, per category
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionBreakdown {
    pub donation: f64,
    pub pledge_payment: f64,
    pub tithe: f64,
    pub offering: f64,
    pub other: f64,
}

impl ContributionBreakdown {
    fn add(&mut self, tx: &Transaction) {
        let slot = match tx.payment_type {
            TransactionType::MembershipDue => return,
            TransactionType::Donation => &mut self.donation,
            TransactionType::PledgePayment => &mut self.pledge_payment,
            TransactionType::Tithe => &mut self.tithe,
            TransactionType::Offering => &mut self.offering,
            TransactionType::Event | TransactionType::Other => &mut self.other,
        };
        *slot += tx.amount;
    }

    fn rounded(self) -> Self {
        ContributionBreakdown {
            donation: round_cents(self.donation),
            pledge_payment: round_cents(self.pledge_payment),
            tithe: round_cents(self.tithe),
            offering: round_cents(self.offering),
            other: round_cents(self.other),
        }
    }

    pub fn total(&self) -> f64 {
        round_cents(self.donation + self.pledge_payment + self.tithe + self.offering + self.other)
    }

    /// (label, amount) rows with a non-zero amount, for display
    pub fn non_zero(&self) -> Vec<(&'static str, f64)> {
        [
            ("Donation", self.donation),
            ("Pledge Payment", self.pledge_payment),
            ("Tithe", self.tithe),
            ("Offering", self.offering),
            ("Other", self.other),
        ]
        .into_iter()
        .filter(|(_, amount)| amount.abs() >= CENT_EPSILON)
        .collect()
    }
}

// ============================================================================
// OPTIONS + SUMMARY
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct DuesOptions {
    /// Months before this date's month are pre-membership
    pub membership_start: Option<NaiveDate>,

    /// Carry the excess of a large dues payment forward into later months
    pub prorate_one_time: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuesSummary {
    pub year: i32,
    pub annual_pledge: f64,
    pub monthly_payment: f64,
    pub months: Vec<MonthlyDues>,
    pub dues_collected: f64,
    pub total_due: f64,
    pub remaining: f64,
    /// 0-100
    pub progress: u8,
    pub contributions: ContributionBreakdown,
}

impl DuesSummary {
    pub fn month(&self, month: u32) -> Option<&MonthlyDues> {
        self.months.iter().find(|m| m.month == month)
    }

    pub fn months_due(&self) -> usize {
        self.months
            .iter()
            .filter(|m| m.status == MonthStatus::Due)
            .count()
    }

    pub fn is_current(&self) -> bool {
        self.total_due < CENT_EPSILON
    }
}

/// Progress against the pledge, rounded, clamped to 0-100. Zero pledge shows 0.
pub fn dues_progress(collected: f64, annual_pledge: f64) -> u8 {
    if annual_pledge <= 0.0 || !annual_pledge.is_finite() {
        return 0;
    }
    let pct = (collected / annual_pledge * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

// ============================================================================
// COMPUTATION
// ============================================================================

/// Compute the dues calendar for `year` as seen on `today`.
///
/// Transactions outside `year` are ignored, so callers can pass a member's
/// full history.
pub fn compute_dues(
    annual_pledge: f64,
    transactions: &[Transaction],
    year: i32,
    today: NaiveDate,
    options: &DuesOptions,
) -> DuesSummary {
    let annual_pledge = annual_pledge.max(0.0);
    let monthly_payment = annual_pledge / 12.0;

    let mut buckets = [0.0_f64; 12];
    let mut contributions = ContributionBreakdown::default();

    for tx in transactions.iter().filter(|tx| tx.year() == year) {
        if tx.is_dues() {
            buckets[(tx.month() - 1) as usize] += tx.amount;
        } else {
            contributions.add(tx);
        }
    }

    let dues_collected = round_cents(buckets.iter().sum());

    if options.prorate_one_time {
        buckets = carry_forward(buckets, monthly_payment);
    }

    let current = (today.year(), today.month());
    let start = options.membership_start.map(|d| (d.year(), d.month()));

    let months: Vec<MonthlyDues> = (1..=12u32)
        .map(|month| {
            let paid = round_cents(buckets[(month - 1) as usize]);
            let expected = round_cents(monthly_payment);
            let key = (year, month);

            let before_membership = start.is_some_and(|s| key < s) && paid < CENT_EPSILON;

            let (due, status) = if before_membership {
                (0.0, MonthStatus::PreMembership)
            } else if key > current {
                // Future months are never delinquent
                if expected > 0.0 && paid + CENT_EPSILON >= expected {
                    (0.0, MonthStatus::Paid)
                } else {
                    (0.0, MonthStatus::Upcoming)
                }
            } else {
                let due = round_cents((monthly_payment - paid).max(0.0));
                if due < CENT_EPSILON {
                    (0.0, MonthStatus::Paid)
                } else {
                    (due, MonthStatus::Due)
                }
            };

            MonthlyDues {
                month,
                label: MONTH_LABELS[(month - 1) as usize],
                expected,
                paid,
                due,
                status,
            }
        })
        .collect();

    let total_due = round_cents(months.iter().map(|m| m.due).sum());

    DuesSummary {
        year,
        annual_pledge,
        monthly_payment: round_cents(monthly_payment),
        months,
        dues_collected,
        total_due,
        remaining: round_cents((annual_pledge - dues_collected).max(0.0)),
        progress: dues_progress(dues_collected, annual_pledge),
        contributions: contributions.rounded(),
    }
}

/// Spread each month's excess over `monthly` into the following months.
/// Whatever is left after December stays on December.
fn carry_forward(raw: [f64; 12], monthly: f64) -> [f64; 12] {
    if monthly <= 0.0 {
        return raw;
    }
    let mut allocated = [0.0_f64; 12];
    let mut carry = 0.0;
    for (i, amount) in raw.iter().enumerate() {
        let available = amount + carry;
        if i == 11 {
            allocated[i] = available;
            break;
        }
        allocated[i] = available.min(monthly);
        carry = available - allocated[i];
    }
    allocated
}

/// Dues calendar for a single member
pub fn member_dues(
    member: &Member,
    transactions: &[Transaction],
    year: i32,
    today: NaiveDate,
    prorate_one_time: bool,
) -> DuesSummary {
    let own: Vec<Transaction> = transactions
        .iter()
        .filter(|tx| tx.member_id.as_deref() == Some(member.id.as_str()))
        .cloned()
        .collect();

    let options = DuesOptions {
        membership_start: member.membership_start_date,
        prorate_one_time,
    };
    compute_dues(member.pledge_amount, &own, year, today, &options)
}

/// Dues calendar for a whole household: summed pledges, pooled payments.
pub fn household_dues(
    household: &Household,
    transactions: &[Transaction],
    year: i32,
    today: NaiveDate,
    prorate_one_time: bool,
) -> DuesSummary {
    let ids = household.member_ids();
    let pooled: Vec<Transaction> = transactions
        .iter()
        .filter(|tx| tx.member_id.as_deref().is_some_and(|id| ids.contains(id)))
        .cloned()
        .collect();

    // Household membership starts with its earliest member
    let membership_start = if household.members.iter().all(|m| m.membership_start_date.is_some()) {
        household
            .members
            .iter()
            .filter_map(|m| m.membership_start_date)
            .min()
    } else {
        None
    };

    let options = DuesOptions {
        membership_start,
        prorate_one_time,
    };
    compute_dues(household.pledge(), &pooled, year, today, &options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{MemberStatus, PaymentMethod};
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(member: Option<&str>, amount: f64, on: NaiveDate, kind: TransactionType) -> Transaction {
        Transaction {
            id: String::new(),
            member_id: member.map(|m| m.to_string()),
            payer_name: None,
            amount,
            payment_date: on,
            payment_type: kind,
            payment_method: PaymentMethod::Cash,
            receipt_number: Some("R-1".to_string()),
            note: None,
            income_category_id: None,
            donor_first_name: None,
            donor_last_name: None,
            donor_email: None,
            donor_phone: None,
            status: None,
        }
    }

    fn dues(amount: f64, on: NaiveDate) -> Transaction {
        tx(Some("1"), amount, on, TransactionType::MembershipDue)
    }

    fn member(id: &str, family: &str, pledge: f64, start: Option<NaiveDate>) -> Member {
        Member {
            id: id.to_string(),
            first_name: "Test".to_string(),
            last_name: id.to_string(),
            email: None,
            phone: None,
            family_id: Some(family.to_string()),
            roles: BTreeSet::new(),
            pledge_amount: pledge,
            membership_start_date: start,
            status: MemberStatus::Active,
            dependents: vec![],
        }
    }

    #[test]
    fn test_partial_january_payment_is_due() {
        let summary = compute_dues(
            1200.0,
            &[dues(50.0, date(2024, 1, 5))],
            2024,
            date(2024, 1, 20),
            &DuesOptions::default(),
        );

        let jan = summary.month(1).unwrap();
        assert_eq!(jan.status, MonthStatus::Due);
        assert_eq!(jan.paid, 50.0);
        assert_eq!(jan.due, 50.0);
        assert_eq!(summary.monthly_payment, 100.0);
        assert_eq!(summary.progress, 4);
    }

    #[test]
    fn test_zero_pledge_shows_zero_progress() {
        let summary = compute_dues(
            0.0,
            &[dues(50.0, date(2024, 1, 5))],
            2024,
            date(2024, 6, 1),
            &DuesOptions::default(),
        );
        assert_eq!(summary.progress, 0);
        assert_eq!(summary.total_due, 0.0);
        assert!(summary.is_current());
    }

    #[test]
    fn test_future_months_are_upcoming() {
        let summary = compute_dues(1200.0, &[], 2024, date(2024, 3, 15), &DuesOptions::default());

        assert_eq!(summary.month(3).unwrap().status, MonthStatus::Due);
        for month in 4..=12 {
            let row = summary.month(month).unwrap();
            assert_eq!(row.status, MonthStatus::Upcoming);
            assert_eq!(row.due, 0.0);
        }
        assert_eq!(summary.total_due, 300.0);
        assert_eq!(summary.months_due(), 3);
    }

    #[test]
    fn test_past_year_is_fully_due() {
        let summary = compute_dues(1200.0, &[], 2023, date(2024, 2, 1), &DuesOptions::default());
        assert_eq!(summary.months_due(), 12);
        assert_eq!(summary.total_due, 1200.0);
    }

    #[test]
    fn test_other_years_ignored() {
        let summary = compute_dues(
            1200.0,
            &[dues(100.0, date(2023, 12, 31)), dues(100.0, date(2024, 1, 1))],
            2024,
            date(2024, 1, 31),
            &DuesOptions::default(),
        );
        assert_eq!(summary.dues_collected, 100.0);
        assert_eq!(summary.month(1).unwrap().status, MonthStatus::Paid);
    }

    #[test]
    fn test_prepaid_future_month_shows_paid() {
        let summary = compute_dues(
            1200.0,
            &[dues(100.0, date(2024, 6, 1))],
            2024,
            date(2024, 2, 1),
            &DuesOptions::default(),
        );
        assert_eq!(summary.month(6).unwrap().status, MonthStatus::Paid);
    }

    #[test]
    fn test_pre_membership_months() {
        let options = DuesOptions {
            membership_start: Some(date(2024, 4, 10)),
            prorate_one_time: false,
        };
        let summary = compute_dues(1200.0, &[], 2024, date(2024, 5, 1), &options);

        for month in 1..=3 {
            assert_eq!(summary.month(month).unwrap().status, MonthStatus::PreMembership);
            assert_eq!(summary.month(month).unwrap().due, 0.0);
        }
        assert_eq!(summary.month(4).unwrap().status, MonthStatus::Due);
        assert_eq!(summary.total_due, 200.0);
    }

    #[test]
    fn test_one_time_payment_prorated_forward() {
        let payments = [dues(600.0, date(2024, 1, 3))];
        let options = DuesOptions {
            membership_start: None,
            prorate_one_time: true,
        };
        let summary = compute_dues(1200.0, &payments, 2024, date(2024, 8, 1), &options);

        for month in 1..=6 {
            assert_eq!(summary.month(month).unwrap().status, MonthStatus::Paid, "month {month}");
        }
        assert_eq!(summary.month(7).unwrap().status, MonthStatus::Due);
        assert_eq!(summary.month(8).unwrap().due, 100.0);
        assert_eq!(summary.dues_collected, 600.0);
        assert_eq!(summary.progress, 50);

        // Without proration the lump sum sits on January only
        let plain = compute_dues(1200.0, &payments, 2024, date(2024, 8, 1), &DuesOptions::default());
        assert_eq!(plain.month(1).unwrap().paid, 600.0);
        assert_eq!(plain.months_due(), 7);
    }

    #[test]
    fn test_proration_keeps_overflow_in_december() {
        let raw = carry_forward([0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 300.0, 0.0], 100.0);
        assert_eq!(raw[10], 100.0);
        assert_eq!(raw[11], 200.0);
    }

    #[test]
    fn test_contribution_breakdown() {
        let txs = vec![
            tx(Some("1"), 20.0, date(2024, 1, 7), TransactionType::Tithe),
            tx(Some("1"), 30.0, date(2024, 2, 7), TransactionType::Tithe),
            tx(Some("1"), 15.5, date(2024, 2, 7), TransactionType::Donation),
            tx(Some("1"), 5.0, date(2024, 2, 7), TransactionType::Event),
            tx(Some("1"), 100.0, date(2024, 2, 7), TransactionType::MembershipDue),
        ];
        let summary = compute_dues(1200.0, &txs, 2024, date(2024, 3, 1), &DuesOptions::default());

        assert_eq!(summary.contributions.tithe, 50.0);
        assert_eq!(summary.contributions.donation, 15.5);
        assert_eq!(summary.contributions.other, 5.0);
        assert_eq!(summary.contributions.total(), 70.5);
        assert_eq!(summary.contributions.non_zero().len(), 3);
        assert_eq!(summary.dues_collected, 100.0);
    }

    #[test]
    fn test_progress_clamped_on_overpayment() {
        assert_eq!(dues_progress(2400.0, 1200.0), 100);
        assert_eq!(dues_progress(-10.0, 1200.0), 0);
        assert_eq!(dues_progress(10.0, 0.0), 0);
    }

    #[test]
    fn test_member_dues_uses_only_own_transactions() {
        let m = member("1", "F", 1200.0, None);
        let txs = vec![
            dues(100.0, date(2024, 1, 5)),
            tx(Some("2"), 100.0, date(2024, 2, 5), TransactionType::MembershipDue),
        ];
        let summary = member_dues(&m, &txs, 2024, date(2024, 2, 28), false);
        assert_eq!(summary.dues_collected, 100.0);
        assert_eq!(summary.month(2).unwrap().status, MonthStatus::Due);
    }

    #[test]
    fn test_household_dues_pools_members() {
        let a = member("1", "F", 1200.0, Some(date(2024, 1, 1)));
        let b = member("2", "F", 600.0, Some(date(2023, 6, 1)));
        let outsider = member("3", "G", 600.0, None);
        let all = vec![a.clone(), b, outsider];
        let household = Household::of(&a, &all);

        let txs = vec![
            dues(100.0, date(2024, 1, 5)),
            tx(Some("2"), 50.0, date(2024, 1, 6), TransactionType::MembershipDue),
            tx(Some("3"), 50.0, date(2024, 1, 6), TransactionType::MembershipDue),
        ];
        let summary = household_dues(&household, &txs, 2024, date(2024, 1, 31), false);

        assert_eq!(summary.annual_pledge, 1800.0);
        assert_eq!(summary.monthly_payment, 150.0);
        assert_eq!(summary.month(1).unwrap().status, MonthStatus::Paid);
        assert_eq!(summary.dues_collected, 150.0);
    }

    proptest! {
        #[test]
        fn prop_progress_matches_ratio(
            pledge_cents in 1_200u64..10_000_000,
            parts in prop::collection::vec(0u64..=1_000, 12),
        ) {
            let weight: u64 = parts.iter().sum::<u64>().max(1);
            let payments: Vec<Transaction> = parts
                .iter()
                .enumerate()
                .map(|(i, part)| {
                    let cents = pledge_cents * part / weight;
                    dues(cents as f64 / 100.0, date(2024, i as u32 + 1, 10))
                })
                .collect();
            let pledge = pledge_cents as f64 / 100.0;
            let collected = round_cents(payments.iter().map(|p| p.amount).sum());

            let summary = compute_dues(pledge, &payments, 2024, date(2024, 12, 31), &DuesOptions::default());

            let expected = (collected / pledge * 100.0).round();
            prop_assert_eq!(summary.progress as f64, expected);
            prop_assert!(summary.progress <= 100);
        }

        #[test]
        fn prop_future_months_never_due(
            today_month in 1u32..=12,
            payments in prop::collection::vec((1u32..=12, 0u32..500), 0..20),
            pledge in 0u32..5_000,
        ) {
            let txs: Vec<Transaction> = payments
                .iter()
                .map(|(m, amount)| dues(*amount as f64, date(2024, *m, 1)))
                .collect();

            let summary = compute_dues(pledge as f64, &txs, 2024, date(2024, today_month, 15), &DuesOptions::default());

            for row in summary.months.iter().filter(|r| r.month > today_month) {
                prop_assert_eq!(row.due, 0.0);
                prop_assert_ne!(row.status, MonthStatus::Due);
            }
        }
    }
}
