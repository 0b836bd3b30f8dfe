// 📐 Form Validation
//
// Client-side checks run before any request is sent. A failing form reports
// every failing field, and the request is blocked.

use crate::entities::{
    ExpenseDraft, MemberDraft, PaymentDraft, PaymentMethod, SmsDraft, TaskDraft, TaskStatus,
};
use crate::phone;
use chrono::NaiveDate;

/// Longest message accepted for one SMS broadcast
pub const SMS_MAX_CHARS: usize = 1600;

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub context: String,
}

impl ValidationError {
    fn new(context: &str, field: &str, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.into(),
            context: context.to_string(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.context, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// One banner line for a failed form
pub fn banner(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

fn finish(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

// ============================================================================
// AMOUNTS
// ============================================================================

/// Keystroke guard for amount fields: digits, at most one dot, at most two
/// decimals. Partial input such as "12." is allowed.
pub fn is_amount_input(text: &str) -> bool {
    let mut parts = text.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let fraction = parts.next();

    if !whole.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    match fraction {
        None => true,
        Some(f) => f.len() <= 2 && f.chars().all(|c| c.is_ascii_digit()),
    }
}

/// Parse a typed amount; must be well-formed and greater than zero
pub fn parse_amount(text: &str) -> Result<f64, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::new("Amount", "amount", "Amount is required"));
    }
    if !is_amount_input(text) || text == "." {
        return Err(ValidationError::new(
            "Amount",
            "amount",
            "Amount must be a number with at most two decimals",
        ));
    }
    let value: f64 = text
        .parse()
        .map_err(|_| ValidationError::new("Amount", "amount", "Amount is not a valid number"))?;
    if value <= 0.0 {
        return Err(ValidationError::new(
            "Amount",
            "amount",
            "Amount must be greater than zero",
        ));
    }
    Ok(value)
}

// ============================================================================
// PAYMENTS / EXPENSES
// ============================================================================

pub fn validate_payment(draft: &PaymentDraft, today: NaiveDate) -> ValidationResult {
    const CTX: &str = "Payment";
    let mut errors = Vec::new();

    if let Err(mut e) = parse_amount(&draft.amount) {
        e.context = CTX.to_string();
        errors.push(e);
    }

    if draft.payment_date > today {
        errors.push(ValidationError::new(
            CTX,
            "paymentDate",
            "Payment date cannot be in the future",
        ));
    }

    if draft.payment_method.requires_receipt() && blank(draft.receipt_number.as_deref()) {
        errors.push(ValidationError::new(
            CTX,
            "receiptNumber",
            "Receipt number is required for cash and check payments",
        ));
    }

    if draft.member_id.is_none() && !draft.anonymous {
        if blank(draft.donor_first_name.as_deref()) || blank(draft.donor_last_name.as_deref()) {
            errors.push(ValidationError::new(
                CTX,
                "donorName",
                "Donor first and last name are required when no member is selected",
            ));
        }
        if let Some(p) = draft.donor_phone.as_deref().filter(|p| !p.trim().is_empty()) {
            if !phone::is_valid(p) {
                errors.push(ValidationError::new(CTX, "donorPhone", "Donor phone must be 10 digits"));
            }
        }
    }

    finish(errors)
}

pub fn validate_expense(draft: &ExpenseDraft, today: NaiveDate) -> ValidationResult {
    const CTX: &str = "Expense";
    let mut errors = Vec::new();

    if let Err(mut e) = parse_amount(&draft.amount) {
        e.context = CTX.to_string();
        errors.push(e);
    }

    match draft.expense_date {
        None => errors.push(ValidationError::new(CTX, "expenseDate", "Expense date is required")),
        Some(d) if d > today => errors.push(ValidationError::new(
            CTX,
            "expenseDate",
            "Expense date cannot be in the future",
        )),
        Some(_) => {}
    }

    if blank(draft.gl_code.as_deref()) {
        errors.push(ValidationError::new(CTX, "glCode", "Expense category is required"));
    }

    let payees = draft.payee_fields_set();
    if payees.len() > 1 {
        errors.push(ValidationError::new(
            CTX,
            "payee",
            format!("Only one payee may be set (got {})", payees.join(", ")),
        ));
    }

    match draft.payment_method {
        None => errors.push(ValidationError::new(CTX, "paymentMethod", "Payment method is required")),
        Some(PaymentMethod::Check) if blank(draft.check_number.as_deref()) => {
            errors.push(ValidationError::new(
                CTX,
                "checkNumber",
                "Check number is required for check payments",
            ))
        }
        Some(PaymentMethod::Cash) if blank(draft.receipt_number.as_deref()) => {
            errors.push(ValidationError::new(
                CTX,
                "receiptNumber",
                "Receipt number is required for cash payments",
            ))
        }
        Some(_) => {}
    }

    finish(errors)
}

// ============================================================================
// MEMBERS
// ============================================================================

pub fn validate_registration(draft: &MemberDraft) -> ValidationResult {
    const CTX: &str = "Member";
    let mut errors = Vec::new();

    if draft.first_name.trim().is_empty() {
        errors.push(ValidationError::new(CTX, "firstName", "First name is required"));
    }
    if draft.last_name.trim().is_empty() {
        errors.push(ValidationError::new(CTX, "lastName", "Last name is required"));
    }
    if !phone::is_valid(&draft.phone) {
        errors.push(ValidationError::new(CTX, "phone", "Phone number must be 10 digits"));
    }
    if let Some(email) = draft.email.as_deref().filter(|e| !e.trim().is_empty()) {
        if !email.contains('@') {
            errors.push(ValidationError::new(CTX, "email", "Email address is not valid"));
        }
    }
    if draft.pledge_amount < 0.0 || !draft.pledge_amount.is_finite() {
        errors.push(ValidationError::new(CTX, "pledgeAmount", "Pledge cannot be negative"));
    }

    finish(errors)
}

/// A dependent can only become a member with their own phone number
pub fn validate_promotion(phone_number: &str) -> ValidationResult {
    if phone::is_valid(phone_number) {
        Ok(())
    } else {
        Err(vec![ValidationError::new(
            "Dependent",
            "phone",
            "A valid phone number is required to promote a dependent",
        )])
    }
}

// ============================================================================
// TASKS / SMS
// ============================================================================

pub fn validate_task(draft: &TaskDraft) -> ValidationResult {
    const CTX: &str = "Task";
    let mut errors = Vec::new();

    if draft.title.trim().is_empty() {
        errors.push(ValidationError::new(CTX, "title", "Task title is required"));
    }

    match (draft.status, draft.rejected_date) {
        (TaskStatus::Rejected, None) => errors.push(ValidationError::new(
            CTX,
            "rejectedDate",
            "Rejected date is required when a task is rejected",
        )),
        (TaskStatus::Rejected, Some(_)) => {}
        (_, Some(_)) => errors.push(ValidationError::new(
            CTX,
            "rejectedDate",
            "Rejected date is only allowed on rejected tasks",
        )),
        (_, None) => {}
    }

    finish(errors)
}

pub fn validate_sms(draft: &SmsDraft) -> ValidationResult {
    const CTX: &str = "SMS";
    let mut errors = Vec::new();

    let length = draft.message.chars().count();
    if draft.message.trim().is_empty() {
        errors.push(ValidationError::new(CTX, "message", "Message is required"));
    } else if length > SMS_MAX_CHARS {
        errors.push(ValidationError::new(
            CTX,
            "message",
            format!("Message is {length} characters; the limit is {SMS_MAX_CHARS}"),
        ));
    }

    if draft.recipients.is_empty() {
        errors.push(ValidationError::new(CTX, "recipients", "Select at least one recipient"));
    }

    finish(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{SmsRecipients, TransactionType};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn payment() -> PaymentDraft {
        PaymentDraft {
            member_id: Some("7".to_string()),
            amount: "50.00".to_string(),
            payment_date: today(),
            payment_type: TransactionType::MembershipDue,
            payment_method: PaymentMethod::CreditCard,
            receipt_number: None,
            note: None,
            income_category_id: None,
            anonymous: false,
            donor_first_name: None,
            donor_last_name: None,
            donor_email: None,
            donor_phone: None,
        }
    }

    fn fields(result: ValidationResult) -> Vec<String> {
        result
            .err()
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.field)
            .collect()
    }

    #[test]
    fn test_amount_input_guard() {
        assert!(is_amount_input("12"));
        assert!(is_amount_input("12."));
        assert!(is_amount_input("12.5"));
        assert!(is_amount_input(""));
        assert!(!is_amount_input("12.555"));
        assert!(!is_amount_input("1.2.3"));
        assert!(!is_amount_input("-5"));
        assert!(!is_amount_input("abc"));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 25.50 ").unwrap(), 25.5);
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("0.00").is_err());
        assert!(parse_amount("").is_err());
        assert!(parse_amount(".").is_err());
        assert!(parse_amount("10.999").is_err());
    }

    #[test]
    fn test_valid_payment_passes() {
        assert!(validate_payment(&payment(), today()).is_ok());
    }

    #[test]
    fn test_cash_payment_needs_receipt() {
        let mut draft = payment();
        draft.payment_method = PaymentMethod::Cash;
        assert_eq!(fields(validate_payment(&draft, today())), vec!["receiptNumber"]);

        draft.receipt_number = Some("R-22".to_string());
        assert!(validate_payment(&draft, today()).is_ok());
    }

    #[test]
    fn test_payment_collects_every_error() {
        let mut draft = payment();
        draft.amount = "0".to_string();
        draft.payment_date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        draft.payment_method = PaymentMethod::Check;
        draft.member_id = None;

        assert_eq!(
            fields(validate_payment(&draft, today())),
            vec!["amount", "paymentDate", "receiptNumber", "donorName"]
        );
    }

    #[test]
    fn test_anonymous_payment_skips_donor_name() {
        let mut draft = payment();
        draft.member_id = None;
        draft.anonymous = true;
        assert!(validate_payment(&draft, today()).is_ok());
    }

    #[test]
    fn test_expense_single_payee() {
        let draft = ExpenseDraft {
            amount: "120".to_string(),
            expense_date: Some(today()),
            gl_code: Some("6100".to_string()),
            vendor_id: Some("3".to_string()),
            employee_id: Some("9".to_string()),
            payment_method: Some(PaymentMethod::Ach),
            ..Default::default()
        };
        assert_eq!(fields(validate_expense(&draft, today())), vec!["payee"]);
    }

    #[test]
    fn test_expense_check_needs_number() {
        let draft = ExpenseDraft {
            amount: "120".to_string(),
            expense_date: Some(today()),
            gl_code: Some("6100".to_string()),
            payee_name: Some("City Water".to_string()),
            payment_method: Some(PaymentMethod::Check),
            ..Default::default()
        };
        assert_eq!(fields(validate_expense(&draft, today())), vec!["checkNumber"]);
    }

    #[test]
    fn test_rejected_task_needs_date() {
        let mut draft = TaskDraft {
            title: "Repaint hall".to_string(),
            status: TaskStatus::Rejected,
            ..Default::default()
        };
        assert_eq!(fields(validate_task(&draft)), vec!["rejectedDate"]);

        draft.rejected_date = Some(today());
        assert!(validate_task(&draft).is_ok());

        draft.status = TaskStatus::Completed;
        assert_eq!(fields(validate_task(&draft)), vec!["rejectedDate"]);
    }

    #[test]
    fn test_registration() {
        let draft = MemberDraft {
            first_name: "Abebe".to_string(),
            last_name: " ".to_string(),
            phone: "555-123".to_string(),
            email: Some("nope".to_string()),
            ..Default::default()
        };
        assert_eq!(
            fields(validate_registration(&draft)),
            vec!["lastName", "phone", "email"]
        );
    }

    #[test]
    fn test_promotion_needs_phone() {
        assert!(validate_promotion("(555) 123-4567").is_ok());
        assert!(validate_promotion("").is_err());
    }

    #[test]
    fn test_sms_limits() {
        let draft = SmsDraft {
            message: "x".repeat(SMS_MAX_CHARS + 1),
            recipients: SmsRecipients::Phones { phones: vec![] },
        };
        assert_eq!(fields(validate_sms(&draft)), vec!["message", "recipients"]);

        let ok = SmsDraft {
            message: "Service starts at 10am".to_string(),
            recipients: SmsRecipients::AllMembers,
        };
        assert!(validate_sms(&ok).is_ok());
    }

    #[test]
    fn test_banner_joins_messages() {
        let errs = validate_task(&TaskDraft::default()).unwrap_err();
        assert_eq!(banner(&errs), "Task title is required");
    }
}
