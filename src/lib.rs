// Church Admin - Core Library
// Exposes all modules for use in the CLI/TUI, the view server, and tests

pub mod access;     // Advisory role gating
pub mod client;     // REST client for the church backend
pub mod config;     // Environment configuration
pub mod dues;       // Household dues aggregation
pub mod entities;   // REST DTOs
pub mod export;     // CSV import / export
pub mod listing;    // Shared filter / sort / paginate
pub mod phone;      // Phone formatting
pub mod telemetry;  // tracing subscriber setup
pub mod validation; // Form validation
pub mod views;      // Screen rows built from DTOs + queries

// Re-export commonly used types
pub use access::{can_access, visible_sections, Role, Section};
pub use client::{fail_open, ApiClient, ApiError, ApiResult, StaticToken, TokenSource};
pub use config::AppConfig;
pub use dues::{
    compute_dues, dues_progress, household_dues, member_dues, ContributionBreakdown, DuesOptions,
    DuesSummary, MonthStatus, MonthlyDues,
};
pub use entities::{
    Dependent, Employee, Expense, ExpenseDraft, Household, Member, MemberDraft, MemberStatus,
    PaymentDraft, PaymentMethod, Transaction, TransactionQuery, TransactionType, Vendor, Voicemail,
};
pub use listing::{
    Debouncer, ListQuery, ListState, Listable, Paged, SearchGate, SortDirection, SortSpec,
};
pub use validation::{ValidationError, ValidationResult};
pub use views::{DuesView, RoleRow, TransactionTotals};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
