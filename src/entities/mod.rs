// Entity Models - REST DTOs consumed from the church backend
//
// Each entity:
// - decodes both camelCase and snake_case field spellings
// - serializes camelCase (the backend's request convention)
// - carries only view-level helpers, never persistence

pub mod wire;
pub mod member;
pub mod transaction;
pub mod expense;
pub mod organization;
pub mod messaging;

pub use member::{Dependent, Household, Member, MemberDraft, MemberStatus, PromoteDependent, Relationship};
pub use transaction::{PaymentDraft, PaymentMethod, Transaction, TransactionQuery, TransactionType};
pub use expense::{Employee, Expense, ExpenseDraft, GlCategory, Payee, Vendor};
pub use organization::{
    child_departments, Department, DepartmentMember, DepartmentRole, DepartmentType, Meeting,
    MeetingDraft, Task, TaskDraft, TaskPriority, TaskStatus,
};
pub use messaging::{Group, SmsDraft, SmsLog, SmsRecipients, SmsSendResult, Voicemail};
