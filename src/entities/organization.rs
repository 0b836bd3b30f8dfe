// 🏛️ Organization Entities - departments, meetings and tasks
//
// Departments form a tree through `parentDepartmentId`. Meetings belong to a
// department and tasks come out of meetings.

use crate::entities::wire;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// DEPARTMENT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartmentType {
    #[default]
    Ministry,
    Committee,
    Board,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartmentRole {
    Leader,
    #[serde(alias = "co-leader", alias = "coLeader")]
    CoLeader,
    #[default]
    #[serde(other)]
    Member,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, rename = "type", alias = "department_type", alias = "departmentType")]
    pub department_type: DepartmentType,

    #[serde(default, alias = "parent_department_id", deserialize_with = "wire::opt_id")]
    pub parent_department_id: Option<String>,

    #[serde(default, alias = "member_count")]
    pub member_count: Option<u32>,

    #[serde(default = "default_active", alias = "is_active", alias = "isActive")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentMember {
    #[serde(alias = "member_id", deserialize_with = "wire::id")]
    pub member_id: String,

    #[serde(default, alias = "member_name")]
    pub member_name: Option<String>,

    #[serde(default, alias = "role_in_department")]
    pub role: DepartmentRole,

    #[serde(default, alias = "joined_at", deserialize_with = "wire::opt_date")]
    pub joined_at: Option<NaiveDate>,
}

/// Children of `parent_id` (or roots when `None`), in input order
pub fn child_departments<'a>(
    departments: &'a [Department],
    parent_id: Option<&str>,
) -> Vec<&'a Department> {
    departments
        .iter()
        .filter(|d| d.parent_department_id.as_deref() == parent_id)
        .collect()
}

// ============================================================================
// MEETING
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,

    #[serde(alias = "department_id", deserialize_with = "wire::id")]
    pub department_id: String,

    pub title: String,

    #[serde(alias = "meeting_date", deserialize_with = "wire::date")]
    pub meeting_date: NaiveDate,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub agenda: Option<String>,

    #[serde(default)]
    pub minutes: Option<String>,

    #[serde(default)]
    pub attendees: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingDraft {
    pub title: String,
    pub meeting_date: NaiveDate,
    pub location: Option<String>,
    pub agenda: Option<String>,
}

// ============================================================================
// TASK
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    #[serde(alias = "in-progress", alias = "inProgress")]
    InProgress,
    Completed,
    Rejected,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,

    #[serde(default, alias = "meeting_id", deserialize_with = "wire::opt_id")]
    pub meeting_id: Option<String>,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, alias = "assigned_to", deserialize_with = "wire::opt_id")]
    pub assigned_to: Option<String>,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: TaskPriority,

    #[serde(default, alias = "due_date", deserialize_with = "wire::opt_date")]
    pub due_date: Option<NaiveDate>,

    #[serde(default, alias = "rejected_date", deserialize_with = "wire::opt_date")]
    pub rejected_date: Option<NaiveDate>,

    #[serde(default, alias = "rejection_reason")]
    pub rejection_reason: Option<String>,
}

impl Task {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self.status, TaskStatus::Pending | TaskStatus::InProgress)
            && self.due_date.is_some_and(|d| d < today)
    }
}

/// Create/edit form payload for tasks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub rejected_date: Option<NaiveDate>,
    pub rejection_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_department_tree() {
        let json = r#"[
            {"id": 1, "name": "Sunday School", "type": "ministry"},
            {"id": 2, "name": "Youth", "type": "ministry", "parent_department_id": 1},
            {"id": 3, "name": "Finance", "type": "committee"}
        ]"#;
        let departments: Vec<Department> = serde_json::from_str(json).unwrap();

        let roots = child_departments(&departments, None);
        assert_eq!(roots.len(), 2);
        let children = child_departments(&departments, Some("1"));
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "Youth");
        assert_eq!(departments[2].department_type, DepartmentType::Committee);
    }

    #[test]
    fn test_task_status_spellings() {
        let json = r#"{"id": 9, "title": "Order chairs", "status": "in-progress", "priority": "urgent", "dueDate": "2024-03-01"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.priority, TaskPriority::Urgent);
        assert!(task.is_overdue(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()));
        assert!(!task.is_overdue(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
    }

    #[test]
    fn test_department_member_role_defaults() {
        let json = r#"{"member_id": 4, "role_in_department": "co_leader"}"#;
        let dm: DepartmentMember = serde_json::from_str(json).unwrap();
        assert_eq!(dm.role, DepartmentRole::CoLeader);

        let dm: DepartmentMember = serde_json::from_str(r#"{"memberId": "5"}"#).unwrap();
        assert_eq!(dm.role, DepartmentRole::Member);
    }
}
