// Department, meeting, task and group endpoints

use super::{segment, ApiClient, ApiResult};
use crate::entities::{Department, DepartmentMember, Group, Meeting, MeetingDraft, Task, TaskDraft};
use crate::validation;
use tracing::info;

impl ApiClient {
    pub async fn list_departments(&self) -> ApiResult<Vec<Department>> {
        self.get("/api/departments", &[], Some("departments")).await
    }

    pub async fn department_members(&self, department_id: &str) -> ApiResult<Vec<DepartmentMember>> {
        self.get(
            &format!("/api/departments/{}/members", segment(department_id)),
            &[],
            Some("members"),
        )
        .await
    }

    pub async fn department_meetings(&self, department_id: &str) -> ApiResult<Vec<Meeting>> {
        self.get(
            &format!("/api/departments/{}/meetings", segment(department_id)),
            &[],
            Some("meetings"),
        )
        .await
    }

    pub async fn create_meeting(&self, department_id: &str, draft: &MeetingDraft) -> ApiResult<Meeting> {
        self.post(
            &format!("/api/departments/{}/meetings", segment(department_id)),
            draft,
            Some("meeting"),
        )
        .await
    }

    pub async fn meeting_tasks(&self, meeting_id: &str) -> ApiResult<Vec<Task>> {
        self.get(
            &format!("/api/departments/meetings/{}/tasks", segment(meeting_id)),
            &[],
            Some("tasks"),
        )
        .await
    }

    pub async fn create_task(&self, meeting_id: &str, draft: &TaskDraft) -> ApiResult<Task> {
        validation::validate_task(draft)?;
        let task: Task = self
            .post(
                &format!("/api/departments/meetings/{}/tasks", segment(meeting_id)),
                draft,
                Some("task"),
            )
            .await?;
        info!(task_id = %task.id, meeting_id, "task created");
        Ok(task)
    }

    pub async fn update_task(&self, task_id: &str, draft: &TaskDraft) -> ApiResult<Task> {
        validation::validate_task(draft)?;
        self.put(
            &format!("/api/departments/tasks/{}", segment(task_id)),
            draft,
            Some("task"),
        )
        .await
    }

    pub async fn active_groups(&self) -> ApiResult<Vec<Group>> {
        self.get("/api/groups/active", &[], Some("groups")).await
    }
}
