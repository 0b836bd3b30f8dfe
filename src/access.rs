// Advisory role gating
//
// Decides which admin sections the UI offers to a signed-in user.
// This is display gating only: the backend enforces authorization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Member,
    Admin,
    Treasurer,
    Secretary,
    #[serde(alias = "churchLeadership", alias = "church-leadership")]
    ChurchLeadership,
    #[serde(alias = "departmentLeader", alias = "department-leader")]
    DepartmentLeader,
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
            Role::Treasurer => "treasurer",
            Role::Secretary => "secretary",
            Role::ChurchLeadership => "church_leadership",
            Role::DepartmentLeader => "department_leader",
            Role::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Member => "Member",
            Role::Admin => "Admin",
            Role::Treasurer => "Treasurer",
            Role::Secretary => "Secretary",
            Role::ChurchLeadership => "Church Leadership",
            Role::DepartmentLeader => "Department Leader",
            Role::Unknown => "Unknown",
        }
    }

    pub fn parse(raw: &str) -> Option<Role> {
        let normalized = raw.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "member" => Some(Role::Member),
            "admin" => Some(Role::Admin),
            "treasurer" => Some(Role::Treasurer),
            "secretary" => Some(Role::Secretary),
            "church_leadership" | "churchleadership" => Some(Role::ChurchLeadership),
            "department_leader" | "departmentleader" => Some(Role::DepartmentLeader),
            _ => None,
        }
    }
}

/// Admin screens the UI can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Members,
    Roles,
    Departments,
    Treasury,
    Expenses,
    Sms,
    Voicemail,
    /// A member's own dues page, open to everyone signed in
    DuesSelf,
}

impl Section {
    pub const ALL: [Section; 8] = [
        Section::Members,
        Section::Roles,
        Section::Departments,
        Section::Treasury,
        Section::Expenses,
        Section::Sms,
        Section::Voicemail,
        Section::DuesSelf,
    ];

    fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Section::Members => &[Role::Admin, Role::Secretary, Role::ChurchLeadership, Role::Treasurer],
            Section::Roles => &[Role::Admin],
            Section::Departments => &[
                Role::Admin,
                Role::Secretary,
                Role::ChurchLeadership,
                Role::DepartmentLeader,
            ],
            Section::Treasury => &[Role::Admin, Role::Treasurer],
            Section::Expenses => &[Role::Admin, Role::Treasurer],
            Section::Sms => &[Role::Admin, Role::Secretary, Role::ChurchLeadership],
            Section::Voicemail => &[Role::Admin, Role::Secretary],
            Section::DuesSelf => &[],
        }
    }
}

/// Whether the UI should offer `section` to a user holding `roles`.
pub fn can_access(roles: &BTreeSet<Role>, section: Section) -> bool {
    let allowed = section.allowed_roles();
    if allowed.is_empty() {
        return true;
    }
    roles.iter().any(|role| allowed.contains(role))
}

/// Sections visible to `roles`, in menu order
pub fn visible_sections(roles: &BTreeSet<Role>) -> Vec<Section> {
    Section::ALL
        .iter()
        .copied()
        .filter(|section| can_access(roles, *section))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(list: &[Role]) -> BTreeSet<Role> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_treasurer_sees_treasury_not_roles() {
        let r = roles(&[Role::Treasurer]);
        assert!(can_access(&r, Section::Treasury));
        assert!(can_access(&r, Section::Expenses));
        assert!(!can_access(&r, Section::Roles));
        assert!(!can_access(&r, Section::Voicemail));
    }

    #[test]
    fn test_plain_member_only_sees_own_dues() {
        let r = roles(&[Role::Member]);
        assert_eq!(visible_sections(&r), vec![Section::DuesSelf]);
    }

    #[test]
    fn test_admin_sees_everything() {
        let r = roles(&[Role::Admin]);
        assert_eq!(visible_sections(&r).len(), Section::ALL.len());
    }

    #[test]
    fn test_role_decoding_accepts_mixed_spellings() {
        let decoded: Vec<Role> =
            serde_json::from_str(r#"["admin", "churchLeadership", "church_leadership", "pastor"]"#)
                .unwrap();
        assert_eq!(
            decoded,
            vec![Role::Admin, Role::ChurchLeadership, Role::ChurchLeadership, Role::Unknown]
        );
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("Church Leadership"), Some(Role::ChurchLeadership));
        assert_eq!(Role::parse("TREASURER"), Some(Role::Treasurer));
        assert_eq!(Role::parse("janitor"), None);
    }
}
