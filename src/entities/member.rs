// 👥 Member Entity - registry records, dependents and households
//
// Members are REST DTOs owned by the backend. A household is every member and
// dependent sharing one `familyId`; dues are aggregated per household.

use crate::access::Role;
use crate::entities::wire;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// MEMBER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    #[default]
    Active,
    Inactive,
    Pending,
    Deleted,
    #[serde(other)]
    Unknown,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Inactive => "inactive",
            MemberStatus::Pending => "pending",
            MemberStatus::Deleted => "deleted",
            MemberStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,

    #[serde(alias = "first_name")]
    pub first_name: String,

    #[serde(alias = "last_name")]
    pub last_name: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default, alias = "phone_number", alias = "phoneNumber")]
    pub phone: Option<String>,

    /// Household linkage; members of one household share it
    #[serde(default, alias = "family_id", deserialize_with = "wire::opt_id")]
    pub family_id: Option<String>,

    #[serde(default)]
    pub roles: BTreeSet<Role>,

    /// Annual pledge
    #[serde(default, alias = "yearly_pledge", alias = "yearlyPledge", alias = "pledge_amount", deserialize_with = "wire::amount")]
    pub pledge_amount: f64,

    #[serde(default, alias = "membership_start_date", deserialize_with = "wire::opt_date")]
    pub membership_start_date: Option<NaiveDate>,

    #[serde(default)]
    pub status: MemberStatus,

    #[serde(default)]
    pub dependents: Vec<Dependent>,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_deleted(&self) -> bool {
        self.status == MemberStatus::Deleted
    }

    /// Household key: the family id, or the member's own id when unlinked
    pub fn household_key(&self) -> &str {
        self.family_id.as_deref().unwrap_or(&self.id)
    }

    /// Comma-separated role labels for tables
    pub fn role_labels(&self) -> String {
        self.roles
            .iter()
            .map(|r| r.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Registration / edit form payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub family_id: Option<String>,
    pub pledge_amount: f64,
    pub roles: BTreeSet<Role>,
}

// ============================================================================
// DEPENDENT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relationship {
    #[serde(alias = "spouse", alias = "SPOUSE")]
    Spouse,
    #[serde(alias = "son", alias = "SON")]
    Son,
    #[serde(alias = "daughter", alias = "DAUGHTER")]
    Daughter,
    #[serde(other)]
    Other,
}

impl Relationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Spouse => "Spouse",
            Relationship::Son => "Son",
            Relationship::Daughter => "Daughter",
            Relationship::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependent {
    #[serde(default, deserialize_with = "wire::id")]
    pub id: String,

    #[serde(default, alias = "member_id", deserialize_with = "wire::opt_id")]
    pub member_id: Option<String>,

    #[serde(alias = "first_name")]
    pub first_name: String,

    #[serde(alias = "last_name")]
    pub last_name: String,

    pub relationship: Relationship,

    #[serde(default, alias = "date_of_birth", deserialize_with = "wire::opt_date")]
    pub date_of_birth: Option<NaiveDate>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub email: Option<String>,
}

impl Dependent {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// Age in whole years on `today`, if a birth date is known
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        self.date_of_birth.and_then(|dob| today.years_since(dob))
    }
}

/// Body of `POST /api/members/dependents/:id/promote`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteDependent {
    pub phone: String,
    pub email: Option<String>,
}

// ============================================================================
// HOUSEHOLD
// ============================================================================

/// Members and dependents sharing one family id
#[derive(Debug, Clone)]
pub struct Household {
    pub family_id: String,
    pub members: Vec<Member>,
}

impl Household {
    /// Collect the household that `head` belongs to out of `all`
    pub fn of(head: &Member, all: &[Member]) -> Self {
        let key = head.household_key().to_string();
        let mut members: Vec<Member> = all
            .iter()
            .filter(|m| m.household_key() == key && !m.is_deleted())
            .cloned()
            .collect();

        if !members.iter().any(|m| m.id == head.id) {
            members.insert(0, head.clone());
        }

        Household {
            family_id: key,
            members,
        }
    }

    /// Group a member list into households, ordered by family id
    pub fn group(all: &[Member]) -> Vec<Household> {
        let mut map: std::collections::BTreeMap<String, Vec<Member>> = std::collections::BTreeMap::new();
        for member in all.iter().filter(|m| !m.is_deleted()) {
            map.entry(member.household_key().to_string())
                .or_default()
                .push(member.clone());
        }
        map.into_iter()
            .map(|(family_id, members)| Household { family_id, members })
            .collect()
    }

    /// Sum of independent members' annual pledges
    pub fn pledge(&self) -> f64 {
        self.members.iter().map(|m| m.pledge_amount.max(0.0)).sum()
    }

    pub fn member_ids(&self) -> BTreeSet<&str> {
        self.members.iter().map(|m| m.id.as_str()).collect()
    }

    pub fn dependents(&self) -> impl Iterator<Item = &Dependent> {
        self.members.iter().flat_map(|m| m.dependents.iter())
    }

    /// Head of household: the earliest member in list order
    pub fn head(&self) -> Option<&Member> {
        self.members.first()
    }

    pub fn size(&self) -> usize {
        self.members.len() + self.dependents().count()
    }
}
