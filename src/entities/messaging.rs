// 📨 Messaging Entities - SMS broadcast, groups and voicemail review

use crate::entities::wire;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// GROUPS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,

    pub name: String,

    #[serde(default, alias = "member_count")]
    pub member_count: u32,

    #[serde(default = "default_active", alias = "is_active", alias = "isActive")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

// ============================================================================
// SMS
// ============================================================================

/// Who a broadcast goes to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SmsRecipients {
    AllMembers,
    Department {
        #[serde(rename = "departmentId")]
        department_id: String,
    },
    Group {
        #[serde(rename = "groupId")]
        group_id: String,
    },
    /// Explicit E.164 numbers
    Phones { phones: Vec<String> },
}

impl SmsRecipients {
    pub fn is_empty(&self) -> bool {
        match self {
            SmsRecipients::AllMembers => false,
            SmsRecipients::Department { department_id } => department_id.trim().is_empty(),
            SmsRecipients::Group { group_id } => group_id.trim().is_empty(),
            SmsRecipients::Phones { phones } => phones.iter().all(|p| p.trim().is_empty()),
        }
    }
}

/// Body of `POST /api/sms/send`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsDraft {
    pub message: String,
    pub recipients: SmsRecipients,
}

/// Backend answer to a broadcast
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsSendResult {
    #[serde(default, alias = "sent_count", alias = "sent")]
    pub sent_count: u32,

    #[serde(default, alias = "failed_count", alias = "failed")]
    pub failed_count: u32,

    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsLog {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,

    pub message: String,

    #[serde(default, alias = "recipient_count")]
    pub recipient_count: u32,

    #[serde(default, alias = "sent_by")]
    pub sent_by: Option<String>,

    #[serde(default, alias = "created_at")]
    pub created_at: Option<DateTime<Utc>>,
}

// ============================================================================
// VOICEMAIL
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voicemail {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,

    #[serde(alias = "from_number", alias = "from", alias = "caller")]
    pub from_number: String,

    #[serde(default, alias = "caller_name")]
    pub caller_name: Option<String>,

    #[serde(default, alias = "recording_url")]
    pub recording_url: Option<String>,

    #[serde(default)]
    pub transcription: Option<String>,

    /// Seconds
    #[serde(default, alias = "recording_duration", alias = "duration")]
    pub duration: u32,

    #[serde(default, alias = "created_at")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, alias = "is_listened", alias = "isListened")]
    pub listened: bool,
}

impl Voicemail {
    /// Duration as m:ss
    pub fn duration_label(&self) -> String {
        format!("{}:{:02}", self.duration / 60, self.duration % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipients_tagging() {
        let r = SmsRecipients::Department {
            department_id: "12".to_string(),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json, serde_json::json!({"type": "department", "departmentId": "12"}));

        let all: SmsRecipients = serde_json::from_str(r#"{"type": "all_members"}"#).unwrap();
        assert_eq!(all, SmsRecipients::AllMembers);
    }

    #[test]
    fn test_recipients_empty() {
        assert!(SmsRecipients::Phones { phones: vec![" ".to_string()] }.is_empty());
        assert!(!SmsRecipients::AllMembers.is_empty());
    }

    #[test]
    fn test_voicemail_decode() {
        let json = r#"{
            "id": 31,
            "from_number": "+15551234567",
            "recording_duration": 75,
            "created_at": "2024-05-01T14:03:00Z",
            "is_listened": true
        }"#;
        let vm: Voicemail = serde_json::from_str(json).unwrap();
        assert_eq!(vm.duration_label(), "1:15");
        assert!(vm.listened);
        assert!(vm.created_at.is_some());
    }
}
