// SMS broadcast and voicemail review endpoints

use super::{segment, ApiClient, ApiResult};
use crate::entities::{SmsDraft, SmsLog, SmsRecipients, SmsSendResult, Voicemail};
use crate::phone;
use crate::validation;
use reqwest::Method;
use serde_json::json;
use tracing::info;

impl ApiClient {
    /// Validate, then broadcast. Explicit phone lists are sent in E.164.
    pub async fn send_sms(&self, draft: &SmsDraft) -> ApiResult<SmsSendResult> {
        validation::validate_sms(draft)?;

        let recipients = match &draft.recipients {
            SmsRecipients::Phones { phones } => SmsRecipients::Phones {
                phones: phones
                    .iter()
                    .filter_map(|p| phone::to_e164(p))
                    .collect(),
            },
            other => other.clone(),
        };
        let body = SmsDraft {
            message: draft.message.clone(),
            recipients,
        };

        let result: SmsSendResult = self.post("/api/sms/send", &body, None).await?;
        info!(sent = result.sent_count, failed = result.failed_count, "sms broadcast sent");
        Ok(result)
    }

    pub async fn sms_logs(&self) -> ApiResult<Vec<SmsLog>> {
        self.get("/api/sms/logs", &[], Some("logs")).await
    }

    pub async fn list_voicemails(&self) -> ApiResult<Vec<Voicemail>> {
        self.get("/api/twilio/admin/voicemails", &[], Some("voicemails"))
            .await
    }

    pub async fn mark_voicemail_listened(&self, voicemail_id: &str) -> ApiResult<()> {
        let _: serde_json::Value = self
            .put(
                &format!("/api/twilio/admin/voicemails/{}/listened", segment(voicemail_id)),
                &json!({ "listened": true }),
                None,
            )
            .await?;
        Ok(())
    }

    pub async fn delete_voicemail(&self, voicemail_id: &str) -> ApiResult<()> {
        self.send_no_content(
            Method::DELETE,
            &format!("/api/twilio/admin/voicemails/{}", segment(voicemail_id)),
        )
        .await
    }
}
