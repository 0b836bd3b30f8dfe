// Member registry endpoints: /api/members/*

use super::{fail_open, segment, ApiClient, ApiResult};
use crate::access::Role;
use crate::entities::{Dependent, Member, MemberDraft, PromoteDependent};
use crate::phone;
use crate::validation;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeSet;
use tracing::info;

#[derive(Debug, Deserialize)]
struct PhoneCheck {
    #[serde(default)]
    exists: bool,
}

impl ApiClient {
    pub async fn list_members(&self) -> ApiResult<Vec<Member>> {
        self.get("/api/members", &[], Some("members")).await
    }

    pub async fn get_member(&self, member_id: &str) -> ApiResult<Member> {
        self.get(&format!("/api/members/{}", segment(member_id)), &[], Some("member"))
            .await
    }

    /// Validate, then register a new member
    pub async fn register_member(&self, draft: &MemberDraft) -> ApiResult<Member> {
        validation::validate_registration(draft)?;
        let body = normalized(draft);
        let member: Member = self.post("/api/members/register", &body, Some("member")).await?;
        info!(member_id = %member.id, "member registered");
        Ok(member)
    }

    pub async fn update_member(&self, member_id: &str, draft: &MemberDraft) -> ApiResult<Member> {
        validation::validate_registration(draft)?;
        let body = normalized(draft);
        self.put(&format!("/api/members/{}", segment(member_id)), &body, Some("member"))
            .await
    }

    /// Soft delete; the backend keeps the record with status "deleted"
    pub async fn delete_member(&self, member_id: &str) -> ApiResult<()> {
        self.send_no_content(Method::DELETE, &format!("/api/members/{}", segment(member_id)))
            .await?;
        info!(member_id, "member deleted");
        Ok(())
    }

    pub async fn update_roles(&self, member_id: &str, roles: &BTreeSet<Role>) -> ApiResult<Member> {
        self.put(
            &format!("/api/members/{}/roles", segment(member_id)),
            &json!({ "roles": roles }),
            Some("member"),
        )
        .await
    }

    /// Whether a phone number is already registered. Fails open: when the
    /// check itself fails, registration is not blocked.
    pub async fn phone_exists(&self, phone_number: &str) -> bool {
        let Some(digits) = phone::normalize(phone_number) else {
            return false;
        };
        let result: ApiResult<PhoneCheck> = self
            .get("/api/members/check-phone", &[("phone", digits)], None)
            .await;
        fail_open("phone duplicate check", result.map(|c| c.exists))
    }

    pub async fn list_dependents(&self, member_id: &str) -> ApiResult<Vec<Dependent>> {
        self.get(
            &format!("/api/members/{}/dependents", segment(member_id)),
            &[],
            Some("dependents"),
        )
        .await
    }

    pub async fn add_dependent(&self, member_id: &str, dependent: &Dependent) -> ApiResult<Dependent> {
        self.post(
            &format!("/api/members/{}/dependents", segment(member_id)),
            dependent,
            Some("dependent"),
        )
        .await
    }

    /// Turn a dependent into an independent member with their own phone
    pub async fn promote_dependent(&self, dependent_id: &str, request: &PromoteDependent) -> ApiResult<Member> {
        validation::validate_promotion(&request.phone)?;
        let body = PromoteDependent {
            phone: phone::normalize(&request.phone).unwrap_or_else(|| request.phone.clone()),
            email: request.email.clone(),
        };
        let member: Member = self
            .post(
                &format!("/api/members/dependents/{}/promote", segment(dependent_id)),
                &body,
                Some("member"),
            )
            .await?;
        info!(dependent_id, member_id = %member.id, "dependent promoted");
        Ok(member)
    }
}

/// Registration body with the phone reduced to its ten digits
fn normalized(draft: &MemberDraft) -> MemberDraft {
    let mut body = draft.clone();
    if let Some(digits) = phone::normalize(&draft.phone) {
        body.phone = digits;
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiError, StaticToken};
    use std::sync::Arc;

    fn offline_client() -> ApiClient {
        // Port 9 (discard) on localhost: nothing listens, every call fails fast
        ApiClient::with_http(reqwest::Client::new(), "http://127.0.0.1:9", Arc::new(StaticToken::new("t")))
    }

    #[test]
    fn test_normalized_phone() {
        let draft = MemberDraft {
            phone: "(555) 123-4567".to_string(),
            ..Default::default()
        };
        assert_eq!(normalized(&draft).phone, "5551234567");
    }

    #[tokio::test]
    async fn test_phone_check_fails_open() {
        assert!(!offline_client().phone_exists("5551234567").await);
    }

    #[tokio::test]
    async fn test_register_blocks_invalid_form() {
        let draft = MemberDraft::default();
        let err = offline_client().register_member(&draft).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref errors) if errors.len() == 3));
    }

    #[tokio::test]
    async fn test_promotion_requires_phone() {
        let request = PromoteDependent {
            phone: "123".to_string(),
            email: None,
        };
        let err = offline_client().promote_dependent("4", &request).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
