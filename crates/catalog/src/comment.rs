use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{CommentId, DomainResult, ProductId, UserId};

use crate::{Owned, validate};

/// A user's comment on a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Comment {
    fn owner_id(&self) -> UserId {
        self.user_id
    }
}

/// Create-comment request. The author comes from the session, never the body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComment {
    pub text: String,
    pub product_id: ProductId,
}

impl CreateComment {
    pub fn validate(&self) -> DomainResult<()> {
        validate_text(&self.text)
    }

    pub fn by(self, user_id: UserId) -> NewComment {
        NewComment {
            text: self.text,
            product_id: self.product_id,
            user_id,
        }
    }
}

/// Insert payload for a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub text: String,
    pub product_id: ProductId,
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateComment {
    pub text: String,
}

impl UpdateComment {
    pub fn validate(&self) -> DomainResult<()> {
        validate_text(&self.text)
    }
}

fn validate_text(text: &str) -> DomainResult<()> {
    validate::length("text", text, 5, 500)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_comment_reads_camel_case_product_id() {
        let body: CreateComment =
            serde_json::from_str(r#"{"text":"great value","productId":3}"#).unwrap();
        assert_eq!(body.product_id, ProductId::new(3));
        assert!(body.validate().is_ok());

        let new = body.by(UserId::new(8));
        assert_eq!(new.user_id, UserId::new(8));
    }

    #[test]
    fn text_bounds() {
        assert!(UpdateComment { text: "meh".to_string() }.validate().is_err());
        assert!(UpdateComment { text: "x".repeat(501) }.validate().is_err());
        assert!(UpdateComment { text: "x".repeat(500) }.validate().is_ok());
    }
}
