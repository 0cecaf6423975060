use kernel::validation::{self, Validator};
use serde::{Deserialize, Serialize};

use crate::snippets::entity::NewSnippet;

const TITLE_MAX_CHARS: usize = 100;
const PERMITTED_EXPIRY_DAYS: [i64; 3] = [1, 7, 365];

/// Snippet creation form
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnippetCreateForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub expires: String,
}

impl Default for SnippetCreateForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            expires: "365".to_string(),
        }
    }
}

impl SnippetCreateForm {
    pub fn validate(&self) -> Result<NewSnippet, Validator> {
        let mut v = Validator::new();

        v.check_field(validation::not_blank(&self.title), "title", "This field cannot be blank");
        v.check_field(
            validation::max_chars(&self.title, TITLE_MAX_CHARS),
            "title",
            format!("This field cannot be more than {TITLE_MAX_CHARS} characters long"),
        );
        v.check_field(
            validation::not_blank(&self.content),
            "content",
            "This field cannot be blank",
        );

        let expires = self.expires.trim().parse::<i64>().ok();
        v.check_field(
            expires.is_some_and(|days| validation::permitted(&days, &PERMITTED_EXPIRY_DAYS)),
            "expires",
            "This field must equal 1, 7 or 365",
        );

        match expires {
            Some(expires_days) if v.valid() => Ok(NewSnippet {
                title: self.title.clone(),
                content: self.content.clone(),
                expires_days,
            }),
            _ => Err(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(title: &str, content: &str, expires: &str) -> SnippetCreateForm {
        SnippetCreateForm {
            title: title.to_string(),
            content: content.to_string(),
            expires: expires.to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        let new = form("O snail", "Climb Mount Fuji", "7").validate().unwrap();
        assert_eq!(new.expires_days, 7);
    }

    #[test]
    fn test_invalid_form() {
        let errors = form("", " ", "30").validate().unwrap_err();
        assert_eq!(errors.field_errors.len(), 3);
        assert_eq!(errors.field_errors["expires"], "This field must equal 1, 7 or 365");

        let long_title = "a".repeat(101);
        let errors = form(&long_title, "x", "1").validate().unwrap_err();
        assert_eq!(
            errors.field_errors["title"],
            "This field cannot be more than 100 characters long"
        );

        let errors = form("t", "c", "soon").validate().unwrap_err();
        assert!(errors.field_errors.contains_key("expires"));
    }
}
