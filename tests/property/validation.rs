//! Property-based tests for request validation.
//!
//! Uses proptest to verify:
//! 1. Any title with a non-whitespace character within the limit is accepted.
//! 2. Whitespace-only titles are always rejected as empty.
//! 3. Titles longer than the limit are always rejected, counting characters.
//! 4. Every positive `i64` rendered in decimal parses back to itself.
//! 5. Arbitrary strings never panic `parse_task_id`, and anything accepted is
//!    a plain positive decimal.

use proptest::prelude::*;
use tasklist_proto::task::{
    CreateTaskRequest, MAX_TITLE_LENGTH, TitleError, parse_task_id, validate_title,
};

/// Strategy for titles that contain at least one visible character.
fn arb_valid_title() -> impl Strategy<Value = String> {
    ("[ \t]{0,8}", "[^\\s]", ".{0,200}")
        .prop_map(|(lead, visible, rest)| format!("{lead}{visible}{rest}"))
        .prop_filter("within limit", |t| t.chars().count() <= MAX_TITLE_LENGTH)
}

proptest! {
    #[test]
    fn visible_titles_within_limit_are_accepted(title in arb_valid_title()) {
        prop_assert!(validate_title(&title, MAX_TITLE_LENGTH).is_ok());
    }

    #[test]
    fn whitespace_titles_are_empty(title in "[ \t\r\n]{0,64}") {
        prop_assert_eq!(validate_title(&title, MAX_TITLE_LENGTH), Err(TitleError::Empty));
    }

    #[test]
    fn long_titles_are_rejected(extra in 1usize..64, ch in "[a-zé日]") {
        let title = ch.repeat(MAX_TITLE_LENGTH + extra);
        prop_assert_eq!(
            validate_title(&title, MAX_TITLE_LENGTH),
            Err(TitleError::TooLong { len: MAX_TITLE_LENGTH + extra, max: MAX_TITLE_LENGTH })
        );
    }

    #[test]
    fn positive_ids_parse(id in 1i64..=i64::MAX) {
        prop_assert_eq!(parse_task_id(&id.to_string()), Ok(id));
    }

    #[test]
    fn parse_never_panics_and_accepts_only_digits(segment in ".{0,32}") {
        if let Ok(id) = parse_task_id(&segment) {
            prop_assert!(id > 0);
            prop_assert!(segment.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn create_request_decodes_any_string_title(title in ".{0,64}") {
        let json = serde_json::json!({ "title": title.clone() }).to_string();
        let request: CreateTaskRequest = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(request.title, title);
    }
}
