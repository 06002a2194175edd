//! Field checks shared by the server controllers and the client actions, so a
//! form rejected locally fails with the same text the server would send.

const REQUIRED_SUFFIX: &str = " is required<br/>";

/// Fields that are absent or blank, rendered as `"<name> is required<br/>"`
/// in the given order. `None` when every field is filled.
pub fn missing_fields<'a, I>(fields: I) -> Option<String>
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let message: String = fields
        .into_iter()
        .filter(|(_, value)| value.map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| format!("{name}{REQUIRED_SUFFIX}"))
        .collect();
    (!message.is_empty()).then_some(message)
}

/// Like [`missing_fields`] but only for fields that are being changed: an
/// absent field is left alone, a present blank one is rejected.
pub fn blank_updates<'a, I>(fields: I) -> Option<String>
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    missing_fields(fields.into_iter().filter(|(_, value)| value.is_some()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_missing_fields_in_order() {
        let message = missing_fields([
            ("username", Some("itunuworks")),
            ("password", None),
            ("email", Some("   ")),
        ]);
        assert_eq!(
            message.as_deref(),
            Some("password is required<br/>email is required<br/>")
        );
    }

    #[test]
    fn complete_fields_pass() {
        assert!(missing_fields([("title", Some("notes"))]).is_none());
    }

    #[test]
    fn blank_updates_ignore_absent_fields() {
        assert!(blank_updates([("email", None), ("username", Some("ada"))]).is_none());
        assert_eq!(
            blank_updates([("email", Some(""))]).as_deref(),
            Some("email is required<br/>")
        );
    }
}
