//! Resource name format: 3-50 chars of `a-z`, `0-9` and `-`, no hyphen at either end.

pub const MIN_NAME_LEN: usize = 3;
pub const MAX_NAME_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameViolation {
    Length,
    Charset,
    EdgeHyphen,
}

impl NameViolation {
    pub fn message(self) -> String {
        match self {
            NameViolation::Length => {
                format!("must be between {MIN_NAME_LEN} and {MAX_NAME_LEN} characters")
            }
            NameViolation::Charset => {
                "must contain only lowercase letters, digits and hyphens".to_string()
            }
            NameViolation::EdgeHyphen => "must not start or end with a hyphen".to_string(),
        }
    }
}

/// Check a resource name, reporting the first rule it breaks.
pub fn check_name(name: &str) -> Result<(), NameViolation> {
    let len = name.chars().count();
    if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len) {
        return Err(NameViolation::Length);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(NameViolation::Charset);
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(NameViolation::EdgeHyphen);
    }
    Ok(())
}
