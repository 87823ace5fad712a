//! Logins are email addresses; the part after `@` is the user's domain.

/// Everything after the first `@`, or the whole string when there is none.
pub fn domain_from_email(email: &str) -> &str {
    match email.find('@') {
        Some(at) => &email[at + 1..],
        None => email,
    }
}

/// Everything before the first `@`.
pub fn username_from_email(email: &str) -> Option<&str> {
    email.find('@').map(|at| &email[..at])
}

pub fn email_from_username_and_domain(username: &str, domain: &str) -> String {
    format!("{}@{}", username, domain)
}
