pub mod bookmark;
pub mod tag;
pub mod user;

#[cfg(test)]
pub(crate) mod test_support;

pub use bookmark::{BookmarkFilter, BookmarkRepository, BookmarkRepositoryTrait};
pub use tag::{TagRepository, TagRepositoryTrait};
pub use user::{UserRepository, UserRepositoryTrait};

/// Escapes `%`, `_` and `\` so user input matches literally inside `LIKE`/`ILIKE`.
pub(crate) fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// True when `err` wraps a Postgres unique-constraint violation.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|e| e.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::{escape_like, is_unique_violation};

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_plain_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&anyhow::anyhow!("duplicate key")));
        assert!(!is_unique_violation(&anyhow::Error::from(sqlx::Error::RowNotFound)));
    }
}
