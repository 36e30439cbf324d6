//! Row predicates and column changes
//!
//! Statements never splice caller values into SQL text: values always travel
//! as bound parameters, and names are checked as plain identifiers.

use sqlx::{QueryBuilder, Sqlite};

use super::error::{StoreError, StoreResult};
use super::record::Value;

/// Check that `name` is a plain SQL identifier (`[A-Za-z_][A-Za-z0-9_]*`)
pub fn check_identifier(name: &str) -> StoreResult<&str> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(name)
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    Eq(String, Value),
    Sql(String, Vec<Value>),
}

/// Restricts an update, delete or select to a subset of rows.
///
/// An empty predicate matches every row. That is deliberate for
/// `Predicate::all()`, so callers deleting or updating must build a
/// restrictive one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    /// Match every row of the table
    pub fn all() -> Self {
        Self::default()
    }

    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and_eq(column, value)
    }

    /// Raw fragment with positional `?` placeholders, one per argument
    pub fn sql(fragment: impl Into<String>, args: Vec<Value>) -> Self {
        let fragment = fragment.into();
        if fragment.trim().is_empty() && args.is_empty() {
            return Self::all();
        }
        Self {
            clauses: vec![Clause::Sql(fragment, args)],
        }
    }

    pub fn and_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Eq(column.into(), value.into()));
        self
    }

    pub fn and(mut self, other: Predicate) -> Self {
        self.clauses.extend(other.clauses);
        self
    }

    pub fn is_all(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Validate names and placeholder counts before anything is sent
    pub(crate) fn validate(&self) -> StoreResult<()> {
        for clause in &self.clauses {
            match clause {
                Clause::Eq(column, _) => {
                    check_identifier(column)?;
                }
                Clause::Sql(fragment, args) => {
                    let placeholders = placeholder_offsets(fragment)?.len();
                    if placeholders != args.len() {
                        return Err(StoreError::PlaceholderMismatch {
                            placeholders,
                            args: args.len(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Append ` WHERE ...` to the builder. Must be validated first.
    pub(crate) fn push_where(self, qb: &mut QueryBuilder<'_, Sqlite>) {
        if self.clauses.is_empty() {
            return;
        }

        qb.push(" WHERE ");
        for (idx, clause) in self.clauses.into_iter().enumerate() {
            if idx > 0 {
                qb.push(" AND ");
            }
            match clause {
                Clause::Eq(column, value) => {
                    qb.push(column).push(" = ");
                    value.push_bind(qb);
                }
                Clause::Sql(fragment, args) => {
                    let offsets = placeholder_offsets(&fragment).unwrap_or_default();
                    qb.push("(");
                    let mut start = 0;
                    for (offset, arg) in offsets.into_iter().zip(args) {
                        qb.push(&fragment[start..offset]);
                        arg.push_bind(qb);
                        start = offset + 1;
                    }
                    qb.push(&fragment[start..]);
                    qb.push(")");
                }
            }
        }
    }
}

/// Byte offsets of the bare `?` placeholders in `fragment`.
///
/// Quoted spans (`'...'`, `"..."`, `` `...` ``) are skipped. Numbered or named
/// forms such as `?1` are rejected.
fn placeholder_offsets(fragment: &str) -> StoreResult<Vec<usize>> {
    let bytes = fragment.as_bytes();
    let mut offsets = Vec::new();
    let mut quote: Option<u8> = None;

    for (idx, &byte) in bytes.iter().enumerate() {
        match quote {
            // `''` closes and reopens the span
            Some(q) if byte == q => quote = None,
            Some(_) => {}
            None => match byte {
                b'\'' | b'"' | b'`' => quote = Some(byte),
                b'?' => {
                    let numbered = bytes
                        .get(idx + 1)
                        .is_some_and(|next| next.is_ascii_alphanumeric() || *next == b'_');
                    if numbered {
                        let end = bytes[idx + 1..]
                            .iter()
                            .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_'))
                            .map_or(bytes.len(), |len| idx + 1 + len);
                        return Err(StoreError::InvalidPlaceholder(fragment[idx..end].to_string()));
                    }
                    offsets.push(idx);
                }
                _ => {}
            },
        }
    }

    Ok(offsets)
}

/// Columns to set in an update, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes {
    columns: Vec<(String, Value)>,
}

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `column` to `value`, replacing an earlier value for the same column
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(c, _)| *c == column) {
            Some(existing) => existing.1 = value,
            None => self.columns.push((column, value)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(c, _)| c.as_str())
    }

    pub(crate) fn validate(&self) -> StoreResult<()> {
        if self.columns.is_empty() {
            return Err(StoreError::EmptyChanges);
        }
        for (column, _) in &self.columns {
            check_identifier(column)?;
        }
        Ok(())
    }

    /// Append `SET a = ?, b = ?`. Must be validated first.
    pub(crate) fn push_set(self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" SET ");
        for (idx, (column, value)) in self.columns.into_iter().enumerate() {
            if idx > 0 {
                qb.push(", ");
            }
            qb.push(column).push(" = ");
            value.push_bind(qb);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(predicate: Predicate) -> String {
        let mut qb = QueryBuilder::<Sqlite>::new("DELETE FROM books");
        predicate.push_where(&mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn test_check_identifier() {
        assert!(check_identifier("books").is_ok());
        assert!(check_identifier("_tmp1").is_ok());
        assert!(check_identifier("").is_err());
        assert!(check_identifier("1books").is_err());
        assert!(check_identifier("books; DROP TABLE books").is_err());
        assert!(check_identifier("name = 'x'").is_err());
    }

    #[test]
    fn test_empty_predicate_matches_everything() {
        assert!(Predicate::all().is_all());
        assert!(Predicate::sql("", vec![]).is_all());
        assert_eq!(render(Predicate::all()), "DELETE FROM books");
    }

    #[test]
    fn test_predicate_binds_values() {
        let predicate = Predicate::eq("id", "abc").and(Predicate::sql("name <> ?", vec!["x".into()]));
        predicate.validate().unwrap();
        assert_eq!(
            render(predicate),
            "DELETE FROM books WHERE id = ? AND (name <> ?)"
        );
    }

    #[test]
    fn test_placeholder_mismatch() {
        let err = Predicate::sql("id = ? OR id = ?", vec!["a".into()])
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::PlaceholderMismatch { placeholders: 2, args: 1 }
        ));
    }

    #[test]
    fn test_quoted_question_marks_are_literal() {
        let predicate = Predicate::sql("name = 'what?' AND id = ?", vec!["abc".into()]);
        predicate.validate().unwrap();
        assert_eq!(
            render(predicate),
            "DELETE FROM books WHERE (name = 'what?' AND id = ?)"
        );

        let predicate = Predicate::sql(r#"name = 'it''s ?' AND "odd?col" = ?"#, vec!["x".into()]);
        predicate.validate().unwrap();

        // the argument has nowhere to go
        let err = Predicate::sql("name = '?'", vec!["x".into()])
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::PlaceholderMismatch { placeholders: 0, args: 1 }
        ));
    }

    #[test]
    fn test_numbered_placeholders_rejected() {
        let err = Predicate::sql("id = ?1", vec!["a".into()])
            .validate()
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPlaceholder(p) if p == "?1"));

        let err = Predicate::sql("id = ?12 OR id = ?", vec!["a".into(), "b".into()])
            .validate()
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPlaceholder(p) if p == "?12"));
    }

    #[test]
    fn test_predicate_rejects_bad_column() {
        let err = Predicate::eq("id = id --", "x").validate().unwrap_err();
        assert!(matches!(err, StoreError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_changes() {
        assert!(matches!(
            Changes::new().validate(),
            Err(StoreError::EmptyChanges)
        ));

        let changes = Changes::new().set("name", "a").set("name", "b");
        assert_eq!(changes.columns().collect::<Vec<_>>(), vec!["name"]);

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE books");
        changes.push_set(&mut qb);
        assert_eq!(qb.sql(), "UPDATE books SET name = ?");
    }
}
