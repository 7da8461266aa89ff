//! Table identifiers and the representative query template

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_REPRESENTATIVE_QUERY, TABLE_PLACEHOLDER};
use crate::errors::{Result, StatSamplerError};

/// A validated, optionally schema-qualified table identifier.
///
/// Accepts `name` or `schema.name`. Each part is either a bare identifier
/// (a letter or underscore followed by letters, digits, `_` or `$`), folded to
/// lower case the way PostgreSQL folds unquoted names, or a double-quoted
/// identifier kept exactly as written (`""` escapes a quote). Generated SQL
/// always uses the quoted form, so the folded name is what the server sees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName {
    schema: Option<String>,
    name: String,
}

impl TableName {
    /// Parse and validate a table identifier.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let mut parts = split_parts(trimmed)?.into_iter();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(name), None, _) => Ok(Self { schema: None, name }),
            (Some(schema), Some(name), None) => Ok(Self { schema: Some(schema), name }),
            _ => Err(invalid(trimmed, "too many dot-separated parts")),
        }
    }

    /// Unqualified table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema qualifier, if one was given.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Identifier rendered with double quotes, safe to splice into SQL.
    pub fn quoted(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", quote_ident(schema), quote_ident(&self.name)),
            None => quote_ident(&self.name),
        }
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn split_parts(raw: &str) -> Result<Vec<String>> {
    let mut parts = Vec::new();
    let mut chars = raw.chars().peekable();

    loop {
        let part = if chars.peek() == Some(&'"') {
            chars.next();
            let mut ident = String::new();
            loop {
                match chars.next() {
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        ident.push('"');
                    }
                    Some('"') => break,
                    Some('\0') => return Err(invalid(raw, "identifier contains a NUL byte")),
                    Some(c) => ident.push(c),
                    None => return Err(invalid(raw, "unterminated quoted identifier")),
                }
            }
            if ident.is_empty() {
                return Err(invalid(raw, "empty identifier"));
            }
            ident
        } else {
            let mut bare = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                bare.push(c);
                chars.next();
            }
            validate_bare(raw, &bare)?;
            bare.to_ascii_lowercase()
        };

        if part.len() > 63 {
            return Err(invalid(raw, "identifier longer than 63 bytes"));
        }
        parts.push(part);

        match chars.next() {
            None => return Ok(parts),
            Some('.') => {}
            Some(_) => return Err(invalid(raw, "unexpected text after quoted identifier")),
        }
    }
}

fn validate_bare(raw: &str, part: &str) -> Result<()> {
    let mut chars = part.chars();
    match chars.next() {
        None => return Err(invalid(raw, "empty identifier")),
        Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
            return Err(invalid(raw, "identifier must start with a letter or underscore"));
        }
        Some(_) => {}
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
        return Err(invalid(raw, "identifier contains unsupported characters"));
    }
    Ok(())
}

/// Whether `part` reads back unchanged when written without quotes.
fn is_plain(part: &str) -> bool {
    let mut chars = part.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$')
}

fn display_part(part: &str) -> String {
    if is_plain(part) {
        part.to_string()
    } else {
        quote_ident(part)
    }
}

fn invalid(raw: &str, reason: &str) -> StatSamplerError {
    StatSamplerError::Config(format!("invalid table name '{raw}': {reason}"))
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", display_part(schema), display_part(&self.name)),
            None => f.write_str(&display_part(&self.name)),
        }
    }
}

impl FromStr for TableName {
    type Err = StatSamplerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TableName {
    type Error = StatSamplerError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<TableName> for String {
    fn from(value: TableName) -> Self {
        value.to_string()
    }
}

const MODIFYING_KEYWORDS: [&str; 6] = ["INSERT", "UPDATE", "DELETE", "MERGE", "TRUNCATE", "INTO"];

/// Query template executed under EXPLAIN to observe planner behaviour.
///
/// One template is used for every table of a LEARN run so plan costs stay
/// comparable across the training corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepresentativeQuery(String);

impl RepresentativeQuery {
    /// Build a template; it must reference the table through `{table}`.
    ///
    /// The template runs under `EXPLAIN ANALYZE`, which executes it, so only a
    /// single read-only `SELECT` or `WITH ... SELECT` statement is accepted.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        let reject = |reason: &str| {
            StatSamplerError::Config(format!("representative query {reason}: {template}"))
        };

        if !template.contains(TABLE_PLACEHOLDER) {
            return Err(reject(&format!("must contain {TABLE_PLACEHOLDER}")));
        }

        let words: Vec<String> = template
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .filter(|w| !w.is_empty())
            .map(str::to_ascii_uppercase)
            .collect();
        match words.first().map(String::as_str) {
            Some("SELECT" | "WITH") => {}
            _ => return Err(reject("must start with SELECT or WITH")),
        }
        if words.iter().any(|w| MODIFYING_KEYWORDS.contains(&w.as_str())) {
            return Err(reject("must not modify data"));
        }
        if template.trim_end().trim_end_matches(';').contains(';') {
            return Err(reject("must be a single statement"));
        }

        Ok(Self(template))
    }

    /// Raw template text.
    pub fn template(&self) -> &str {
        &self.0
    }

    /// Substitute the quoted table identifier into the template.
    pub fn render(&self, table: &TableName) -> String {
        self.0.replace(TABLE_PLACEHOLDER, &table.quoted())
    }
}

impl Default for RepresentativeQuery {
    fn default() -> Self {
        Self(DEFAULT_REPRESENTATIVE_QUERY.to_string())
    }
}

impl TryFrom<String> for RepresentativeQuery {
    type Error = StatSamplerError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RepresentativeQuery> for String {
    fn from(value: RepresentativeQuery) -> Self {
        value.0
    }
}
