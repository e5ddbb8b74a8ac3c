//! Identifier and title normalisation.

/// Turn a human name into a GoodData identifier fragment.
pub fn to_identifier(text: &str) -> String {
    text.to_lowercase()
}

/// Normalise a visual title.
pub fn to_title(text: &str) -> String {
    text.trim().to_string()
}

/// A literal usable in MAQL/DML `IN (...)` lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Int(i64),
    Text(String),
}

impl Literal {
    /// Render the literal the way MAQL expects: integers bare, text quoted.
    pub fn to_maql(&self) -> String {
        match self {
            Literal::Int(i) => i.to_string(),
            Literal::Text(s) => format!("\"{}\"", s),
        }
    }
}

/// Render a value as a MAQL literal.
pub fn gd_literal(value: impl Into<Literal>) -> String {
    value.into().to_maql()
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Text(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_is_lowercase() {
        assert_eq!(to_identifier("Test"), "test");
        assert_eq!(to_identifier(""), "");
    }

    #[test]
    fn title_is_trimmed() {
        assert_eq!(to_title("  Pay Day "), "Pay Day");
    }

    #[test]
    fn literals() {
        assert_eq!(Literal::from("d1").to_maql(), "\"d1\"");
        assert_eq!(Literal::from(42).to_maql(), "42");
        assert_eq!(gd_literal("Boston"), "\"Boston\"");
    }
}
