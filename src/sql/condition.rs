//! WHERE-clause conditions: `column <op> value`
//!
//! Operators are matched in a fixed order so that a shorter operator never
//! matches inside a longer one (`<=` is tried before `<` and `=`).

use std::{cmp::Ordering, fmt::Display};

use crate::{
    error::{Error, Result},
    sql::types::{unquote, Row},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    LessEqual,
    GreaterEqual,
    NotEqual,
    Equal,
    Less,
    Greater,
    In,
}

impl Operator {
    /// Matching order
    const PRECEDENCE: [Operator; 7] = [
        Operator::LessEqual,
        Operator::GreaterEqual,
        Operator::NotEqual,
        Operator::Equal,
        Operator::Less,
        Operator::Greater,
        Operator::In,
    ];

    pub fn to_str(&self) -> &str {
        match self {
            Operator::LessEqual => "<=",
            Operator::GreaterEqual => ">=",
            Operator::NotEqual => "!=",
            Operator::Equal => "=",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::In => " IN ",
        }
    }

    /// Byte offset of this operator in the condition text
    fn find(&self, condition: &str) -> Option<usize> {
        match self {
            // ASCII-only uppercasing keeps byte offsets stable
            Operator::In => condition.to_ascii_uppercase().find(self.to_str()),
            op => condition.find(op.to_str()),
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str().trim())
    }
}

/// A parsed filter condition
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Column operand, lowercased
    pub column: String,
    pub operator: Operator,
    /// Value operand with one layer of quotes stripped
    pub value: String,
}

impl Condition {
    pub fn parse(condition: &str) -> Result<Self> {
        let (operator, pos) = Operator::PRECEDENCE
            .iter()
            .find_map(|op| op.find(condition).map(|pos| (*op, pos)))
            .ok_or_else(|| Error::UnsupportedOperator(condition.to_string()))?;

        let column = condition[..pos].trim();
        let value = condition[pos + operator.to_str().len()..].trim();
        if column.is_empty() || value.is_empty() {
            return Err(Error::UnsupportedOperator(condition.to_string()));
        }

        Ok(Self {
            column: column.to_lowercase(),
            operator,
            value: unquote(value).to_string(),
        })
    }

    /// Values of an `IN (a, b, ...)` list
    fn in_list(&self) -> Vec<&str> {
        let list = self.value.trim();
        let list = list
            .strip_prefix('(')
            .and_then(|l| l.strip_suffix(')'))
            .unwrap_or(list);
        list.split(',').map(|v| unquote(v.trim())).collect()
    }

    /// Decides whether the row satisfies this condition
    pub fn evaluate(&self, row: &Row) -> bool {
        let actual = row.get(&self.column).and_then(|v| v.as_deref());
        match (self.operator, actual) {
            (Operator::Equal, actual) => actual == Some(self.value.as_str()),
            (Operator::NotEqual, actual) => actual != Some(self.value.as_str()),
            (Operator::In, Some(actual)) => self.in_list().contains(&actual),
            (_, None) => false,
            (Operator::LessEqual, Some(actual)) => compare_values(actual, &self.value).is_le(),
            (Operator::GreaterEqual, Some(actual)) => compare_values(actual, &self.value).is_ge(),
            (Operator::Less, Some(actual)) => compare_values(actual, &self.value).is_lt(),
            (Operator::Greater, Some(actual)) => compare_values(actual, &self.value).is_gt(),
        }
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.column, self.operator, self.value)
    }
}

/// Numeric comparison when both sides are numbers, lexical otherwise
pub fn compare_values(left: &str, right: &str) -> Ordering {
    if let (Ok(l), Ok(r)) = (left.trim().parse::<f64>(), right.trim().parse::<f64>()) {
        if let Some(ord) = l.partial_cmp(&r) {
            return ord;
        }
    }
    if let (Ok(l), Ok(r)) = (left.trim().parse::<i64>(), right.trim().parse::<i64>()) {
        return l.cmp(&r);
    }
    left.cmp(right)
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::{compare_values, Condition, Operator};
    use crate::{
        error::{Error, Result},
        sql::types::Row,
    };

    fn row(pairs: &[(&str, Option<&str>)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(|v| v.to_string())))
            .collect()
    }

    #[test]
    fn test_operator_precedence() -> Result<()> {
        let cases = [
            ("a <= 5", Operator::LessEqual),
            ("a >= 5", Operator::GreaterEqual),
            ("a != 5", Operator::NotEqual),
            ("a = 5", Operator::Equal),
            ("a < 5", Operator::Less),
            ("a > 5", Operator::Greater),
            ("a in (1, 2)", Operator::In),
            ("a<=5", Operator::LessEqual),
        ];
        for (text, op) in cases {
            let cond = Condition::parse(text)?;
            assert_eq!(cond.operator, op, "{}", text);
            assert_eq!(cond.column, "a");
        }
        assert_eq!(Condition::parse("a <= 5")?.value, "5");
        Ok(())
    }

    #[test]
    fn test_unsupported_operator() {
        assert!(matches!(
            Condition::parse("a LIKE 'x%'"),
            Err(Error::UnsupportedOperator(_))
        ));
        assert!(matches!(
            Condition::parse("a ="),
            Err(Error::UnsupportedOperator(_))
        ));
        // `IN` needs surrounding spaces to count as the keyword
        assert!(Condition::parse("inventory").is_err());
    }

    #[test]
    fn test_boundary_le_vs_lt() -> Result<()> {
        let five = row(&[("col", Some("5"))]);
        assert!(Condition::parse("col <= 5")?.evaluate(&five));
        assert!(!Condition::parse("col < 5")?.evaluate(&five));
        assert!(Condition::parse("col >= 5")?.evaluate(&five));
        assert!(!Condition::parse("col > 5")?.evaluate(&five));
        Ok(())
    }

    #[test]
    fn test_equality_is_exact_string_match() -> Result<()> {
        let r = row(&[("name", Some("Alice")), ("score", Some("5.0"))]);
        assert!(Condition::parse("name = 'Alice'")?.evaluate(&r));
        assert!(Condition::parse("NAME = \"Alice\"")?.evaluate(&r));
        assert!(!Condition::parse("name = alice")?.evaluate(&r));
        assert!(!Condition::parse("score = 5")?.evaluate(&r));
        assert!(Condition::parse("score != 5")?.evaluate(&r));
        Ok(())
    }

    #[test]
    fn test_absent_values() -> Result<()> {
        let r = row(&[("name", None)]);
        assert!(!Condition::parse("name = null")?.evaluate(&r));
        assert!(Condition::parse("name != 'x'")?.evaluate(&r));
        assert!(!Condition::parse("name < 'x'")?.evaluate(&r));
        assert!(!Condition::parse("name IN ('x')")?.evaluate(&r));
        Ok(())
    }

    #[test]
    fn test_in_list() -> Result<()> {
        let r = row(&[("city", Some("Paris")), ("id", Some("3"))]);
        assert!(Condition::parse("city IN ('Paris', 'Rome')")?.evaluate(&r));
        assert!(Condition::parse("id in (1,2,3)")?.evaluate(&r));
        assert!(!Condition::parse("id IN (1, 2)")?.evaluate(&r));
        Ok(())
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(compare_values("10", "9"), Ordering::Greater);
        assert_eq!(compare_values("2.5", "10"), Ordering::Less);
        assert_eq!(compare_values("-1", "1"), Ordering::Less);
        assert_eq!(compare_values("apple", "banana"), Ordering::Less);
        // mixed falls back to lexical
        assert_eq!(compare_values("10", "abc"), Ordering::Less);
    }
}
