//! Predicate expression trees.
//!
//! A pushed-down predicate is a binary tree of operator nodes over operand
//! leaves (column references, scalar constants, value collections). The
//! tree arrives already parsed from the wire; this module defines its
//! shape, and [`prune`] narrows it to what a connector can honor.
//!
//! Invariants:
//! - Logical operators (AND/OR/NOT) have operator children.
//! - Comparison operators have one column child and one value child, or a
//!   single column child for unary IS NULL / IS NOT NULL.

pub mod prune;

pub use prune::{prune, prune_chain, SupportedOperatorPruner, SupportedTypesPruner, TreePruner};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operator tag carried by an operator node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    Equal,
    NotEqual,
    Like,
    In,
    IsNull,
    IsNotNull,
    And,
    Or,
    Not,
}

impl Operator {
    /// Logical operators combine other operator nodes; everything else
    /// compares a column against values.
    pub fn is_logical(&self) -> bool {
        matches!(self, Operator::And | Operator::Or | Operator::Not)
    }

    pub fn is_unary(&self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull | Operator::Not)
    }

    fn symbol(&self) -> &'static str {
        match self {
            Operator::LessThan => "<",
            Operator::GreaterThan => ">",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThanOrEqual => ">=",
            Operator::Equal => "=",
            Operator::NotEqual => "<>",
            Operator::Like => "LIKE",
            Operator::In => "IN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "NOT",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Declared type of a column or constant operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Numeric,
    Text,
    Varchar,
    Char,
    Bytea,
    Date,
    Timestamp,
}

/// One node of a predicate tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Operator over up to two children.
    Operator { op: Operator, children: Vec<Node> },
    /// Column reference leaf.
    Column {
        name: String,
        index: u32,
        data_type: DataType,
    },
    /// Scalar constant leaf, value kept in its wire (string) form.
    Scalar { value: String, data_type: DataType },
    /// Value collection leaf for IN-style predicates.
    Collection {
        values: Vec<String>,
        data_type: DataType,
    },
}

impl Node {
    pub fn column(name: impl Into<String>, index: u32, data_type: DataType) -> Self {
        Node::Column {
            name: name.into(),
            index,
            data_type,
        }
    }

    pub fn scalar(value: impl Into<String>, data_type: DataType) -> Self {
        Node::Scalar {
            value: value.into(),
            data_type,
        }
    }

    pub fn collection(values: Vec<String>, data_type: DataType) -> Self {
        Node::Collection { values, data_type }
    }

    /// Binary comparison: column on the left, value operand on the right.
    pub fn comparison(op: Operator, column: Node, value: Node) -> Self {
        Node::Operator {
            op,
            children: vec![column, value],
        }
    }

    /// Unary operator (IS NULL / IS NOT NULL over a column, NOT over an
    /// operator node).
    pub fn unary(op: Operator, child: Node) -> Self {
        Node::Operator {
            op,
            children: vec![child],
        }
    }

    pub fn and(left: Node, right: Node) -> Self {
        Node::Operator {
            op: Operator::And,
            children: vec![left, right],
        }
    }

    pub fn or(left: Node, right: Node) -> Self {
        Node::Operator {
            op: Operator::Or,
            children: vec![left, right],
        }
    }

    pub fn op(&self) -> Option<Operator> {
        match self {
            Node::Operator { op, .. } => Some(*op),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Operator { children, .. } => children,
            _ => &[],
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Column { name, .. } => write!(f, "{}", name),
            Node::Scalar { value, .. } => write!(f, "{}", value),
            Node::Collection { values, .. } => write!(f, "({})", values.join(",")),
            Node::Operator { op, children } => match (op, children.as_slice()) {
                (Operator::Not, [child]) => write!(f, "(NOT {})", child),
                (Operator::IsNull | Operator::IsNotNull, [column]) => {
                    write!(f, "({} {})", column, op)
                }
                (op, [left, right]) => write!(f, "({} {} {})", left, op, right),
                (op, children) => {
                    write!(f, "({}", op)?;
                    for child in children {
                        write!(f, " {}", child)?;
                    }
                    write!(f, ")")
                }
            },
        }
    }
}
