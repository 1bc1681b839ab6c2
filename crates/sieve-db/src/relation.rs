//! SQL relation
//!
//! A [`Relation`] that accumulates a `SELECT` statement: a condition tree
//! with `?` placeholders, joins, ordering and a page window. Rendering
//! numbers the placeholders as PostgreSQL positional parameters (`$1`, `$2`,
//! ...) in statement order.

use serde::Serialize;

use sieve_queries::{Relation, SortDirection};

/// Parameter for prepared statements
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    Int(i64),
    String(String),
    Float(f64),
    Bool(bool),
    Null,
}

impl From<&str> for SqlParam {
    fn from(s: &str) -> Self {
        SqlParam::String(s.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(s: String) -> Self {
        SqlParam::String(s)
    }
}

impl From<i64> for SqlParam {
    fn from(n: i64) -> Self {
        SqlParam::Int(n)
    }
}

impl From<f64> for SqlParam {
    fn from(n: f64) -> Self {
        SqlParam::Float(n)
    }
}

impl From<bool> for SqlParam {
    fn from(b: bool) -> Self {
        SqlParam::Bool(b)
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlParam::Null, Into::into)
    }
}

/// WHERE condition tree
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// SQL fragment with one param per `?`
    Clause { sql: String, params: Vec<SqlParam> },
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    pub fn clause(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Condition::Clause {
            sql: sql.into(),
            params,
        }
    }

    pub fn and(self, other: Condition) -> Self {
        let mut parts = match self {
            Condition::And(parts) => parts,
            other => vec![other],
        };
        match other {
            Condition::And(more) => parts.extend(more),
            other => parts.push(other),
        }
        Condition::And(parts)
    }

    pub fn or(self, other: Condition) -> Self {
        let mut parts = match self {
            Condition::Or(parts) => parts,
            other => vec![other],
        };
        match other {
            Condition::Or(more) => parts.extend(more),
            other => parts.push(other),
        }
        Condition::Or(parts)
    }

    fn render(&self, out: &mut String, params: &mut Vec<SqlParam>, nested: bool) {
        match self {
            Condition::Clause { sql, params: own } => {
                let wrap = nested && has_or_keyword(sql);
                if wrap {
                    out.push('(');
                }
                push_numbered(out, sql, own, params);
                if wrap {
                    out.push(')');
                }
            }
            Condition::And(parts) => render_group(out, params, parts, " AND ", nested),
            Condition::Or(parts) => render_group(out, params, parts, " OR ", nested),
        }
    }
}

fn render_group(out: &mut String, params: &mut Vec<SqlParam>, parts: &[Condition], sep: &str, nested: bool) {
    if parts.is_empty() {
        out.push_str("TRUE");
        return;
    }
    let wrap = nested && parts.len() > 1;
    if wrap {
        out.push('(');
    }
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        part.render(out, params, true);
    }
    if wrap {
        out.push(')');
    }
}

/// Walk `sql`, calling `f(ch, quoted)` for each char. `quoted` is true
/// inside '...' literals and "..." identifiers, quote chars included.
fn scan_sql(sql: &str, mut f: impl FnMut(char, bool)) {
    let mut quote: Option<char> = None;
    for ch in sql.chars() {
        match quote {
            Some(q) => {
                f(ch, true);
                if ch == q {
                    quote = None;
                }
            }
            None if ch == '\'' || ch == '"' => {
                f(ch, true);
                quote = Some(ch);
            }
            None => f(ch, false),
        }
    }
}

/// Number of bind placeholders in `sql`, ignoring `?` inside quotes
pub(crate) fn placeholder_count(sql: &str) -> usize {
    let mut count = 0;
    scan_sql(sql, |ch, quoted| {
        if ch == '?' && !quoted {
            count += 1;
        }
    });
    count
}

/// True when `sql` has a bare `OR` word outside quotes
fn has_or_keyword(sql: &str) -> bool {
    let mut word = String::new();
    let mut found = false;
    scan_sql(sql, |ch, quoted| {
        if !quoted && (ch.is_ascii_alphanumeric() || ch == '_') {
            word.push(ch);
        } else {
            found |= word.eq_ignore_ascii_case("or");
            word.clear();
        }
    });
    found || word.eq_ignore_ascii_case("or")
}

/// Copy `sql`, replacing each unquoted `?` with the next positional parameter
fn push_numbered(out: &mut String, sql: &str, own: &[SqlParam], params: &mut Vec<SqlParam>) {
    let mut own = own.iter();
    scan_sql(sql, |ch, quoted| {
        if ch == '?' && !quoted {
            let param = own.next().cloned().unwrap_or(SqlParam::Null);
            params.push(param);
            out.push('$');
            out.push_str(&params.len().to_string());
        } else {
            out.push(ch);
        }
    });
}

/// One ORDER BY term
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
    pub expr: String,
    pub params: Vec<SqlParam>,
    pub direction: SortDirection,
}

impl OrderTerm {
    /// Parse `expr`, honoring a trailing `ASC`/`DESC`
    pub fn parse(expr: &str, params: Vec<SqlParam>) -> Self {
        let trimmed = expr.trim();
        let upper = trimmed.to_ascii_uppercase();
        let (expr, direction) = if upper.ends_with(" DESC") {
            (&trimmed[..trimmed.len() - 5], SortDirection::Desc)
        } else if upper.ends_with(" ASC") {
            (&trimmed[..trimmed.len() - 4], SortDirection::Asc)
        } else {
            (trimmed, SortDirection::Asc)
        };
        Self {
            expr: expr.trim_end().to_string(),
            params,
            direction,
        }
    }
}

/// A lazily built `SELECT` over one table
#[derive(Debug, Clone, PartialEq)]
pub struct SqlRelation {
    table: String,
    select: Option<String>,
    joins: Vec<String>,
    condition: Option<Condition>,
    order: Vec<OrderTerm>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SqlRelation {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select: None,
            joins: Vec::new(),
            condition: None,
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn order_terms(&self) -> &[OrderTerm] {
        &self.order
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Select list; defaults to `<table>.*`
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.select = Some(columns.into());
        self
    }

    /// Add a raw JOIN clause, once
    pub fn join(mut self, clause: impl Into<String>) -> Self {
        let clause = clause.into();
        if !self.joins.contains(&clause) {
            self.joins.push(clause);
        }
        self
    }

    /// AND a `?`-placeholder clause
    pub fn where_clause(self, sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        self.where_condition(Condition::clause(sql, params))
    }

    pub fn where_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(match self.condition.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// Append an ORDER BY term
    pub fn order(mut self, expr: impl Into<String>, direction: SortDirection) -> Self {
        self.order.push(OrderTerm {
            expr: expr.into(),
            params: Vec::new(),
            direction,
        });
        self
    }

    pub fn order_term(mut self, term: OrderTerm) -> Self {
        self.order.push(term);
        self
    }

    fn merge_joins(&mut self, other: Vec<String>) {
        for join in other {
            if !self.joins.contains(&join) {
                self.joins.push(join);
            }
        }
    }

    fn push_from(&self, sql: &mut String) {
        sql.push_str(" FROM ");
        sql.push_str(&self.table);
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
    }

    fn push_where(&self, sql: &mut String, params: &mut Vec<SqlParam>) {
        if let Some(condition) = &self.condition {
            sql.push_str(" WHERE ");
            condition.render(sql, params, false);
        }
    }

    /// Full statement and its bind parameters
    pub fn to_sql(&self) -> (String, Vec<SqlParam>) {
        let mut params = Vec::new();
        let mut sql = String::from("SELECT ");
        match &self.select {
            Some(select) => sql.push_str(select),
            None => {
                sql.push_str(&self.table);
                sql.push_str(".*");
            }
        }
        self.push_from(&mut sql);
        self.push_where(&mut sql, &mut params);

        if !self.order.is_empty() {
            sql.push_str(" ORDER BY ");
            for (i, term) in self.order.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                push_numbered(&mut sql, &term.expr, &term.params, &mut params);
                sql.push_str(match term.direction {
                    SortDirection::Asc => " ASC",
                    SortDirection::Desc => " DESC",
                });
            }
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        (sql, params)
    }

    /// `COUNT(*)` over the same rows, ignoring order and pagination
    pub fn count_sql(&self) -> (String, Vec<SqlParam>) {
        let mut params = Vec::new();
        let mut sql = String::from("SELECT COUNT(*)");
        self.push_from(&mut sql);
        self.push_where(&mut sql, &mut params);
        (sql, params)
    }
}

impl Relation for SqlRelation {
    fn all(&self) -> Self {
        Self {
            table: self.table.clone(),
            select: self.select.clone(),
            joins: self.joins.clone(),
            condition: None,
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    fn and(mut self, other: Self) -> Self {
        self.merge_joins(other.joins);
        match other.condition {
            Some(condition) => self.where_condition(condition),
            None => self,
        }
    }

    fn or(mut self, other: Self) -> Self {
        self.merge_joins(other.joins);
        self.condition = match (self.condition.take(), other.condition) {
            (Some(left), Some(right)) => Some(left.or(right)),
            // either side unrestricted matches everything
            _ => None,
        };
        self
    }

    fn reverse_order(mut self) -> Self {
        if self.order.is_empty() {
            let id = format!("{}.id", self.table);
            return self.order(id, SortDirection::Desc);
        }
        for term in &mut self.order {
            term.direction = term.direction.reverse();
        }
        self
    }

    fn paginate(mut self, offset: u64, limit: u64) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }
}
