//! Query helpers over the library and shop schemas
//!
//! Every helper is generic over `ConnectionTrait`, so it runs against a pooled
//! connection, a transaction, or a [`QueryCounter`] that records round trips.

pub mod library;
pub mod shop;

use sea_orm::sea_query::{Alias, Expr, Func, IntoColumnRef, LikeExpr, SimpleExpr};
use sea_orm::{
    ConnectionTrait, DbBackend, DbErr, ExecResult, QueryResult, Statement,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Connection wrapper counting the statements sent to the database
pub struct QueryCounter<'a, C> {
    inner: &'a C,
    count: AtomicUsize,
}

impl<'a, C: ConnectionTrait> QueryCounter<'a, C> {
    pub fn new(inner: &'a C) -> Self {
        Self { inner, count: AtomicUsize::new(0) }
    }

    /// Statements issued so far
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }

    fn bump(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl<'a, C: ConnectionTrait> ConnectionTrait for QueryCounter<'a, C> {
    fn get_database_backend(&self) -> DbBackend {
        self.inner.get_database_backend()
    }

    async fn execute(&self, stmt: Statement) -> Result<ExecResult, DbErr> {
        self.bump();
        self.inner.execute(stmt).await
    }

    async fn execute_unprepared(&self, sql: &str) -> Result<ExecResult, DbErr> {
        self.bump();
        self.inner.execute_unprepared(sql).await
    }

    async fn query_one(&self, stmt: Statement) -> Result<Option<QueryResult>, DbErr> {
        self.bump();
        self.inner.query_one(stmt).await
    }

    async fn query_all(&self, stmt: Statement) -> Result<Vec<QueryResult>, DbErr> {
        self.bump();
        self.inner.query_all(stmt).await
    }

    fn support_returning(&self) -> bool {
        self.inner.support_returning()
    }
}

/// Case-insensitive substring match, `LOWER(col) LIKE '%needle%' ESCAPE '\'`.
/// `%` and `_` in the needle match literally.
pub fn icontains<T: IntoColumnRef>(col: T, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&needle.to_lowercase()));
    Expr::expr(Func::lower(Expr::col(col))).like(LikeExpr::new(pattern).escape('\\'))
}

fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `CAST(expr AS double precision)`; AVG/SUM types differ per backend otherwise
pub fn as_double<T: Into<SimpleExpr>>(expr: T) -> SimpleExpr {
    Func::cast_as(expr, Alias::new("double precision")).into()
}

/// Round to two decimal places, the way ratings are reported
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Sort direction parsed from an `ordering` query value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl From<Direction> for sea_orm::Order {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Asc => sea_orm::Order::Asc,
            Direction::Desc => sea_orm::Order::Desc,
        }
    }
}

/// Parse `field` / `-field`; fields outside `allowed` are ignored
pub fn parse_ordering<'a>(value: Option<&'a str>, allowed: &[&str]) -> Option<(&'a str, Direction)> {
    let value = value?.trim();
    let (field, direction) = match value.strip_prefix('-') {
        Some(field) => (field, Direction::Desc),
        None => (value, Direction::Asc),
    };
    allowed.contains(&field).then_some((field, direction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ordering() {
        let allowed = ["title", "published_date"];
        assert_eq!(parse_ordering(Some("title"), &allowed), Some(("title", Direction::Asc)));
        assert_eq!(
            parse_ordering(Some("-published_date"), &allowed),
            Some(("published_date", Direction::Desc))
        );
        assert_eq!(parse_ordering(Some("password"), &allowed), None);
        assert_eq!(parse_ordering(None, &allowed), None);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(4.666_666), 4.67);
        assert_eq!(round2(3.0), 3.0);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off"), r"50\%\_off");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_icontains_declares_escape_character() {
        use sea_orm::sea_query::{Query, SqliteQueryBuilder};

        let sql = Query::select()
            .expr(Expr::val(1))
            .and_where(icontains(Alias::new("name"), "snake_case"))
            .to_string(SqliteQueryBuilder);
        assert!(sql.contains("ESCAPE"), "{}", sql);
    }
}
