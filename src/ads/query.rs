//! Filter, sort and pagination for the ad feed.
//!
//! Filters are kept as data (column, comparison, value) and rendered with bound
//! parameters only. The same [`AdFilter`] drives both the page query and the count query.
use std::cmp::Ordering;

use sqlx::{Postgres, QueryBuilder};

use crate::ads::repo_types::Ad;

const AD_COLUMNS: &str = "id, user_id, title, description, image_url, price, created_at";

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterColumn {
    Price,
}

impl FilterColumn {
    fn sql(self) -> &'static str {
        match self {
            FilterColumn::Price => "price",
        }
    }

    fn value_of(self, ad: &Ad) -> f64 {
        match self {
            FilterColumn::Price => ad.price,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    AtLeast,
    AtMost,
}

impl Comparison {
    fn sql(self) -> &'static str {
        match self {
            Comparison::AtLeast => " >= ",
            Comparison::AtMost => " <= ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Predicate {
    pub column: FilterColumn,
    pub comparison: Comparison,
    pub value: f64,
}

impl Predicate {
    pub fn matches(&self, ad: &Ad) -> bool {
        let actual = self.column.value_of(ad);
        match self.comparison {
            Comparison::AtLeast => actual >= self.value,
            Comparison::AtMost => actual <= self.value,
        }
    }
}

/// Conjunction of predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdFilter {
    predicates: Vec<Predicate>,
}

impl AdFilter {
    /// `min_price > 0` adds a lower bound. `max_price > 0` adds an upper bound only when it
    /// is not below `min_price`; an inverted range keeps just the lower bound.
    pub fn price_range(min_price: f64, max_price: f64) -> Self {
        let mut predicates = Vec::new();
        if min_price > 0.0 {
            predicates.push(Predicate {
                column: FilterColumn::Price,
                comparison: Comparison::AtLeast,
                value: min_price,
            });
        }
        if max_price > 0.0 && max_price >= min_price {
            predicates.push(Predicate {
                column: FilterColumn::Price,
                comparison: Comparison::AtMost,
                value: max_price,
            });
        }
        Self { predicates }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn matches(&self, ad: &Ad) -> bool {
        self.predicates.iter().all(|p| p.matches(ad))
    }

    fn push_where(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        for (i, p) in self.predicates.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            qb.push(p.column.sql());
            qb.push(p.comparison.sql());
            qb.push_bind(p.value);
        }
    }

    pub fn count_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM ads");
        self.push_where(&mut qb);
        qb
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    #[default]
    CreatedAt,
    Price,
}

impl SortColumn {
    /// Unknown or missing values sort by creation time.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("price") => SortColumn::Price,
            _ => SortColumn::CreatedAt,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            SortColumn::CreatedAt => "created_at",
            SortColumn::Price => "price",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Only a case-insensitive `asc` sorts ascending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdSort {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl AdSort {
    pub fn parse(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        Self {
            column: SortColumn::parse(sort_by),
            direction: SortDirection::parse(sort_order),
        }
    }

    /// Ordering of two ads under this sort, with `id` as tie-breaker.
    pub fn compare(&self, a: &Ad, b: &Ad) -> Ordering {
        let primary = match self.column {
            SortColumn::CreatedAt => a.created_at.cmp(&b.created_at),
            SortColumn::Price => a.price.total_cmp(&b.price),
        };
        let ord = primary.then_with(|| a.id.cmp(&b.id));
        match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }

    fn push_order_by(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        let dir = self.direction.sql();
        qb.push(format!(" ORDER BY {} {}, id {}", self.column.sql(), dir, dir));
    }
}

/// One page of the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct AdQuery {
    pub filter: AdFilter,
    pub sort: AdSort,
    pub offset: i64,
    pub limit: i64,
}

impl AdQuery {
    pub fn new(
        offset: i64,
        limit: i64,
        sort_by: Option<&str>,
        sort_order: Option<&str>,
        min_price: f64,
        max_price: f64,
    ) -> Self {
        Self {
            filter: AdFilter::price_range(min_price, max_price),
            sort: AdSort::parse(sort_by, sort_order),
            offset,
            limit,
        }
    }

    pub fn page_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM ads", AD_COLUMNS));
        self.filter.push_where(&mut qb);
        self.sort.push_order_by(&mut qb);
        qb.push(" OFFSET ");
        qb.push_bind(self.offset);
        qb.push(" LIMIT ");
        qb.push_bind(self.limit);
        qb
    }

    /// Apply the query to an in-process collection: filter, sort, then offset and limit.
    pub fn apply<'a>(&self, ads: impl IntoIterator<Item = &'a Ad>) -> Vec<Ad> {
        let mut matching: Vec<&Ad> = ads.into_iter().filter(|a| self.filter.matches(a)).collect();
        matching.sort_by(|a, b| self.sort.compare(a, b));
        matching
            .into_iter()
            .skip(usize::try_from(self.offset).unwrap_or(0))
            .take(usize::try_from(self.limit).unwrap_or(0))
            .cloned()
            .collect()
    }
}
