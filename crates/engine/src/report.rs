//! Reports over the saved lists of a user.
//!
//! Everything here is a pure function of its input; the session recomputes
//! the summary whenever the saved lists change.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashSet},
    fmt,
};

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{Category, ListId, Money, Product, PurchaseList};

/// How many categories the summary ranks.
pub const TOP_CATEGORIES: usize = 3;

/// A calendar month, ordered chronologically and displayed as `m/yyyy`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthYear {
    pub year: i32,
    /// 1-indexed.
    pub month: u32,
}

impl MonthYear {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    /// Month of `instant` as seen from `tz`.
    pub fn from_datetime_in<Z: TimeZone>(instant: &DateTime<Utc>, tz: &Z) -> Self {
        Self::from_date(instant.with_timezone(tz).date_naive())
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.month, self.year)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportSummary {
    pub total_spent: Money,
    /// In major units, `0.0` without lists.
    pub average_spent_per_list: f64,
    pub top_categories: Vec<CategoryCount>,
    pub spend_by_month: BTreeMap<MonthYear, Money>,
}

/// Summary with month buckets in UTC.
pub fn summarize(lists: &[PurchaseList]) -> ReportSummary {
    summarize_in(lists, &Utc)
}

/// Summary with month buckets in `tz`.
///
/// Lists without a creation time count toward the totals but not toward
/// `spend_by_month`.
pub fn summarize_in<Z: TimeZone>(lists: &[PurchaseList], tz: &Z) -> ReportSummary {
    let total_spent: Money = lists.iter().map(|l| l.total).sum();
    let average_spent_per_list = if lists.is_empty() {
        0.0
    } else {
        total_spent.as_major() / lists.len() as f64
    };

    let mut spend_by_month = BTreeMap::new();
    for list in lists {
        if let Some(created_at) = &list.created_at {
            *spend_by_month
                .entry(MonthYear::from_datetime_in(created_at, tz))
                .or_insert(Money::ZERO) += list.total;
        }
    }

    ReportSummary {
        total_spent,
        average_spent_per_list,
        top_categories: rank_categories(lists.iter().flat_map(|l| &l.products)),
        spend_by_month,
    }
}

/// Count products per category, inactive ones included, and keep the top
/// ones. Equal counts keep the order in which categories first appeared.
fn rank_categories<'a>(products: impl Iterator<Item = &'a Product>) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    for product in products {
        match counts.iter_mut().find(|c| c.category == product.category) {
            Some(entry) => entry.count += 1,
            None => counts.push(CategoryCount {
                category: product.category,
                count: 1,
            }),
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(TOP_CATEGORIES);
    counts
}

/// A product together with the list it was bought in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductView {
    pub list_id: ListId,
    pub list_store: String,
    /// Month of the purchase date.
    pub month_year: MonthYear,
    pub product: Product,
}

pub fn flatten_products(lists: &[PurchaseList]) -> Vec<ProductView> {
    lists
        .iter()
        .flat_map(|list| {
            list.products.iter().map(|product| ProductView {
                list_id: list.id,
                list_store: list.store.clone(),
                month_year: MonthYear::from_date(product.purchase_date),
                product: product.clone(),
            })
        })
        .collect()
}

/// Product filters; unset fields let everything through.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Case-insensitive substring of the name.
    pub name: Option<String>,
    /// Case-insensitive exact brand.
    pub brand: Option<String>,
    pub category: Option<Category>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        non_blank(&self.name).is_none()
            && non_blank(&self.brand).is_none()
            && self.category.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }
}

/// Products matching every set criterion, in input order.
pub fn filter_products<'a>(
    products: &'a [ProductView],
    criteria: &FilterCriteria,
) -> Vec<&'a ProductView> {
    let name = non_blank(&criteria.name);
    let brand = non_blank(&criteria.brand);

    products
        .iter()
        .filter(|view| {
            let product = &view.product;
            name.as_ref()
                .is_none_or(|n| product.name.to_lowercase().contains(n.as_str()))
                && brand.as_ref().is_none_or(|b| {
                    product
                        .brand
                        .as_ref()
                        .is_some_and(|pb| pb.trim().to_lowercase() == *b)
                })
                && criteria.category.is_none_or(|c| product.category == c)
                && criteria.min_price.is_none_or(|min| product.price >= min)
                && criteria.max_price.is_none_or(|max| product.price <= max)
        })
        .collect()
}

/// Average price per month, in major units, of the products called `name`.
pub fn price_trend(products: &[ProductView], name: &str) -> BTreeMap<MonthYear, f64> {
    let wanted = name.trim().to_lowercase();
    let mut sums: BTreeMap<MonthYear, (i64, u32)> = BTreeMap::new();
    for view in products {
        if view.product.name.trim().to_lowercase() == wanted {
            let entry = sums.entry(view.month_year).or_insert((0, 0));
            entry.0 += view.product.price.cents();
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(month, (cents, count))| (month, cents as f64 / f64::from(count) / 100.0))
        .collect()
}

/// Distinct categories, first-seen order.
pub fn unique_categories(products: &[ProductView]) -> Vec<Category> {
    let mut seen = Vec::new();
    for view in products {
        if !seen.contains(&view.product.category) {
            seen.push(view.product.category);
        }
    }
    seen
}

/// Distinct brands, first-seen order. Products without a brand are skipped.
pub fn unique_brands(products: &[ProductView]) -> Vec<String> {
    let mut seen = HashSet::new();
    products
        .iter()
        .filter_map(|view| view.product.brand.as_ref())
        .filter(|brand| seen.insert(brand.as_str()))
        .cloned()
        .collect()
}

/// Purchase history, newest first. Undated lists go last.
pub fn list_history(lists: &[PurchaseList]) -> Vec<&PurchaseList> {
    let mut history: Vec<&PurchaseList> = lists.iter().collect();
    history.sort_by(|a, b| match (&a.created_at, &b.created_at) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    history
}
