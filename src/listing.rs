// 🔎 List Filter / Sort / Paginate
//
// One shared helper behind every admin list (members, role management,
// transactions, vendors, employees, voicemails):
// - free-text search: case-insensitive substring over a fixed field set
// - categorical filters: exact match, AND-combined with the search
// - sort on one field, ascending or descending, ties in original order
// - 1-based pages; the page resets to 1 whenever the inputs change

use crate::access::Role;
use crate::entities::{Employee, Member, Transaction, Vendor, Voicemail};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Server-side search terms shorter than this do not refetch
pub const MIN_SEARCH_CHARS: usize = 3;

// ============================================================================
// LISTABLE
// ============================================================================

/// Something an admin list can search, filter and sort
pub trait Listable {
    /// Fields the free-text search looks at
    const SEARCH_FIELDS: &'static [&'static str];

    /// Value of a named field, if the entity has one
    fn field(&self, key: &str) -> Option<Cow<'_, str>>;

    /// Categorical filter check; exact (ASCII case-insensitive) by default
    fn matches_filter(&self, key: &str, value: &str) -> bool {
        self.field(key)
            .map(|v| v.eq_ignore_ascii_case(value))
            .unwrap_or(false)
    }
}

fn opt(value: &Option<String>) -> Option<Cow<'_, str>> {
    value.as_deref().map(Cow::Borrowed)
}

fn flag(value: bool) -> Option<Cow<'static, str>> {
    Some(Cow::Borrowed(if value { "true" } else { "false" }))
}

impl Listable for Member {
    const SEARCH_FIELDS: &'static [&'static str] =
        &["firstName", "lastName", "fullName", "email", "phone", "familyId"];

    fn field(&self, key: &str) -> Option<Cow<'_, str>> {
        match key {
            "id" => Some(Cow::Borrowed(&self.id)),
            "firstName" => Some(Cow::Borrowed(&self.first_name)),
            "lastName" => Some(Cow::Borrowed(&self.last_name)),
            "fullName" | "name" => Some(Cow::Owned(self.full_name())),
            "email" => opt(&self.email),
            "phone" => opt(&self.phone),
            "familyId" => opt(&self.family_id),
            "status" => Some(Cow::Borrowed(self.status.as_str())),
            "roles" => Some(Cow::Owned(self.role_labels())),
            "pledgeAmount" => Some(Cow::Owned(format!("{:.2}", self.pledge_amount))),
            "membershipStartDate" => self
                .membership_start_date
                .map(|d| Cow::Owned(d.format("%Y-%m-%d").to_string())),
            _ => None,
        }
    }

    fn matches_filter(&self, key: &str, value: &str) -> bool {
        match key {
            "role" => Role::parse(value).is_some_and(|role| self.has_role(role)),
            _ => self
                .field(key)
                .map(|v| v.eq_ignore_ascii_case(value))
                .unwrap_or(false),
        }
    }
}

impl Listable for Transaction {
    const SEARCH_FIELDS: &'static [&'static str] =
        &["name", "receiptNumber", "note", "memberId", "amount"];

    fn field(&self, key: &str) -> Option<Cow<'_, str>> {
        match key {
            "id" => Some(Cow::Borrowed(&self.id)),
            "name" => Some(Cow::Owned(self.display_name())),
            "memberId" => opt(&self.member_id),
            "amount" => Some(Cow::Owned(format!("{:.2}", self.amount))),
            "paymentDate" => Some(Cow::Owned(self.payment_date.format("%Y-%m-%d").to_string())),
            "paymentType" => Some(Cow::Borrowed(self.payment_type.as_str())),
            "paymentMethod" => Some(Cow::Borrowed(self.payment_method.as_str())),
            "receiptNumber" => opt(&self.receipt_number),
            "note" => opt(&self.note),
            "status" => opt(&self.status),
            _ => None,
        }
    }
}

impl Listable for Vendor {
    const SEARCH_FIELDS: &'static [&'static str] =
        &["name", "contactPerson", "email", "phone", "vendorType"];

    fn field(&self, key: &str) -> Option<Cow<'_, str>> {
        match key {
            "id" => Some(Cow::Borrowed(&self.id)),
            "name" => Some(Cow::Borrowed(&self.name)),
            "vendorType" => opt(&self.vendor_type),
            "contactPerson" => opt(&self.contact_person),
            "email" => opt(&self.email),
            "phone" => opt(&self.phone),
            "active" => flag(self.active),
            _ => None,
        }
    }
}

impl Listable for Employee {
    const SEARCH_FIELDS: &'static [&'static str] =
        &["firstName", "lastName", "position", "email", "phone"];

    fn field(&self, key: &str) -> Option<Cow<'_, str>> {
        match key {
            "id" => Some(Cow::Borrowed(&self.id)),
            "firstName" => Some(Cow::Borrowed(&self.first_name)),
            "lastName" => Some(Cow::Borrowed(&self.last_name)),
            "name" => Some(Cow::Owned(self.full_name())),
            "position" => opt(&self.position),
            "employmentType" => opt(&self.employment_type),
            "email" => opt(&self.email),
            "phone" => opt(&self.phone),
            "active" => flag(self.active),
            _ => None,
        }
    }
}

impl Listable for Voicemail {
    const SEARCH_FIELDS: &'static [&'static str] = &["fromNumber", "callerName", "transcription"];

    fn field(&self, key: &str) -> Option<Cow<'_, str>> {
        match key {
            "id" => Some(Cow::Borrowed(&self.id)),
            "fromNumber" => Some(Cow::Borrowed(&self.from_number)),
            "callerName" => opt(&self.caller_name),
            "transcription" => opt(&self.transcription),
            "duration" => Some(Cow::Owned(self.duration.to_string())),
            "createdAt" => self.created_at.map(|t| Cow::Owned(t.to_rfc3339())),
            "listened" => flag(self.listened),
            _ => None,
        }
    }
}

// ============================================================================
// QUERY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn parse(raw: &str) -> SortDirection {
        if raw.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: String,
    #[serde(default)]
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub search: String,

    /// field -> required value; empty or "all" values are inactive
    #[serde(default)]
    pub filters: BTreeMap<String, String>,

    #[serde(default)]
    pub sort: Option<SortSpec>,

    /// 1-based
    #[serde(default = "default_page")]
    pub page: usize,

    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for ListQuery {
    fn default() -> Self {
        ListQuery {
            search: String::new(),
            filters: BTreeMap::new(),
            sort: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListQuery {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn with_sort(mut self, key: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(SortSpec {
            key: key.into(),
            direction,
        });
        self
    }

    pub fn with_page(mut self, page: usize, page_size: usize) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    fn active_filters(&self) -> impl Iterator<Item = (&String, &String)> {
        self.filters
            .iter()
            .filter(|(_, v)| !v.trim().is_empty() && !v.eq_ignore_ascii_case("all"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Paged<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

// ============================================================================
// FILTER / SORT / PAGINATE
// ============================================================================

/// Case-insensitive substring match over the entity's search fields.
/// An empty (or blank) term matches everything.
pub fn matches_search<T: Listable>(item: &T, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    T::SEARCH_FIELDS.iter().any(|key| {
        item.field(key)
            .map(|value| value.to_lowercase().contains(&needle))
            .unwrap_or(false)
    })
}

/// Items passing the search and every active filter, in input order
pub fn filter_items<'a, T: Listable>(items: &'a [T], query: &ListQuery) -> Vec<&'a T> {
    items
        .iter()
        .filter(|item| matches_search(*item, &query.search))
        .filter(|item| {
            query
                .active_filters()
                .all(|(key, value)| item.matches_filter(key, value))
        })
        .collect()
}

/// Sort class of one cell: missing, then finite numbers, then text
#[derive(Debug, PartialEq, PartialOrd)]
enum SortKey {
    Missing,
    Number(f64),
    Text(String),
}

impl SortKey {
    fn of(value: Option<&str>) -> Self {
        match value {
            None => SortKey::Missing,
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(x) if x.is_finite() => SortKey::Number(x),
                _ => SortKey::Text(raw.to_lowercase()),
            },
        }
    }
}

/// Total preorder over cell values. Missing values come first, then finite
/// numbers in numeric order, then everything else case-insensitively.
pub fn compare_values(a: Option<&str>, b: Option<&str>) -> Ordering {
    // Derived order ranks variants first; numbers are finite so it never fails
    SortKey::of(a)
        .partial_cmp(&SortKey::of(b))
        .unwrap_or(Ordering::Equal)
}

/// Stable sort on one field; ties keep their input order in both directions
pub fn sort_items<T: Listable>(items: &mut [&T], sort: &SortSpec) {
    items.sort_by(|a, b| {
        let left = a.field(&sort.key);
        let right = b.field(&sort.key);
        let ord = compare_values(left.as_deref(), right.as_deref());
        match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

/// Slice one 1-based page out of `items`. Page size 0 counts as 1 and pages
/// past the end are empty.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Paged<T> {
    let page_size = page_size.max(1);
    let page = page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size).max(1);

    let start = (page - 1).saturating_mul(page_size);
    let items: Vec<T> = items.into_iter().skip(start).take(page_size).collect();

    Paged {
        items,
        page,
        page_size,
        total_items,
        total_pages,
    }
}

/// Filter, sort and paginate in one go
pub fn apply<T: Listable + Clone>(items: &[T], query: &ListQuery) -> Paged<T> {
    let mut matched = filter_items(items, query);
    if let Some(sort) = &query.sort {
        sort_items(&mut matched, sort);
    }
    let owned: Vec<T> = matched.into_iter().cloned().collect();
    paginate(owned, query.page, query.page_size)
}

// ============================================================================
// LIST STATE
// ============================================================================

/// Query state of one list screen. Any change to search, filters or sort
/// sends the view back to page 1.
#[derive(Debug, Clone, Default)]
pub struct ListState {
    query: ListQuery,
}

impl ListState {
    pub fn new(page_size: usize) -> Self {
        ListState {
            query: ListQuery {
                page_size: page_size.max(1),
                ..ListQuery::default()
            },
        }
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn page(&self) -> usize {
        self.query.page
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        let term = term.into();
        if term != self.query.search {
            self.query.search = term;
            self.query.page = 1;
        }
    }

    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.filters.insert(key.into(), value.into());
        self.query.page = 1;
    }

    pub fn clear_filter(&mut self, key: &str) {
        if self.query.filters.remove(key).is_some() {
            self.query.page = 1;
        }
    }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.query.filters.get(key).map(|v| v.as_str())
    }

    pub fn set_sort(&mut self, key: impl Into<String>, direction: SortDirection) {
        self.query.sort = Some(SortSpec {
            key: key.into(),
            direction,
        });
        self.query.page = 1;
    }

    /// Sorting by the active key flips direction; a new key starts ascending
    pub fn toggle_sort(&mut self, key: &str) {
        let direction = match &self.query.sort {
            Some(sort) if sort.key == key => sort.direction.flipped(),
            _ => SortDirection::Asc,
        };
        self.set_sort(key, direction);
    }

    pub fn next_page(&mut self, total_pages: usize) {
        if self.query.page < total_pages {
            self.query.page += 1;
        }
    }

    pub fn previous_page(&mut self) {
        if self.query.page > 1 {
            self.query.page -= 1;
        }
    }

    pub fn go_to(&mut self, page: usize) {
        self.query.page = page.max(1);
    }
}

// ============================================================================
// SERVER-SIDE SEARCH
// ============================================================================

/// Decides whether a typed term is worth a network refetch
#[derive(Debug, Clone)]
pub struct SearchGate {
    min_chars: usize,
    last_fetched: Option<String>,
}

impl Default for SearchGate {
    fn default() -> Self {
        SearchGate::new(MIN_SEARCH_CHARS)
    }
}

impl SearchGate {
    pub fn new(min_chars: usize) -> Self {
        SearchGate {
            min_chars,
            last_fetched: None,
        }
    }

    /// Empty terms refetch (clearing the search); short terms never do;
    /// repeating the last fetched term does not either.
    pub fn should_fetch(&self, term: &str) -> bool {
        let term = term.trim();
        if !term.is_empty() && term.chars().count() < self.min_chars {
            return false;
        }
        self.last_fetched.as_deref() != Some(term)
    }

    pub fn mark_fetched(&mut self, term: &str) {
        self.last_fetched = Some(term.trim().to_string());
    }
}

/// Delays a search until typing has been idle for `delay`.
/// A newer term replaces the pending one.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<(String, Instant)>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            pending: None,
        }
    }

    pub fn push(&mut self, term: impl Into<String>, now: Instant) {
        self.pending = Some((term.into(), now));
    }

    /// The settled term, once `delay` has passed since the last push
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((_, at)) if now.duration_since(*at) >= self.delay => {
                self.pending.take().map(|(term, _)| term)
            }
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
