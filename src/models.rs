//! Domain models that mirror the SQLite schema and get passed between the
//! persistence layer and whatever host embeds it. The intent is that these
//! types stay light-weight data holders so the `db` modules can focus on the
//! transactional business rules.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
/// A catalog entry. Two books are the same edition when category, title,
/// press, publish year and author all match; the generated `id` plays no part
/// in that comparison.
pub struct Book {
    /// Primary key from the database. Zero until the registration path writes
    /// the generated id back onto the record.
    pub id: i64,
    pub category: String,
    pub title: String,
    pub press: String,
    pub publish_year: i64,
    pub author: String,
    pub price: f64,
    /// Copies currently on the shelf. Mutated only through the stock
    /// adjustment path so it can never drop below zero.
    pub stock: i64,
}

impl Book {
    /// Build an unregistered book; the id stays zero until stored.
    pub fn new(
        category: &str,
        title: &str,
        press: &str,
        publish_year: i64,
        author: &str,
        price: f64,
        stock: i64,
    ) -> Self {
        Self {
            id: 0,
            category: category.to_string(),
            title: title.to_string(),
            press: press.to_string(),
            publish_year,
            author: author.to_string(),
            price,
            stock,
        }
    }

    /// Value comparison of the five-field edition key. Used by the batch
    /// registration path to reject duplicates inside one submission before
    /// any row is written.
    pub fn same_edition(&self, other: &Book) -> bool {
        self.category == other.category
            && self.title == other.title
            && self.press == other.press
            && self.publish_year == other.publish_year
            && self.author == other.author
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({})", self.title, self.author, self.press)
    }
}

/// Kind of reader a card was issued to. Stored as a one-letter code so the
/// column stays a fixed-width `TEXT` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Student,
    Teacher,
    Other,
}

impl CardKind {
    /// One-letter code persisted in the `type` column.
    pub fn code(self) -> &'static str {
        match self {
            Self::Student => "S",
            Self::Teacher => "T",
            Self::Other => "O",
        }
    }

    /// Inverse of [`CardKind::code`]. Returns `None` for codes the schema
    /// never stores.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "S" => Some(Self::Student),
            "T" => Some(Self::Teacher),
            "O" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Student => "Student",
            Self::Teacher => "Teacher",
            Self::Other => "Other",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A membership card. Name, department and kind together form the natural
/// key; no two cards may share all three.
pub struct Card {
    /// Primary key from the database, zero until registered.
    pub id: i64,
    pub name: String,
    pub department: String,
    pub kind: CardKind,
}

impl Card {
    /// Build an unregistered card; the id stays zero until stored.
    pub fn new(name: &str, department: &str, kind: CardKind) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            department: department.to_string(),
            kind,
        }
    }
}

/// Column a catalog query may sort on. Keeping this an enum (instead of a
/// caller-supplied string) means the ORDER BY clause is assembled only from
/// known column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    #[default]
    BookId,
    Category,
    Title,
    Press,
    PublishYear,
    Author,
    Price,
    Stock,
}

impl SortColumn {
    /// The schema column name this variant sorts on.
    pub fn column(self) -> &'static str {
        match self {
            Self::BookId => "book_id",
            Self::Category => "category",
            Self::Title => "title",
            Self::Press => "press",
            Self::PublishYear => "publish_year",
            Self::Author => "author",
            Self::Price => "price",
            Self::Stock => "stock",
        }
    }
}

/// Sort direction for catalog queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Filter set for catalog queries. Every field is optional and the active
/// ones are ANDed together; `Default` therefore matches every book. Title,
/// press and author are substring matches, category is exact, and the year
/// and price bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct BookQuery {
    pub category: Option<String>,
    pub title: Option<String>,
    pub press: Option<String>,
    pub author: Option<String>,
    pub min_publish_year: Option<i64>,
    pub max_publish_year: Option<i64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Requested sort key; ties always fall back to `book_id` ascending.
    pub sort_by: SortColumn,
    pub order: SortOrder,
}

#[derive(Debug, Clone, PartialEq)]
/// One row of a card's borrow history: the loan joined with the book it
/// refers to. `return_time` stays zero while the loan is open.
pub struct HistoryEntry {
    pub card_id: i64,
    pub book_id: i64,
    pub borrow_time: i64,
    pub return_time: i64,
    pub category: String,
    pub title: String,
    pub press: String,
    pub publish_year: i64,
    pub author: String,
    pub price: f64,
}
