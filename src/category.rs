//! This file defines the `Category` type, the types needed to create a
//! category and the API routes for the category type.
//! A category groups transactions and decides whether they count as income or
//! expense in the month summary.

use std::{
    fmt::Display,
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    alert::AlertView,
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    navigation::NavBar,
};

/// The name of a category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is
    /// an empty string.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether transactions in a category count as income or expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum CategoryType {
    /// Money coming in, e.g. wages.
    Income,
    /// Money going out, e.g. groceries.
    Expense,
}

impl CategoryType {
    /// The value stored in the database and submitted by forms.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// The human readable label used in views and exports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }
}

impl FromStr for CategoryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(Error::InvalidCategoryType(other.to_string())),
        }
    }
}

impl Display for CategoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The ID of a category.
pub type CategoryId = i64;

/// A group of transactions, e.g., 'Groceries' or 'Wages'.
///
/// The category's type decides whether its transactions add to the income or
/// the expense total of a month summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,

    /// The name of the category.
    pub name: CategoryName,

    /// Whether the category counts as income or expense.
    pub category_type: CategoryType,

    /// An optional display colour as a hex code, e.g. "#16a34a".
    pub color: Option<String>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a category in the database.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn create_category(
    name: CategoryName,
    category_type: CategoryType,
    color: Option<String>,
    connection: &Connection,
) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO category (name, category_type, color) VALUES (?1, ?2, ?3);",
        (name.as_ref(), category_type.as_str(), &color),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name,
        category_type,
        color,
    })
}

/// Retrieve the category with `category_id` from the database.
///
/// # Errors
/// This function will return [Error::NotFound] if there is no such category,
/// or [Error::SqlError] if there is an SQL error.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, category_type, color FROM category WHERE id = :id;")?
        .query_row(&[(":id", &category_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve all categories in the database, ordered by type and then name.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, name, category_type, color FROM category
             ORDER BY category_type ASC, name ASC;",
        )?
        .query_map([], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Update a category's name, type and colour in the database.
///
/// # Errors
/// This function will return [Error::UpdateMissingCategory] if the category
/// doesn't exist, or an error if there is an SQL error.
pub fn update_category(
    category_id: CategoryId,
    name: CategoryName,
    category_type: CategoryType,
    color: Option<String>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE category SET name = ?1, category_type = ?2, color = ?3 WHERE id = ?4",
        (name.as_ref(), category_type.as_str(), &color, category_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(())
}

/// Delete a category from the database.
///
/// Deletion is refused while transactions still reference the category, so
/// transactions are never silently orphaned.
///
/// # Errors
/// This function will return [Error::CategoryInUse] if transactions still
/// reference the category, [Error::DeleteMissingCategory] if the category
/// doesn't exist, or an error if there is an SQL error.
pub fn delete_category(category_id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let transaction_count = count_transactions_with_category(category_id, connection)?;

    if transaction_count > 0 {
        return Err(Error::CategoryInUse { transaction_count });
    }

    let rows_affected = connection.execute("DELETE FROM category WHERE id = ?1", [category_id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// Count the transactions that reference the category with `category_id`.
pub fn count_transactions_with_category(
    category_id: CategoryId,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .prepare("SELECT COUNT(id) FROM \"transaction\" WHERE category_id = :id;")?
        .query_row(&[(":id", &category_id)], |row| row.get::<usize, i64>(0))
        .map(|count| count as usize)
        .map_err(|error| error.into())
}

/// Create the category table.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            category_type TEXT NOT NULL CHECK (category_type IN ('income', 'expense')),
            color TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let name = CategoryName::new_unchecked(&raw_name);
    let raw_type: String = row.get(2)?;
    let category_type = CategoryType::from_str(&raw_type).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("invalid category type {raw_type:?}").into(),
        )
    })?;
    let color = row.get(3)?;

    Ok(Category {
        id,
        name,
        category_type,
        color,
    })
}

// ============================================================================
// VIEWS
// ============================================================================

fn category_form_fields(
    name: &str,
    category_type: CategoryType,
    color: Option<&str>,
) -> Markup {
    html! {
        div
        {
            label for="name" class=(FORM_LABEL_STYLE) { "Name" }

            input
                id="name"
                type="text"
                name="name"
                placeholder="Category Name"
                value=(name)
                required
                autofocus
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="category_type" class=(FORM_LABEL_STYLE) { "Type" }

            select id="category_type" name="category_type" required class=(FORM_SELECT_STYLE)
            {
                option
                    value=(CategoryType::Income.as_str())
                    selected[category_type == CategoryType::Income]
                {
                    (CategoryType::Income.label())
                }
                option
                    value=(CategoryType::Expense.as_str())
                    selected[category_type == CategoryType::Expense]
                {
                    (CategoryType::Expense.label())
                }
            }
        }

        div
        {
            label for="color" class=(FORM_LABEL_STYLE) { "Colour (hex, optional)" }

            input
                id="color"
                type="text"
                name="color"
                placeholder="#16a34a"
                value=[color]
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

fn new_category_form_view(error_message: &str) -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_CATEGORY)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (category_form_fields("", CategoryType::Expense, None))

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400" { (error_message) }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Category" }
        }
    }
}

fn category_table_view(categories: &[Category]) -> Markup {
    html! {
        table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th class=(TABLE_CELL_STYLE) { "Name" }
                    th class=(TABLE_CELL_STYLE) { "Type" }
                    th class=(TABLE_CELL_STYLE) { "Colour" }
                    th class=(TABLE_CELL_STYLE) { "Actions" }
                }
            }

            tbody
            {
                @for category in categories
                {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td class=(TABLE_CELL_STYLE) { (category.name) }
                        td class=(TABLE_CELL_STYLE) { (category.category_type.label()) }
                        td class=(TABLE_CELL_STYLE)
                        {
                            @if let Some(color) = &category.color {
                                span
                                    class="inline-block w-4 h-4 rounded-full align-middle mr-2"
                                    style=(format!("background-color: {color}")) {}
                                (color)
                            }
                        }
                        td class=(TABLE_CELL_STYLE)
                        {
                            a
                                href=(endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category.id))
                                class=(LINK_STYLE)
                            {
                                "Edit"
                            }
                            " "
                            button
                                hx-delete=(endpoints::format_endpoint(endpoints::DELETE_CATEGORY, category.id))
                                hx-confirm="Delete this category?"
                                hx-target="#alert-container"
                                class=(BUTTON_DELETE_STYLE)
                            {
                                "Delete"
                            }
                        }
                    }
                }
            }
        }
    }
}

fn categories_view(categories: &[Category]) -> Markup {
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let content = html! {
        (nav_bar)
        div id="alert-container" {}
        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "Categories" }
            (category_table_view(categories))

            h2 class="text-xl font-bold mt-8 mb-4" { "New Category" }
            (new_category_form_view(""))
        }
    };

    base("Categories", &content)
}

fn edit_category_view(
    update_endpoint: &str,
    category: &Category,
    error_message: &str,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let form = html! {
        form
            hx-put=(update_endpoint)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (category_form_fields(
                category.name.as_ref(),
                category.category_type,
                category.color.as_deref(),
            ))

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400" { (error_message) }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Update Category" }
        }
    };

    let content = html! {
        (nav_bar)
        div id="alert-container" {}
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Edit Category", &content)
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// The state needed for the categories page and its endpoints.
#[derive(Debug, Clone)]
pub struct CategoryEndpointState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating or updating a category.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryFormData {
    /// The name of the category.
    pub name: String,
    /// The type submitted by the form select, "income" or "expense".
    pub category_type: String,
    /// The optional display colour.
    #[serde(default)]
    pub color: Option<String>,
}

impl CategoryFormData {
    fn parse(&self) -> Result<(CategoryName, CategoryType, Option<String>), Error> {
        let name = CategoryName::new(&self.name)?;
        let category_type = CategoryType::from_str(&self.category_type)?;
        let color = self
            .color
            .as_deref()
            .map(str::trim)
            .filter(|color| !color.is_empty())
            .map(str::to_string);

        Ok((name, category_type, color))
    }
}

/// Route handler for the categories listing page.
pub async fn get_categories_page(
    State(state): State<CategoryEndpointState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)?;

    Ok(categories_view(&categories).into_response())
}

/// A route handler for creating a new category.
pub async fn create_category_endpoint(
    State(state): State<CategoryEndpointState>,
    Form(form_data): Form<CategoryFormData>,
) -> Response {
    let (name, category_type, color) = match form_data.parse() {
        Ok(parsed) => parsed,
        Err(error) => {
            return new_category_form_view(&format!("Error: {error}")).into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_category(name, category_type, color, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");

            error.into_alert_response()
        }
    }
}

/// Route handler for the edit category page.
pub async fn get_edit_category_page(
    Path(category_id): Path<CategoryId>,
    State(state): State<CategoryEndpointState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_CATEGORY, category_id);
    let category = get_category(category_id, &connection)?;

    Ok(edit_category_view(&update_endpoint, &category, "").into_response())
}

/// A route handler for updating a category.
pub async fn update_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<CategoryEndpointState>,
    Form(form_data): Form<CategoryFormData>,
) -> Response {
    let (name, category_type, color) = match form_data.parse() {
        Ok(parsed) => parsed,
        Err(error) => {
            return AlertView::error("Invalid category", &format!("Error: {error}"))
                .into_response(StatusCode::UNPROCESSABLE_ENTITY);
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_category(category_id, name, category_type, color, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::UpdateMissingCategory) => Error::UpdateMissingCategory.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

/// A route handler for deleting a category.
///
/// Deletion is refused while transactions still reference the category.
pub async fn delete_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<CategoryEndpointState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_category(category_id, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ (Error::DeleteMissingCategory | Error::CategoryInUse { .. })) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}




#[cfg(test)]
mod category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use scraper::Html;
    use time::macros::date;

    use crate::{
        category::{
            Category, CategoryFormData, CategoryName, CategoryType, create_category,
            create_category_endpoint, delete_category_endpoint, get_categories_page, get_category,
        },
        db::initialize,
        endpoints,
        transaction::{Transaction, create_transaction},
    };

    use super::CategoryEndpointState;

    fn get_test_state() -> CategoryEndpointState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        CategoryEndpointState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn can_create_category() {
        let state = get_test_state();
        let form = CategoryFormData {
            name: "Books".to_string(),
            category_type: "expense".to_string(),
            color: None,
        };

        let response = create_category_endpoint(State(state.clone()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response
                .headers()
                .get("hx-redirect")
                .expect("hx-redirect header missing"),
            endpoints::CATEGORIES_VIEW
        );

        // Five seeded categories, so the new one gets ID 6.
        let connection = state.db_connection.lock().unwrap();
        let want = Category {
            id: 6,
            name: CategoryName::new_unchecked("Books"),
            category_type: CategoryType::Expense,
            color: None,
        };
        assert_eq!(Ok(want), get_category(6, &connection));
    }

    #[tokio::test]
    async fn create_category_fails_on_empty_name() {
        let state = get_test_state();
        let form = CategoryFormData {
            name: "".to_string(),
            category_type: "expense".to_string(),
            color: None,
        };

        let response = create_category_endpoint(State(state), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = Html::parse_fragment(&String::from_utf8_lossy(&body));
        let p = scraper::Selector::parse("p").unwrap();
        let error_message: String = html
            .select(&p)
            .next()
            .expect("No error message found")
            .text()
            .collect();

        assert_eq!(error_message.trim(), "Error: Category name cannot be empty");
    }

    #[tokio::test]
    async fn categories_page_lists_seeded_categories() {
        let state = get_test_state();

        let response = get_categories_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&body).to_string();
        let html = Html::parse_document(&text);
        assert!(
            html.errors.is_empty(),
            "Got HTML parsing errors: {:?}",
            html.errors
        );

        for name in ["Salary", "Gift", "Food", "Transport", "Leisure"] {
            assert!(text.contains(name), "Expected {name} in page");
        }
    }

    #[tokio::test]
    async fn delete_category_in_use_returns_conflict() {
        let state = get_test_state();
        let category_id = {
            let connection = state.db_connection.lock().unwrap();
            let category = create_category(
                CategoryName::new_unchecked("Rent"),
                CategoryType::Expense,
                None,
                &connection,
            )
            .unwrap();

            create_transaction(
                Transaction::build(Decimal::new(120000, 2), date!(2024 - 01 - 01))
                    .category_id(Some(category.id)),
                &connection,
            )
            .unwrap();

            category.id
        };

        let response = delete_category_endpoint(Path(category_id), State(state.clone()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let connection = state.db_connection.lock().unwrap();
        assert!(get_category(category_id, &connection).is_ok());
    }
}
