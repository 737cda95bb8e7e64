//! Per-user budget categories.

mod create;
mod db;
mod delete;
pub(crate) mod domain;
mod edit;
mod form;

pub use create::{create_category_endpoint, get_new_category_page};
pub use db::{
    create_category, create_category_table, delete_category, get_categories, get_category,
    seed_default_categories, update_category,
};
pub use delete::delete_category_endpoint;
pub use domain::{
    Category, CategoryColor, CategoryIcon, CategoryName, DEFAULT_CATEGORIES,
    UNKNOWN_CATEGORY_ICON, UNKNOWN_CATEGORY_NAME,
};
pub use edit::{get_edit_category_page, update_category_endpoint};
