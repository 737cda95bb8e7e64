//! Parsing and rendering of the transaction entry form.

use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    category::Category,
    database_id::CategoryId,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
};

/// The largest amount or budget accepted, one trillion yen.
pub const MAX_YEN: i64 = 1_000_000_000_000;

/// Parse a whole yen amount typed by a user.
///
/// Full-width digits (`０`-`９`) are converted to ASCII digits, and commas,
/// spaces and yen signs are ignored, so "￥１，２００" parses as 1200.
///
/// # Errors
///
/// Returns an [Error::InvalidAmount] if the text is empty, not a whole number, negative or
/// more than [MAX_YEN].
pub fn parse_yen(text: &str) -> Result<i64, Error> {
    let normalized: String = text
        .trim()
        .chars()
        .filter_map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32),
            '－' => Some('-'),
            ',' | '，' | '¥' | '￥' | ' ' | '\u{3000}' => None,
            c => Some(c),
        })
        .collect();

    match normalized.parse::<i64>() {
        Ok(amount) if (0..=MAX_YEN).contains(&amount) => Ok(amount),
        _ => Err(Error::InvalidAmount(text.trim().to_owned())),
    }
}

/// The raw data entered by the user in the transaction entry form.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionFormData {
    pub amount: String,
    pub category_id: CategoryId,
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub store: String,
    #[serde(default)]
    pub note: String,
    pub date: Date,
}

/// The values to pre-fill the entry form with.
pub struct TransactionFormValues<'a> {
    pub amount: &'a str,
    pub category_id: Option<CategoryId>,
    pub item_name: &'a str,
    pub store: &'a str,
    pub note: &'a str,
    pub date: Date,
}

impl<'a> TransactionFormValues<'a> {
    /// An empty form dated `date`.
    pub fn empty(date: Date) -> Self {
        Self {
            amount: "",
            category_id: None,
            item_name: "",
            store: "",
            note: "",
            date,
        }
    }
}

impl<'a> From<&'a TransactionFormData> for TransactionFormValues<'a> {
    fn from(form: &'a TransactionFormData) -> Self {
        Self {
            amount: &form.amount,
            category_id: Some(form.category_id),
            item_name: &form.item_name,
            store: &form.store,
            note: &form.note,
            date: form.date,
        }
    }
}

/// The transaction entry form.
///
/// The first category is selected when `values` does not name one.
pub fn transaction_form(
    values: &TransactionFormValues<'_>,
    categories: &[Category],
    error_message: Option<&str>,
) -> Markup {
    let selected_category = values
        .category_id
        .or_else(|| categories.first().map(|category| category.id));

    html! {
        form
            id="transaction-form"
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-disabled-elt="find button[type=submit]"
            class="w-full space-y-4"
        {
            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "金額" }

                div class="input-wrapper"
                {
                    input
                        id="amount"
                        type="text"
                        name="amount"
                        inputmode="numeric"
                        placeholder="0"
                        value=(values.amount)
                        required
                        autofocus
                        class={ (FORM_TEXT_INPUT_STYLE) " text-2xl font-bold" };
                }

                @if let Some(error_message) = error_message {
                    p class="text-red-500 text-base" { (error_message) }
                }
            }

            fieldset
            {
                legend class=(FORM_LABEL_STYLE) { "カテゴリ" }

                div class="grid grid-cols-3 gap-2"
                {
                    @for category in categories {
                        @let id = format!("category-{}", category.id);

                        div
                        {
                            input
                                id=(id)
                                type="radio"
                                name="category_id"
                                value=(category.id)
                                checked[selected_category == Some(category.id)]
                                required
                                class="peer sr-only";

                            label
                                for=(id)
                                class={ "flex flex-col items-center gap-1 rounded-xl p-2 text-xs \
                                    font-bold cursor-pointer border border-transparent \
                                    peer-checked:border-pink-400 " (category.color.badge_style()) }
                            {
                                span class="text-xl" { (category.icon) }
                                (category.name)
                            }
                        }
                    }
                }
            }

            div
            {
                label for="item_name" class=(FORM_LABEL_STYLE) { "品名" }

                input
                    id="item_name"
                    type="text"
                    name="item_name"
                    placeholder="例: ランチ"
                    value=(values.item_name)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="grid grid-cols-2 gap-3"
            {
                div
                {
                    label for="store" class=(FORM_LABEL_STYLE) { "お店" }

                    input
                        id="store"
                        type="text"
                        name="store"
                        value=(values.store)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="date" class=(FORM_LABEL_STYLE) { "日付" }

                    input
                        id="date"
                        type="date"
                        name="date"
                        value=(values.date)
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            div
            {
                label for="note" class=(FORM_LABEL_STYLE) { "メモ" }

                input
                    id="note"
                    type="text"
                    name="note"
                    value=(values.note)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "記録する" }
        }
    }
}
