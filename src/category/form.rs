//! The form shared by the create and edit category pages.

use maud::{Markup, html};

use crate::{
    category::{Category, CategoryColor, domain::CategoryFormData},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
    },
};

/// Which request the form should send.
pub enum CategoryFormAction<'a> {
    /// `hx-post` to the given endpoint.
    Create(&'a str),
    /// `hx-put` to the given endpoint.
    Update(&'a str),
}

/// The values to pre-fill the form with.
#[derive(Debug, Default)]
pub struct CategoryFormValues<'a> {
    pub name: &'a str,
    pub icon: &'a str,
    pub color: CategoryColor,
    pub budget: String,
}

impl<'a> From<&'a Category> for CategoryFormValues<'a> {
    fn from(category: &'a Category) -> Self {
        Self {
            name: category.name.as_ref(),
            icon: category.icon.as_ref(),
            color: category.color,
            budget: category.budget.to_string(),
        }
    }
}

impl<'a> From<&'a CategoryFormData> for CategoryFormValues<'a> {
    fn from(form: &'a CategoryFormData) -> Self {
        Self {
            name: &form.name,
            icon: &form.icon,
            color: form.color.parse().unwrap_or_default(),
            budget: form.budget.clone(),
        }
    }
}

pub fn category_form(
    action: CategoryFormAction<'_>,
    values: &CategoryFormValues<'_>,
    error_message: &str,
) -> Markup {
    let (hx_post, hx_put, submit_text) = match action {
        CategoryFormAction::Create(endpoint) => (Some(endpoint), None, "カテゴリを追加"),
        CategoryFormAction::Update(endpoint) => (None, Some(endpoint), "保存"),
    };

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div class="flex gap-3"
            {
                div class="w-20"
                {
                    label for="icon" class=(FORM_LABEL_STYLE) { "アイコン" }

                    input
                        id="icon"
                        type="text"
                        name="icon"
                        placeholder="📦"
                        value=(values.icon)
                        class={ (FORM_TEXT_INPUT_STYLE) " text-center text-xl" };
                }

                div class="flex-1"
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "カテゴリ名" }

                    input
                        id="name"
                        type="text"
                        name="name"
                        placeholder="例: カフェ"
                        value=(values.name)
                        required
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            div
            {
                label for="budget" class=(FORM_LABEL_STYLE) { "月の予算" }

                div class="input-wrapper"
                {
                    input
                        id="budget"
                        type="text"
                        name="budget"
                        inputmode="numeric"
                        placeholder="0"
                        value=(values.budget)
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            fieldset class="space-y-2"
            {
                legend class=(FORM_LABEL_STYLE) { "カラー" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    @for color in CategoryColor::ALL {
                        @let id = format!("color-{color}");

                        div
                        {
                            input
                                id=(id)
                                type="radio"
                                name="color"
                                value=(color.as_str())
                                checked[color == values.color]
                                class=(FORM_RADIO_INPUT_STYLE);

                            label for=(id) class=(FORM_RADIO_LABEL_STYLE) title=(color.as_str())
                            {
                                span class={ "block h-5 w-full rounded " (color.swatch_style()) } {}
                            }
                        }
                    }
                }
            }

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}
