use maud::{DOCTYPE, Markup, PreEscaped, html};

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};

// Link styles
pub const LINK_STYLE: &str = "text-pink-600 hover:text-pink-500 \
    dark:text-pink-400 dark:hover:text-pink-300 underline";

// Button styles
pub const BUTTON_PRIMARY_STYLE: &str = "w-full px-4 py-2 bg-pink-500 \
    dark:bg-pink-600 disabled:bg-pink-700 hover:enabled:bg-pink-600 \
    hover:enabled:dark:bg-pink-700 text-white rounded-full font-bold";

pub const BUTTON_SECONDARY_STYLE: &str = "w-full py-2.5 px-5 mb-2 \
    text-sm font-medium text-gray-900 bg-white rounded-full border border-pink-200 \
    hover:bg-pink-50 hover:text-pink-700 focus:z-10 dark:bg-gray-800 \
    dark:text-gray-400 dark:border-gray-600 dark:hover:text-white \
    dark:hover:bg-gray-700";

pub const BUTTON_DELETE_STYLE: &str = "text-red-600 hover:text-red-500 \
    dark:text-red-500 dark:hover:text-red-400 underline bg-transparent \
    border-none cursor-pointer";

// Form styles
pub const FORM_CONTAINER_STYLE: &str = "flex flex-col items-center px-6 py-8 \
    mx-auto lg:py-0 max-w-md text-gray-900 dark:text-white";
pub const FORM_LABEL_STYLE: &str = "block mb-2 text-sm font-medium text-gray-900 dark:text-white";
pub const FORM_TEXT_INPUT_STYLE: &str = "block w-full p-2.5 rounded-xl text-sm \
    text-gray-900 dark:text-white disabled:text-gray-500 bg-pink-50/50 \
    dark:bg-gray-700 border border-pink-100 dark:border-gray-600 \
    dark:placeholder-gray-400 focus:ring-pink-400 focus:border-pink-400";
pub const FORM_RADIO_GROUP_STYLE: &str = "grid grid-cols-5 gap-2";
pub const FORM_RADIO_INPUT_STYLE: &str = "peer sr-only";
pub const FORM_RADIO_LABEL_STYLE: &str = "block rounded-lg border border-gray-300 \
    dark:border-gray-600 px-2 py-2 text-center text-xs font-medium cursor-pointer \
    peer-checked:ring-2 peer-checked:ring-pink-400";

// Card styles
pub const CARD_STYLE: &str = "w-full bg-white dark:bg-gray-800 rounded-2xl shadow-sm \
    border border-pink-100 dark:border-gray-700 p-4";

// Page container
pub const PAGE_CONTAINER_STYLE: &str =
    "flex flex-col items-center px-6 py-8 mx-auto lg:py-5 max-w-2xl text-gray-900 dark:text-white";

pub enum HeadElement {
    /// The file path or URL to a JavaScript script.
    ScriptLink(String),
    Style(PreEscaped<String>),
}

pub fn base(title: &str, head_elements: &[HeadElement], content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="ja"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - MoneyFlow" }
                link href="/static/main.css" rel="stylesheet";
                script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4" {}

                script src="https://unpkg.com/htmx.org@2.0.8/dist/htmx.min.js" {}
                script src="https://unpkg.com/htmx-ext-response-targets@2.0.4/dist/response-targets.js" {}

                style
                {
                    r#"
                    #indicator.htmx-indicator {
                        display: none;
                    }

                    #indicator.htmx-request .htmx-indicator {
                        display: inline;
                    }

                    #indicator.htmx-request.htmx-indicator {
                        display: inline;
                    }
                    "#
                }

                @for element in head_elements
                {
                    @match element
                    {
                        HeadElement::ScriptLink(path) => script src=(path) {}
                        HeadElement::Style(text) => style { (text) }
                    }
                }

                script src="/static/app.js" defer {}
            }

            body
                hx-ext="response-targets"
                class="container max-w-full min-h-screen bg-pink-50/40 dark:bg-gray-900 pb-[calc(5rem+env(safe-area-inset-bottom))] lg:pb-0"
            {
                (content)

                // Alert container for out-of-band swaps
                div
                    id="alert-container"
                    class="hidden w-full max-w-md px-4"
                    style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
                {}
            }
        }
    }
}

/// A full page for errors, with a large status code and a link back to the dashboard.
pub fn error_view(title: &str, header: &str, description: &str, fix: &str) -> Markup {
    // Template adapted from https://flowbite.com/blocks/marketing/404/
    let content = html!(
        section class="bg-white dark:bg-gray-900"
        {
            div class="py-8 px-4 mx-auto max-w-screen-xl lg:py-16 lg:px-6"
            {
                div class="mx-auto max-w-screen-sm text-center"
                {
                    h1
                        class="mb-4 text-7xl tracking-tight font-extrabold
                            lg:text-9xl text-pink-500 dark:text-pink-400"
                    {
                        (header)
                    }

                    p
                        class="mb-4 text-3xl md:text-4xl tracking-tight
                            font-bold text-gray-900 dark:text-white"
                    {
                        (description)
                    }

                    p
                        class="mb-4 text-1xl md:text-2xl tracking-tight
                            text-gray-900 dark:text-white"
                    {
                        (fix)
                    }

                    a
                        href="/"
                        class="inline-flex text-white bg-pink-500
                            hover:bg-pink-700 focus:ring-4 focus:outline-hidden
                            focus:ring-pink-300 font-medium rounded-full text-sm px-5
                            py-2.5 text-center my-4"
                    {
                        "ホームに戻る"
                    }
                }
            }
        }
    );

    base(title, &[], &content)
}

/// A centered card with a heading, used for the log-in page.
pub fn form_card(form_title: &str, form: &Markup) -> Markup {
    html! {
        div class="flex flex-col items-center justify-center px-6 py-8 mx-auto"
        {
            a href="/" class="flex items-center mb-6 text-2xl font-semibold text-gray-900 dark:text-white"
            {
                "🎀 MoneyFlow"
            }

            div class="w-full bg-white rounded-2xl shadow dark:border md:mt-0 sm:max-w-md xl:p-0 dark:bg-gray-800 dark:border-gray-700"
            {
                div class="p-6 space-y-4 md:space-y-6 sm:p-8"
                {
                    h1 class="text-xl font-bold leading-tight tracking-tight text-gray-900 md:text-2xl dark:text-white"
                    {
                        (form_title)
                    }

                    (form)
                }
            }
        }
    }
}

pub fn email_input(email: &str) -> Markup {
    html! {
        div
        {
            label for="email" class=(FORM_LABEL_STYLE) { "Email" }

            input
                type="email"
                name="email"
                id="email"
                placeholder="you@example.com"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                value=(email);
        }
    }
}

pub fn password_input(password: &str, min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="password"
                class=(FORM_LABEL_STYLE)
            {
                "Password"
            }

            input
                type="password"
                name="password"
                id="password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                value=(password)
                minlength=(min_length);

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }

    }
}

pub fn loading_spinner() -> Markup {
    // Spinner SVG adapted from https://flowbite.com/docs/components/spinner/
    html! {
        svg
            aria-hidden="true"
            role="status"
            class="inline text-white w-4 h-4 me-2 mb-1 animate-spin"
            viewBox="0 0 100 101"
            fill="none"
            xmlns="http://www.w3.org/2000/svg"
        {
            path
                d="M100 50.5908C100 78.2051 77.6142 100.591 50 100.591C22.3858 100.591 0 78.2051 0 50.5908C0 22.9766 22.3858 0.59082 50 0.59082C77.6142 0.59082 100 22.9766 100 50.5908ZM9.08144 50.5908C9.08144 73.1895 27.4013 91.5094 50 91.5094C72.5987 91.5094 90.9186 73.1895 90.9186 50.5908C90.9186 27.9921 72.5987 9.67226 50 9.67226C27.4013 9.67226 9.08144 27.9921 9.08144 50.5908Z"
                fill="#E5E7EB" {}
            path
                d="M93.9676 39.0409C96.393 38.4038 97.8624 35.9116 97.0079 33.5539C95.2932 28.8227 92.871 24.3692 89.8167 20.348C85.8452 15.1192 80.8826 10.7238 75.2124 7.41289C69.5422 4.10194 63.2754 1.94025 56.7698 1.05124C51.7666 0.367541 46.6976 0.446843 41.7345 1.27873C39.2613 1.69328 37.813 4.19778 38.4501 6.62326C39.0873 9.04874 41.5694 10.4717 44.0505 10.1071C47.8511 9.54855 51.7191 9.52689 55.5402 10.0491C60.8642 10.7766 65.9928 12.5457 70.6331 15.2552C75.2735 17.9648 79.3347 21.5619 82.5849 25.841C84.9175 28.9121 86.7997 32.2913 88.1811 35.8758C89.083 38.2158 91.5421 39.6781 93.9676 39.0409Z"
                fill="currentColor" {}
        }
    }
}

/// Returns the CSS styles for adding a yen sign prefix to amount inputs.
pub fn yen_input_styles() -> HeadElement {
    HeadElement::Style(PreEscaped(
        r#"
        .input-wrapper {
            position: relative;
            display: block;
        }
        .input-wrapper input {
            padding-left: 1.6rem;
        }
        .input-wrapper::before {
            content: '¥';
            position: absolute;
            left: 0.7rem;
            top: 50%;
            transform: translateY(-50%);
            pointer-events: none;
        }
        "#
        .to_owned(),
    ))
}

/// Format a whole yen amount, e.g. `12000` as "¥12,000" and `-500` as "-¥500".
pub fn format_yen(amount: i64) -> String {
    static POSITIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency("¥")
            .unwrap()
            .precision(Precision::Decimals(0))
    });

    static NEGATIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency("-¥")
            .unwrap()
            .precision(Precision::Decimals(0))
    });

    if amount < 0 {
        negative_fmt.fmt_string(amount.unsigned_abs() as f64)
    } else if amount > 0 {
        positive_fmt.fmt_string(amount as f64)
    } else {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        "¥0".to_owned()
    }
}

/// Percentage of `budget` used by `spent`, clamped to the range 0..=100.
///
/// A budget of zero (or less) is always shown as 0% used.
pub fn percent_used(spent: i64, budget: i64) -> f64 {
    if budget <= 0 {
        return 0.0;
    }

    (spent as f64 / budget as f64 * 100.0).clamp(0.0, 100.0)
}

/// A horizontal bar showing how much of `budget` has been used by `spent`.
///
/// The bar turns red when the budget is exceeded.
pub fn progress_bar(spent: i64, budget: i64, compact: bool) -> Markup {
    let percentage = percent_used(spent, budget);
    let is_over = budget > 0 && spent > budget;
    let height = if compact { "h-2" } else { "h-4" };
    let fill = if is_over { "bg-rose-400" } else { "bg-pink-400" };

    html! {
        div
            class={ "w-full bg-pink-50 rounded-full overflow-hidden border border-pink-100 " (height) }
            role="progressbar"
            aria-valuemin="0"
            aria-valuemax="100"
            aria-valuenow=(format!("{percentage:.0}"))
        {
            div
                class={ "h-full transition-all duration-500 ease-out " (fill) }
                style=(format!("width: {percentage:.1}%"))
            {}
        }
    }
}

/// A button that deletes the element matched by `hx_target` once the user confirms.
///
/// Errors are swapped into the alert container instead.
pub fn delete_button(delete_url: &str, confirm_message: &str, hx_target: &str) -> Markup {
    html! {
        button
            type="button"
            hx-delete=(delete_url)
            hx-confirm=(confirm_message)
            hx-target=(hx_target)
            hx-target-error="#alert-container"
            hx-swap="delete"
            class=(BUTTON_DELETE_STYLE)
            aria-label="削除"
        {
            "削除"
        }
    }
}

/// A link with pink text for use in a <p> tag.
pub fn link(url: &str, text: &str) -> Markup {
    html! (
        a href=(url) class=(LINK_STYLE) { (text) }
    )
}

#[cfg(test)]
mod format_tests {
    use super::{format_yen, percent_used};

    #[test]
    fn formats_zero() {
        assert_eq!(format_yen(0), "¥0");
    }

    #[test]
    fn negative_amounts_have_leading_minus() {
        let formatted = format_yen(-500);

        assert!(formatted.starts_with("-¥"), "got {formatted}");
        assert!(formatted.ends_with("500"), "got {formatted}");
    }

    #[test]
    fn positive_amounts_have_yen_prefix() {
        let formatted = format_yen(40000);

        assert!(formatted.starts_with('¥'), "got {formatted}");
        assert!(!formatted.contains('.'), "got {formatted}");
    }

    #[test]
    fn percent_used_is_proportional() {
        assert_eq!(percent_used(12000, 40000), 30.0);
        assert_eq!(percent_used(3000, 10000), 30.0);
    }

    #[test]
    fn percent_used_is_clamped() {
        assert_eq!(percent_used(50000, 40000), 100.0);
        assert_eq!(percent_used(-10, 40000), 0.0);
    }

    #[test]
    fn percent_used_is_zero_without_budget() {
        assert_eq!(percent_used(1234, 0), 0.0);
    }
}
