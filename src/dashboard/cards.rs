//! Card components for the dashboard.
//!
//! Provides:
//! - The period selector (month/year toggle with previous and next links)
//! - The remaining balance card for the whole period
//! - One card per category with its spending against its budget

use maud::{Markup, html};

use crate::{
    dashboard::{
        aggregation::{CategorySummary, PeriodSummary},
        period::{Granularity, Period},
    },
    html::{CARD_STYLE, format_yen, progress_bar},
};

const TOGGLE_ACTIVE_STYLE: &str =
    "px-4 py-1.5 rounded-full text-xs font-bold bg-white text-pink-500 shadow-sm";
const TOGGLE_INACTIVE_STYLE: &str =
    "px-4 py-1.5 rounded-full text-xs font-bold text-pink-300 hover:text-pink-400";

/// Renders the month/year toggle and the previous/next period links.
pub(super) fn period_selector(period: Period) -> Markup {
    let toggle = |granularity: Granularity, text: &str| {
        let is_active = period.granularity == granularity;

        html! {
            a
                href=(period.with_granularity(granularity).href())
                class=(if is_active { TOGGLE_ACTIVE_STYLE } else { TOGGLE_INACTIVE_STYLE })
                aria-current=[is_active.then_some("true")]
                data-granularity=(granularity.as_str())
            {
                (text)
            }
        }
    };

    html! {
        div
            id="period-selector"
            class="w-full flex items-center justify-between gap-2"
        {
            div class="flex bg-pink-50 rounded-full p-1 border border-pink-100 dark:bg-gray-800 dark:border-gray-700"
            {
                (toggle(Granularity::Month, "月"))
                (toggle(Granularity::Year, "年"))
            }

            div class="flex items-center gap-4 bg-white px-3 py-1 rounded-full border border-pink-100 shadow-sm dark:bg-gray-800 dark:border-gray-700"
            {
                a
                    href=(period.shift(-1).href())
                    class="p-1 rounded-full hover:bg-pink-50 text-pink-400"
                    aria-label="前へ"
                    rel="prev"
                {
                    "‹"
                }

                h1 class="text-sm font-bold min-w-[6rem] text-center tracking-wide"
                {
                    (period.label())
                }

                a
                    href=(period.shift(1).href())
                    class="p-1 rounded-full hover:bg-pink-50 text-pink-400"
                    aria-label="次へ"
                    rel="next"
                {
                    "›"
                }
            }
        }
    }
}

/// Renders the balance left in the period with a progress bar for the whole budget.
pub(super) fn remaining_card(summary: &PeriodSummary, period: Period) -> Markup {
    let title = match period.granularity {
        Granularity::Month => "今月の残高",
        Granularity::Year => "年間の残高",
    };
    let remaining_style = if summary.remaining < 0 {
        "text-4xl font-bold tracking-tight text-rose-500"
    } else {
        "text-4xl font-bold tracking-tight"
    };

    html! {
        section id="remaining-card" class=(CARD_STYLE)
        {
            div class="flex justify-between items-end mb-3"
            {
                span class="text-sm font-medium text-pink-400 tracking-wider" { "♡ " (title) }

                span class=(remaining_style) data-remaining=(summary.remaining)
                {
                    (format_yen(summary.remaining))
                }
            }

            div class="space-y-3"
            {
                (progress_bar(summary.total_spent, summary.total_budget, false))

                div class="flex justify-between text-xs text-gray-400 font-medium"
                {
                    span class="bg-pink-50 px-2 py-1 rounded-lg text-pink-400 dark:bg-gray-700"
                    {
                        "使用: " (format_yen(summary.total_spent))
                    }

                    span class="bg-gray-50 px-2 py-1 rounded-lg dark:bg-gray-700"
                    {
                        "予算: " (format_yen(summary.total_budget))
                    }
                }
            }
        }
    }
}

/// Renders one card per category, in category order.
pub(super) fn category_cards(summaries: &[CategorySummary]) -> Markup {
    html! {
        section class="w-full space-y-3" aria-label="カテゴリ別"
        {
            @for summary in summaries {
                (category_card(summary))
            }
        }
    }
}

fn category_card(summary: &CategorySummary) -> Markup {
    let category = summary.category;
    let spent_style = if summary.is_over_budget() {
        "text-sm font-bold block text-rose-500"
    } else {
        "text-sm font-bold block"
    };

    html! {
        div
            class={ (CARD_STYLE) " space-y-2" }
            data-category-id=(category.id)
            data-over-budget=[summary.is_over_budget().then_some("true")]
        {
            div class="flex justify-between items-center"
            {
                div class="flex items-center gap-3"
                {
                    span
                        class={ "w-10 h-10 rounded-xl flex items-center justify-center text-lg "
                            (category.color.badge_style()) }
                    {
                        (category.icon)
                    }

                    span class="text-sm font-bold" { (category.name) }
                }

                div class="text-right"
                {
                    span class=(spent_style) { (format_yen(summary.spent)) }
                    span class="text-[10px] text-gray-400" { "/ " (format_yen(summary.budget)) }
                }
            }

            (progress_bar(summary.spent, summary.budget, true))
        }
    }
}
