//! The navigation bar shown at the top of the page on desktop and as a tab bar on mobile.

use maud::{Markup, html};

use crate::endpoints;

/// A link in the navigation bar.
///
/// It will change appearance if `is_current` is set to
/// `true`. Only one link should be set as active at any one time.
#[derive(Clone)]
struct Link<'a> {
    url: &'a str,
    icon: &'a str,
    title: &'a str,
    is_current: bool,
}

impl Link<'_> {
    fn into_desktop_html(self) -> Markup {
        let style = if self.is_current {
            "block py-2 px-3 text-white bg-pink-500 rounded-full lg:bg-transparent
        lg:text-pink-600 lg:p-0 dark:text-white lg:dark:text-pink-400"
        } else {
            "block py-2 px-3 text-gray-900 rounded-full hover:bg-pink-50
        lg:hover:bg-transparent lg:border-0 lg:hover:text-pink-600 lg:p-0
        dark:text-white lg:dark:hover:text-pink-400 dark:hover:bg-gray-700"
        };

        html!( a href=(self.url) class=(style) { (self.title) } )
    }

    fn into_tab_html(self) -> Markup {
        let style = if self.is_current {
            "flex flex-col items-center gap-1 rounded-xl px-2 py-2 \
            text-pink-600 bg-pink-50 dark:bg-pink-900/30 dark:text-pink-200"
        } else {
            "flex flex-col items-center gap-1 rounded-xl px-2 py-2 \
            text-gray-500 hover:text-pink-500 dark:text-gray-300"
        };

        html! {
            a
                href=(self.url)
                class=(style)
                aria-current=[self.is_current.then_some("page")]
            {
                span class="text-xl" aria-hidden="true" { (self.icon) }
                span class="text-[10px] font-bold" { (self.title) }
            }
        }
    }
}

pub struct NavBar<'a> {
    links: Vec<Link<'a>>,
}

impl NavBar<'_> {
    /// Get the navigation bar.
    ///
    /// If a link matches `active_endpoint`, then that link will be
    /// marked as active and displayed differently in the HTML.
    pub fn new(active_endpoint: &str) -> NavBar<'_> {
        let links = vec![
            Link {
                url: endpoints::DASHBOARD_VIEW,
                icon: "🏠",
                title: "ホーム",
                is_current: active_endpoint == endpoints::DASHBOARD_VIEW,
            },
            Link {
                url: endpoints::NEW_TRANSACTION_VIEW,
                icon: "✏️",
                title: "入力",
                is_current: active_endpoint == endpoints::NEW_TRANSACTION_VIEW,
            },
            Link {
                url: endpoints::TRANSACTIONS_VIEW,
                icon: "📋",
                title: "履歴",
                is_current: active_endpoint == endpoints::TRANSACTIONS_VIEW,
            },
            Link {
                url: endpoints::SETTINGS_VIEW,
                icon: "⚙️",
                title: "設定",
                is_current: active_endpoint == endpoints::SETTINGS_VIEW,
            },
        ];

        NavBar { links }
    }

    pub fn into_html(self) -> Markup {
        let links = self.links;

        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white/80 border-b border-pink-100 dark:bg-gray-900 backdrop-blur"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a
                        href="/"
                        class="flex items-center space-x-2"
                    {
                        span class="text-2xl" { "🎀" }

                        span
                            class="self-center text-2xl font-semibold whitespace-nowrap text-pink-500 dark:text-pink-300"
                        {
                            "MoneyFlow"
                        }
                    }

                    div class="hidden w-full lg:block lg:w-auto"
                    {
                        ul
                            class="font-medium flex flex-col p-4 lg:p-0 mt-4
                            border border-pink-100 rounded-sm bg-pink-50
                            lg:flex-row lg:space-x-8 lg:mt-0
                            lg:border-0 lg:bg-transparent dark:bg-gray-800
                            lg:dark:bg-gray-900 dark:border-gray-700"
                        {
                            @for link in links.clone().into_iter() {
                                li { (link.into_desktop_html()) }
                            }
                        }
                    }
                }
            }

            nav class="fixed inset-x-0 bottom-0 z-40 lg:hidden"
            {
                div
                    class="border-t border-pink-100 bg-white/95 backdrop-blur
                    pb-[env(safe-area-inset-bottom)] dark:border-gray-700 dark:bg-gray-900/95"
                {
                    ul
                        class="grid grid-cols-4 gap-2 px-4 py-2"
                        aria-label="Primary"
                    {
                        @for link in links.into_iter() {
                            li class="min-w-0" { (link.into_tab_html()) }
                        }
                    }
                }
            }
        )
    }
}
