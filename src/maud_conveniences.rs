use maud::{Markup, Render, html};

///first column hugs the left, the rest are centred
const fn align(column: usize) -> &'static str {
    if column == 0 { "text-left" } else { "text-center" }
}

pub fn render_table<const N: usize>(titles: [&'static str; N], items: Vec<[Markup; N]>) -> Markup {
    html! {
        div class="overflow-x-auto" {
            table class="min-w-full bg-white" {
                thead {
                    tr class="bg-[#f7f9fc]" {
                        @for (i, title) in titles.into_iter().enumerate() {
                            th class={"py-4 px-6 font-bold text-[#1a1a1a] " (align(i))} {(title)}
                        }
                    }
                }
                tbody {
                    @for (row_no, row) in items.into_iter().enumerate() {
                        tr class={"border-b border-[#e4e4e4] hover:bg-gray-50 " (if row_no % 2 == 1 { "bg-[#f7f9fc]" } else { "" })} {
                            @for (i, col) in row.into_iter().enumerate() {
                                td class={"py-4 px-6 " (align(i))} {(col)}
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn render_nav() -> Markup {
    html! {
        header class="bg-[#1b2a4e] text-white px-24 py-3" {
            div class="flex items-center justify-between" {
                div class="flex flex-1 items-center font-bold text-lg" {"LingoTalk"}
                nav class="flex gap-11" {
                    a href="/" class="text-white font-bold" {"Classes"}
                    @for inactive in ["Calendar", "Setting", "Requests"] {
                        span class="text-orange-300 cursor-not-allowed" {(inactive)}
                    }
                }
                div class="flex-1" {}
            }
        }
    }
}

pub fn title(s: impl Render) -> Markup {
    html! {
        h1 class="text-[#1b2a4e] font-bold text-2xl" {(s)}
    }
}

pub fn spinner() -> Markup {
    html! {
        span class="inline-block h-4 w-4 rounded-full border-2 border-current border-t-transparent animate-spin" {}
    }
}

pub fn error_banner(message: impl Render, retry: Markup) -> Markup {
    html! {
        div class="p-4 bg-red-50 border-l-4 border-red-400 flex items-center justify-between" role="alert" {
            p class="text-red-700" {"Error: " (message)}
            (retry)
        }
    }
}
