//! `paginate` helper: pagination widget markup.
//!
//! ```handlebars
//! {{paginate page pages 2 "/posts"}}
//! ```
//!
//! Links point to `{url}/page/{n}`, plus `{url}/page/first` and
//! `{url}/page/last`.

use std::fmt::Write as _;

use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderErrorReason,
    html_escape,
};

/// Render the pagination list for `cur_page` of `n_pages`.
///
/// `offset` is the number of numbered links shown on each side of the
/// current page. Returns an empty string when there is only one page.
pub fn paginate(cur_page: i64, n_pages: i64, offset: i64, url: &str) -> String {
    if n_pages < 2 {
        return String::new();
    }

    let low = cur_page.saturating_sub(offset);
    let high = cur_page.saturating_add(offset);
    let mut html = String::from("<ul class='pagination'>");

    if cur_page > 1 {
        let _ = write!(
            html,
            "<li><a href='{url}/page/first'>&laquo;First</a></li>\
             <li><a href='{url}/page/{}'>&laquo;</a></li>",
            cur_page.saturating_sub(1)
        );
    }

    if low > 1 {
        html.push_str("<li><span>...</span></li>");
    }

    // Clipped up front so a huge offset stays cheap
    for page in low.max(1)..=high.min(n_pages) {
        if page == cur_page {
            let _ = write!(
                html,
                "<li class='active'><a href='{url}/page/{page}'>{page}</a></li>"
            );
        } else {
            let _ = write!(html, "<li><a href='{url}/page/{page}'>{page}</a></li>");
        }
    }

    if high < n_pages {
        html.push_str("<li><span>...</span></li>");
    }

    if cur_page != n_pages {
        let _ = write!(
            html,
            "<li><a href='{url}/page/{}'>&raquo;</a></li>\
             <li><a href='{url}/page/last'>Last&raquo;</a></li>",
            cur_page.saturating_add(1)
        );
    }

    html.push_str("</ul>");
    html
}

pub fn paginate_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let int = |index: usize| {
        h.param(index)
            .ok_or(RenderErrorReason::ParamNotFoundForIndex("paginate", index))?
            .value()
            .as_i64()
            .ok_or(RenderErrorReason::InvalidParamType("integer"))
    };
    let cur_page = int(0)?;
    let n_pages = int(1)?;
    let offset = int(2)?;
    let url = h.param(3).and_then(|p| p.value().as_str()).unwrap_or("");

    out.write(&paginate(cur_page, n_pages, offset, &html_escape(url)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page_is_empty() {
        assert_eq!(paginate(1, 1, 1, "/posts"), "");
        assert_eq!(paginate(1, 0, 1, "/posts"), "");
    }

    #[test]
    fn test_window_in_the_middle() {
        let html = paginate(3, 10, 1, "/posts");

        assert!(html.starts_with("<ul class='pagination'>"));
        assert!(html.contains("<a href='/posts/page/first'>&laquo;First</a>"));
        assert!(html.contains("<a href='/posts/page/2'>&laquo;</a>"));
        assert!(html.contains("<a href='/posts/page/2'>2</a>"));
        assert!(html.contains("<li class='active'><a href='/posts/page/3'>3</a></li>"));
        assert!(html.contains("<a href='/posts/page/4'>4</a>"));
        assert!(!html.contains(">1</a>"));
        assert!(!html.contains(">5</a>"));
        assert_eq!(html.matches("<li><span>...</span></li>").count(), 2);
        assert!(html.contains("<a href='/posts/page/4'>&raquo;</a>"));
        assert!(html.ends_with("<li><a href='/posts/page/last'>Last&raquo;</a></li></ul>"));
    }

    #[test]
    fn test_first_page_has_no_back_links() {
        let html = paginate(1, 2, 1, "");

        assert!(!html.contains("First"));
        assert!(!html.contains("..."));
        assert!(html.contains("<li class='active'><a href='/page/1'>1</a></li>"));
        assert!(html.contains("<a href='/page/2'>2</a>"));
        assert!(html.contains("Last&raquo;"));
    }

    #[test]
    fn test_last_page_has_no_forward_links() {
        let html = paginate(10, 10, 2, "/p");

        assert!(html.contains("&laquo;First"));
        assert_eq!(html.matches("...").count(), 1);
        assert!(html.contains("<a href='/p/page/8'>8</a>"));
        assert!(!html.contains("Last&raquo;"));
        assert!(!html.contains("&raquo;</a>"));
    }

    #[test]
    fn test_extreme_arguments_do_not_overflow() {
        let html = paginate(1, 10, i64::MAX, "/x");
        assert_eq!(html.matches("<li><a href='/x/page/").count(), 9 + 2);
        assert!(!html.contains("..."));

        let html = paginate(i64::MAX, i64::MAX, 0, "");
        assert!(html.contains("&laquo;First"));
        assert!(!html.contains("Last&raquo;"));

        assert!(paginate(i64::MIN, 3, 1, "").starts_with("<ul"));
    }

    #[test]
    fn test_huge_offset_is_clipped_to_page_range() {
        let html = paginate(5, 10, 1_000_000_000_000, "");
        assert_eq!(html.matches("<a href='/page/").count(), 10 + 4);
        assert!(!html.contains("..."));
    }

    #[test]
    fn test_helper_with_extreme_offset() {
        let mut registry = Handlebars::new();
        registry.register_helper("paginate", Box::new(paginate_helper));
        let html = registry
            .render_template("{{paginate 1 10 9223372036854775807 \"/x\"}}", &())
            .unwrap();
        assert!(html.contains("<a href='/x/page/10'>10</a>"));
    }
}
