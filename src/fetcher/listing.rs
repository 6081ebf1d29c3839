use crate::coupons::RawListing;
use scraper::{Html, Selector};
use url::Url;

/// Split a listing page into raw entries.
///
/// An entry is any element matching `selector` that holds both a link and
/// an `h3`/`h4`/`h5` heading. Nested matches are kept only at the outermost
/// level.
pub fn split_listings(html: &str, selector: &str, page: u32) -> Vec<RawListing> {
    let Ok(item_sel) = Selector::parse(selector) else {
        tracing::warn!(selector, "invalid listing selector");
        return Vec::new();
    };
    let (Ok(link_sel), Ok(heading_sel)) =
        (Selector::parse("a[href]"), Selector::parse("h3, h4, h5"))
    else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut listings = Vec::new();
    let mut taken = Vec::new();

    for element in document.select(&item_sel) {
        if element
            .ancestors()
            .any(|ancestor| taken.contains(&ancestor.id()))
        {
            continue;
        }
        if element.select(&link_sel).next().is_none()
            || element.select(&heading_sel).next().is_none()
        {
            continue;
        }
        taken.push(element.id());
        listings.push(RawListing {
            html: element.html(),
            page,
        });
    }

    listings
}

/// First link in `html` whose host is `host` or a subdomain of it.
pub fn find_link_to_host(html: &str, base: &Url, host: &str) -> Option<Url> {
    let link_sel = Selector::parse("a[href]").ok()?;
    let host = host.trim_start_matches('.').to_ascii_lowercase();
    let document = Html::parse_document(html);

    document
        .select(&link_sel)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .find(|url| {
            url.host_str().is_some_and(|h| {
                let h = h.to_ascii_lowercase();
                h == host || h.ends_with(&format!(".{host}"))
            })
        })
}
