use super::categorizer::Categorizer;
use super::types::{CouponRecord, RawListing};
use crate::error::ParseError;
use chrono::{DateTime, NaiveDate, Utc};
use scraper::{ElementRef, Html, Selector};
use url::Url;

const COUPON_CODE_PARAM: &str = "couponCode";

/// Turns raw listing elements into [`CouponRecord`]s.
///
/// Pure: no I/O, the scrape timestamp is passed in by the caller.
#[derive(Debug, Clone)]
pub struct ListingParser {
    base_url: Url,
    categorizer: Categorizer,
}

impl ListingParser {
    pub fn new(base_url: Url, categorizer: Categorizer) -> Self {
        Self {
            base_url,
            categorizer,
        }
    }

    pub fn categorizer(&self) -> &Categorizer {
        &self.categorizer
    }

    pub fn parse(
        &self,
        raw: &RawListing,
        scraped_at: DateTime<Utc>,
    ) -> Result<CouponRecord, ParseError> {
        let fragment = Html::parse_fragment(&raw.html);
        let root = fragment.root_element();
        let listing = root.children().find_map(ElementRef::wrap).unwrap_or(root);

        let title = first_text(root, "h3, h4, h5").ok_or(ParseError::MissingField("title"))?;

        let href = first_element(root, "a[href]")
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(ParseError::MissingField("url"))?;
        let url = self.resolve_href(href)?;

        let id = first_element(root, "[data-coupon-id], [data-id]")
            .and_then(|el| {
                el.value()
                    .attr("data-coupon-id")
                    .or_else(|| el.value().attr("data-id"))
            })
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map_or_else(|| url.to_string(), ToString::to_string);

        let code = coupon_code_from_url(&url)
            .or_else(|| text_within(listing, "[class*=coupon], [class*=code]"));

        let full_text = collapse_whitespace(&root.text().collect::<Vec<_>>().join(" "));

        let description = text_within(listing, "p.description")
            .or_else(|| text_within(listing, "[class*=description]"))
            .or_else(|| text_within(listing, "p"));

        let original_price = text_within(listing, "[class*=price]").or_else(|| {
            root.text()
                .map(str::trim)
                .filter(|t| !t.is_empty() && *t != title)
                .find(|t| t.contains('$') || t.to_lowercase().contains("free"))
                .map(ToString::to_string)
        });

        let expires = text_within(listing, "[class*=expir], [class*=valid]")
            .or_else(|| {
                root.text()
                    .map(str::trim)
                    .find(|t| {
                        let lower = t.to_lowercase();
                        lower.contains("expires") || lower.contains("valid until")
                    })
                    .map(ToString::to_string)
            })
            .map(|text| format_expiry(&text));

        Ok(CouponRecord {
            id,
            category: self.categorizer.categorize(&title),
            title,
            code,
            discount_percent: discount_percent(&full_text),
            url: url.to_string(),
            description,
            original_price,
            expires,
            scraped_at,
        })
    }

    fn resolve_href(&self, href: &str) -> Result<Url, ParseError> {
        let mut url = self
            .base_url
            .join(href)
            .map_err(|e| ParseError::InvalidUrl {
                href: href.to_string(),
                reason: e.to_string(),
            })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ParseError::InvalidUrl {
                href: href.to_string(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }

        url.set_fragment(None);
        Ok(url)
    }
}

/// Value of the `couponCode` query parameter, if the link carries one.
pub fn coupon_code_from_url(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == COUPON_CODE_PARAM)
        .map(|(_, value)| value.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn first_element<'a>(root: ElementRef<'a>, selector: &str) -> Option<ElementRef<'a>> {
    let sel = Selector::parse(selector).ok()?;
    root.select(&sel).next()
}

fn first_text(root: ElementRef<'_>, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    root.select(&sel)
        .map(|el| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
        .find(|t| !t.is_empty())
}

/// Like [`first_text`], but never matches `scope` itself.
fn text_within(scope: ElementRef<'_>, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    scope
        .select(&sel)
        .filter(|el| el.id() != scope.id())
        .map(|el| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
        .find(|t| !t.is_empty())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `NN%` in the text, capped at 100.
fn discount_percent(text: &str) -> Option<u8> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let digits_end = i;
            while i < bytes.len() && bytes[i] == b' ' {
                i += 1;
            }
            if i < bytes.len() && bytes[i] == b'%' {
                let value: u32 = text[start..digits_end].parse().ok()?;
                return Some(u8::try_from(value.min(100)).unwrap_or(100));
            }
        } else {
            i += 1;
        }
    }
    None
}

/// `2025-01-31` becomes `January 31, 2025`; anything else is kept as-is.
fn format_expiry(text: &str) -> String {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_or_else(|_| text.to_string(), |d| d.format("%B %d, %Y").to_string())
}
