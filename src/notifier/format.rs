use crate::coupons::{Category, CouponRecord};
use crate::error::NotifierError;
use serde::Serialize;
use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "message";
const NOT_AVAILABLE: &str = "N/A";

/// Built-in layout. Variables: `category`, `source`, and `records`, each with
/// `title`, `code`, `discount`, `price`, `expires`, `url`, `description`.
pub const DEFAULT_TEMPLATE: &str = "🎓 *New {{ category }} Courses*
{% for r in records %}
📚 *{{ r.title }}*
{% if r.discount %}🔥 {{ r.discount }}% off
{% endif %}💰 Original Price: {{ r.price }}
🏷️ Coupon: {{ r.code }}
⏰ Expires: {{ r.expires }}
🔗 {{ r.url }}
{% endfor %}
🔍 More deals at: {{ source }}";

#[derive(Debug, Serialize)]
struct MessageView<'a> {
    category: &'static str,
    source: &'a str,
    records: Vec<RecordView<'a>>,
}

#[derive(Debug, Serialize)]
struct RecordView<'a> {
    title: &'a str,
    code: &'a str,
    discount: String,
    price: &'a str,
    expires: &'a str,
    url: &'a str,
    description: &'a str,
}

impl<'a> From<&'a CouponRecord> for RecordView<'a> {
    fn from(record: &'a CouponRecord) -> Self {
        Self {
            title: &record.title,
            code: record.code.as_deref().unwrap_or(NOT_AVAILABLE),
            discount: record
                .discount_percent
                .map(|d| d.to_string())
                .unwrap_or_default(),
            price: record.original_price.as_deref().unwrap_or(NOT_AVAILABLE),
            expires: record.expires.as_deref().unwrap_or(NOT_AVAILABLE),
            url: &record.url,
            description: record.description.as_deref().unwrap_or_default(),
        }
    }
}

/// Renders groups of same-category records into message text.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    tera: Tera,
}

impl MessageFormatter {
    /// Compile `template`, or the built-in layout when `None`.
    pub fn new(template: Option<&str>) -> Result<Self, NotifierError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, template.unwrap_or(DEFAULT_TEMPLATE))
            .map_err(|e| NotifierError::Render(render_error_chain(&e)))?;
        Ok(Self { tera })
    }

    /// Render and cut to `max_chars`.
    pub fn render(
        &self,
        category: Category,
        source: &str,
        records: &[&CouponRecord],
        max_chars: usize,
    ) -> Result<String, NotifierError> {
        let text = self.render_full(category, source, records)?;
        Ok(truncate_text(&text, max_chars))
    }

    /// Rendered text before any length limit is applied.
    pub fn render_full(
        &self,
        category: Category,
        source: &str,
        records: &[&CouponRecord],
    ) -> Result<String, NotifierError> {
        let view = MessageView {
            category: category.label(),
            source,
            records: records.iter().map(|r| RecordView::from(*r)).collect(),
        };
        let context =
            Context::from_serialize(&view).map_err(|e| NotifierError::Render(e.to_string()))?;
        let text = self
            .tera
            .render(TEMPLATE_NAME, &context)
            .map_err(|e| NotifierError::Render(render_error_chain(&e)))?;
        Ok(text.trim().to_string())
    }
}

fn render_error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

/// Cut to at most `max_chars` characters, marking the cut with `...`.
fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let truncated: String = text.chars().take(keep).collect();
    format!("{truncated}...")
}
