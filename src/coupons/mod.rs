pub mod categorizer;
pub mod parser;
pub mod types;

pub use categorizer::{Categorizer, default_rules};
pub use parser::{ListingParser, coupon_code_from_url};
pub use types::{Category, CategoryRule, CouponRecord, RawListing};
