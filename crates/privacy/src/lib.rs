pub mod apply;
pub mod errors;
pub mod policy;
pub mod text;
pub mod url;

pub use apply::{redact_value, scrub_json, scrub_text, RedactReport};
pub use errors::{PrivacyError, PrivacyResult};
pub use policy::{HashAlg, PiiRule, PrivacyPolicyView};
pub use text::{digest_bytes, mask_pii, normalize, truncate};
