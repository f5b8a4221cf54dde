//! Decoder for IAB TCF v2 consent strings and per-vendor consent resolution
//! against the Global Vendor List (GVL).
//!
//! A TC string is a compact, dot-segmented, base64url-encoded record of a
//! user's consent decisions. This crate decodes such strings into a
//! [`TcModel`] and, given a parsed GVL document, answers the question
//! consumers actually ask: which purposes may this vendor process, under
//! which legal basis?
//!
//! NOTE: This is not an official IAB library. Only TCF version 2 strings are
//! supported.
//!
//! # Decoding a consent string
//!
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let s = "COvFyGBOvFyGBAbAAAENAPCAAOAAAAAAAAAAAEEUACCKAAA";
//! let model = tcf_core::decode(s)?;
//!
//! assert_eq!(model.cmp_id, 27);
//! assert_eq!(model.purpose_consent_ids(), vec![1, 2, 3]);
//! assert!(model.has_vendor_consent(6));
//! # Ok(())
//! # }
//! ```
//!
//! # Resolving a vendor's effective consent
//!
//! A vendor-level consent bit alone is not enough: consent in TCF is
//! purpose-scoped, so [`resolve`] intersects the vendor's GVL registration
//! with the signaled bits.
//!
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use tcf_core::GvlDocument;
//!
//! let model = tcf_core::decode("COvFyGBOvFyGBAbAAAENAPCAAOAAAAAAAAAAAEEUACCKAAA")?;
//! let gvl = GvlDocument::from_json(
//!     r#"{"vendors": {"6": {"id": 6, "name": "Acme", "purposes": [1, 2, 4]}}}"#,
//! )?;
//!
//! let result = tcf_core::resolve(6, &model, &gvl)?;
//! assert_eq!(result.name.as_deref(), Some("Acme"));
//! assert_eq!(result.purposes_under_consent, vec![1, 2]);
//! # Ok(())
//! # }
//! ```
//!
//! # Error handling
//!
//! Decoding is conservative: if a string cannot be fully decoded, it is an
//! error, and no partial model is returned. This avoids deriving consent
//! decisions from corrupted payloads. The one exception is an optional
//! segment with an unrecognized type, which is skipped and recorded in
//! [`TcModel::warnings`] so that strings from future policy versions remain
//! readable.

pub mod core;
pub mod decoder;
pub mod gvl;
pub mod model;
pub mod resolver;

pub use crate::core::idset::{BitSet, IdSet};
pub use crate::decoder::{
    decode, decode_with_gvl, DecodeError, DecodeWarning, SegmentType, TCF_VERSION,
};
pub use crate::gvl::{Definition, GvlCache, GvlDocument, Vendor};
pub use crate::model::{PublisherPurposes, PublisherRestriction, RestrictionType, TcModel};
pub use crate::resolver::{resolve, ResolveError, VendorConsentResult};
