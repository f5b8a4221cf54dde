//! The in-memory representation of a decoded TCF v2 consent string.

use crate::core::idset::{BitSet, IdSet};
use crate::decoder::{decode, DecodeError, DecodeWarning};
use crate::gvl::GvlDocument;
use num_derive::FromPrimitive;
use std::str::FromStr;
use std::sync::Arc;

/// A fully decoded TCF v2 consent string.
///
/// Produced by [`decode`](crate::decode) (or `str::parse`) and read-only
/// afterwards: a model is never returned partially populated, and nothing in
/// this crate mutates one after decoding, so sharing it across threads needs
/// no synchronization.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct TcModel {
    /// Always 2 for this codec.
    pub version: u8,
    /// Milliseconds since the Unix epoch.
    pub created: u64,
    /// Milliseconds since the Unix epoch.
    pub last_updated: u64,
    pub cmp_id: u16,
    pub cmp_version: u16,
    pub consent_screen: u8,
    /// Two-letter ISO 639-1 code.
    pub consent_language: String,
    pub vendor_list_version: u16,
    pub policy_version: u8,
    pub is_service_specific: bool,
    pub use_non_standard_stacks: bool,
    pub special_feature_optins: BitSet,
    pub purpose_consents: BitSet,
    pub purpose_legitimate_interests: BitSet,
    pub purpose_one_treatment: bool,
    /// Two-letter ISO 3166-1 country code of the publisher.
    pub publisher_country_code: String,
    pub vendor_consents: IdSet,
    pub vendor_legitimate_interests: IdSet,
    pub publisher_restrictions: Vec<PublisherRestriction>,
    /// From the optional Disclosed Vendors segment; kept separate from the
    /// core vendor sets.
    pub disclosed_vendors: Option<IdSet>,
    /// From the optional Allowed Vendors segment.
    pub allowed_vendors: Option<IdSet>,
    /// From the optional Publisher TC segment; augments, never overwrites,
    /// the core purpose fields (the scopes differ).
    pub publisher_purposes: Option<PublisherPurposes>,
    /// Non-fatal observations recorded while decoding.
    pub warnings: Vec<DecodeWarning>,
    /// The GVL snapshot supplied at decode time, if any. Informational only;
    /// [`resolve`](crate::resolve) takes the GVL as an explicit argument.
    pub gvl: Option<Arc<GvlDocument>>,
}

impl TcModel {
    pub fn has_purpose_consent(&self, id: u16) -> bool {
        self.purpose_consents.contains(id)
    }

    pub fn has_purpose_legitimate_interest(&self, id: u16) -> bool {
        self.purpose_legitimate_interests.contains(id)
    }

    pub fn has_special_feature_optin(&self, id: u16) -> bool {
        self.special_feature_optins.contains(id)
    }

    pub fn has_vendor_consent(&self, id: u16) -> bool {
        self.vendor_consents.contains(id)
    }

    pub fn has_vendor_legitimate_interest(&self, id: u16) -> bool {
        self.vendor_legitimate_interests.contains(id)
    }

    /// Consented purpose ids, ascending.
    pub fn purpose_consent_ids(&self) -> Vec<u16> {
        self.purpose_consents.iter().collect()
    }

    /// Purpose ids with legitimate-interest transparency established, ascending.
    pub fn purpose_legitimate_interest_ids(&self) -> Vec<u16> {
        self.purpose_legitimate_interests.iter().collect()
    }

    /// Opted-in special feature ids, ascending.
    pub fn special_feature_optin_ids(&self) -> Vec<u16> {
        self.special_feature_optins.iter().collect()
    }

    /// Consented vendor ids, ascending.
    pub fn vendor_consent_ids(&self) -> Vec<u16> {
        self.vendor_consents.iter().collect()
    }

    /// Vendor ids with a legitimate-interest signal, ascending.
    pub fn vendor_legitimate_interest_ids(&self) -> Vec<u16> {
        self.vendor_legitimate_interests.iter().collect()
    }
}

impl FromStr for TcModel {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

/// A publisher restriction entry from the trailing region of the core segment.
#[derive(Debug, Eq, PartialEq)]
pub struct PublisherRestriction {
    pub purpose_id: u8,
    pub restriction_type: RestrictionType,
    pub restricted_vendor_ids: IdSet,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive)]
pub enum RestrictionType {
    NotAllowed = 0,
    RequireConsent = 1,
    RequireLegitimateInterest = 2,
    Undefined = 3,
}

/// Purpose signals scoped to the publisher, from the Publisher TC segment.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct PublisherPurposes {
    pub consents: BitSet,
    pub legitimate_interests: BitSet,
    /// Publisher-defined purposes beyond the standard 24; the bitfield width
    /// is the declared custom purpose count.
    pub custom_consents: BitSet,
    pub custom_legitimate_interests: BitSet,
}
