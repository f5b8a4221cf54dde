//! Per-vendor effective consent: the answer the consuming application
//! actually needs, computed by intersecting what a vendor is registered for
//! in the GVL with what the decoded string signals.

use crate::gvl::GvlDocument;
use crate::model::TcModel;
use thiserror::Error;

#[derive(Error, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ResolveError {
    /// Vendor ids are 1-based; 0 is a malformed argument, not a lookup miss.
    #[error("vendor id must be a positive integer")]
    InvalidVendorId,
}

/// The effective consent state of one vendor under one decoded string.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VendorConsentResult {
    pub vendor_id: u16,
    /// `None` when the vendor is not in the GVL.
    pub name: Option<String>,
    /// The vendor is absent from the GVL: the signal flags below are
    /// best-effort and the purpose lists are necessarily empty.
    pub gvl_unknown: bool,
    /// The vendor-level consent bit from the core segment.
    pub has_consent: bool,
    /// The vendor-level legitimate-interest bit from the core segment.
    pub has_legitimate_interest: bool,
    /// Purposes the vendor declares under consent that the user consented
    /// to, provided the vendor-level consent bit is set. Sorted.
    pub purposes_under_consent: Vec<u16>,
    /// Same intersection for the legitimate-interest basis. Sorted.
    pub purposes_under_legitimate_interest: Vec<u16>,
    /// Declared special features the user opted into; opt-in is global, so
    /// no vendor-level bit gates these. Sorted.
    pub special_feature_optins: Vec<u16>,
    /// Declared special purposes, verbatim: no consent gate exists for them.
    pub special_purposes: Vec<u16>,
    /// Declared features, verbatim: they ride along with any allowed purpose.
    pub features: Vec<u16>,
}

/// Computes the effective consent for `vendor_id`.
///
/// A purpose counts as consented for a vendor only when both the vendor-level
/// bit and that purpose's bit are set; either alone is not sufficient. A
/// vendor id missing from the GVL or from the string's vendor sets is not an
/// error, only a malformed argument is.
///
/// Pure and deterministic; safe to call concurrently for many vendor ids
/// against one shared model and GVL snapshot.
pub fn resolve(
    vendor_id: u16,
    model: &TcModel,
    gvl: &GvlDocument,
) -> Result<VendorConsentResult, ResolveError> {
    if vendor_id == 0 {
        return Err(ResolveError::InvalidVendorId);
    }

    let has_consent = model.has_vendor_consent(vendor_id);
    let has_legitimate_interest = model.has_vendor_legitimate_interest(vendor_id);

    let Some(vendor) = gvl.vendor(vendor_id) else {
        return Ok(VendorConsentResult {
            vendor_id,
            gvl_unknown: true,
            has_consent,
            has_legitimate_interest,
            ..Default::default()
        });
    };

    let purposes_under_consent = if has_consent {
        sorted_filter(&vendor.purposes, |id| model.has_purpose_consent(id))
    } else {
        vec![]
    };
    let purposes_under_legitimate_interest = if has_legitimate_interest {
        sorted_filter(&vendor.leg_int_purposes, |id| {
            model.has_purpose_legitimate_interest(id)
        })
    } else {
        vec![]
    };
    let special_feature_optins =
        sorted_filter(&vendor.special_features, |id| {
            model.has_special_feature_optin(id)
        });

    Ok(VendorConsentResult {
        vendor_id,
        name: Some(vendor.name.clone()),
        gvl_unknown: false,
        has_consent,
        has_legitimate_interest,
        purposes_under_consent,
        purposes_under_legitimate_interest,
        special_feature_optins,
        special_purposes: sorted_filter(&vendor.special_purposes, |_| true),
        features: sorted_filter(&vendor.features, |_| true),
    })
}

fn sorted_filter(ids: &[u16], mut keep: impl FnMut(u16) -> bool) -> Vec<u16> {
    let mut ids: Vec<u16> = ids.iter().copied().filter(|&id| keep(id)).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
