//! Decoding of TCF v2 consent strings into a [`TcModel`].
//!
//! A consent string is a dot-separated sequence of independently
//! base64url-encoded segments. Segment 0 is the mandatory core segment; later
//! segments carry a 6-bit type prefix. Decoding is strict and all-or-nothing:
//! any malformed recognized segment fails the whole decode, so a caller never
//! sees a model that under- or over-reports consent. The single tolerance is
//! for segment types this crate does not know about, which are skipped and
//! recorded as warnings so that strings from future policy versions remain
//! readable.

use crate::core::base64::DecodeExt;
use crate::core::idset::IdSet;
use crate::core::{DataReader, FromDataReader};
use crate::gvl::GvlDocument;
use crate::model::{PublisherPurposes, PublisherRestriction, RestrictionType, TcModel};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::io;
use std::sync::Arc;
use strum_macros::Display;
use thiserror::Error;

/// The only consent string version this codec accepts.
pub const TCF_VERSION: u8 = 2;

const SEGMENT_TYPE_BITS: u32 = 6;

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, FromPrimitive)]
pub enum SegmentType {
    /// Only valid as segment index 0, where it carries no type prefix.
    Core = 0,
    DisclosedVendors = 1,
    AllowedVendors = 2,
    PublisherTc = 3,
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("empty consent string")]
    EmptyString,
    #[error("unable to decode segment")]
    SegmentDecode(#[from] base64::DecodeError),
    /// A bit read ran past the end of a segment: truncated or corrupt input.
    #[error("unexpected end of segment data")]
    Read(#[from] io::Error),
    #[error("unsupported consent string version (expected {TCF_VERSION}, found {found})")]
    UnsupportedVersion { found: u8 },
    /// A vendor range entry with `start > end`, or one referencing the
    /// invalid vendor id 0.
    #[error("malformed vendor range ({start}..={end})")]
    MalformedRange { start: u16, end: u16 },
    #[error("duplicate segment type {segment_type}")]
    DuplicateSegmentType { segment_type: SegmentType },
}

/// Non-fatal observations recorded on the model during decoding.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum DecodeWarning {
    /// The wire format cannot enforce `created <= last_updated`; a violation
    /// marks a sloppy encoder, not an unreadable string.
    #[error("created timestamp {created} is later than last updated {last_updated}")]
    CreatedAfterLastUpdated { created: u64, last_updated: u64 },
    #[error("unknown segment type {segment_type}, segment skipped")]
    UnknownSegmentType { segment_type: u8 },
}

/// Decodes a consent string into a [`TcModel`].
///
/// Never returns a partially populated model: every error aborts the whole
/// decode.
pub fn decode(s: &str) -> Result<TcModel, DecodeError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(DecodeError::EmptyString);
    }

    let mut segments_iter = s.split('.');

    // split always yields at least one element: the core segment
    let core = segments_iter.next().unwrap_or(s).decode_base64_url()?;
    let mut r = DataReader::new(&core);
    let mut model: TcModel = r.parse()?;
    let mut seen = Vec::new();

    for segment in segments_iter {
        let bytes = segment.decode_base64_url()?;
        let mut r = DataReader::new(&bytes);
        let type_bits: u8 = r.read_fixed_integer(SEGMENT_TYPE_BITS)?;

        let known = SegmentType::from_u8(type_bits).filter(|&t| t != SegmentType::Core);
        let Some(segment_type) = known else {
            model.warnings.push(DecodeWarning::UnknownSegmentType {
                segment_type: type_bits,
            });
            continue;
        };

        if seen.contains(&segment_type) {
            return Err(DecodeError::DuplicateSegmentType { segment_type });
        }
        seen.push(segment_type);

        match segment_type {
            SegmentType::DisclosedVendors => {
                model.disclosed_vendors = Some(read_vendor_set(&mut r)?);
            }
            SegmentType::AllowedVendors => {
                model.allowed_vendors = Some(read_vendor_set(&mut r)?);
            }
            SegmentType::PublisherTc => {
                model.publisher_purposes = Some(r.parse()?);
            }
            // filtered out above
            SegmentType::Core => {}
        }
    }

    Ok(model)
}

/// Like [`decode`], additionally attaching a GVL snapshot to the model.
///
/// The attachment is informational bookkeeping for consumers;
/// [`resolve`](crate::resolve) takes its GVL as an explicit argument.
pub fn decode_with_gvl(s: &str, gvl: Arc<GvlDocument>) -> Result<TcModel, DecodeError> {
    let mut model = decode(s)?;
    model.gvl = Some(gvl);
    Ok(model)
}

impl FromDataReader for TcModel {
    type Err = DecodeError;

    fn from_data_reader(r: &mut DataReader) -> Result<Self, Self::Err> {
        let version = r.read_fixed_integer(6)?;
        if version != TCF_VERSION {
            return Err(DecodeError::UnsupportedVersion { found: version });
        }

        let created = r.read_datetime_as_unix_timestamp_millis()?;
        let last_updated = r.read_datetime_as_unix_timestamp_millis()?;
        let cmp_id = r.read_fixed_integer(12)?;
        let cmp_version = r.read_fixed_integer(12)?;
        let consent_screen = r.read_fixed_integer(6)?;
        let consent_language = r.read_string(2)?;
        let vendor_list_version = r.read_fixed_integer(12)?;
        let policy_version = r.read_fixed_integer(6)?;
        let is_service_specific = r.read_bool()?;
        let use_non_standard_stacks = r.read_bool()?;
        let special_feature_optins = r.read_fixed_bitfield(12)?;
        let purpose_consents = r.read_fixed_bitfield(24)?;
        let purpose_legitimate_interests = r.read_fixed_bitfield(24)?;
        let purpose_one_treatment = r.read_bool()?;
        let publisher_country_code = r.read_string(2)?;
        let vendor_consents = read_vendor_set(r)?;
        let vendor_legitimate_interests = read_vendor_set(r)?;
        let publisher_restrictions = read_publisher_restrictions(r)?;

        let mut warnings = Vec::new();
        if created > last_updated {
            warnings.push(DecodeWarning::CreatedAfterLastUpdated {
                created,
                last_updated,
            });
        }

        Ok(Self {
            version,
            created,
            last_updated,
            cmp_id,
            cmp_version,
            consent_screen,
            consent_language,
            vendor_list_version,
            policy_version,
            is_service_specific,
            use_non_standard_stacks,
            special_feature_optins,
            purpose_consents,
            purpose_legitimate_interests,
            purpose_one_treatment,
            publisher_country_code,
            vendor_consents,
            vendor_legitimate_interests,
            publisher_restrictions,
            disclosed_vendors: None,
            allowed_vendors: None,
            publisher_purposes: None,
            warnings,
            gvl: None,
        })
    }
}

impl FromDataReader for PublisherPurposes {
    type Err = DecodeError;

    fn from_data_reader(r: &mut DataReader) -> Result<Self, Self::Err> {
        let consents = r.read_fixed_bitfield(24)?;
        let legitimate_interests = r.read_fixed_bitfield(24)?;
        let num_custom_purposes = r.read_fixed_integer::<u16>(6)?;
        let custom_consents = r.read_fixed_bitfield(num_custom_purposes)?;
        let custom_legitimate_interests = r.read_fixed_bitfield(num_custom_purposes)?;

        Ok(Self {
            consents,
            legitimate_interests,
            custom_consents,
            custom_legitimate_interests,
        })
    }
}

/// Decodes one vendor set: a 16-bit max vendor id followed by either a plain
/// bitfield of that many flags or a count-prefixed list of single ids and
/// inclusive id ranges. Shared by the two core vendor fields and the
/// disclosed/allowed vendor segments.
fn read_vendor_set(r: &mut DataReader) -> Result<IdSet, DecodeError> {
    let max_vendor_id = r.read_fixed_integer::<u16>(16)?;
    let is_range_encoding = r.read_bool()?;

    if is_range_encoding {
        let num_entries = r.read_fixed_integer::<u16>(12)?;
        let mut entries = Vec::with_capacity(usize::from(num_entries));

        for _ in 0..num_entries {
            let is_range = r.read_bool()?;
            let (start, end) = if is_range {
                let start = r.read_fixed_integer::<u16>(16)?;
                let end = r.read_fixed_integer::<u16>(16)?;
                (start, end)
            } else {
                let id = r.read_fixed_integer::<u16>(16)?;
                (id, id)
            };

            // ids are 1-based; 0 never refers to a vendor
            if start == 0 || start > end {
                return Err(DecodeError::MalformedRange { start, end });
            }
            entries.push((start, end));
        }

        Ok(IdSet::from_ranges(entries))
    } else {
        Ok(IdSet::BitField(r.read_fixed_bitfield(max_vendor_id)?))
    }
}

/// Decodes the trailing publisher restrictions region of the core segment:
/// a 12-bit entry count, then per entry a 6-bit purpose id, a 2-bit
/// restriction type and a vendor set. Segments written before this region
/// existed end right where the count would start, leaving at most 7 bits of
/// zeroed byte-alignment padding; that decodes as no restrictions.
/// Truncation inside the region is still an error.
fn read_publisher_restrictions(
    r: &mut DataReader,
) -> Result<Vec<PublisherRestriction>, DecodeError> {
    let remaining = r.bits_remaining();
    if remaining < 12 {
        // 8 or more leftover bits cannot be padding, and neither can a
        // nonzero remainder: both mark a truncated count
        if remaining >= 8 || r.read_fixed_integer::<u8>(remaining as u32)? != 0 {
            return Err(DecodeError::Read(io::ErrorKind::UnexpectedEof.into()));
        }
        return Ok(vec![]);
    }

    let num_restrictions = r.read_fixed_integer::<u16>(12)?;

    let mut restrictions = Vec::with_capacity(usize::from(num_restrictions));
    for _ in 0..num_restrictions {
        let purpose_id = r.read_fixed_integer::<u8>(6)?;
        let restriction_type = RestrictionType::from_u8(r.read_fixed_integer::<u8>(2)?)
            .unwrap_or(RestrictionType::Undefined);
        let restricted_vendor_ids = read_vendor_set(r)?;

        restrictions.push(PublisherRestriction {
            purpose_id,
            restriction_type,
            restricted_vendor_ids,
        });
    }

    Ok(restrictions)
}
