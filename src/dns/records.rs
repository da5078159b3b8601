//! Record helpers shared by the checkers.

use std::net::IpAddr;

use hickory_resolver::proto::rr::rdata::caa::{Property, Value};
use hickory_resolver::proto::rr::rdata::CAA;
use hickory_resolver::proto::rr::{RData, Record};

/// Trims whitespace, strips one trailing dot and lowercases.
pub fn normalize_fqdn(name: &str) -> String {
    let name = name.trim();
    name.strip_suffix('.').unwrap_or(name).to_lowercase()
}

/// Normalizes `name` and appends the root label.
pub fn to_fqdn(name: &str) -> String {
    format!("{}.", normalize_fqdn(name))
}

/// A and AAAA addresses in `records`, in record order.
pub fn addresses(records: &[Record]) -> Vec<IpAddr> {
    records
        .iter()
        .filter_map(|record| match record.data() {
            Some(RData::A(a)) => Some(IpAddr::V4(a.0)),
            Some(RData::AAAA(aaaa)) => Some(IpAddr::V6(aaaa.0)),
            _ => None,
        })
        .collect()
}

/// Character strings of every TXT record, each record's strings concatenated.
pub fn txt_strings(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| match record.data() {
            Some(RData::TXT(txt)) => Some(
                txt.txt_data()
                    .iter()
                    .map(|part| String::from_utf8_lossy(part).into_owned())
                    .collect::<String>(),
            ),
            _ => None,
        })
        .collect()
}

/// One record per line, in presentation format.
pub fn format_records(records: &[Record]) -> String {
    records
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// A CAA record reduced to what policy evaluation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaaRecord {
    /// Critical flag (bit 0 of the flags octet, "128" on the wire)
    pub critical: bool,
    /// Lowercased property tag
    pub tag: String,
    /// Issuer domain for `issue`/`issuewild`, lowercased, without trailing dot
    pub issuer: Option<String>,
    /// The record in presentation format
    pub text: String,
}

impl CaaRecord {
    /// Extracts the CAA records from an answer.
    pub fn from_records(records: &[Record]) -> Vec<CaaRecord> {
        records
            .iter()
            .filter_map(|record| match record.data() {
                Some(RData::CAA(caa)) => Some(CaaRecord::from_caa(caa, record.to_string())),
                _ => None,
            })
            .collect()
    }

    fn from_caa(caa: &CAA, text: String) -> CaaRecord {
        let tag = match caa.tag() {
            Property::Issue => "issue".to_string(),
            Property::IssueWild => "issuewild".to_string(),
            Property::Iodef => "iodef".to_string(),
            Property::Unknown(other) => other.to_lowercase(),
        };
        let issuer = match caa.value() {
            Value::Issuer(Some(name), _) => Some(normalize_fqdn(&name.to_ascii())),
            _ => None,
        };
        CaaRecord {
            critical: caa.issuer_critical(),
            tag,
            issuer,
            text,
        }
    }

    /// An `issue` property.
    pub fn is_issue(&self) -> bool {
        self.tag == "issue"
    }

    /// An `issuewild` property.
    pub fn is_issuewild(&self) -> bool {
        self.tag == "issuewild"
    }

    /// Critical records with a tag the CA does not understand block issuance.
    pub fn is_critical_unknown(&self) -> bool {
        self.critical && !matches!(self.tag.as_str(), "issue" | "issuewild" | "iodef")
    }
}
