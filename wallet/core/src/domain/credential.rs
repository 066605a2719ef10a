// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Classification Credential
//!
//! A [`ClassificationCredential`] is an opaque verifiable-credential document
//! handed to the wallet by an external collaborator. Issuer formats changed
//! over time, so the same logical fields appear in several places:
//!
//! | Shape | Claims location | Envelope fields |
//! |-------|-----------------|-----------------|
//! | [`CredentialShape::Flat`] | `credentialSubject` (object or first array element) | top level |
//! | [`CredentialShape::ClaimsList`] | first element of `claims` | top level |
//! | [`CredentialShape::Wrapped`] | any of the above inside `verifiableCredential`, `vc` or `credential` | inner document, outer `iss` as fallback |
//!
//! [`ClassificationCredential::normalize`] is the single adapter that maps
//! every known shape into [`CanonicalCredential`]. All trust, clearance and
//! binding logic downstream reads only the canonical form.
//!
//! Documents matching none of the shapes normalize to
//! [`CredentialShape::Unknown`] with no claims; validators reject them with a
//! typed error and the resolver skips them.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::classification::ClassificationLevel;

/// `type` entries that mark a credential as classification-bearing.
pub const CLASSIFICATION_TYPE_MARKERS: &[&str] = &[
    "ClassificationCredential",
    "SecurityClearanceCredential",
    "ClearanceCredential",
];

const CLEARANCE_CLAIM_KEYS: &[&str] = &["clearanceLevel", "classificationLevel", "clearance", "classification"];
const LEGACY_FINGERPRINT_KEYS: &[&str] = &["keyFingerprint", "publicKeyFingerprint"];
const SIGNING_FINGERPRINT_KEYS: &[&str] = &["signingKeyFingerprint"];
const AGREEMENT_FINGERPRINT_KEYS: &[&str] = &["agreementKeyFingerprint", "encryptionKeyFingerprint"];
const SUBJECT_IDENTITY_KEYS: &[&str] = &["firstName", "lastName", "fullName", "employeeId"];
const WRAPPER_KEYS: &[&str] = &["verifiableCredential", "vc", "credential"];

/// Externally supplied credential document. Read-only to the wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassificationCredential {
    raw: Value,
}

impl ClassificationCredential {
    pub fn from_value(raw: Value) -> Self {
        Self { raw }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self { raw: serde_json::from_str(json)? })
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Credential `id`, when the issuer set one. Used only for diagnostics.
    pub fn id(&self) -> Option<&str> {
        self.raw
            .get("id")
            .and_then(Value::as_str)
            .or_else(|| unwrap_envelope(&self.raw).and_then(|inner| inner.get("id")).and_then(Value::as_str))
    }

    /// Map this document into the canonical representation.
    pub fn normalize(&self) -> CanonicalCredential {
        let Some(outer) = self.raw.as_object() else {
            return CanonicalCredential::unknown();
        };

        if let Some(inner) = unwrap_envelope(&self.raw).and_then(Value::as_object) {
            let mut canonical = normalize_document(inner);
            if canonical.issuer.is_none() {
                canonical.issuer = extract_issuer(outer);
            }
            if canonical.valid_until.is_none() {
                canonical.valid_until = extract_valid_until(outer);
            }
            if canonical.shape != CredentialShape::Unknown {
                canonical.shape = CredentialShape::Wrapped;
            }
            return canonical;
        }

        normalize_document(outer)
    }
}

/// Which producer format a credential was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialShape {
    Flat,
    ClaimsList,
    Wrapped,
    Unknown,
}

/// Key fingerprints literally embedded in a credential's claims.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintClaims {
    /// Single fingerprint carried by legacy single-key credentials.
    pub legacy: Option<String>,
    pub signing: Option<String>,
    pub agreement: Option<String>,
}

impl FingerprintClaims {
    pub fn is_empty(&self) -> bool {
        self.legacy.is_none() && self.signing.is_none() && self.agreement.is_none()
    }

    /// The fingerprint the credential binds its holder's key to: the
    /// agreement fingerprint for dual-key credentials, else the legacy one.
    pub fn bound(&self) -> Option<&str> {
        self.agreement
            .as_deref()
            .or(self.legacy.as_deref())
            .or(self.signing.as_deref())
    }

    pub fn all(&self) -> impl Iterator<Item = &str> {
        [&self.agreement, &self.signing, &self.legacy]
            .into_iter()
            .filter_map(|claim| claim.as_deref())
    }
}

/// Canonical internal view of a credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalCredential {
    pub shape: CredentialShape,
    pub issuer: Option<String>,
    pub schema_ref: Option<String>,
    pub types: Vec<String>,
    pub clearance_claim: Option<String>,
    pub fingerprints: FingerprintClaims,
    pub has_subject_identity: bool,
    pub valid_until: Option<DateTime<Utc>>,
}

impl CanonicalCredential {
    fn unknown() -> Self {
        Self {
            shape: CredentialShape::Unknown,
            issuer: None,
            schema_ref: None,
            types: Vec::new(),
            clearance_claim: None,
            fingerprints: FingerprintClaims::default(),
            has_subject_identity: false,
            valid_until: None,
        }
    }

    /// Lenient level of the clearance claim, if one is present.
    pub fn clearance_level(&self) -> Option<ClassificationLevel> {
        self.clearance_claim.as_deref().map(ClassificationLevel::parse)
    }

    pub fn has_type_marker(&self) -> bool {
        self.types
            .iter()
            .any(|t| CLASSIFICATION_TYPE_MARKERS.contains(&t.as_str()))
    }

    /// Explicit type tag, else a clearance claim, else person-identifying
    /// subject fields as a last resort.
    pub fn looks_like_classification_credential(&self) -> bool {
        self.has_type_marker() || self.clearance_claim.is_some() || self.has_subject_identity
    }
}

fn unwrap_envelope(raw: &Value) -> Option<&Value> {
    let outer = raw.as_object()?;
    WRAPPER_KEYS.iter().find_map(|key| match outer.get(*key)? {
        Value::Array(items) => items.first().filter(|v| v.is_object()),
        value @ Value::Object(_) => Some(value),
        _ => None,
    })
}

fn normalize_document(doc: &Map<String, Value>) -> CanonicalCredential {
    let (shape, claims) = match locate_claims(doc) {
        Some((shape, claims)) => (shape, Some(claims)),
        None => (CredentialShape::Unknown, None),
    };

    let mut canonical = CanonicalCredential::unknown();
    canonical.shape = shape;
    canonical.issuer = extract_issuer(doc);
    canonical.schema_ref = extract_schema(doc);
    canonical.types = extract_types(doc);
    canonical.valid_until = extract_valid_until(doc);

    if let Some(claims) = claims {
        canonical.clearance_claim = first_string(claims, CLEARANCE_CLAIM_KEYS);
        canonical.fingerprints = FingerprintClaims {
            legacy: first_string(claims, LEGACY_FINGERPRINT_KEYS),
            signing: first_string(claims, SIGNING_FINGERPRINT_KEYS),
            agreement: first_string(claims, AGREEMENT_FINGERPRINT_KEYS),
        };
        canonical.has_subject_identity = SUBJECT_IDENTITY_KEYS
            .iter()
            .any(|key| claims.get(*key).is_some_and(|v| !v.is_null()));
    }

    canonical
}

fn locate_claims(doc: &Map<String, Value>) -> Option<(CredentialShape, &Map<String, Value>)> {
    match doc.get("credentialSubject") {
        Some(Value::Object(subject)) => return Some((CredentialShape::Flat, subject)),
        Some(Value::Array(subjects)) => {
            if let Some(subject) = subjects.first().and_then(Value::as_object) {
                return Some((CredentialShape::Flat, subject));
            }
        }
        _ => {}
    }

    doc.get("claims")
        .and_then(Value::as_array)
        .and_then(|claims| claims.first())
        .and_then(Value::as_object)
        .map(|claims| (CredentialShape::ClaimsList, claims))
}

/// First non-blank string among `keys`, in order.
fn first_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        obj.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn extract_issuer(doc: &Map<String, Value>) -> Option<String> {
    match doc.get("issuer") {
        Some(Value::String(s)) => return Some(s.clone()),
        Some(Value::Object(obj)) => {
            if let Some(id) = obj.get("id").and_then(Value::as_str) {
                return Some(id.to_string());
            }
        }
        _ => {}
    }
    first_string(doc, &["issuerDid", "iss"])
}

fn extract_schema(doc: &Map<String, Value>) -> Option<String> {
    let from_schema = match doc.get("credentialSchema") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Object(obj)) => obj.get("id").and_then(Value::as_str).map(str::to_string),
        Some(Value::Array(items)) => items
            .first()
            .and_then(|item| item.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    };
    from_schema
        .filter(|s| !s.trim().is_empty())
        .or_else(|| first_string(doc, &["schemaRef", "schemaId", "schema_id"]))
}

fn extract_types(doc: &Map<String, Value>) -> Vec<String> {
    let value = doc.get("type").or_else(|| doc.get("@type"));
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn extract_valid_until(doc: &Map<String, Value>) -> Option<DateTime<Utc>> {
    for key in ["validUntil", "expirationDate"] {
        if let Some(raw) = doc.get(key).and_then(Value::as_str) {
            match DateTime::parse_from_rfc3339(raw) {
                Ok(parsed) => return Some(parsed.with_timezone(&Utc)),
                Err(e) => tracing::warn!(field = key, value = %raw, "Ignoring unparseable expiry: {}", e),
            }
        }
    }
    doc.get("exp")
        .and_then(Value::as_i64)
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}
