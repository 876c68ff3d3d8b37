use std::str::FromStr;

use bon::Builder;
use const_oid::AssociatedOid;
use der::asn1::{Any, BitString, OctetString, SetOfVec};
use der::flagset::FlagSet;
use der::{Decode, Encode, EncodePem};
use rsa::pkcs1v15::SigningKey;
use rsa::signature::{SignatureEncoding, Signer};
use sha1::Sha1;
use x509_cert::attr::Attribute;
use x509_cert::ext::pkix::{BasicConstraints, KeyUsage, KeyUsages};
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::request::{CertReq, CertReqInfo, Version};
use x509_cert::spki::{DynSignatureAlgorithmIdentifier, SubjectPublicKeyInfoOwned};

use crate::credentials::UserName;
use crate::error::WorkflowError;
use crate::key::RsaKeyPair;

/// Country component of every request subject.
const COUNTRY: &str = "XA";

/// Requested-extension choices carried inside the PKCS#9 extension-request
/// attribute.
///
/// The defaults are basicConstraints critical with CA:true and keyUsage
/// critical with only the dataEncipherment bit. That is an unusual pairing for
/// a leaf request, but it is the fixed contract of the existing artifact
/// consumers; the fields are exposed here rather than hardcoded so a
/// deployment that does not depend on them can override without forking the
/// builder.
#[derive(Debug, Clone, Builder)]
pub struct RequestOptions {
    /// CA bit of the requested basicConstraints extension.
    #[builder(default = true)]
    pub ca: bool,
    /// Requested keyUsage bits.
    #[builder(default = KeyUsages::DataEncipherment.into())]
    pub key_usage: FlagSet<KeyUsages>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A signed PKCS#10 certificate signing request. Immutable once built.
#[derive(Debug, Clone)]
pub struct SigningRequest {
    /// The inner representation of the request.
    pub inner: CertReq,
}

impl SigningRequest {
    /// Builds and signs a request for the given identity and key pair.
    ///
    /// The subject is `CN=<username>, C=XA`; the extension request carries the
    /// choices from `options`; the signature algorithm is
    /// `sha1WithRSAEncryption`, the format understood by the artifact set's
    /// existing consumers.
    pub fn build(
        user: &UserName,
        keys: &RsaKeyPair,
        options: &RequestOptions,
    ) -> Result<Self, WorkflowError> {
        let subject = Name::from_str(&format!("CN={},C={}", user, COUNTRY))
            .map_err(|e| WorkflowError::Signing(e.to_string()))?;

        let public_key = SubjectPublicKeyInfoOwned::from_key(keys.public_key().clone())
            .map_err(|e| WorkflowError::Signing(e.to_string()))?;

        let attributes = extension_request(options).map_err(signing_fault)?;

        let info = CertReqInfo {
            version: Version::V1,
            subject,
            public_key,
            attributes,
        };
        let info_der = info.to_der().map_err(signing_fault)?;

        let signing_key = SigningKey::<Sha1>::new(keys.private_key().clone());
        let algorithm = signing_key
            .signature_algorithm_identifier()
            .map_err(|e| WorkflowError::Signing(e.to_string()))?;
        let signature = signing_key
            .try_sign(&info_der)
            .map_err(|e| WorkflowError::Signing(e.to_string()))?;

        let inner = CertReq {
            info,
            algorithm,
            signature: BitString::from_bytes(&signature.to_bytes()).map_err(signing_fault)?,
        };
        Ok(Self { inner })
    }

    /// Encodes the request into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>, WorkflowError> {
        self.inner.to_der().map_err(signing_fault)
    }

    /// Encodes the request into PEM format.
    pub fn to_pem(&self) -> Result<String, WorkflowError> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(signing_fault)
    }
}

fn signing_fault(err: der::Error) -> WorkflowError {
    WorkflowError::Signing(err.to_string())
}

/// Assembles the single PKCS#9 extension-request attribute.
fn extension_request(options: &RequestOptions) -> der::Result<SetOfVec<Attribute>> {
    let basic_constraints = BasicConstraints {
        ca: options.ca,
        path_len_constraint: None,
    };
    let key_usage = KeyUsage(options.key_usage);

    let extensions = vec![
        extension(&basic_constraints, true)?,
        extension(&key_usage, true)?,
    ];

    // The attribute value is the DER-encoded Extensions sequence.
    let value = Any::from_der(&extensions.to_der()?)?;
    let mut values = SetOfVec::new();
    values.insert(value)?;

    let attribute = Attribute {
        oid: const_oid::db::rfc5912::ID_EXTENSION_REQ,
        values,
    };
    let mut attributes = SetOfVec::new();
    attributes.insert(attribute)?;
    Ok(attributes)
}

fn extension<E: AssociatedOid + Encode>(value: &E, critical: bool) -> der::Result<Extension> {
    Ok(Extension {
        extn_id: E::OID,
        critical,
        extn_value: OctetString::new(value.to_der()?)?,
    })
}
