//! Request body policy.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Verb;

/// Body encoding declared on an operation or a bridge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyEncoding {
    /// Form for plain arguments, multipart when a file part is present.
    #[default]
    Auto,
    None,
    FormUrlEncoded,
    Multipart,
}

impl fmt::Display for BodyEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BodyEncoding::Auto => "auto",
            BodyEncoding::None => "none",
            BodyEncoding::FormUrlEncoded => "form-urlencoded",
            BodyEncoding::Multipart => "multipart",
        })
    }
}

/// Body encoding after policy resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBody {
    None,
    FormUrlEncoded,
    Multipart,
}

impl ResolvedBody {
    pub fn content_type(self) -> Option<&'static str> {
        match self {
            ResolvedBody::None => None,
            ResolvedBody::FormUrlEncoded => Some("application/x-www-form-urlencoded"),
            ResolvedBody::Multipart => Some("multipart/form-data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BodyPolicyError {
    #[error("GET requests do not support binary parts")]
    GetWithFilePart,

    #[error("GET requests cannot carry a {0} body")]
    GetWithBody(BodyEncoding),

    #[error("{0} requests do not support binary parts")]
    FileOnVerb(Verb),

    #[error("binary parts require a multipart body, not {0}")]
    FileRequiresMultipart(BodyEncoding),
}

/// Resolves the body encoding of an operation.
pub fn resolve(
    verb: Verb,
    has_file_part: bool,
    declared: BodyEncoding,
) -> Result<ResolvedBody, BodyPolicyError> {
    if verb == Verb::Get {
        if has_file_part {
            return Err(BodyPolicyError::GetWithFilePart);
        }
        return match declared {
            BodyEncoding::Auto | BodyEncoding::None => Ok(ResolvedBody::None),
            other => Err(BodyPolicyError::GetWithBody(other)),
        };
    }

    if has_file_part && !verb.accepts_files() {
        return Err(BodyPolicyError::FileOnVerb(verb));
    }

    let resolved = match declared {
        BodyEncoding::Auto if has_file_part => ResolvedBody::Multipart,
        BodyEncoding::Auto | BodyEncoding::FormUrlEncoded => ResolvedBody::FormUrlEncoded,
        BodyEncoding::None => ResolvedBody::None,
        BodyEncoding::Multipart => ResolvedBody::Multipart,
    };
    if has_file_part && resolved != ResolvedBody::Multipart {
        return Err(BodyPolicyError::FileRequiresMultipart(declared));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [BodyEncoding; 4] = [
        BodyEncoding::Auto,
        BodyEncoding::None,
        BodyEncoding::FormUrlEncoded,
        BodyEncoding::Multipart,
    ];

    #[test]
    fn test_get_never_has_a_body() {
        for declared in ALL {
            for has_file in [false, true] {
                if let Ok(resolved) = resolve(Verb::Get, has_file, declared) {
                    assert_eq!(resolved, ResolvedBody::None);
                }
            }
        }
        assert_eq!(resolve(Verb::Get, false, BodyEncoding::Auto), Ok(ResolvedBody::None));
        assert_eq!(
            resolve(Verb::Get, false, BodyEncoding::Multipart),
            Err(BodyPolicyError::GetWithBody(BodyEncoding::Multipart))
        );
        assert_eq!(
            resolve(Verb::Get, true, BodyEncoding::Auto),
            Err(BodyPolicyError::GetWithFilePart)
        );
    }

    #[test]
    fn test_auto_resolution() {
        for verb in [Verb::Post, Verb::Put, Verb::Patch] {
            assert_eq!(resolve(verb, false, BodyEncoding::Auto), Ok(ResolvedBody::FormUrlEncoded));
            assert_eq!(resolve(verb, true, BodyEncoding::Auto), Ok(ResolvedBody::Multipart));
        }
        assert_eq!(resolve(Verb::Delete, false, BodyEncoding::Auto), Ok(ResolvedBody::FormUrlEncoded));
    }

    #[test]
    fn test_file_parts_always_resolve_to_multipart() {
        for verb in [Verb::Get, Verb::Post, Verb::Put, Verb::Patch, Verb::Delete] {
            for declared in ALL {
                if let Ok(resolved) = resolve(verb, true, declared) {
                    assert_eq!(resolved, ResolvedBody::Multipart);
                }
            }
        }
        assert_eq!(
            resolve(Verb::Post, true, BodyEncoding::FormUrlEncoded),
            Err(BodyPolicyError::FileRequiresMultipart(BodyEncoding::FormUrlEncoded))
        );
        assert_eq!(
            resolve(Verb::Delete, true, BodyEncoding::Multipart),
            Err(BodyPolicyError::FileOnVerb(Verb::Delete))
        );
    }
}
