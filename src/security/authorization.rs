//! Access-control metadata and its enforcement.
//!
//! Markers are collected from four sources in a fixed order: the bridge
//! definition, the operation, the implementing service and the service's
//! handler. Any `AllowAnonymous` in the chain opens the operation; otherwise
//! every collected requirement must hold.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::Principal;

/// One access constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Requirement {
    /// Any authenticated caller.
    Authenticated,
    /// The caller must hold at least one of these roles.
    Roles(Vec<String>),
    /// A named policy from the dispatcher's [`PolicyRegistry`].
    Policy(String),
}

impl Requirement {
    pub fn role(role: impl Into<String>) -> Self {
        Requirement::Roles(vec![role.into()])
    }

    pub fn any_role<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Requirement::Roles(roles.into_iter().map(Into::into).collect())
    }

    pub fn policy(name: impl Into<String>) -> Self {
        Requirement::Policy(name.into())
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Authenticated => f.write_str("authenticated"),
            Requirement::Roles(roles) => write!(f, "roles [{}]", roles.join(", ")),
            Requirement::Policy(name) => write!(f, "policy {name:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessMarker {
    Authorize(Requirement),
    AllowAnonymous,
}

/// The merged access decision for one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessMetadata {
    pub anonymous: bool,
    /// Ordered and free of duplicates.
    pub requirements: Vec<Requirement>,
}

/// Why a request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDenied {
    Unauthenticated,
    Forbidden(Requirement),
}

impl AccessMetadata {
    /// Folds the four marker sources, in order, into one decision.
    pub fn merge(
        bridge: &[AccessMarker],
        operation: &[AccessMarker],
        service: &[AccessMarker],
        handler: &[AccessMarker],
    ) -> Self {
        let mut merged = AccessMetadata::default();
        for marker in [bridge, operation, service, handler].into_iter().flatten() {
            match marker {
                AccessMarker::AllowAnonymous => merged.anonymous = true,
                AccessMarker::Authorize(requirement) => {
                    if !merged.requirements.contains(requirement) {
                        merged.requirements.push(requirement.clone());
                    }
                }
            }
        }
        if merged.anonymous {
            merged.requirements.clear();
        }
        merged
    }

    pub fn is_open(&self) -> bool {
        self.anonymous || self.requirements.is_empty()
    }

    pub fn policies(&self) -> impl Iterator<Item = &str> {
        self.requirements.iter().filter_map(|requirement| match requirement {
            Requirement::Policy(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn evaluate(
        &self,
        principal: Option<&Principal>,
        policies: &PolicyRegistry,
    ) -> Result<(), AccessDenied> {
        if self.is_open() {
            return Ok(());
        }
        let Some(principal) = principal else {
            return Err(AccessDenied::Unauthenticated);
        };
        for requirement in &self.requirements {
            let satisfied = match requirement {
                Requirement::Authenticated => true,
                Requirement::Roles(roles) => roles.iter().any(|role| principal.is_in_role(role)),
                Requirement::Policy(name) => policies.check(name, principal),
            };
            if !satisfied {
                return Err(AccessDenied::Forbidden(requirement.clone()));
            }
        }
        Ok(())
    }
}

type PolicyFn = Arc<dyn Fn(&Principal) -> bool + Send + Sync>;

/// Named authorization policies.
#[derive(Clone, Default)]
pub struct PolicyRegistry {
    policies: HashMap<String, PolicyFn>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<F>(&mut self, name: impl Into<String>, policy: F)
    where
        F: Fn(&Principal) -> bool + Send + Sync + 'static,
    {
        self.policies.insert(name.into(), Arc::new(policy));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.policies.contains_key(name)
    }

    /// Unknown policies never pass.
    pub fn check(&self, name: &str, principal: &Principal) -> bool {
        self.policies
            .get(name)
            .is_some_and(|policy| policy(principal))
    }
}

impl fmt::Debug for PolicyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.policies.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> AccessMarker {
        AccessMarker::Authorize(Requirement::role("Admin"))
    }

    fn authenticated() -> AccessMarker {
        AccessMarker::Authorize(Requirement::Authenticated)
    }

    #[test]
    fn test_anonymous_anywhere_wins() {
        let sources: [&[AccessMarker]; 4] = [&[admin()], &[authenticated()], &[admin()], &[]];
        for position in 0..4 {
            let mut markers: Vec<Vec<AccessMarker>> = sources.iter().map(|s| s.to_vec()).collect();
            markers[position].push(AccessMarker::AllowAnonymous);
            let merged = AccessMetadata::merge(&markers[0], &markers[1], &markers[2], &markers[3]);
            assert!(merged.anonymous);
            assert!(merged.requirements.is_empty());
            assert!(merged.is_open());
        }
    }

    #[test]
    fn test_requirements_are_unioned_in_order() {
        let merged = AccessMetadata::merge(
            &[authenticated()],
            &[admin()],
            &[authenticated()],
            &[AccessMarker::Authorize(Requirement::policy("adult"))],
        );
        assert!(!merged.anonymous);
        assert_eq!(
            merged.requirements,
            vec![
                Requirement::Authenticated,
                Requirement::role("Admin"),
                Requirement::policy("adult"),
            ]
        );
        assert_eq!(merged.policies().collect::<Vec<_>>(), vec!["adult"]);
    }

    #[test]
    fn test_evaluate_distinguishes_401_and_403() {
        let policies = PolicyRegistry::new();
        let merged = AccessMetadata::merge(&[], &[admin()], &[], &[]);

        assert_eq!(merged.evaluate(None, &policies), Err(AccessDenied::Unauthenticated));

        let user = Principal::new("bob");
        assert_eq!(
            merged.evaluate(Some(&user), &policies),
            Err(AccessDenied::Forbidden(Requirement::role("Admin")))
        );

        let boss = Principal::new("alice").with_roles(["Admin"]);
        assert_eq!(merged.evaluate(Some(&boss), &policies), Ok(()));
    }

    #[test]
    fn test_no_markers_is_open() {
        let merged = AccessMetadata::merge(&[], &[], &[], &[]);
        assert!(merged.is_open());
        assert_eq!(merged.evaluate(None, &PolicyRegistry::new()), Ok(()));
    }

    #[test]
    fn test_policies() {
        let mut policies = PolicyRegistry::new();
        policies.insert("named_alice", |p: &Principal| p.name == "alice");
        let merged = AccessMetadata::merge(
            &[AccessMarker::Authorize(Requirement::policy("named_alice"))],
            &[],
            &[],
            &[],
        );
        assert_eq!(merged.evaluate(Some(&Principal::new("alice")), &policies), Ok(()));
        assert!(merged.evaluate(Some(&Principal::new("bob")), &policies).is_err());
        assert!(!policies.check("missing", &Principal::new("alice")));
    }
}
