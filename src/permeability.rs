//! Permeability evaluation: who may connect, and who may see what.
//!
//! Pure decision procedures over explicit inputs; the service fetches
//! memory- and compartment-level policies from the graph and hands them to
//! these functions. Every check is fail-safe: any restrictive layer in the
//! chain {source memory, source compartments, connection, destination
//! compartments, destination memory} denies the operation.

use crate::models::{CompartmentRef, Permeability};

/// The flow-relevant state of one memory: its own policy plus the policies
/// of every compartment it belongs to.
#[derive(Debug, Clone, Default)]
pub struct FlowProfile {
    /// Memory-level permeability, if the memory exists.
    pub permeability: Option<Permeability>,
    /// Permeabilities of every compartment the memory belongs to.
    pub compartments: Vec<Permeability>,
}

impl FlowProfile {
    /// Builds a profile from a memory policy and its compartment rows.
    #[must_use]
    pub fn new(permeability: Option<Permeability>, compartments: &[CompartmentRef]) -> Self {
        Self {
            permeability,
            compartments: compartments.iter().map(|c| c.permeability).collect(),
        }
    }

    /// True if the memory itself and every compartment admit inward flow.
    #[must_use]
    pub fn allows_inward(&self) -> bool {
        if let Some(p) = self.permeability {
            if !p.allows_inward() {
                return false;
            }
        }
        self.compartments.iter().all(|p| p.allows_inward())
    }

    /// True if the memory itself and every compartment admit outward flow.
    #[must_use]
    pub fn allows_outward(&self) -> bool {
        if let Some(p) = self.permeability {
            if !p.allows_outward() {
                return false;
            }
        }
        self.compartments.iter().all(|p| p.allows_outward())
    }
}

/// Decides whether an organic connection may form between two memories.
///
/// Rules, in order:
///
/// 1. Both memories global (no compartments): allowed.
/// 2. Both memories in exactly the same non-empty set of compartments
///    (fully co-located): allowed, even when those compartments forbid
///    external connections.
/// 3. Otherwise, any compartment of either memory with
///    `allow_external_connections = false` blocks.
///
/// Fail-safe: a single restrictive compartment blocks even if the memories
/// share another compartment.
#[must_use]
pub fn can_form_connection(a: &[CompartmentRef], b: &[CompartmentRef]) -> bool {
    if a.is_empty() && b.is_empty() {
        return true;
    }

    let ids_a: std::collections::BTreeSet<&str> = a.iter().map(|c| c.id.as_str()).collect();
    let ids_b: std::collections::BTreeSet<&str> = b.iter().map(|c| c.id.as_str()).collect();
    if ids_a == ids_b && !ids_a.is_empty() {
        return true;
    }

    a.iter()
        .chain(b.iter())
        .all(|c| c.allow_external_connections)
}

/// Decides whether data may flow from one memory to another.
///
/// Enforced in order; any failing layer terminates with `false`:
///
/// 1. The source memory must allow outward flow.
/// 2. The destination memory must allow inward flow.
/// 3. Every source compartment must allow outward flow.
/// 4. Every destination compartment must allow inward flow.
/// 5. The connection, if its permeability is known, must allow inward flow
///    (connection policies are expressed from the owner's perspective).
#[must_use]
pub fn can_data_flow(
    from: &FlowProfile,
    to: &FlowProfile,
    connection: Option<Permeability>,
) -> bool {
    if let Some(p) = from.permeability {
        if !p.allows_outward() {
            return false;
        }
    }
    if let Some(p) = to.permeability {
        if !p.allows_inward() {
            return false;
        }
    }
    if !from.compartments.iter().all(|p| p.allows_outward()) {
        return false;
    }
    if !to.compartments.iter().all(|p| p.allows_inward()) {
        return false;
    }
    if let Some(conn) = connection {
        if !conn.allows_inward() {
            return false;
        }
    }
    true
}

/// Filters candidate results flowing toward a requesting memory.
///
/// Data flows from each candidate to the requester, so the requester must
/// admit inward flow (otherwise the result set is empty) and each candidate
/// must admit outward flow at its memory layer and in every compartment.
///
/// `profile_of` supplies the pre-fetched profile for a candidate id; the
/// service batches those lookups, one round-trip per layer.
pub fn filter_by_permeability<T, F>(requester: &FlowProfile, candidates: Vec<T>, profile_of: F) -> Vec<T>
where
    F: Fn(&T) -> FlowProfile,
{
    if candidates.is_empty() {
        return candidates;
    }

    if !requester.allows_inward() {
        return Vec::new();
    }

    candidates
        .into_iter()
        .filter(|c| profile_of(c).allows_outward())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn comp(id: &str, permeability: Permeability, allow_external: bool) -> CompartmentRef {
        CompartmentRef {
            id: id.to_string(),
            name: id.to_string(),
            permeability,
            allow_external_connections: allow_external,
        }
    }

    #[test]
    fn test_global_memories_can_connect() {
        assert!(can_form_connection(&[], &[]));
    }

    #[test]
    fn test_colocated_memories_can_connect_despite_restriction() {
        let locked = [comp("c1", Permeability::Closed, false)];
        assert!(can_form_connection(&locked, &locked));
    }

    #[test]
    fn test_any_restrictive_compartment_blocks_formation() {
        let open = [comp("open", Permeability::Open, true)];
        let mixed = [
            comp("open", Permeability::Open, true),
            comp("locked", Permeability::Closed, false),
        ];
        // Shares "open" with the other memory, but "locked" still blocks.
        assert!(!can_form_connection(&mixed, &open));
        assert!(!can_form_connection(&open, &mixed));
        // One compartmentalized, one global, all permissive: allowed.
        assert!(can_form_connection(&open, &[]));
    }

    #[test]
    fn test_same_multi_set_is_colocated() {
        let a = [
            comp("c1", Permeability::Open, false),
            comp("c2", Permeability::Closed, false),
        ];
        let b = [
            comp("c2", Permeability::Closed, false),
            comp("c1", Permeability::Open, false),
        ];
        assert!(can_form_connection(&a, &b));
    }

    #[test]
    fn test_data_flow_memory_layer() {
        let open = FlowProfile {
            permeability: Some(Permeability::Open),
            compartments: vec![],
        };
        let sealed = FlowProfile {
            permeability: Some(Permeability::Closed),
            compartments: vec![],
        };
        assert!(can_data_flow(&open, &open, None));
        assert!(!can_data_flow(&sealed, &open, None));
        assert!(!can_data_flow(&open, &sealed, None));
    }

    #[test]
    fn test_data_flow_osmotic_directionality() {
        let inward = FlowProfile {
            permeability: Some(Permeability::OsmoticInward),
            compartments: vec![],
        };
        let open = FlowProfile {
            permeability: Some(Permeability::Open),
            compartments: vec![],
        };
        // Inward-only can receive but not emit.
        assert!(can_data_flow(&open, &inward, None));
        assert!(!can_data_flow(&inward, &open, None));

        let outward = FlowProfile {
            permeability: Some(Permeability::OsmoticOutward),
            compartments: vec![],
        };
        assert!(can_data_flow(&outward, &open, None));
        assert!(!can_data_flow(&open, &outward, None));
    }

    #[test]
    fn test_data_flow_compartment_layer_fail_safe() {
        let from = FlowProfile {
            permeability: Some(Permeability::Open),
            compartments: vec![Permeability::Open, Permeability::OsmoticInward],
        };
        let to = FlowProfile {
            permeability: Some(Permeability::Open),
            compartments: vec![],
        };
        // One source compartment refuses outward flow.
        assert!(!can_data_flow(&from, &to, None));
        assert!(can_data_flow(&to, &from, None));
    }

    #[test]
    fn test_connection_layer() {
        let open = FlowProfile {
            permeability: Some(Permeability::Open),
            compartments: vec![],
        };
        assert!(can_data_flow(&open, &open, Some(Permeability::Open)));
        assert!(!can_data_flow(&open, &open, Some(Permeability::OsmoticOutward)));
        assert!(can_data_flow(&open, &open, Some(Permeability::OsmoticInward)));
    }

    #[test]
    fn test_missing_memory_policy_does_not_block() {
        let unknown = FlowProfile::default();
        assert!(can_data_flow(&unknown, &unknown, None));
    }

    #[test]
    fn test_filter_blocked_requester_empties_results() {
        let requester = FlowProfile {
            permeability: Some(Permeability::OsmoticOutward),
            compartments: vec![],
        };
        let out = filter_by_permeability(&requester, vec!["a", "b"], |_| FlowProfile::default());
        assert!(out.is_empty());
    }

    #[test]
    fn test_filter_drops_sealed_candidates() {
        let requester = FlowProfile {
            permeability: Some(Permeability::Open),
            compartments: vec![],
        };
        let out = filter_by_permeability(&requester, vec!["open", "sealed"], |c| {
            if *c == "sealed" {
                FlowProfile {
                    permeability: Some(Permeability::OsmoticInward),
                    compartments: vec![],
                }
            } else {
                FlowProfile::default()
            }
        });
        assert_eq!(out, vec!["open"]);
    }

    proptest! {
        /// P4 fail-safety: a flow is permitted only when no layer forbids it.
        #[test]
        fn prop_flow_permitted_iff_no_layer_blocks(
            from_mem in 0_u8..4,
            to_mem in 0_u8..4,
            from_comps in prop::collection::vec(0_u8..4, 0..4),
            to_comps in prop::collection::vec(0_u8..4, 0..4),
        ) {
            fn perm(i: u8) -> Permeability {
                match i {
                    0 => Permeability::Open,
                    1 => Permeability::Closed,
                    2 => Permeability::OsmoticInward,
                    _ => Permeability::OsmoticOutward,
                }
            }
            let from = FlowProfile {
                permeability: Some(perm(from_mem)),
                compartments: from_comps.iter().copied().map(perm).collect(),
            };
            let to = FlowProfile {
                permeability: Some(perm(to_mem)),
                compartments: to_comps.iter().copied().map(perm).collect(),
            };

            let expected = perm(from_mem).allows_outward()
                && perm(to_mem).allows_inward()
                && from_comps.iter().all(|&c| perm(c).allows_outward())
                && to_comps.iter().all(|&c| perm(c).allows_inward());

            prop_assert_eq!(can_data_flow(&from, &to, None), expected);
        }

        /// Formation never succeeds past a restrictive compartment unless
        /// the memberships are identical.
        #[test]
        fn prop_formation_fail_safe(
            a_ids in prop::collection::vec(0_u8..3, 0..3),
            b_ids in prop::collection::vec(0_u8..3, 0..3),
            restrictive in 0_u8..3,
        ) {
            let mk = |ids: &[u8]| -> Vec<CompartmentRef> {
                ids.iter()
                    .map(|&i| CompartmentRef {
                        id: format!("c{i}"),
                        name: format!("c{i}"),
                        permeability: Permeability::Open,
                        allow_external_connections: i != restrictive,
                    })
                    .collect()
            };
            let a = mk(&a_ids);
            let b = mk(&b_ids);

            let set_a: std::collections::BTreeSet<u8> = a_ids.iter().copied().collect();
            let set_b: std::collections::BTreeSet<u8> = b_ids.iter().copied().collect();
            let colocated = set_a == set_b;
            let has_restrictive = a_ids.iter().chain(b_ids.iter()).any(|&i| i == restrictive);

            let allowed = can_form_connection(&a, &b);
            if colocated {
                prop_assert!(allowed);
            } else if has_restrictive {
                prop_assert!(!allowed);
            } else {
                prop_assert!(allowed);
            }
        }
    }
}
