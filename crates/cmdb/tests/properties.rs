//! Property-based tests for graph integrity.
//!
//! Random sequences of mutations are applied to a fresh store; afterwards the
//! structural invariants must hold:
//! - no two CIs share a name
//! - every relationship references two existing, distinct CIs
//! - `all` is exactly the union of `source` and `target`

use cmdb::Cmdb;
use cmdb::domain::{
    CiFilter, CiId, CiUpdate, Direction, KNOWN_CI_TYPES, KNOWN_STATUSES, NewConfigurationItem,
    NewRelationship, RelationshipId, RelationshipType,
};
use proptest::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Op {
    Create(usize),
    Rename(u64, usize),
    Link(u64, u64, usize),
    Delete(u64),
    Unlink(u64),
}

// A small name pool so duplicates actually happen
const NAMES: [&str; 6] = [
    "WebServer-Prod-01",
    "WebServer-Prod-02",
    "CustomerDB-Prod-01",
    "BillingApp-Prod",
    "Core-Switch-01",
    "webserver-prod-01",
];

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..NAMES.len()).prop_map(Op::Create),
        1 => (1u64..10, 0..NAMES.len()).prop_map(|(id, n)| Op::Rename(id, n)),
        3 => (1u64..10, 1u64..10, 0..RelationshipType::ALL.len())
            .prop_map(|(s, t, k)| Op::Link(s, t, k)),
        1 => (1u64..10).prop_map(Op::Delete),
        1 => (1u64..12).prop_map(Op::Unlink),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

async fn apply(cmdb: &Cmdb, op: &Op) {
    // Failures are expected (duplicates, self-loops, missing ids); only the
    // resulting state matters.
    let _ = match *op {
        Op::Create(n) => cmdb
            .create_ci(NewConfigurationItem::new(NAMES[n], "Server", "Active"))
            .await
            .map(|_| ()),
        Op::Rename(id, n) => cmdb
            .update_ci(
                CiId(id),
                CiUpdate {
                    name: Some(NAMES[n].to_string()),
                    ..CiUpdate::default()
                },
            )
            .await
            .map(|_| ()),
        Op::Link(s, t, k) => cmdb
            .create_relationship(NewRelationship::new(
                CiId(s),
                CiId(t),
                RelationshipType::ALL[k],
            ))
            .await
            .map(|_| ()),
        Op::Delete(id) => cmdb.delete_ci_with_cascade(CiId(id)).await.map(|_| ()),
        Op::Unlink(id) => cmdb
            .delete_relationship(RelationshipId(id))
            .await
            .map(|_| ()),
    };
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: names stay unique and relationships never dangle.
    #[test]
    fn prop_mutations_preserve_integrity(ops in prop::collection::vec(op(), 1..40)) {
        let rt = runtime();
        rt.block_on(async {
            let cmdb = Cmdb::in_memory();
            for op in &ops {
                apply(&cmdb, op).await;
            }

            let cis = cmdb.list_cis(&CiFilter::default()).await.unwrap();
            let names: HashSet<&str> = cis.iter().map(|ci| ci.name.as_str()).collect();
            prop_assert_eq!(names.len(), cis.len());

            let mut sorted: Vec<&str> = cis.iter().map(|ci| ci.name.as_str()).collect();
            sorted.sort_unstable();
            let listed: Vec<&str> = cis.iter().map(|ci| ci.name.as_str()).collect();
            prop_assert_eq!(listed, sorted);

            let ids: HashSet<CiId> = cis.iter().map(|ci| ci.id).collect();
            let mut seen = HashSet::new();
            for ci in &cis {
                let all = cmdb.relationships_of(ci.id, Direction::All).await.unwrap();
                let outbound = cmdb.relationships_of(ci.id, Direction::Source).await.unwrap();
                let inbound = cmdb.relationships_of(ci.id, Direction::Target).await.unwrap();
                prop_assert_eq!(all.len(), outbound.len() + inbound.len());

                for rel in &all {
                    prop_assert_ne!(rel.source_id, rel.target_id);
                    prop_assert!(ids.contains(&rel.source_id));
                    prop_assert!(ids.contains(&rel.target_id));
                    seen.insert(rel.id);
                }
            }

            let counts = cmdb.counts().await.unwrap();
            prop_assert_eq!(counts.cis, cis.len());
            prop_assert_eq!(counts.relationships, seen.len());
            Ok(())
        })?;
    }

    /// Property: create then get returns the input plus an id.
    #[test]
    fn prop_create_then_get_roundtrips(
        name in "[A-Za-z][A-Za-z0-9-]{0,40}",
        ci_type in prop::sample::select(KNOWN_CI_TYPES.to_vec()),
        status in prop::sample::select(KNOWN_STATUSES.to_vec()),
        owner in prop::option::of("[A-Za-z ]{1,30}"),
    ) {
        let rt = runtime();
        rt.block_on(async {
            let cmdb = Cmdb::in_memory();
            let mut input = NewConfigurationItem::new(name.as_str(), ci_type, status);
            input.owner = owner.clone();

            let created = cmdb.create_ci(input).await.unwrap();
            let fetched = cmdb.get_ci(created.id).await.unwrap();

            prop_assert_eq!(&fetched, &created);
            prop_assert_eq!(fetched.name.as_str(), name.as_str());
            prop_assert_eq!(fetched.ci_type.as_str(), ci_type);
            prop_assert_eq!(fetched.status.as_str(), status);
            prop_assert_eq!(fetched.owner.as_deref(), owner.as_deref());
            Ok(())
        })?;
    }
}
