use kinship_core::{normalize, parse_bulk_text, MemberStore};

fn store_from(text: &str) -> MemberStore {
    MemberStore::from_members(parse_bulk_text(text))
}

fn assert_symmetric(store: &MemberStore) {
    for member in store.members() {
        for spouse in &member.spouses {
            let other = store.get(spouse).unwrap();
            assert!(other.spouses.contains(&member.name), "{spouse} -/-> {}", member.name);
        }
        for parent in &member.parents {
            let other = store.get(parent).unwrap();
            assert!(other.children.contains(&member.name), "{parent} -/-> {}", member.name);
        }
        for child in &member.children {
            let other = store.get(child).unwrap();
            assert!(other.parents.contains(&member.name), "{child} -/-> {}", member.name);
        }
        for sibling in &member.siblings {
            let other = store.get(sibling).unwrap();
            assert!(other.siblings.contains(&member.name), "{sibling} -/-> {}", member.name);
        }
    }
}

const MESSY_FAMILY: &str = "\
NAME:Ann; SPOUSES:Bob; CHILDREN:Cat
NAME:Bob
NAME:Cat; SIBLINGS:Dan
NAME:Dan; PARENTS:Bob, Ghost
NAME:Eve; SPOUSES:Eve; SIBLINGS:Eve, Dan";

#[test]
fn normalize_makes_every_edge_symmetric() {
    let mut store = store_from(MESSY_FAMILY);
    normalize(&mut store);

    assert_symmetric(&store);
    assert_eq!(store.get("Bob").unwrap().spouses, vec!["Ann"]);
    assert_eq!(store.get("Bob").unwrap().children, vec!["Dan"]);
    assert_eq!(store.get("Cat").unwrap().parents, vec!["Ann"]);
    assert_eq!(store.get("Dan").unwrap().siblings, vec!["Cat", "Eve"]);
}

#[test]
fn normalize_drops_dangling_and_self_references() {
    let mut store = store_from(MESSY_FAMILY);
    normalize(&mut store);

    assert_eq!(store.get("Dan").unwrap().parents, vec!["Bob"]);
    let eve = store.get("Eve").unwrap();
    assert!(eve.spouses.is_empty());
    assert_eq!(eve.siblings, vec!["Dan"]);
    assert!(!store.contains("Ghost"));
}

#[test]
fn normalize_is_idempotent() {
    let mut store = store_from(MESSY_FAMILY);
    let first = normalize(&mut store);
    assert!(!first.is_empty());

    let snapshot = store.clone();
    let second = normalize(&mut store);
    assert!(second.is_empty(), "unexpected change: {second:?}");
    assert_eq!(store, snapshot);
}

#[test]
fn one_sided_spouse_is_mirrored() {
    let mut store = store_from("NAME:A; SPOUSES:B\nNAME:B");
    normalize(&mut store);

    assert_eq!(store.get("A").unwrap().spouses, vec!["B"]);
    assert_eq!(store.get("B").unwrap().spouses, vec!["A"]);
}

#[test]
fn forward_references_resolve_once_target_exists() {
    let mut store = store_from("NAME:Kid; PARENTS:Later");
    store
        .merge_by_name(&kinship_core::FamilyMember::new("Later"))
        .unwrap();
    normalize(&mut store);

    assert_eq!(store.get("Later").unwrap().children, vec!["Kid"]);
}
