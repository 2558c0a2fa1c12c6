use kinship_core::graph::{connected_members, relative_levels};
use kinship_core::{all_levels, connected_family_of, normalize, parse_bulk_text, MemberStore};
use std::collections::BTreeMap;

const LINEAGE: &str = "\
NAME:G4
NAME:G3; PARENTS:G4
NAME:G2; PARENTS:G3; SPOUSES:G2Wife
NAME:G2Wife
NAME:Aunt; PARENTS:G2
NAME:G1; PARENTS:G2; SPOUSES:Step
NAME:Step
NAME:Focus; PARENTS:G1; SPOUSES:Fay; SIBLINGS:Sib
NAME:Fay
NAME:Sib; PARENTS:G1
NAME:Nephew; PARENTS:Sib
NAME:C1; PARENTS:Focus; SPOUSES:C1Wife
NAME:C1Wife
NAME:C2; PARENTS:C1
NAME:C3; PARENTS:C2
NAME:C4; PARENTS:C3
NAME:C5; PARENTS:C4";

fn lineage() -> MemberStore {
    let mut store = MemberStore::from_members(parse_bulk_text(LINEAGE));
    normalize(&mut store);
    store
}

#[test]
fn ancestors_stop_two_generations_up_and_descendants_do_not() {
    let store = lineage();
    let members = connected_members(&store, "Focus");

    let expected = [
        ("G2", 0),
        ("G2Wife", 0),
        ("G1", 1),
        ("Step", 1),
        ("Focus", 2),
        ("Fay", 2),
        ("Sib", 2),
        ("C1", 3),
        ("C1Wife", 3),
        ("C2", 4),
        ("C3", 5),
        ("C4", 6),
        ("C5", 7),
    ]
    .into_iter()
    .map(|(name, level)| (name.to_string(), level))
    .collect::<BTreeMap<_, _>>();
    assert_eq!(members, expected);
    for excluded in ["G3", "G4", "Aunt", "Nephew"] {
        assert!(!members.contains_key(excluded), "{excluded} should be hidden");
    }
}

#[test]
fn neighborhood_levels_are_display_ordered() {
    let store = lineage();
    let groups = connected_family_of(&store, "Focus");

    let levels = groups.iter().map(|group| group.level).collect::<Vec<_>>();
    assert_eq!(levels, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(groups[0].names(), vec!["G2", "G2Wife"]);
    assert_eq!(groups[1].names(), vec!["G1", "Step"]);
    assert_eq!(groups[2].names(), vec!["Focus", "Fay", "Sib"]);
    assert_eq!(groups[3].names(), vec!["C1", "C1Wife"]);
}

#[test]
fn relative_levels_cover_the_whole_component() {
    let store = lineage();
    let levels = relative_levels(&store, "Focus");

    assert_eq!(levels["Focus"], 0);
    assert_eq!(levels["G4"], -4);
    assert_eq!(levels["Aunt"], -1);
    assert_eq!(levels["Nephew"], 1);
    assert_eq!(levels["C5"], 5);
}

#[test]
fn shared_descendant_is_listed_once() {
    let mut store = MemberStore::from_members(parse_bulk_text(
        "NAME:Focus; CHILDREN:A,B\nNAME:A\nNAME:B\nNAME:D; PARENTS:A,B",
    ));
    normalize(&mut store);

    let groups = connected_family_of(&store, "Focus");
    let occurrences = groups
        .iter()
        .flat_map(|group| group.members.iter())
        .filter(|member| member.name == "D")
        .count();
    assert_eq!(occurrences, 1);
    assert_eq!(groups.last().unwrap().level, 2);
}

#[test]
fn unknown_focus_yields_nothing() {
    let store = lineage();
    assert!(connected_family_of(&store, "Stranger").is_empty());
}

#[test]
fn full_tree_places_every_root_line() {
    let store = lineage();
    let groups = all_levels(&store);

    let placed = groups
        .iter()
        .map(|group| group.members.len())
        .sum::<usize>();
    assert_eq!(placed, store.len());
    assert_eq!(groups[0].level, 0);
    assert!(groups[0].names().contains(&"G4"));
    assert!(groups
        .iter()
        .any(|group| group.level == 4 && group.names().contains(&"Focus")));
}
