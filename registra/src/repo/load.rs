//! Bounded-depth relationship load planning
//!
//! [`build_load_plan`] turns the static registry in [`crate::schema`] into a
//! tree of [`LoadNode`]s describing which relationships to fetch, and in what
//! nesting, for a given traversal depth. The plan is pure data: executing it
//! against a connection happens in [`super::relations`].
//!
//! Termination over the cyclic entity graph works per path, not globally.
//! Each recursion level clones the set of entity kinds already on its path,
//! so the same kind may appear on two sibling branches, while a branch that
//! would revisit its own ancestor stops expanding there. A back-reference to
//! an ancestor still gets a node of its own (one extra hop), it just has no
//! children.

use std::collections::HashSet;

use crate::schema::{relations_of, EntityKind, RelationDef};

/// One relationship fetch in a load plan
#[derive(Debug, Clone, PartialEq)]
pub struct LoadNode {
    /// The registry edge to fetch
    pub relation: &'static RelationDef,
    /// Plans to apply to the fetched rows, one level deeper
    pub children: Vec<LoadNode>,
}

/// Build the load plan for `root` with the given traversal depth
///
/// Depth 0 loads no relationships at all; depth 1 loads the root's direct
/// relationships, and so on.
pub fn build_load_plan(root: EntityKind, depth: u32) -> Vec<LoadNode> {
    expand(root, depth, &HashSet::new())
}

fn expand(kind: EntityKind, depth: u32, visited: &HashSet<EntityKind>) -> Vec<LoadNode> {
    if depth == 0 || visited.contains(&kind) {
        return Vec::new();
    }

    // Clone per level: siblings must not see kinds added on each other's
    // branches, only the ancestors of this path.
    let mut visited = visited.clone();
    visited.insert(kind);

    relations_of(kind)
        .iter()
        .map(|relation| LoadNode {
            relation,
            children: expand(relation.target, depth - 1, &visited),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_names(nodes: &[LoadNode]) -> Vec<&'static str> {
        nodes.iter().map(|n| n.relation.name).collect()
    }

    fn max_depth(nodes: &[LoadNode]) -> u32 {
        nodes
            .iter()
            .map(|n| 1 + max_depth(&n.children))
            .max()
            .unwrap_or(0)
    }

    fn count_nodes(nodes: &[LoadNode]) -> usize {
        nodes.iter().map(|n| 1 + count_nodes(&n.children)).sum()
    }

    #[test]
    fn test_depth_zero_is_empty() {
        assert!(build_load_plan(EntityKind::School, 0).is_empty());
    }

    #[test]
    fn test_depth_one_is_direct_relations() {
        let plan = build_load_plan(EntityKind::School, 1);
        assert_eq!(node_names(&plan), vec!["faculties"]);
        assert!(plan[0].children.is_empty());
    }

    #[test]
    fn test_depth_two_expands_one_level() {
        let plan = build_load_plan(EntityKind::School, 2);
        assert_eq!(node_names(&plan), vec!["faculties"]);
        // Faculty's back-reference to School is loaded but not expanded.
        assert_eq!(node_names(&plan[0].children), vec!["school", "departments"]);
        for child in &plan[0].children {
            assert!(child.children.is_empty());
        }
    }

    #[test]
    fn test_ancestor_revisit_stops_expansion() {
        let plan = build_load_plan(EntityKind::School, 5);
        let faculties = &plan[0];
        let school = faculties
            .children
            .iter()
            .find(|n| n.relation.name == "school")
            .expect("school back-reference");
        // School is on this path already, so the back-reference never
        // expands no matter how much depth remains.
        assert!(school.children.is_empty());
    }

    #[test]
    fn test_sibling_branches_do_not_share_visited_sets() {
        // From CourseOffering, both the semester and session branches reach
        // Session: semester -> session directly, and the session relation
        // itself. One branch visiting Session must not block the other.
        let plan = build_load_plan(EntityKind::CourseOffering, 2);
        let names = node_names(&plan);
        assert!(names.contains(&"semester"));
        assert!(names.contains(&"session"));
        let semester = plan
            .iter()
            .find(|n| n.relation.name == "semester")
            .expect("semester branch");
        assert!(node_names(&semester.children).contains(&"session"));
    }

    #[test]
    fn test_depth_bounds_nesting() {
        for depth in 0..=4 {
            let plan = build_load_plan(EntityKind::CourseOffering, depth);
            assert!(max_depth(&plan) <= depth);
        }
    }

    #[test]
    fn test_plan_is_finite_at_large_depth() {
        // The graph is cyclic; only the per-path visited set bounds the
        // plan once depth exceeds the number of entity kinds.
        for kind in EntityKind::ALL {
            let plan = build_load_plan(kind, 50);
            assert!(count_nodes(&plan) < 1_000, "plan exploded for {}", kind);
        }
    }

    #[test]
    fn test_plan_is_deterministic() {
        let a = build_load_plan(EntityKind::StudentProfile, 3);
        let b = build_load_plan(EntityKind::StudentProfile, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_school_depth_three_shape() {
        let plan = build_load_plan(EntityKind::School, 3);
        let faculties = &plan[0];
        let departments = faculties
            .children
            .iter()
            .find(|n| n.relation.name == "departments")
            .expect("departments branch");
        assert_eq!(
            node_names(&departments.children),
            vec!["faculty", "users", "courses"]
        );
    }
}
