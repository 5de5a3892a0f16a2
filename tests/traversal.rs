//! Tests for the generic branching traversal engine, driven over a plain
//! adjacency-list graph rather than a network model.
use phasetrace::traversal::{QueueKind, Traversal};

/// Caller state threaded through the walk: the graph plus a visit log.
struct Walk {
    edges: Vec<Vec<usize>>,
    visits: Vec<usize>,
    distances: Vec<(usize, usize)>,
}

impl Walk {
    fn new(edges: Vec<Vec<usize>>) -> Self {
        Walk {
            edges,
            visits: Vec::new(),
            distances: Vec::new(),
        }
    }
}

/// A traversal that logs every step and queues straight continuations.
fn straight_walker() -> Traversal<usize, Walk, ()> {
    Traversal::new(
        QueueKind::BreadthFirst,
        |item: usize, _, walk: &mut Walk, queuer| {
            for next in walk.edges[item].clone() {
                queuer.queue(next);
            }
            Ok(())
        },
    )
    .add_step_action(|item, _, walk| {
        walk.visits.push(item);
        Ok(())
    })
}

/// A traversal that opens a branch per continuation at every fork.
fn branching_walker() -> Traversal<usize, Walk, ()> {
    Traversal::new(
        QueueKind::BreadthFirst,
        |item: usize, _, walk: &mut Walk, queuer| {
            let next = walk.edges[item].clone();
            if next.len() == 1 {
                queuer.queue(next[0]);
            } else {
                for n in next {
                    queuer.queue_branch(n);
                }
            }
            Ok(())
        },
    )
    .add_step_action(|item, _, walk| {
        walk.visits.push(item);
        Ok(())
    })
}

#[test]
fn cycle_terminates_and_visits_each_item_once() {
    // 0 -> 1 -> 2 -> 0, a loop.
    let mut walk = Walk::new(vec![vec![1], vec![2], vec![0]]);
    let mut traversal = straight_walker();
    traversal.run(0, &mut walk, true).unwrap();
    assert_eq!(walk.visits, vec![0, 1, 2]);
}

#[test]
fn sibling_branches_revisit_a_reconverging_item() {
    // A diamond: 0 forks to 1 and 2, both reconverge on 3.
    let mut walk = Walk::new(vec![vec![1, 2], vec![3], vec![3], vec![]]);
    let mut traversal = branching_walker();
    traversal.run(0, &mut walk, true).unwrap();

    // Each sibling branch independently processes 3, but no branch
    // processes anything in its own ancestry twice.
    assert_eq!(walk.visits, vec![0, 1, 3, 2, 3]);
}

#[test]
fn branch_lineage_suppresses_revisits() {
    // 0 forks to 1 and 2; 1 leads back to 0 and on to 3.
    let mut walk = Walk::new(vec![vec![1, 2], vec![0, 3], vec![], vec![]]);
    let mut traversal = branching_walker();
    traversal.run(0, &mut walk, true).unwrap();

    // The branch through 1 must not re-walk 0, which its ancestor visited.
    assert_eq!(walk.visits.iter().filter(|v| **v == 0).count(), 1);
    assert!(walk.visits.contains(&3));
}

#[test]
fn stop_conditions_halt_without_queueing() {
    let mut walk = Walk::new(vec![vec![1], vec![2], vec![3], vec![]]);
    let mut traversal = straight_walker().add_stop_condition(|item, _, _: &Walk| item == 1);
    traversal.run(0, &mut walk, true).unwrap();

    // The stop item itself is still actioned; nothing beyond it is.
    assert_eq!(walk.visits, vec![0, 1]);
}

#[test]
fn start_item_can_be_exempt_from_stop_conditions() {
    let mut walk = Walk::new(vec![vec![1], vec![]]);
    let mut traversal = straight_walker().add_stop_condition(|_, _, _: &Walk| true);
    traversal.run(0, &mut walk, false).unwrap();
    assert_eq!(walk.visits, vec![0, 1]);

    let mut walk = Walk::new(vec![vec![1], vec![]]);
    let mut traversal = straight_walker().add_stop_condition(|_, _, _: &Walk| true);
    traversal.run(0, &mut walk, true).unwrap();
    assert_eq!(walk.visits, vec![0]);
}

#[test]
fn queue_conditions_filter_continuations() {
    let mut walk = Walk::new(vec![vec![1, 2], vec![3], vec![3], vec![]]);
    let mut traversal =
        straight_walker().add_queue_condition(|next, _, _, _, _: &Walk| next != 2);
    traversal.run(0, &mut walk, true).unwrap();
    assert_eq!(walk.visits, vec![0, 1, 3]);
}

#[test]
fn context_value_computers_flow_along_the_walk() {
    let mut walk = Walk::new(vec![vec![1], vec![2], vec![]]);
    let mut traversal = Traversal::<usize, Walk, ()>::new(
        QueueKind::BreadthFirst,
        |item: usize, _, walk: &mut Walk, queuer| {
            for next in walk.edges[item].clone() {
                queuer.queue(next);
            }
            Ok(())
        },
    )
    .add_context_value_computer(
        "hops",
        |_: &usize| 0usize,
        |_, _, hops: Option<&usize>| hops.copied().unwrap_or(0) + 1,
    )
    .add_step_action(|item, context, walk| {
        let hops = *context.value::<usize>("hops").unwrap();
        walk.distances.push((item, hops));
        Ok(())
    });
    traversal.run(0, &mut walk, true).unwrap();
    assert_eq!(walk.distances, vec![(0, 0), (1, 1), (2, 2)]);
}

#[test]
fn depth_first_drains_lifo() {
    let mut walk = Walk::new(vec![vec![1, 2], vec![], vec![]]);
    let mut traversal =
        Traversal::<usize, Walk, ()>::new(QueueKind::DepthFirst, |item: usize, _, walk: &mut Walk, queuer| {
            for next in walk.edges[item].clone() {
                queuer.queue(next);
            }
            Ok(())
        })
        .add_step_action(|item, _, walk| {
            walk.visits.push(item);
            Ok(())
        });
    traversal.run(0, &mut walk, true).unwrap();
    assert_eq!(walk.visits, vec![0, 2, 1]);
}

#[test]
fn has_visited_reports_walked_items() {
    let mut walk = Walk::new(vec![vec![1], vec![]]);
    let mut traversal = straight_walker();
    assert!(!traversal.has_visited(0));
    traversal.run(0, &mut walk, true).unwrap();
    assert!(traversal.has_visited(0));
    assert!(traversal.has_visited(1));
    assert!(!traversal.has_visited(7));

    traversal.reset();
    assert!(!traversal.has_visited(0));
}

#[test]
fn reset_allows_reuse() {
    let mut walk = Walk::new(vec![vec![1], vec![]]);
    let mut traversal = straight_walker();
    traversal.run(0, &mut walk, true).unwrap();
    traversal.reset();
    traversal.run(0, &mut walk, true).unwrap();
    assert_eq!(walk.visits, vec![0, 1, 0, 1]);
}

#[test]
#[should_panic(expected = "reset")]
fn rerunning_without_reset_panics() {
    let mut walk = Walk::new(vec![vec![1], vec![]]);
    let mut traversal = straight_walker();
    traversal.run(0, &mut walk, true).unwrap();
    let _ = traversal.run(0, &mut walk, true);
}

#[test]
fn action_errors_abort_the_run() {
    let mut walk = Walk::new(vec![vec![1], vec![2], vec![]]);
    let mut traversal = Traversal::new(
        QueueKind::BreadthFirst,
        |item: usize, _, walk: &mut Walk, queuer| {
            for next in walk.edges[item].clone() {
                queuer.queue(next);
            }
            Ok(())
        },
    )
    .add_step_action(|item, _, walk: &mut Walk| {
        walk.visits.push(item);
        if item == 1 { Err("boom") } else { Ok(()) }
    });
    assert_eq!(traversal.run(0, &mut walk, true), Err("boom"));
    assert_eq!(walk.visits, vec![0, 1]);
}
