//! Integration tests for the scene segmentation model
//!
//! Partition invariants under segmentation, random boundary edits, split and
//! merge.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use storyboard_editor::services::{Direction, RangeEdge, SegmentationModel, Shift};

fn model(sentences: usize, target: usize) -> SegmentationModel {
    let sentences = (0..sentences).map(|i| format!("Sentence {}.", i)).collect();
    let mut model = SegmentationModel::local(sentences);
    model.segment(target);
    model
}

fn lengths(model: &SegmentationModel) -> Vec<usize> {
    model
        .scenes()
        .iter()
        .map(|s| s.range.expect("local scenes have ranges").len())
        .collect()
}

#[test]
fn test_segment_covers_every_sentence_once() {
    for n in 1..120 {
        for t in 1..25 {
            let m = model(n, t);
            assert!(m.check_partition(), "partition broken for n={} t={}", n, t);

            let first = m.scenes().first().unwrap().range.unwrap();
            let last = m.scenes().last().unwrap().range.unwrap();
            assert_eq!(first.start, 0);
            assert_eq!(last.end, n - 1);
            assert_eq!(lengths(&m).iter().sum::<usize>(), n);

            if n >= 3 * t {
                assert_eq!(m.len(), t, "n={} t={}", n, t);
                assert!(lengths(&m).iter().all(|len| *len >= 3), "n={} t={}", n, t);
            }
        }
    }
}

#[test]
fn test_segment_numbers_and_texts_are_positional() {
    let m = model(12, 4);
    for (i, scene) in m.scenes().iter().enumerate() {
        assert_eq!(scene.scene_number as usize, i + 1);
        assert_eq!(scene.title, format!("Scene {}", i + 1));
    }
    assert_eq!(m.scenes()[0].text, "Sentence 0. Sentence 1. Sentence 2.");
}

#[test]
fn test_random_boundary_edits_keep_invariants() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for round in 0..20 {
        let mut m = model(60, 8 + round % 5);
        for _ in 0..400 {
            let idx = rng.gen_range(0..m.len());
            let id = m.scenes()[idx].id;
            let edge = if rng.gen_bool(0.5) {
                RangeEdge::Start
            } else {
                RangeEdge::End
            };
            let shift = if rng.gen_bool(0.5) {
                Shift::Decrease
            } else {
                Shift::Increase
            };

            m.adjust_boundary(id, edge, shift);

            assert!(m.check_partition());
            assert!(lengths(&m).iter().all(|len| *len >= 2), "{:?}", lengths(&m));
        }
    }
}

#[test]
fn test_random_set_range_keeps_invariants() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut m = model(50, 7);

    for _ in 0..300 {
        let idx = rng.gen_range(0..m.len());
        let id = m.scenes()[idx].id;
        let start = rng.gen_range(0..50);
        let end = rng.gen_range(0..50);

        m.set_range(id, start, end);

        assert!(m.check_partition());
        assert!(lengths(&m).iter().all(|len| *len >= 2), "{:?}", lengths(&m));
    }
}

#[test]
fn test_boundary_edit_renumbers_and_retexts() {
    let mut m = model(12, 4);
    let second = m.scenes()[1].id;

    assert!(m.adjust_boundary(second, RangeEdge::Start, Shift::Decrease));

    assert_eq!(m.scenes()[0].text, "Sentence 0. Sentence 1.");
    assert!(m.scenes()[1].text.starts_with("Sentence 2."));
    assert_eq!(m.scene(second).unwrap().scene_number, 2);
}

#[test]
fn test_split_then_merge_is_identity_on_ranges() {
    let mut m = model(40, 5);

    for idx in 0..m.len() {
        let id = m.scenes()[idx].id;
        let range = m.scene(id).unwrap().range.unwrap();

        for at in (range.start + 1)..=range.end {
            let mut copy = m.clone();
            let right = copy.split(id, at).expect("split inside range");
            assert!(copy.check_partition());
            assert_eq!(copy.len(), m.len() + 1);

            let merged = copy
                .merge_with_neighbor(id, Direction::Next)
                .expect("left half has a right neighbor");
            assert_ne!(merged, right);
            assert_eq!(copy.scene(merged).unwrap().range, Some(range));
            assert_eq!(copy.len(), m.len());
            assert!(copy.check_partition());
        }
    }
}

#[test]
fn test_split_resets_right_half_to_pending() {
    use storyboard_editor::models::SceneStatus;

    let mut m = model(12, 2);
    let id = m.scenes()[0].id;
    m.approve(id, true);

    let right = m.split(id, 3).unwrap();

    assert_eq!(m.scene(id).unwrap().status, SceneStatus::Approved);
    assert_eq!(m.scene(right).unwrap().status, SceneStatus::Pending);
    assert_eq!(m.scene(right).unwrap().scene_number, 2);
    assert_eq!(m.scenes()[2].scene_number, 3);
}

#[test]
fn test_merge_issues_new_identity() {
    let mut m = model(12, 4);
    let a = m.scenes()[1].id;
    let b = m.scenes()[2].id;

    let merged = m.merge_with_neighbor(b, Direction::Prev).unwrap();

    assert!(m.scene(a).is_none());
    assert!(m.scene(b).is_none());
    let scene = m.scene(merged).unwrap();
    assert_eq!(scene.scene_number, 2);
    assert_eq!(scene.range.unwrap().len(), 6);
}
