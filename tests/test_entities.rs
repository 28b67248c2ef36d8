use shooting_gallery::entities::*;
use shooting_gallery::geometry::Vec2;

use std::collections::BinaryHeap;

#[test]
fn cover_slots_are_fixed_and_distinct() {
    assert_eq!(COVER_SLOTS.len(), 4);
    for (index, slot) in COVER_SLOTS.iter().enumerate() {
        assert_eq!(slot.id, index);
        assert!(slot.center.x > 0.0 && slot.center.x < PLAYFIELD.x);
        assert!(slot.center.y > 0.0 && slot.center.y < PLAYFIELD.y);
        assert!(slot.size.x > 0.0 && slot.size.y > 0.0);
    }
    // No two slots share a centre
    for a in 0..COVER_SLOTS.len() {
        for b in (a + 1)..COVER_SLOTS.len() {
            assert_ne!(COVER_SLOTS[a].center, COVER_SLOTS[b].center);
        }
    }
}

#[test]
fn ui_regions_sit_inside_the_playfield() {
    for rect in [START_BUTTON, RESTART_BUTTON, RELOAD_REGION] {
        assert!(rect.x >= 0.0);
        assert!(rect.y >= 0.0);
        assert!(rect.x + rect.w <= PLAYFIELD.x);
        assert!(rect.y + rect.h <= PLAYFIELD.y);
    }
}

#[test]
fn phase_and_mode_equality() {
    // Enums derive PartialEq — equality comparisons must work
    assert_eq!(SessionMode::Active, SessionMode::Active);
    assert_ne!(SessionMode::Active, SessionMode::Ended);
    assert_eq!(
        EnemyPhase::Hiding { dwell: 1.0 },
        EnemyPhase::Hiding { dwell: 1.0 }
    );
    assert_ne!(
        EnemyPhase::Hiding { dwell: 1.0 },
        EnemyPhase::Warning { left: 1.0 }
    );
    assert_eq!(ParticleKind::Blood, ParticleKind::Blood);
    assert_ne!(ParticleKind::Blood, ParticleKind::BulletHole);
}

#[test]
fn scheduled_events_pop_soonest_first() {
    let mut heap = BinaryHeap::new();
    heap.push(ScheduledEvent {
        due: 3.0,
        action: DeferredAction::AutoReload,
    });
    heap.push(ScheduledEvent {
        due: 1.0,
        action: DeferredAction::EndSession,
    });
    heap.push(ScheduledEvent {
        due: 2.0,
        action: DeferredAction::AdvanceWave { from_wave: 1 },
    });

    let order: Vec<f64> = std::iter::from_fn(|| heap.pop().map(|e| e.due)).collect();
    assert_eq!(order, vec![1.0, 2.0, 3.0]);
}

#[test]
fn session_clone_is_independent() {
    let original = shooting_gallery::compute::new_session();
    let mut cloned = original.clone();

    // Mutating the clone must not affect the original
    cloned.resources.score = 999;
    cloned.enemies.push(Enemy {
        id: 0,
        slot: 0,
        hp: 1,
        max_hp: 1,
        outfit: Outfit::Vest,
        pos: Vec2::new(5.0, 5.0),
        phase: EnemyPhase::Hiding { dwell: 1.0 },
    });

    assert_eq!(original.resources.score, 0);
    assert!(original.enemies.is_empty());
}
